use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::logging::RunLogger;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("stage [{command}] exited with status {status}")]
    ExecutionFailed {
        command: String,
        status: i32,
        output: String,
    },
    #[error("failed to launch [{command}]: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Synthesis(anyhow::Error),
}

/// One external stage invocation, built from structured tokens rather
/// than a concatenated string.
#[derive(Debug, Clone)]
pub struct StageCommand {
    program: String,
    args: Vec<String>,
    work_dir: PathBuf,
}

impl StageCommand {
    pub fn new(program: &str, work_dir: &Path) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            work_dir: work_dir.to_path_buf(),
        }
    }

    pub fn arg(mut self, flag: &str, value: &str) -> Self {
        self.args.push(flag.to_string());
        self.args.push(value.to_string());
        self
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        if enabled {
            self.args.push("--debug".to_string());
        }
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Human-readable rendering, for log lines only.
    pub fn render(&self) -> String {
        let mut line = self.program.clone();
        for token in &self.args {
            line.push(' ');
            line.push_str(token);
        }
        line
    }
}

/// Capability for running one stage command to completion. The production
/// implementation spawns a process; test doubles record the call instead.
pub trait CommandRunner {
    /// Blocks until the command exits. Returns the merged stdout/stderr
    /// text on success; non-zero exit becomes `ExecutionFailed` carrying
    /// the same captured text.
    fn run(&self, command: &StageCommand) -> Result<String, StageError>;
}

/// Spawns the named executable in the command's working directory and
/// captures its combined output.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &StageCommand) -> Result<String, StageError> {
        let output = Command::new(command.program())
            .args(command.args())
            .current_dir(command.work_dir())
            .output()
            .map_err(|source| StageError::Spawn {
                command: command.render(),
                source,
            })?;

        let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
        captured.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(captured)
        } else {
            Err(StageError::ExecutionFailed {
                command: command.render(),
                status: output.status.code().unwrap_or(-1),
                output: captured,
            })
        }
    }
}

/// Runs one stage command and surfaces any captured output through the
/// logger on both the success and the failure path, so a failing stage's
/// output is never dropped.
pub fn execute(
    runner: &dyn CommandRunner,
    logger: &dyn RunLogger,
    command: &StageCommand,
) -> Result<(), StageError> {
    logger.info(&format!("Calling [{}]", command.render()));
    match runner.run(command) {
        Ok(output) => {
            if !output.is_empty() {
                logger.info(&output);
            }
            Ok(())
        }
        Err(err) => {
            if let StageError::ExecutionFailed { output, .. } = &err {
                if !output.is_empty() {
                    logger.info(output);
                }
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLogger {
        lines: Mutex<Vec<String>>,
    }

    impl RunLogger for RecordingLogger {
        fn info(&self, message: &str) {
            self.lines.lock().unwrap().push(message.to_string());
        }

        fn error(&self, message: &str) {
            self.lines.lock().unwrap().push(format!("ERROR {message}"));
        }
    }

    #[test]
    fn builds_flag_value_tokens_in_order() {
        let cmd = StageCommand::new("lst_determine_grid_points", Path::new("/tmp"))
            .arg("--xml", "scene.xml")
            .arg("--data_path", "/data")
            .debug(true);

        assert_eq!(
            cmd.args(),
            ["--xml", "scene.xml", "--data_path", "/data", "--debug"]
        );
        assert_eq!(
            cmd.render(),
            "lst_determine_grid_points --xml scene.xml --data_path /data --debug"
        );
    }

    #[test]
    fn debug_flag_is_omitted_when_disabled() {
        let cmd = StageCommand::new("lst_atmospheric_parameters", Path::new("/tmp"))
            .arg("--xml", "scene.xml")
            .debug(false);
        assert_eq!(cmd.args(), ["--xml", "scene.xml"]);
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_output_and_status() {
        let temp = tempfile::tempdir().unwrap();
        let ok = StageCommand::new("true", temp.path());
        assert!(SystemRunner.run(&ok).is_ok());

        let failing = StageCommand::new("false", temp.path());
        match SystemRunner.run(&failing) {
            Err(StageError::ExecutionFailed { status, .. }) => assert_eq!(status, 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn missing_executable_is_a_spawn_error() {
        let temp = tempfile::tempdir().unwrap();
        let cmd = StageCommand::new("lst_no_such_stage_binary", temp.path());
        assert!(matches!(
            SystemRunner.run(&cmd),
            Err(StageError::Spawn { .. })
        ));
    }

    struct FailingRunner;

    impl CommandRunner for FailingRunner {
        fn run(&self, command: &StageCommand) -> Result<String, StageError> {
            Err(StageError::ExecutionFailed {
                command: command.render(),
                status: 2,
                output: "stage diagnostics".to_string(),
            })
        }
    }

    #[test]
    fn failing_stage_output_is_logged_before_the_error_returns() {
        let logger = RecordingLogger::default();
        let cmd = StageCommand::new("lst_run_modtran", Path::new("/tmp"));

        let err = execute(&FailingRunner, &logger, &cmd).unwrap_err();
        assert!(matches!(err, StageError::ExecutionFailed { .. }));

        let lines = logger.lines.lock().unwrap();
        assert!(lines.iter().any(|line| line == "stage diagnostics"));
    }
}
