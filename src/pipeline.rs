use crate::context::RunContext;
use crate::invoker::{CommandRunner, StageError};
use crate::logging::RunLogger;
use crate::stages::{
    AtmosphericParameters, BuildModtranInput, DetermineGridPoints, ExtractAuxiliaryNarrData,
    GenerateEmissivityProducts, RunModtran, Stage, SynthesizeLstBand,
};
use crate::synthesis::BandSynthesizer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    Running(usize),
    Succeeded,
    Failed { stage: usize, name: &'static str },
}

/// The ordered stage sequence for one product run. Stages execute
/// strictly in order and communicate only through the working directory;
/// the first failure ends the run with no rollback of completed stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    state: PipelineState,
}

impl Pipeline {
    /// The one valid production order: grid points, auxiliary NARR
    /// extraction, MODTRAN input, emissivity, MODTRAN execution,
    /// atmospheric parameters, final band synthesis.
    pub fn standard(synthesizer: Box<dyn BandSynthesizer>) -> Self {
        Self::with_stages(vec![
            Box::new(DetermineGridPoints),
            Box::new(ExtractAuxiliaryNarrData),
            Box::new(BuildModtranInput),
            Box::new(GenerateEmissivityProducts),
            Box::new(RunModtran),
            Box::new(AtmosphericParameters),
            Box::new(SynthesizeLstBand::new(synthesizer)),
        ])
    }

    pub fn with_stages(stages: Vec<Box<dyn Stage>>) -> Self {
        Self {
            stages,
            state: PipelineState::NotStarted,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Succeeded
    }

    pub fn run(
        &mut self,
        ctx: &RunContext,
        runner: &dyn CommandRunner,
        logger: &dyn RunLogger,
    ) -> Result<(), StageError> {
        for (index, stage) in self.stages.iter().enumerate() {
            self.state = PipelineState::Running(index);
            if let Err(err) = stage.run(ctx, runner, logger) {
                self.state = PipelineState::Failed {
                    stage: index,
                    name: stage.name(),
                };
                return Err(err);
            }
        }
        self.state = PipelineState::Succeeded;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct NullLogger;

    impl RunLogger for NullLogger {
        fn info(&self, _message: &str) {}
        fn error(&self, _message: &str) {}
    }

    thread_local! {
        static CALLS: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    }

    struct ScriptedStage {
        name: &'static str,
        fail: bool,
    }

    impl Stage for ScriptedStage {
        fn name(&self) -> &'static str {
            self.name
        }

        fn run(
            &self,
            _ctx: &RunContext,
            _runner: &dyn CommandRunner,
            _logger: &dyn RunLogger,
        ) -> Result<(), StageError> {
            CALLS.with(|calls| calls.borrow_mut().push(self.name));
            if self.fail {
                Err(StageError::ExecutionFailed {
                    command: self.name.to_string(),
                    status: 1,
                    output: String::new(),
                })
            } else {
                Ok(())
            }
        }
    }

    struct UnusedRunner;

    impl CommandRunner for UnusedRunner {
        fn run(&self, command: &crate::invoker::StageCommand) -> Result<String, StageError> {
            panic!("unexpected command invocation: {}", command.render());
        }
    }

    fn test_context(work_dir: std::path::PathBuf) -> RunContext {
        RunContext {
            metadata_file: "scene.xml".to_string(),
            work_dir,
            data_path: "/data".to_string(),
            aux_path: "/aux".to_string(),
            modtran_data_path: "/modtran".to_string(),
            server_name: "ged.example.gov".to_string(),
            server_path: "/ASTT/".to_string(),
            process_count: "2".to_string(),
            debug: false,
        }
    }

    #[test]
    fn stops_at_first_failing_stage() {
        CALLS.with(|calls| calls.borrow_mut().clear());
        let temp = tempfile::tempdir().unwrap();
        let mut pipeline = Pipeline::with_stages(vec![
            Box::new(ScriptedStage {
                name: "first",
                fail: false,
            }),
            Box::new(ScriptedStage {
                name: "second",
                fail: true,
            }),
            Box::new(ScriptedStage {
                name: "third",
                fail: false,
            }),
        ]);

        let result = pipeline.run(
            &test_context(temp.path().to_path_buf()),
            &UnusedRunner,
            &NullLogger,
        );

        assert!(result.is_err());
        assert_eq!(
            *pipeline.state(),
            PipelineState::Failed {
                stage: 1,
                name: "second"
            }
        );
        CALLS.with(|calls| assert_eq!(*calls.borrow(), ["first", "second"]));
    }

    #[test]
    fn reaches_succeeded_when_every_stage_passes() {
        CALLS.with(|calls| calls.borrow_mut().clear());
        let temp = tempfile::tempdir().unwrap();
        let mut pipeline = Pipeline::with_stages(vec![
            Box::new(ScriptedStage {
                name: "first",
                fail: false,
            }),
            Box::new(ScriptedStage {
                name: "second",
                fail: false,
            }),
        ]);

        pipeline
            .run(
                &test_context(temp.path().to_path_buf()),
                &UnusedRunner,
                &NullLogger,
            )
            .unwrap();
        assert!(pipeline.succeeded());
        CALLS.with(|calls| assert_eq!(*calls.borrow(), ["first", "second"]));
    }
}
