use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const PROC_CFG_FILENAME: &str = "processing.conf";
pub const PROCESSING_SECTION: &str = "processing";

const HOME_VAR: &str = "HOME";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("[{0}] not found in environment")]
    MissingEnvVar(&'static str),
    #[error("missing configuration file [{}]", .0.display())]
    MissingFile(PathBuf),
    #[error("failed reading configuration file [{}]: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed configuration line {line} in [{}]", .path.display())]
    Malformed { path: PathBuf, line: usize },
    #[error("missing configuration section [{0}]")]
    MissingSection(String),
    #[error("missing configuration key [{key}] in section [{section}]")]
    MissingKey { section: String, key: String },
}

/// Immutable key/value store read from an INI-style configuration file.
/// Values are opaque strings; interpretation is the caller's concern.
#[derive(Debug)]
pub struct ProcessingConfig {
    sections: HashMap<String, HashMap<String, String>>,
}

impl ProcessingConfig {
    /// Resolves `$HOME/.usgs/espa/<filename>` and loads it.
    pub fn load(filename: &str) -> Result<Self, ConfigError> {
        let home = env::var(HOME_VAR).map_err(|_| ConfigError::MissingEnvVar(HOME_VAR))?;
        let path = Path::new(&home).join(".usgs").join("espa").join(filename);
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                let name = line[1..line.len() - 1].trim().to_string();
                sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }
            let split = line
                .find('=')
                .or_else(|| line.find(':'))
                .ok_or(ConfigError::Malformed {
                    path: path.to_path_buf(),
                    line: idx + 1,
                })?;
            let section = current.as_ref().ok_or(ConfigError::Malformed {
                path: path.to_path_buf(),
                line: idx + 1,
            })?;
            let key = line[..split].trim().to_lowercase();
            let value = line[split + 1..].trim().to_string();
            if let Some(entries) = sections.get_mut(section) {
                entries.insert(key, value);
            }
        }

        Ok(Self { sections })
    }

    /// Looks up one value. Missing section or key is an error; there is
    /// no defaulting.
    pub fn get(&self, section: &str, key: &str) -> Result<&str, ConfigError> {
        let entries = self
            .sections
            .get(section)
            .ok_or_else(|| ConfigError::MissingSection(section.to_string()))?;
        entries
            .get(&key.to_lowercase())
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingKey {
                section: section.to_string(),
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(PROC_CFG_FILENAME);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_sections_and_keys() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_config(
            temp.path(),
            "# cron processing settings\n\
             [processing]\n\
             omp_num_threads = 4\n\
             lst_data_path: /usr/local/lst/data\n",
        );

        let cfg = ProcessingConfig::load_from(&path).unwrap();
        assert_eq!(cfg.get("processing", "omp_num_threads").unwrap(), "4");
        assert_eq!(
            cfg.get("processing", "LST_DATA_PATH").unwrap(),
            "/usr/local/lst/data"
        );
    }

    #[test]
    fn missing_key_is_an_error_not_a_default() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_config(temp.path(), "[processing]\nomp_num_threads = 4\n");

        let cfg = ProcessingConfig::load_from(&path).unwrap();
        let err = cfg.get("processing", "lst_aux_path").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { .. }));

        let err = cfg.get("reporting", "omp_num_threads").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection(_)));
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = ProcessingConfig::load_from(&temp.path().join("absent.conf")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(_)));
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_config(temp.path(), "[processing]\nnot a pair\n");

        let err = ProcessingConfig::load_from(&path).unwrap_err();
        match err {
            ConfigError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
