use std::path::PathBuf;

use crate::config::{ConfigError, PROCESSING_SECTION, ProcessingConfig};

/// Resolved, immutable parameters for one pipeline run. Built once from
/// the command line and the processing configuration, then only read.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// XML metadata reference naming the scene being processed.
    pub metadata_file: String,
    /// Directory all stages read from and write into.
    pub work_dir: PathBuf,
    pub data_path: String,
    pub aux_path: String,
    pub modtran_data_path: String,
    pub server_name: String,
    pub server_path: String,
    /// Opaque worker-count hint, passed through to stages unparsed.
    pub process_count: String,
    pub debug: bool,
}

impl RunContext {
    pub fn from_config(
        cfg: &ProcessingConfig,
        metadata_file: String,
        work_dir: PathBuf,
        debug: bool,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            metadata_file,
            work_dir,
            data_path: cfg.get(PROCESSING_SECTION, "lst_data_path")?.to_string(),
            aux_path: cfg.get(PROCESSING_SECTION, "lst_aux_path")?.to_string(),
            modtran_data_path: cfg.get(PROCESSING_SECTION, "modtran_data_path")?.to_string(),
            server_name: cfg
                .get(PROCESSING_SECTION, "aster_ged_server_name")?
                .to_string(),
            server_path: cfg
                .get(PROCESSING_SECTION, "aster_ged_server_path")?
                .to_string(),
            process_count: cfg.get(PROCESSING_SECTION, "omp_num_threads")?.to_string(),
            debug,
        })
    }

    /// Scene identifier: the metadata reference minus its `.xml` suffix.
    pub fn scene_id(&self) -> &str {
        self.metadata_file
            .strip_suffix(".xml")
            .unwrap_or(&self.metadata_file)
    }
}
