use tracing::{error, info};

/// Logging capability threaded through the pipeline instead of relying on
/// ambient global state. Tests substitute a recording implementation.
pub trait RunLogger {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Production logger backed by the `tracing` subscriber installed in main.
#[derive(Debug, Default)]
pub struct TracingLogger;

impl RunLogger for TracingLogger {
    fn info(&self, message: &str) {
        info!("{message}");
    }

    fn error(&self, message: &str) {
        error!("{message}");
    }
}
