pub mod cleanup;
pub mod config;
pub mod context;
pub mod invoker;
pub mod logging;
pub mod pipeline;
pub mod stages;
pub mod synthesis;

pub use cleanup::RetentionFlags;
pub use config::{ConfigError, ProcessingConfig};
pub use context::RunContext;
pub use invoker::{CommandRunner, StageCommand, StageError, SystemRunner};
pub use pipeline::{Pipeline, PipelineState};
