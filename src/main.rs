use std::env;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use lst_products::cleanup::{self, RetentionFlags};
use lst_products::config::{PROC_CFG_FILENAME, ProcessingConfig};
use lst_products::context::RunContext;
use lst_products::invoker::SystemRunner;
use lst_products::logging::TracingLogger;
use lst_products::pipeline::Pipeline;
use lst_products::synthesis::BuildLstData;
use tracing::info;
use tracing_subscriber::{EnvFilter, prelude::*};

#[derive(Parser)]
#[command(
    name = "lst_generate_products",
    version,
    about = "Runs the sub-applications required to generate LST products"
)]
struct Cli {
    /// The XML metadata file to use
    #[arg(long = "xml", value_name = "FILE")]
    xml_filename: String,

    /// Keep any intermediate band products generated
    #[arg(long = "keep-intermediate-data")]
    keep_intermediate_data: bool,

    /// Keep any temporary files generated
    #[arg(long = "keep-temporary-data")]
    keep_temporary_data: bool,

    /// Output debug messages and pass --debug through to every stage
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_tracing(cli.debug)?;

    info!("*** Begin LST Generate Products ***");

    let cfg = ProcessingConfig::load(PROC_CFG_FILENAME)?;
    let work_dir = env::current_dir().context("Failed to determine current directory")?;
    let ctx = RunContext::from_config(&cfg, cli.xml_filename, work_dir, cli.debug)?;

    let runner = SystemRunner;
    let logger = TracingLogger;
    let mut pipeline = Pipeline::standard(Box::new(BuildLstData));
    pipeline.run(&ctx, &runner, &logger)?;

    // Clean up files and directories according to user selections.
    // Never reached on a failed run.
    cleanup::apply(
        &ctx.work_dir,
        RetentionFlags {
            keep_temporary: cli.keep_temporary_data,
            keep_intermediate: cli.keep_intermediate_data,
        },
        &logger,
    )?;

    info!("*** LST Generate Products - Complete ***");
    Ok(())
}

fn configure_tracing(debug: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|err| anyhow!(err.to_string()))?;

    Ok(())
}
