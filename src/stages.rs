use crate::context::RunContext;
use crate::invoker::{self, CommandRunner, StageCommand, StageError};
use crate::logging::RunLogger;
use crate::synthesis::BandSynthesizer;

pub const GRID_POINTS_COMMAND: &str = "lst_determine_grid_points";
pub const EXTRACT_AUX_COMMAND: &str = "lst_extract_auxiliary_narr_data";
pub const BUILD_MODTRAN_INPUT_COMMAND: &str = "lst_build_modtran_input";
pub const EMISSIVITY_COMMAND: &str = "estimate_landsat_emissivity";
pub const RUN_MODTRAN_COMMAND: &str = "lst_run_modtran";
pub const ATMOSPHERIC_PARAMETERS_COMMAND: &str = "lst_atmospheric_parameters";

/// One discrete step of the product pipeline. External stages shell out
/// through the `CommandRunner`; the final synthesis stage runs in-process.
pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(
        &self,
        ctx: &RunContext,
        runner: &dyn CommandRunner,
        logger: &dyn RunLogger,
    ) -> Result<(), StageError>;
}

pub struct DetermineGridPoints;

impl Stage for DetermineGridPoints {
    fn name(&self) -> &'static str {
        "determine_grid_points"
    }

    fn run(
        &self,
        ctx: &RunContext,
        runner: &dyn CommandRunner,
        logger: &dyn RunLogger,
    ) -> Result<(), StageError> {
        let cmd = StageCommand::new(GRID_POINTS_COMMAND, &ctx.work_dir)
            .arg("--xml", &ctx.metadata_file)
            .arg("--data_path", &ctx.data_path)
            .debug(ctx.debug);
        invoker::execute(runner, logger, &cmd)
    }
}

pub struct ExtractAuxiliaryNarrData;

impl Stage for ExtractAuxiliaryNarrData {
    fn name(&self) -> &'static str {
        "extract_auxiliary_narr_data"
    }

    fn run(
        &self,
        ctx: &RunContext,
        runner: &dyn CommandRunner,
        logger: &dyn RunLogger,
    ) -> Result<(), StageError> {
        let cmd = StageCommand::new(EXTRACT_AUX_COMMAND, &ctx.work_dir)
            .arg("--xml", &ctx.metadata_file)
            .arg("--aux_path", &ctx.aux_path)
            .debug(ctx.debug);
        invoker::execute(runner, logger, &cmd)
    }
}

pub struct BuildModtranInput;

impl Stage for BuildModtranInput {
    fn name(&self) -> &'static str {
        "build_modtran_input"
    }

    fn run(
        &self,
        ctx: &RunContext,
        runner: &dyn CommandRunner,
        logger: &dyn RunLogger,
    ) -> Result<(), StageError> {
        let cmd = StageCommand::new(BUILD_MODTRAN_INPUT_COMMAND, &ctx.work_dir)
            .arg("--xml", &ctx.metadata_file)
            .arg("--data_path", &ctx.data_path)
            .debug(ctx.debug);
        invoker::execute(runner, logger, &cmd)
    }
}

pub struct GenerateEmissivityProducts;

impl Stage for GenerateEmissivityProducts {
    fn name(&self) -> &'static str {
        "generate_emissivity_products"
    }

    fn run(
        &self,
        ctx: &RunContext,
        runner: &dyn CommandRunner,
        logger: &dyn RunLogger,
    ) -> Result<(), StageError> {
        let cmd = StageCommand::new(EMISSIVITY_COMMAND, &ctx.work_dir)
            .arg("--xml", &ctx.metadata_file)
            .arg("--aster-ged-server-name", &ctx.server_name)
            .arg("--aster-ged-server-path", &ctx.server_path)
            .debug(ctx.debug);
        invoker::execute(runner, logger, &cmd)
    }
}

pub struct RunModtran;

impl Stage for RunModtran {
    fn name(&self) -> &'static str {
        "run_modtran"
    }

    fn run(
        &self,
        ctx: &RunContext,
        runner: &dyn CommandRunner,
        logger: &dyn RunLogger,
    ) -> Result<(), StageError> {
        let cmd = StageCommand::new(RUN_MODTRAN_COMMAND, &ctx.work_dir)
            .arg("--modtran_data_path", &ctx.modtran_data_path)
            .arg("--process_count", &ctx.process_count)
            .debug(ctx.debug);
        invoker::execute(runner, logger, &cmd)
    }
}

pub struct AtmosphericParameters;

impl Stage for AtmosphericParameters {
    fn name(&self) -> &'static str {
        "atmospheric_parameters"
    }

    fn run(
        &self,
        ctx: &RunContext,
        runner: &dyn CommandRunner,
        logger: &dyn RunLogger,
    ) -> Result<(), StageError> {
        let cmd = StageCommand::new(ATMOSPHERIC_PARAMETERS_COMMAND, &ctx.work_dir)
            .arg("--xml", &ctx.metadata_file)
            .debug(ctx.debug);
        match invoker::execute(runner, logger, &cmd) {
            Ok(()) => Ok(()),
            Err(err) => {
                logger.error(
                    "Failed creating atmospheric parameters and generating intermediate data",
                );
                Err(err)
            }
        }
    }
}

/// Final LST band synthesis. Runs in-process; any failure is logged with
/// a stage-specific message and re-raised with its source intact.
pub struct SynthesizeLstBand {
    builder: Box<dyn BandSynthesizer>,
}

impl SynthesizeLstBand {
    pub fn new(builder: Box<dyn BandSynthesizer>) -> Self {
        Self { builder }
    }
}

impl Stage for SynthesizeLstBand {
    fn name(&self) -> &'static str {
        "synthesize_lst_band"
    }

    fn run(
        &self,
        ctx: &RunContext,
        _runner: &dyn CommandRunner,
        logger: &dyn RunLogger,
    ) -> Result<(), StageError> {
        self.builder.generate(ctx).map_err(|err| {
            logger.error("Failed processing Land Surface Temperature");
            StageError::Synthesis(err)
        })
    }
}
