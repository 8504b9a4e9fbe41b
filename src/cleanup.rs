use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glob::glob;

use crate::logging::RunLogger;

pub const GRID_POINT_HEADER_NAME: &str = "grid_points.hdr";
pub const GRID_POINT_BINARY_NAME: &str = "grid_points.bin";
pub const GRID_POINT_ELEVATION_NAME: &str = "grid_elevations.txt";
pub const MODTRAN_ELEVATION_NAME: &str = "modtran_elevations.txt";
pub const ATMOSPHERE_PARAMETERS_NAME: &str = "atmospheric_parameters.txt";
pub const USED_POINTS_NAME: &str = "used_points.txt";

const EMISSIVITY_HEADER_PATTERN: &str = "*_emis.img.aux.xml";

/// Per-scene MODTRAN run directories are named row_col_narr-row_narr-col.
const SCENE_DIRECTORY_PATTERN: &str =
    "[0-9][0-9][0-9]_[0-9][0-9][0-9]_[0-9][0-9][0-9]_[0-9][0-9][0-9]";

/// NARR parameter directories written while building MODTRAN input.
pub const MODTRAN_PARAMETER_DIRS: [&str; 3] = ["HGT", "SPFH", "TMP"];

pub const EMISSIVITY_BAND_PATTERN: &str = "*_landsat_emis.*";
pub const TRANSMITTANCE_BAND_PATTERN: &str = "*_lst_atmospheric_transmittance.*";
pub const DOWNWELLED_BAND_PATTERN: &str = "*_lst_downwelled_radiance.*";
pub const UPWELLED_BAND_PATTERN: &str = "*_lst_upwelled_radiance.*";
pub const THERMAL_BAND_PATTERN: &str = "*_lst_thermal_radiance.*";

const INTERMEDIATE_BAND_PATTERNS: [&str; 5] = [
    EMISSIVITY_BAND_PATTERN,
    TRANSMITTANCE_BAND_PATTERN,
    DOWNWELLED_BAND_PATTERN,
    UPWELLED_BAND_PATTERN,
    THERMAL_BAND_PATTERN,
];

/// User-selected retention. A set flag means the matching sweep is
/// skipped and its artifacts are left in place for inspection.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetentionFlags {
    pub keep_temporary: bool,
    pub keep_intermediate: bool,
}

/// Applies the retention policy to a successful run's working directory.
/// Must only be called once the pipeline has reached its succeeded state;
/// a failed run keeps everything for post-mortem inspection.
pub fn apply(work_dir: &Path, flags: RetentionFlags, logger: &dyn RunLogger) -> Result<()> {
    if flags.keep_temporary {
        logger.info("Keeping temporary data");
    } else {
        cleanup_temporary_data(work_dir)?;
    }

    if flags.keep_intermediate {
        logger.info("Keeping intermediate band products");
    } else {
        cleanup_intermediate_bands(work_dir)?;
    }

    Ok(())
}

/// Removes the temporary grid/elevation/atmosphere files, emissivity
/// header droppings, and the per-scene and NARR parameter directories.
/// Absent entries are skipped, so repeated sweeps are no-ops.
pub fn cleanup_temporary_data(work_dir: &Path) -> Result<()> {
    let file_names = [
        GRID_POINT_HEADER_NAME,
        GRID_POINT_BINARY_NAME,
        GRID_POINT_ELEVATION_NAME,
        MODTRAN_ELEVATION_NAME,
        ATMOSPHERE_PARAMETERS_NAME,
        USED_POINTS_NAME,
    ];
    for name in file_names {
        let path = work_dir.join(name);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed removing [{}]", path.display()))?;
        }
    }

    for path in matches_in(work_dir, EMISSIVITY_HEADER_PATTERN)? {
        fs::remove_file(&path).with_context(|| format!("Failed removing [{}]", path.display()))?;
    }

    for path in matches_in(work_dir, SCENE_DIRECTORY_PATTERN)? {
        if path.is_dir() {
            fs::remove_dir_all(&path)
                .with_context(|| format!("Failed removing [{}]", path.display()))?;
        }
    }

    for name in MODTRAN_PARAMETER_DIRS {
        let path = work_dir.join(name);
        if path.exists() {
            fs::remove_dir_all(&path)
                .with_context(|| format!("Failed removing [{}]", path.display()))?;
        }
    }

    Ok(())
}

/// Removes the per-band intermediates used to build the final LST band.
pub fn cleanup_intermediate_bands(work_dir: &Path) -> Result<()> {
    for pattern in INTERMEDIATE_BAND_PATTERNS {
        for path in matches_in(work_dir, pattern)? {
            if path.is_file() {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed removing [{}]", path.display()))?;
            }
        }
    }
    Ok(())
}

fn matches_in(work_dir: &Path, pattern: &str) -> Result<Vec<std::path::PathBuf>> {
    // The directory prefix may itself contain glob metacharacters.
    let prefix = glob::Pattern::escape(&work_dir.to_string_lossy());
    let full = format!("{prefix}/{pattern}");
    let mut paths = Vec::new();
    for entry in glob(&full).with_context(|| format!("Invalid cleanup pattern: {full}"))? {
        paths.push(entry.with_context(|| format!("Failed expanding cleanup pattern: {full}"))?);
    }
    Ok(paths)
}
