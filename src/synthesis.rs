use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::context::RunContext;

/// Landsat 8 TIRS band 10 thermal calibration constants.
const K1: f64 = 774.8853;
const K2: f64 = 1321.0789;

/// Final pipeline step: builds the LST band from the intermediate
/// products the earlier stages left in the working directory.
pub trait BandSynthesizer {
    fn generate(&self, ctx: &RunContext) -> Result<()>;
}

/// Production synthesizer. Reads the per-scene radiance, transmittance,
/// and emissivity intermediates as raw little-endian f32 rasters,
/// corrects the thermal radiance to surface-leaving radiance, and writes
/// `<scene>_lst.img` with per-sample temperatures in Kelvin.
#[derive(Debug, Default)]
pub struct BuildLstData;

impl BandSynthesizer for BuildLstData {
    fn generate(&self, ctx: &RunContext) -> Result<()> {
        let scene = ctx.scene_id();
        let inputs = [
            ("thermal radiance", band_path(ctx, scene, "lst_thermal_radiance")),
            ("upwelled radiance", band_path(ctx, scene, "lst_upwelled_radiance")),
            ("downwelled radiance", band_path(ctx, scene, "lst_downwelled_radiance")),
            ("atmospheric transmittance", band_path(ctx, scene, "lst_atmospheric_transmittance")),
            ("landsat emissivity", band_path(ctx, scene, "landsat_emis")),
        ];

        let missing: Vec<&str> = inputs
            .iter()
            .filter(|(_, path)| !path.is_file())
            .map(|(label, _)| *label)
            .collect();
        if !missing.is_empty() {
            bail!("Missing intermediate products: {}", missing.join(", "));
        }

        let thermal = read_band(&inputs[0].1)?;
        let upwelled = read_band(&inputs[1].1)?;
        let downwelled = read_band(&inputs[2].1)?;
        let transmittance = read_band(&inputs[3].1)?;
        let emissivity = read_band(&inputs[4].1)?;

        let sample_count = thermal.len();
        for (label, band) in [
            ("upwelled radiance", &upwelled),
            ("downwelled radiance", &downwelled),
            ("atmospheric transmittance", &transmittance),
            ("landsat emissivity", &emissivity),
        ] {
            if band.len() != sample_count {
                bail!(
                    "Intermediate band size mismatch: {label} has {} samples, expected {}",
                    band.len(),
                    sample_count
                );
            }
        }

        let mut temperatures = Vec::with_capacity(sample_count);
        for index in 0..sample_count {
            temperatures.push(surface_temperature(
                thermal[index] as f64,
                upwelled[index] as f64,
                downwelled[index] as f64,
                transmittance[index] as f64,
                emissivity[index] as f64,
            )?);
        }

        let output = ctx.work_dir.join(format!("{scene}_lst.img"));
        write_band(&output, &temperatures)?;
        Ok(())
    }
}

fn band_path(ctx: &RunContext, scene: &str, suffix: &str) -> PathBuf {
    ctx.work_dir.join(format!("{scene}_{suffix}.img"))
}

/// Surface temperature in Kelvin from at-sensor thermal radiance.
fn surface_temperature(
    thermal: f64,
    upwelled: f64,
    downwelled: f64,
    transmittance: f64,
    emissivity: f64,
) -> Result<f32> {
    if transmittance <= 0.0 {
        bail!("Non-positive atmospheric transmittance sample [{transmittance}]");
    }
    if emissivity <= 0.0 || emissivity > 1.0 {
        bail!("Emissivity sample [{emissivity}] outside (0, 1]");
    }

    let surface_leaving = (thermal - upwelled) / transmittance;
    let emitted = surface_leaving - (1.0 - emissivity) * downwelled;
    let blackbody = emitted / emissivity;
    if blackbody <= 0.0 {
        bail!("Non-positive surface radiance [{blackbody}] derived from intermediates");
    }

    Ok((K2 / (K1 / blackbody + 1.0).ln()) as f32)
}

fn read_band(path: &Path) -> Result<Vec<f32>> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed reading band [{}]", path.display()))?;
    if bytes.len() % 4 != 0 {
        bail!(
            "Band [{}] is not a whole number of f32 samples ({} bytes)",
            path.display(),
            bytes.len()
        );
    }
    let mut samples = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        samples.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok(samples)
}

fn write_band(path: &Path, samples: &[f32]) -> Result<()> {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    fs::write(path, bytes).with_context(|| format!("Failed writing band [{}]", path.display()))
}
