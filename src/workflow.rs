//! Run configuration and the end-to-end detection workflow.
//!
//! Every input is named in a [`RunConfig`] and threaded through [`run`]
//! explicitly; nothing is cached between runs.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::calibration::{EmpiricalLine, ReferencePanel};
use crate::data::{export, loader, HyperspectralCube, RocCurve, ScoreMap, SpectralLibrary, SpectralSignature};
use crate::detection::{evaluate, BackgroundStatistics, ThresholdSweep};
use crate::error::DetectionError;

fn default_threshold_step() -> f64 {
    1.0
}

/// A detection run as read from a JSON file.
///
/// ```json
/// {
///   "cube": "scene.parquet",
///   "library": "library.json",
///   "ground_truth": "green_target.csv",
///   "target": "green",
///   "calibration": {
///     "bright": { "material": "aluminum", "row": 10, "col": 30 },
///     "dark":   { "material": "black",    "row": 10, "col": 8 }
///   },
///   "threshold_step": 1.0,
///   "roc_output": "roc.csv"
/// }
/// ```
///
/// Relative paths are resolved against the directory holding the file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub cube: PathBuf,
    pub library: PathBuf,
    pub ground_truth: PathBuf,
    /// Library entry to search for.
    pub target: String,
    /// When absent the library spectrum is assumed to be in cube units already.
    #[serde(default)]
    pub calibration: Option<CalibrationConfig>,
    #[serde(default = "default_threshold_step")]
    pub threshold_step: f64,
    #[serde(default)]
    pub roc_output: Option<PathBuf>,
    #[serde(default)]
    pub score_image: Option<PathBuf>,
}

/// Reference panels for the empirical line.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CalibrationConfig {
    pub bright: PanelLocation,
    pub dark: PanelLocation,
}

/// A library material and the zero-based pixel where it sits in the scene.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PanelLocation {
    pub material: String,
    pub row: usize,
    pub col: usize,
}

impl RunConfig {
    /// Read a config file and resolve its paths.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading run config {}", path.display()))?;
        let config: RunConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing run config {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolve_paths(base))
    }

    fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.cube);
        resolve(&mut self.library);
        resolve(&mut self.ground_truth);
        if let Some(p) = self.roc_output.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.score_image.as_mut() {
            resolve(p);
        }
        self
    }
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Target signature in cube units, as handed to the detector.
    pub target: SpectralSignature,
    pub bands: usize,
    pub scores: ScoreMap,
    pub roc: RocCurve,
}

/// Load inputs, calibrate the target, score the scene and evaluate it.
pub fn run(config: &RunConfig) -> Result<RunOutput> {
    let sweep = ThresholdSweep::new(config.threshold_step)?;

    let cube = loader::load_cube(&config.cube)?;
    let library = loader::load_library(&config.library)?;
    let truth = loader::load_mask(&config.ground_truth)?;

    let target = target_signature(config, &cube, &library)?;
    if target.len() != cube.bands() {
        return Err(DetectionError::DimensionMismatch {
            what: "signature length vs cube bands",
            expected: vec![cube.bands()],
            found: vec![target.len()],
        })
        .with_context(|| format!("target '{}'", target.name));
    }

    let stats = BackgroundStatistics::estimate(&cube).context("estimating background statistics")?;
    let scores = stats
        .score(&cube, &target)
        .with_context(|| format!("matched filter for '{}'", target.name))?;
    let roc = evaluate(&scores, &truth, &sweep).context("evaluating detection performance")?;

    log::info!(
        "Target '{}': {} thresholds, {} target / {} background pixels",
        target.name,
        roc.len(),
        truth.positives(),
        truth.negatives()
    );

    if let Some(path) = &config.roc_output {
        export::write_roc_csv(path, &roc)?;
    }
    if let Some(path) = &config.score_image {
        export::write_score_png(path, &scores)?;
    }

    Ok(RunOutput {
        target,
        bands: cube.bands(),
        scores,
        roc,
    })
}

/// The configured target in cube units, calibrated through the empirical
/// line when reference panels are given.
fn target_signature(
    config: &RunConfig,
    cube: &HyperspectralCube,
    library: &SpectralLibrary,
) -> Result<SpectralSignature> {
    let reflectance = library.signature(&config.target).with_context(|| {
        format!(
            "target '{}' not in library (have: {})",
            config.target,
            library.names().collect::<Vec<_>>().join(", ")
        )
    })?;

    let Some(cal) = &config.calibration else {
        return Ok(reflectance);
    };

    let panel = |loc: &PanelLocation| -> Result<(ndarray::Array1<f64>, ndarray::Array1<f64>)> {
        let Some(radiance) = cube.pixel(loc.row, loc.col) else {
            bail!(
                "panel '{}' at ({}, {}) is outside the {}×{} scene",
                loc.material,
                loc.row,
                loc.col,
                cube.rows(),
                cube.cols()
            );
        };
        let reflectance = library
            .get(&loc.material)
            .with_context(|| format!("panel material '{}' not in library", loc.material))?;
        Ok((radiance.to_owned(), reflectance.clone()))
    };
    let (bright_rad, bright_refl) = panel(&cal.bright)?;
    let (dark_rad, dark_refl) = panel(&cal.dark)?;

    let line = EmpiricalLine::fit(
        ReferencePanel {
            radiance: bright_rad.view(),
            reflectance: bright_refl.view(),
        },
        ReferencePanel {
            radiance: dark_rad.view(),
            reflectance: dark_refl.view(),
        },
    )
    .context("fitting empirical line")?;
    log::debug!(
        "Empirical line from '{}' and '{}' over {} bands",
        cal.bright.material,
        cal.dark.material,
        line.bands()
    );

    Ok(line.to_radiance(&reflectance)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_and_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{"cube": "c.json", "library": "/abs/lib.json", "ground_truth": "m.csv", "target": "green"}"#,
        )
        .unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.cube, dir.path().join("c.json"));
        assert_eq!(config.library, PathBuf::from("/abs/lib.json"));
        assert_eq!(config.threshold_step, 1.0);
        assert!(config.calibration.is_none());
        assert!(config.roc_output.is_none());
    }

    #[test]
    fn signature_length_checked_before_statistics() {
        // Constant bands make the covariance singular; the length mismatch
        // must surface first.
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cube.json"), "[[[1, 1], [1, 1]], [[2, 2], [2, 2]]]").unwrap();
        std::fs::write(dir.path().join("lib.json"), r#"{"green": [0.1, 0.2, 0.3]}"#).unwrap();
        std::fs::write(dir.path().join("mask.json"), "[[0, 1], [0, 0]]").unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{"cube": "cube.json", "library": "lib.json", "ground_truth": "mask.json", "target": "green"}"#,
        )
        .unwrap();

        let err = run(&RunConfig::load(&path).unwrap()).unwrap_err();
        let cause = err.chain().find_map(|e| e.downcast_ref::<DetectionError>());
        assert!(
            matches!(
                cause,
                Some(DetectionError::DimensionMismatch { expected, found, .. })
                    if expected == &vec![2] && found == &vec![3]
            ),
            "{err:#}"
        );
    }

    #[test]
    fn unknown_config_field_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{"cube": "c.json", "library": "l.json", "ground_truth": "m.csv", "target": "g", "tresh": 2}"#,
        )
        .unwrap();
        assert!(RunConfig::load(&path).is_err());
    }
}
