//! Spectral matched filter target detection for hyperspectral imagery.
//!
//! A scene is a [`HyperspectralCube`] of `bands × rows × cols` radiance
//! samples. Given a target [`SpectralSignature`] in the same units, the
//! [`matched_filter`] whitens every pixel against whole-scene background
//! statistics and projects it onto the whitened target direction:
//!
//! ```text
//! score(x) = (s − μ)ᵗ · Σ⁻¹ · (x − μ)
//! ```
//!
//! The resulting [`ScoreMap`] is scored against a binary
//! [`GroundTruthMask`] by sweeping thresholds, giving a [`RocCurve`] of
//! detection and false-alarm probabilities.
//!
//! Reflectance library spectra are brought into radiance units with the
//! empirical line method in [`calibration`]; [`workflow`] ties loading,
//! calibration, detection and evaluation together from a JSON run config.

pub mod calibration;
pub mod color;
pub mod data;
pub mod detection;
pub mod error;
pub mod workflow;

pub use data::{GroundTruthMask, HyperspectralCube, RocCurve, ScoreMap, SpectralLibrary, SpectralSignature};
pub use detection::{
    calc_prob_detection_false_alarm, evaluate, matched_filter, BackgroundStatistics, ThresholdSweep,
};
pub use error::{DetectionError, Result};
