//! Target detection and detector evaluation.
//!
//! ```text
//!  HyperspectralCube + SpectralSignature
//!        │
//!        ▼
//!   ┌────────────────┐
//!   │ matched_filter │  whole-scene μ, Σ → (s − μ)ᵗ Σ⁻¹ (x − μ) per pixel
//!   └────────────────┘
//!        │ ScoreMap
//!        ▼
//!   ┌────────────────┐
//!   │      roc       │  + GroundTruthMask → P_d / P_fa per threshold
//!   └────────────────┘
//! ```

pub mod matched_filter;
pub mod roc;

pub use matched_filter::{matched_filter, BackgroundStatistics};
pub use roc::{calc_prob_detection_false_alarm, evaluate, ThresholdSweep};

/// Smallest reciprocal condition estimate of the background covariance that
/// is still whitened; below it the covariance is reported as singular.
pub const MIN_RCOND: f64 = 1e-12;

/// Largest number of thresholds a single ROC sweep may produce.
pub const MAX_THRESHOLDS: usize = 1_000_000;
