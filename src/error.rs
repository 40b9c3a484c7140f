use thiserror::Error;

/// Failures raised by the detection and evaluation core.
///
/// Every variant describes a violated mathematical precondition, so none of
/// them are retried; the caller decides whether to regularise, re-select
/// inputs or give up.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("{what}: expected shape {expected:?}, found {found:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("hyperspectral cube has no bands or no pixels")]
    EmptyCube,

    /// Background covariance could not be factorised, or its reciprocal
    /// condition estimate is below [`crate::detection::MIN_RCOND`].
    #[error("background covariance is singular or ill-conditioned (rcond ~ {rcond:e})")]
    SingularCovariance { rcond: f64 },

    #[error(
        "ground truth needs both target and background pixels \
         (found {positives} target, {negatives} background)"
    )]
    DegenerateGroundTruth { positives: usize, negatives: usize },

    #[error("score map holds a non-finite value at ({row}, {col})")]
    NonFiniteScore { row: usize, col: usize },

    #[error("threshold step must be positive and finite, got {0}")]
    InvalidStep(f64),

    /// Sweeping `[min, max]` at `step` would need more than
    /// [`crate::detection::MAX_THRESHOLDS`] thresholds.
    #[error("sweeping [{min:e}, {max:e}] at step {step:e} needs more than {limit} thresholds")]
    SweepTooLarge {
        min: f64,
        max: f64,
        step: f64,
        limit: usize,
    },

    #[error("ground truth value at ({row}, {col}) is {value}, expected 0 or 1")]
    InvalidMaskValue { row: usize, col: usize, value: f64 },

    /// Bright and dark reference panels share a reflectance in this band, so
    /// the empirical line has no slope.
    #[error("calibration panels have equal reflectance in band {band}")]
    DegenerateCalibration { band: usize },
}

pub type Result<T> = std::result::Result<T, DetectionError>;
