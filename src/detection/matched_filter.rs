use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use ndarray::{Array1, Array2, Axis};

use super::MIN_RCOND;
use crate::data::{HyperspectralCube, ScoreMap, SpectralSignature};
use crate::error::{DetectionError, Result};

// ---------------------------------------------------------------------------
// Background statistics: whole-scene mean and covariance
// ---------------------------------------------------------------------------

/// Global background model of a scene: per-band mean `μ`, covariance
/// `Σ = (1/N)·W·Wᵗ` of the mean-subtracted samples `W`, and the Cholesky
/// factor of `Σ` used for whitening.
///
/// Estimating once and scoring several signatures against the same
/// statistics gives the same maps as calling [`matched_filter`] per target.
#[derive(Debug, Clone)]
pub struct BackgroundStatistics {
    mean: Array1<f64>,
    covariance: Array2<f64>,
    factor: Cholesky<f64, Dyn>,
    rcond: f64,
}

impl BackgroundStatistics {
    /// Estimate statistics over every pixel of `cube`.
    ///
    /// Fails with [`DetectionError::SingularCovariance`] when `Σ` is not
    /// positive definite or its reciprocal condition estimate is below
    /// [`MIN_RCOND`]; this happens when bands are linearly dependent or there
    /// are fewer pixels than bands.
    pub fn estimate(cube: &HyperspectralCube) -> Result<Self> {
        let samples = cube.band_matrix();
        let bands = cube.bands();
        let n = cube.pixel_count();

        let mean = samples.mean_axis(Axis(1)).ok_or(DetectionError::EmptyCube)?;
        let centred = &samples - &mean.view().insert_axis(Axis(1));
        let covariance = centred.dot(&centred.t()) / n as f64;

        if covariance.iter().any(|v| !v.is_finite()) {
            return Err(DetectionError::SingularCovariance { rcond: f64::NAN });
        }

        let sigma = DMatrix::from_fn(bands, bands, |i, j| covariance[[i, j]]);
        let factor = Cholesky::new(sigma).ok_or(DetectionError::SingularCovariance { rcond: 0.0 })?;

        // cond(Σ) ≈ (max Lᵢᵢ / min Lᵢᵢ)² for the Cholesky factor L.
        let diag = factor.l_dirty().diagonal();
        let (lo, hi) = diag
            .iter()
            .fold((f64::INFINITY, 0.0f64), |(lo, hi), &d| (lo.min(d), hi.max(d)));
        let rcond = if hi > 0.0 { (lo / hi).powi(2) } else { 0.0 };
        if rcond.is_nan() || rcond < MIN_RCOND {
            return Err(DetectionError::SingularCovariance { rcond });
        }

        log::debug!(
            "Background statistics: {bands} bands over {n} pixels, rcond ~ {rcond:.3e}"
        );

        Ok(Self {
            mean,
            covariance,
            factor,
            rcond,
        })
    }

    pub fn bands(&self) -> usize {
        self.mean.len()
    }

    /// Per-band mean over all pixels.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// `bands × bands` background covariance.
    pub fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    /// Reciprocal condition estimate of the covariance, in `(0, 1]`.
    pub fn rcond(&self) -> f64 {
        self.rcond
    }

    /// Whitened target direction `Σ⁻¹·(s − μ)`, computed by solving against
    /// the Cholesky factor rather than forming the inverse.
    pub fn whitened_target(&self, signature: &SpectralSignature) -> Result<Array1<f64>> {
        if signature.len() != self.bands() {
            return Err(DetectionError::DimensionMismatch {
                what: "signature length vs cube bands",
                expected: vec![self.bands()],
                found: vec![signature.len()],
            });
        }

        let d = &signature.values - &self.mean;
        let w = self.factor.solve(&DVector::from_iterator(d.len(), d.iter().copied()));
        Ok(w.iter().copied().collect())
    }

    /// Matched-filter score of every pixel of `cube` against `signature`:
    /// `score[i] = (s − μ)ᵗ · Σ⁻¹ · (x[i] − μ)`.
    ///
    /// `cube` is only borrowed; centring happens on a private copy.
    pub fn score(&self, cube: &HyperspectralCube, signature: &SpectralSignature) -> Result<ScoreMap> {
        if cube.bands() != self.bands() {
            return Err(DetectionError::DimensionMismatch {
                what: "cube bands vs background statistics",
                expected: vec![self.bands()],
                found: vec![cube.bands()],
            });
        }
        let target = self.whitened_target(signature)?;

        let centred = &cube.band_matrix() - &self.mean.view().insert_axis(Axis(1));
        let scores = target.dot(&centred);

        let (rows, cols) = cube.spatial_shape();
        let map = scores
            .into_shape_with_order((rows, cols))
            .map_err(|_| DetectionError::DimensionMismatch {
                what: "score count vs cube pixels",
                expected: vec![rows * cols],
                found: vec![cube.pixel_count()],
            })?;

        log_score_range(&signature.name, &map);
        Ok(map)
    }
}

fn log_score_range(name: &str, map: &ScoreMap) {
    let (lo, hi) = map
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    log::info!("Matched filter '{name}': scores in [{lo:.3}, {hi:.3}]");
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Spectral matched filter of `signature` over `cube` using whole-scene
/// background statistics. Output is `(rows, cols)`, aligned with the cube.
pub fn matched_filter(cube: &HyperspectralCube, signature: &SpectralSignature) -> Result<ScoreMap> {
    if signature.len() != cube.bands() {
        return Err(DetectionError::DimensionMismatch {
            what: "signature length vs cube bands",
            expected: vec![cube.bands()],
            found: vec![signature.len()],
        });
    }
    BackgroundStatistics::estimate(cube)?.score(cube, signature)
}
