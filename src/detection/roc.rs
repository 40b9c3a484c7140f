use super::MAX_THRESHOLDS;
use crate::data::{GroundTruthMask, RocCurve, ScoreMap};
use crate::error::{DetectionError, Result};

/// Largest `|k|` for which `k as f64` is exact.
const MAX_EXACT_K: f64 = 9_007_199_254_740_992.0;

// ---------------------------------------------------------------------------
// Threshold sweep policy
// ---------------------------------------------------------------------------

/// Spacing of the thresholds swept over a score map.
///
/// Thresholds are `k · step` for every integer `k` from
/// `floor(min / step)` to `ceil(max / step)` inclusive, so the default unit
/// step gives one threshold per integer spanning `floor(min)..=ceil(max)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSweep {
    step: f64,
}

impl Default for ThresholdSweep {
    fn default() -> Self {
        Self { step: 1.0 }
    }
}

impl ThresholdSweep {
    pub fn new(step: f64) -> Result<Self> {
        if !(step.is_finite() && step > 0.0) {
            return Err(DetectionError::InvalidStep(step));
        }
        Ok(Self { step })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Ascending thresholds covering `[min, max]`: the first is `<= min` and
    /// the last is `>= max`, even when `k · step` rounds across either end.
    ///
    /// Fails with [`DetectionError::SweepTooLarge`] rather than allocating
    /// more than [`MAX_THRESHOLDS`] values.
    pub fn thresholds(&self, min: f64, max: f64) -> Result<Vec<f64>> {
        let step = self.step;
        let lo_k = (min / step).floor();
        let hi_k = (max / step).ceil();
        // Two extra slots for the rounding nudges below.
        let count = hi_k - lo_k + 3.0;
        if !(count <= MAX_THRESHOLDS as f64) || lo_k.abs().max(hi_k.abs()) > MAX_EXACT_K {
            return Err(DetectionError::SweepTooLarge {
                min,
                max,
                step,
                limit: MAX_THRESHOLDS,
            });
        }

        let mut lo = lo_k as i64;
        let mut hi = hi_k as i64;
        while lo as f64 * step > min {
            lo -= 1;
        }
        while (hi as f64) * step < max {
            hi += 1;
        }
        Ok((lo..=hi).map(|k| k as f64 * step).collect())
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Detection and false-alarm probabilities of `scores` against `truth` at
/// every threshold of `sweep`.
///
/// A pixel counts as detected at threshold `t` only when its score is
/// strictly greater than `t`. `P_d` is normalised by the number of target
/// pixels and `P_fa` by the number of background pixels.
pub fn evaluate(scores: &ScoreMap, truth: &GroundTruthMask, sweep: &ThresholdSweep) -> Result<RocCurve> {
    if scores.dim() != truth.shape() {
        let (sr, sc) = scores.dim();
        let (tr, tc) = truth.shape();
        return Err(DetectionError::DimensionMismatch {
            what: "ground truth shape vs score map",
            expected: vec![sr, sc],
            found: vec![tr, tc],
        });
    }

    let positives = truth.positives();
    let negatives = truth.negatives();
    if positives == 0 || negatives == 0 {
        return Err(DetectionError::DegenerateGroundTruth { positives, negatives });
    }

    let mut target = Vec::with_capacity(positives);
    let mut background = Vec::with_capacity(negatives);
    for (((row, col), &score), &present) in scores.indexed_iter().zip(truth.cells().iter()) {
        if !score.is_finite() {
            return Err(DetectionError::NonFiniteScore { row, col });
        }
        if present {
            target.push(score);
        } else {
            background.push(score);
        }
    }
    target.sort_by(f64::total_cmp);
    background.sort_by(f64::total_cmp);

    let min = target[0].min(background[0]);
    let max = target[positives - 1].max(background[negatives - 1]);
    let thresholds = sweep.thresholds(min, max)?;

    let p_detection = thresholds
        .iter()
        .map(|&t| count_above(&target, t) as f64 / positives as f64)
        .collect();
    let p_false_alarm = thresholds
        .iter()
        .map(|&t| count_above(&background, t) as f64 / negatives as f64)
        .collect();

    log::debug!(
        "ROC over {} thresholds ({positives} target / {negatives} background pixels)",
        thresholds.len()
    );

    Ok(RocCurve {
        thresholds,
        p_detection,
        p_false_alarm,
    })
}

/// Unit-step evaluation: one threshold per integer in `floor(min)..=ceil(max)`.
pub fn calc_prob_detection_false_alarm(scores: &ScoreMap, truth: &GroundTruthMask) -> Result<RocCurve> {
    evaluate(scores, truth, &ThresholdSweep::default())
}

/// Number of values strictly above `t` in an ascending slice.
fn count_above(sorted: &[f64], t: f64) -> usize {
    sorted.len() - sorted.partition_point(|&s| s <= t)
}
