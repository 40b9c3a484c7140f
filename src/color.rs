use palette::{Hsl, IntoColor, Srgb};

use crate::data::ScoreMap;

// ---------------------------------------------------------------------------
// Score colour ramp: matched-filter score → RGB
// ---------------------------------------------------------------------------

/// Hue at the weakest score (blue); the strongest score maps to hue 0 (red).
const COLD_HUE: f32 = 240.0;

/// Min–max scaled colour ramp over the finite values of a score map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRamp {
    pub min: f64,
    pub max: f64,
}

impl ScoreRamp {
    pub fn from_scores(scores: &ScoreMap) -> Self {
        let (min, max) = scores
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            // No finite values at all.
            return Self { min: 0.0, max: 0.0 };
        }
        Self { min, max }
    }

    /// Position of `value` on the ramp in `[0, 1]`; a flat map sits at 0.
    pub fn normalise(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if !value.is_finite() || range.abs() < f64::EPSILON {
            return 0.0;
        }
        ((value - self.min) / range).clamp(0.0, 1.0)
    }

    pub fn color_for(&self, value: f64) -> [u8; 3] {
        let t = self.normalise(value) as f32;
        let hsl = Hsl::new(COLD_HUE * (1.0 - t), 0.85, 0.25 + 0.3 * t);
        let rgb: Srgb = hsl.into_color();
        [
            (rgb.red * 255.0) as u8,
            (rgb.green * 255.0) as u8,
            (rgb.blue * 255.0) as u8,
        ]
    }

    /// Row-major packed RGB bytes for the whole map.
    pub fn rgb_bytes(&self, scores: &ScoreMap) -> Vec<u8> {
        scores.iter().flat_map(|&v| self.color_for(v)).collect()
    }
}
