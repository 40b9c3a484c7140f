//! Empirical line method (ELM): a per-band linear map from reflectance to
//! radiance, fitted from one bright and one dark reference panel whose
//! radiance is read from the scene and whose reflectance was measured on
//! the ground.

use ndarray::{Array1, ArrayView1, Zip};

use crate::data::SpectralSignature;
use crate::error::{DetectionError, Result};

/// Radiance and reflectance of one reference panel.
#[derive(Debug, Clone, Copy)]
pub struct ReferencePanel<'a> {
    pub radiance: ArrayView1<'a, f64>,
    pub reflectance: ArrayView1<'a, f64>,
}

/// `radiance = gain · reflectance + offset`, per band.
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalLine {
    pub gain: Array1<f64>,
    pub offset: Array1<f64>,
}

impl EmpiricalLine {
    /// Fit the line through the bright and dark panels in every band.
    pub fn fit(bright: ReferencePanel<'_>, dark: ReferencePanel<'_>) -> Result<Self> {
        let bands = bright.radiance.len();
        for (what, len) in [
            ("bright panel reflectance", bright.reflectance.len()),
            ("dark panel radiance", dark.radiance.len()),
            ("dark panel reflectance", dark.reflectance.len()),
        ] {
            if len != bands {
                return Err(DetectionError::DimensionMismatch {
                    what,
                    expected: vec![bands],
                    found: vec![len],
                });
            }
        }

        if let Some(band) = bright
            .reflectance
            .iter()
            .zip(dark.reflectance.iter())
            .position(|(&p1, &p2)| (p2 - p1).abs() < f64::EPSILON)
        {
            return Err(DetectionError::DegenerateCalibration { band });
        }

        let mut gain = Array1::zeros(bands);
        let mut offset = Array1::zeros(bands);
        Zip::from(&mut gain)
            .and(&mut offset)
            .and(bright.radiance)
            .and(bright.reflectance)
            .and(dark.radiance)
            .and(dark.reflectance)
            .for_each(|a, b, &l1, &p1, &l2, &p2| {
                let dp = p2 - p1;
                *a = (l2 - l1) / dp;
                *b = (l1 * p2 - l2 * p1) / dp;
            });

        Ok(Self { gain, offset })
    }

    pub fn bands(&self) -> usize {
        self.gain.len()
    }

    /// Convert a reflectance spectrum into the radiance units of the scene.
    pub fn to_radiance(&self, reflectance: &SpectralSignature) -> Result<SpectralSignature> {
        if reflectance.len() != self.bands() {
            return Err(DetectionError::DimensionMismatch {
                what: "reflectance length vs calibration bands",
                expected: vec![self.bands()],
                found: vec![reflectance.len()],
            });
        }
        let radiance = &self.gain * &reflectance.values + &self.offset;
        Ok(SpectralSignature::new(reflectance.name.clone(), radiance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn panels() -> (Array1<f64>, Array1<f64>, Array1<f64>, Array1<f64>) {
        // radiance = [10, 20] · ρ + [1, 2]
        let bright_refl = array![0.9, 0.8];
        let dark_refl = array![0.05, 0.1];
        let bright_rad = array![10.0 * 0.9 + 1.0, 20.0 * 0.8 + 2.0];
        let dark_rad = array![10.0 * 0.05 + 1.0, 20.0 * 0.1 + 2.0];
        (bright_rad, bright_refl, dark_rad, dark_refl)
    }

    #[test]
    fn recovers_linear_sensor_model() {
        let (l1, p1, l2, p2) = panels();
        let line = EmpiricalLine::fit(
            ReferencePanel { radiance: l1.view(), reflectance: p1.view() },
            ReferencePanel { radiance: l2.view(), reflectance: p2.view() },
        )
        .unwrap();

        assert_relative_eq!(line.gain, array![10.0, 20.0], epsilon = 1e-9);
        assert_relative_eq!(line.offset, array![1.0, 2.0], epsilon = 1e-9);

        let green = SpectralSignature::new("green", array![0.3, 0.6]);
        let radiance = line.to_radiance(&green).unwrap();
        assert_eq!(radiance.name, "green");
        assert_relative_eq!(radiance.values, array![4.0, 14.0], epsilon = 1e-9);
    }

    #[test]
    fn panels_map_onto_themselves() {
        let (l1, p1, l2, p2) = panels();
        let line = EmpiricalLine::fit(
            ReferencePanel { radiance: l1.view(), reflectance: p1.view() },
            ReferencePanel { radiance: l2.view(), reflectance: p2.view() },
        )
        .unwrap();
        let bright = line.to_radiance(&SpectralSignature::new("bright", p1.clone())).unwrap();
        assert_relative_eq!(bright.values, l1, epsilon = 1e-9);
    }

    #[test]
    fn equal_reflectance_is_degenerate() {
        let rad = array![1.0, 2.0, 3.0];
        let bright = array![0.9, 0.5, 0.9];
        let dark = array![0.1, 0.5, 0.1];
        let err = EmpiricalLine::fit(
            ReferencePanel { radiance: rad.view(), reflectance: bright.view() },
            ReferencePanel { radiance: rad.view(), reflectance: dark.view() },
        )
        .unwrap_err();
        assert_eq!(err, DetectionError::DegenerateCalibration { band: 1 });
    }

    #[test]
    fn length_mismatch() {
        let rad = array![1.0, 2.0];
        let short = array![0.5];
        let err = EmpiricalLine::fit(
            ReferencePanel { radiance: rad.view(), reflectance: short.view() },
            ReferencePanel { radiance: rad.view(), reflectance: rad.view() },
        )
        .unwrap_err();
        assert!(matches!(err, DetectionError::DimensionMismatch { .. }));
    }
}
