use std::collections::BTreeMap;

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2};
use serde::Serialize;

use crate::error::{DetectionError, Result};

// ---------------------------------------------------------------------------
// HyperspectralCube – band × row × col radiance samples
// ---------------------------------------------------------------------------

/// A fully materialised hyperspectral image.
///
/// Samples are held as a `bands × pixels` matrix with pixels flattened
/// row-major (`pixel = row * cols + col`), which is the layout every
/// statistic in [`crate::detection`] works on.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperspectralCube {
    samples: Array2<f64>,
    rows: usize,
    cols: usize,
}

impl HyperspectralCube {
    /// Build a cube from a `(band, row, col)` array.
    pub fn new(data: Array3<f64>) -> Result<Self> {
        let (bands, rows, cols) = data.dim();
        // `iter()` walks in logical order regardless of memory layout.
        Self::from_shape_vec(bands, rows, cols, data.iter().copied().collect())
    }

    /// Build a cube from band-major values (`[band][row][col]` flattened).
    pub fn from_shape_vec(bands: usize, rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        if bands == 0 || rows == 0 || cols == 0 {
            return Err(DetectionError::EmptyCube);
        }
        let found = values.len();
        let samples = Array2::from_shape_vec((bands, rows * cols), values).map_err(|_| {
            DetectionError::DimensionMismatch {
                what: "cube sample count",
                expected: vec![bands * rows * cols],
                found: vec![found],
            }
        })?;
        Ok(Self { samples, rows, cols })
    }

    pub fn bands(&self) -> usize {
        self.samples.nrows()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Spatial extent as `(rows, cols)`.
    pub fn spatial_shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn pixel_count(&self) -> usize {
        self.samples.ncols()
    }

    /// The `bands × pixels` sample matrix.
    pub fn band_matrix(&self) -> ArrayView2<'_, f64> {
        self.samples.view()
    }

    /// Spectrum of a single pixel, or `None` when out of bounds.
    pub fn pixel(&self, row: usize, col: usize) -> Option<ArrayView1<'_, f64>> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.samples.column(row * self.cols + col))
    }
}

// ---------------------------------------------------------------------------
// SpectralSignature – one material's per-band response
// ---------------------------------------------------------------------------

/// A named per-band spectrum in the same physical units as the cube.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralSignature {
    pub name: String,
    pub values: Array1<f64>,
}

impl SpectralSignature {
    pub fn new(name: impl Into<String>, values: Array1<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SpectralLibrary – named reference spectra (usually reflectance)
// ---------------------------------------------------------------------------

/// Ground-measured spectra keyed by material name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralLibrary {
    entries: BTreeMap<String, Array1<f64>>,
}

impl SpectralLibrary {
    pub fn insert(&mut self, name: impl Into<String>, values: Array1<f64>) {
        self.entries.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&Array1<f64>> {
        self.entries.get(name)
    }

    /// Owned signature for `name`, if present.
    pub fn signature(&self, name: &str) -> Option<SpectralSignature> {
        self.entries
            .get(name)
            .map(|values| SpectralSignature::new(name, values.clone()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// GroundTruthMask – binary target presence per pixel
// ---------------------------------------------------------------------------

/// `true` where the target is physically present.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruthMask {
    cells: Array2<bool>,
}

impl GroundTruthMask {
    pub fn new(cells: Array2<bool>) -> Self {
        Self { cells }
    }

    /// Accept a numeric mask holding only `0` and `1`.
    pub fn from_values(values: &Array2<f64>) -> Result<Self> {
        for ((row, col), &value) in values.indexed_iter() {
            if value != 0.0 && value != 1.0 {
                return Err(DetectionError::InvalidMaskValue { row, col, value });
            }
        }
        Ok(Self {
            cells: values.mapv(|v| v == 1.0),
        })
    }

    pub fn cells(&self) -> &Array2<bool> {
        &self.cells
    }

    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// Number of target-present pixels.
    pub fn positives(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Number of target-absent pixels.
    pub fn negatives(&self) -> usize {
        self.cells.len() - self.positives()
    }
}

// ---------------------------------------------------------------------------
// Detector output
// ---------------------------------------------------------------------------

/// Per-pixel matched-filter score, `(rows, cols)`; higher is a stronger match.
pub type ScoreMap = Array2<f64>;

/// Detection and false-alarm probabilities, index-aligned by ascending threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RocCurve {
    pub thresholds: Vec<f64>,
    pub p_detection: Vec<f64>,
    pub p_false_alarm: Vec<f64>,
}

impl RocCurve {
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// `[P_fa, P_d]` pairs for a linear-axis plot.
    pub fn linear_points(&self) -> Vec<[f64; 2]> {
        self.p_false_alarm
            .iter()
            .zip(&self.p_detection)
            .map(|(&pfa, &pd)| [pfa, pd])
            .collect()
    }

    /// `[ln P_fa, P_d]` pairs; entries with `P_fa == 0` have no logarithm and
    /// are dropped.
    pub fn semilog_points(&self) -> Vec<[f64; 2]> {
        self.p_false_alarm
            .iter()
            .zip(&self.p_detection)
            .filter(|(&pfa, _)| pfa != 0.0)
            .map(|(&pfa, &pd)| [pfa.ln(), pd])
            .collect()
    }
}
