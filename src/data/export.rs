use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::model::{RocCurve, ScoreMap};
use crate::color::ScoreRamp;

#[derive(Serialize)]
struct RocRow {
    threshold: f64,
    p_detection: f64,
    p_false_alarm: f64,
}

/// Write a ROC curve as `threshold,p_detection,p_false_alarm` rows.
pub fn write_roc_csv(path: &Path, roc: &RocCurve) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    for ((&threshold, &p_detection), &p_false_alarm) in roc
        .thresholds
        .iter()
        .zip(&roc.p_detection)
        .zip(&roc.p_false_alarm)
    {
        writer.serialize(RocRow {
            threshold,
            p_detection,
            p_false_alarm,
        })?;
    }
    writer.flush().context("flushing ROC csv")?;

    log::info!("Wrote {} ROC points to {}", roc.len(), path.display());
    Ok(())
}

/// Render a score map through [`ScoreRamp`] and save it (format from extension).
pub fn write_score_png(path: &Path, scores: &ScoreMap) -> Result<()> {
    let (rows, cols) = scores.dim();
    let bytes = ScoreRamp::from_scores(scores).rgb_bytes(scores);
    let img = image::RgbImage::from_raw(cols as u32, rows as u32, bytes)
        .context("score map does not fit an RGB buffer")?;
    img.save(path)
        .with_context(|| format!("saving score image {}", path.display()))?;

    log::info!("Wrote {cols}×{rows} score image to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn roc_csv_has_one_row_per_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roc.csv");
        let roc = RocCurve {
            thresholds: vec![-1.0, 0.0, 1.0],
            p_detection: vec![1.0, 1.0, 0.0],
            p_false_alarm: vec![1.0, 0.5, 0.0],
        };
        write_roc_csv(&path, &roc).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, ["threshold", "p_detection", "p_false_alarm"]);

        let rows: Vec<Vec<f64>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(|f| f.parse().unwrap()).collect())
            .collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn score_png_matches_spatial_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.png");
        write_score_png(&path, &array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
    }
}
