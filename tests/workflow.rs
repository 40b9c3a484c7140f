use std::path::Path;

use rusty_smf::workflow::{self, RunConfig};

const BANDS: usize = 8;
const SIZE: usize = 20;
const GREEN: [usize; 4] = [5, 9, 5, 9];
const BLACK: [usize; 4] = [14, 17, 2, 5];
const ALUMINUM: [usize; 4] = [14, 17, 14, 17];

fn inside(row: usize, col: usize, [r0, r1, c0, c1]: [usize; 4]) -> bool {
    (r0..r1).contains(&row) && (c0..c1).contains(&col)
}

/// Deterministic value in [0, 1).
fn hash01(i: usize) -> f64 {
    ((i as f64 * 12.9898).sin() * 43758.5453).fract().abs()
}

fn reflectance(material: &str, b: usize) -> f64 {
    let x = b as f64 / (BANDS - 1) as f64;
    match material {
        "grass" => 0.05 + 0.5 * x * x,
        "soil" => 0.15 + 0.15 * x,
        "green" => 0.05 + 0.3 * (-(x - 0.3).powi(2) / 0.02).exp(),
        "black" => 0.04,
        "aluminum" => 0.85,
        _ => 0.0,
    }
}

fn radiance(rho: f64, b: usize) -> f64 {
    (80.0 + 10.0 * b as f64) * rho + 3.0
}

/// Writes a small panel scene and returns the config path.
fn write_scene(dir: &Path, cube_name: &str) -> std::path::PathBuf {
    let mut cube = vec![vec![vec![0.0; SIZE]; SIZE]; BANDS];
    let mut mask = vec![vec![0u8; SIZE]; SIZE];

    for row in 0..SIZE {
        for col in 0..SIZE {
            let p = row * SIZE + col;
            let soil = 0.4 * hash01(p + 1);
            for b in 0..BANDS {
                let rho = if inside(row, col, GREEN) {
                    reflectance("green", b)
                } else if inside(row, col, BLACK) {
                    reflectance("black", b)
                } else if inside(row, col, ALUMINUM) {
                    reflectance("aluminum", b)
                } else {
                    (1.0 - soil) * reflectance("grass", b) + soil * reflectance("soil", b)
                };
                let noise = 0.3 * (hash01(p * BANDS + b + 7919) - 0.5);
                cube[b][row][col] = radiance(rho, b) + noise;
            }
            if inside(row, col, GREEN) {
                mask[row][col] = 1;
            }
        }
    }

    let library: std::collections::BTreeMap<&str, Vec<f64>> = ["green", "black", "aluminum", "grass"]
        .into_iter()
        .map(|m| (m, (0..BANDS).map(|b| reflectance(m, b)).collect()))
        .collect();

    std::fs::write(dir.join(cube_name), serde_json::to_string(&cube).unwrap()).unwrap();
    std::fs::write(dir.join("library.json"), serde_json::to_string(&library).unwrap()).unwrap();
    std::fs::write(dir.join("mask.json"), serde_json::to_string(&mask).unwrap()).unwrap();

    let config = serde_json::json!({
        "cube": cube_name,
        "library": "library.json",
        "ground_truth": "mask.json",
        "target": "green",
        "calibration": {
            "bright": { "material": "aluminum", "row": 15, "col": 15 },
            "dark": { "material": "black", "row": 15, "col": 3 }
        },
        "roc_output": "roc.csv"
    });
    let path = dir.join("run.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

#[test]
fn green_panel_is_separated_from_background() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::load(&write_scene(dir.path(), "cube.json")).unwrap();
    let output = workflow::run(&config).unwrap();

    assert_eq!(output.bands, BANDS);
    assert_eq!(output.scores.dim(), (SIZE, SIZE));

    let roc = &output.roc;
    assert!(!roc.is_empty());
    assert!(roc.p_detection.windows(2).all(|w| w[0] >= w[1]));
    assert!(roc.p_false_alarm.windows(2).all(|w| w[0] >= w[1]));

    // Some threshold keeps every panel pixel while rejecting most background.
    let separating = roc
        .p_detection
        .iter()
        .zip(&roc.p_false_alarm)
        .any(|(&pd, &pfa)| pd == 1.0 && pfa < 0.1);
    assert!(separating, "{roc:?}");

    assert!(dir.path().join("roc.csv").exists());
}

#[test]
fn calibrated_target_lies_on_the_sensor_line() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::load(&write_scene(dir.path(), "cube.json")).unwrap();
    let output = workflow::run(&config).unwrap();

    // Panel centres carry at most ±0.15 of noise, so the fitted line is close
    // to the true one.
    for b in 0..BANDS {
        let expected = radiance(reflectance("green", b), b);
        let got = output.target.values[b];
        assert!((got - expected).abs() < 1.0, "band {b}: {got} vs {expected}");
    }
}

#[test]
fn missing_target_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RunConfig::load(&write_scene(dir.path(), "cube.json")).unwrap();
    config.target = "tan".into();

    let err = workflow::run(&config).unwrap_err();
    assert!(format!("{err:#}").contains("'tan' not in library"), "{err:#}");
}

#[test]
fn uncalibrated_library_mismatch_is_dimension_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path(), "cube.json");
    std::fs::write(dir.path().join("library.json"), r#"{"green": [0.1, 0.2, 0.3]}"#).unwrap();

    let mut config = RunConfig::load(&path).unwrap();
    config.calibration = None;

    let err = workflow::run(&config).unwrap_err();
    let err = err
        .downcast_ref::<rusty_smf::DetectionError>()
        .or_else(|| err.chain().find_map(|e| e.downcast_ref::<rusty_smf::DetectionError>()));
    assert!(
        matches!(err, Some(rusty_smf::DetectionError::DimensionMismatch { .. })),
        "{err:?}"
    );
}

#[test]
fn all_background_mask_is_degenerate() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path(), "cube.json");
    let empty = vec![vec![0u8; SIZE]; SIZE];
    std::fs::write(dir.path().join("mask.json"), serde_json::to_string(&empty).unwrap()).unwrap();

    let config = RunConfig::load(&path).unwrap();
    let err = workflow::run(&config).unwrap_err();
    assert!(
        err.chain().any(|e| matches!(
            e.downcast_ref::<rusty_smf::DetectionError>(),
            Some(rusty_smf::DetectionError::DegenerateGroundTruth { positives: 0, .. })
        )),
        "{err:#}"
    );
}
