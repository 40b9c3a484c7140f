use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Builder, Int64Array, ListBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

/// Write a synthetic panel-on-grass scene with its library, ground truth and
/// run config.
#[derive(Parser)]
#[command(name = "generate_sample", about)]
struct Cli {
    /// Output directory.
    #[arg(default_value = "sample_scene")]
    out_dir: PathBuf,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

const BANDS: usize = 40;
const ROWS: usize = 48;
const COLS: usize = 64;

/// Panel name and its `[row0, row1) × [col0, col1)` footprint.
const PANELS: [(&str, [usize; 4]); 4] = [
    ("black", [10, 18, 6, 14]),
    ("green", [10, 18, 26, 34]),
    ("tan", [10, 18, 46, 54]),
    ("aluminum", [30, 38, 26, 34]),
];

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Ground-truth reflectance of each material at wavelength `nm`.
fn reflectance(material: &str, nm: f64) -> f64 {
    match material {
        "grass" => 0.04 + gaussian(nm, 550.0, 30.0, 0.06) + 0.45 * sigmoid((nm - 710.0) / 15.0),
        "soil" => 0.12 + 0.2 * (nm - 400.0) / 600.0,
        "black" => 0.04 + 0.01 * (nm - 400.0) / 600.0,
        "green" => 0.05 + gaussian(nm, 540.0, 40.0, 0.25) + 0.1 * sigmoid((nm - 800.0) / 40.0),
        "tan" => 0.2 + 0.25 * (nm - 400.0) / 600.0,
        "aluminum" => 0.85 - 0.05 * (nm - 400.0) / 600.0,
        _ => 0.0,
    }
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn panel_at(row: usize, col: usize) -> Option<&'static str> {
    PANELS
        .iter()
        .find(|(_, [r0, r1, c0, c1])| (*r0..*r1).contains(&row) && (*c0..*c1).contains(&col))
        .map(|(name, _)| *name)
}

fn panel_centre(name: &str) -> (usize, usize) {
    let (_, [r0, r1, c0, c1]) = PANELS
        .iter()
        .find(|(n, _)| *n == name)
        .copied()
        .unwrap_or(PANELS[0]);
    ((r0 + r1) / 2, (c0 + c1) / 2)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut rng = SimpleRng::new(cli.seed);

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;

    // Wavelengths: 400 → 985 nm, step 15
    let wavelengths: Vec<f64> = (0..BANDS).map(|b| 400.0 + b as f64 * 15.0).collect();
    // At-sensor radiance = gain·ρ + path radiance
    let gain: Vec<f64> = wavelengths.iter().map(|&nm| gaussian(nm, 620.0, 260.0, 120.0)).collect();
    let path: Vec<f64> = wavelengths.iter().map(|&nm| 6.0 * (-(nm - 400.0) / 200.0).exp()).collect();

    // Pixel-major spectra and ground truth
    let mut pixels: Vec<(i64, i64, Vec<f64>)> = Vec::with_capacity(ROWS * COLS);
    let mut truth = vec![vec![0u8; COLS]; ROWS];

    for row in 0..ROWS {
        for col in 0..COLS {
            let panel = panel_at(row, col);
            let soil_fraction = if panel.is_none() { rng.next_f64() * 0.35 } else { 0.0 };
            let illumination = rng.gauss(1.0, 0.04);

            let spectrum = wavelengths
                .iter()
                .enumerate()
                .map(|(b, &nm)| {
                    let rho = match panel {
                        Some(name) => reflectance(name, nm),
                        None => {
                            (1.0 - soil_fraction) * reflectance("grass", nm)
                                + soil_fraction * reflectance("soil", nm)
                        }
                    };
                    gain[b] * illumination * rho + path[b] + rng.gauss(0.0, 0.4)
                })
                .collect();

            if panel == Some("green") {
                truth[row][col] = 1;
            }
            pixels.push((row as i64, col as i64, spectrum));
        }
    }

    write_cube_parquet(&cli.out_dir.join("cube.parquet"), &pixels)?;
    write_cube_json(&cli.out_dir.join("cube.json"), &pixels)?;
    write_library(&cli.out_dir.join("library.json"), &wavelengths)?;
    write_truth(&cli.out_dir.join("green_target.csv"), &truth)?;
    write_config(&cli.out_dir.join("run.json"))?;

    println!(
        "Wrote {ROWS}×{COLS} scene ({BANDS} bands) with {} panels to {}",
        PANELS.len(),
        cli.out_dir.display()
    );
    Ok(())
}

fn write_cube_parquet(path: &Path, pixels: &[(i64, i64, Vec<f64>)]) -> Result<()> {
    let mut spectrum_builder = ListBuilder::new(Float64Builder::new());
    for (_, _, spectrum) in pixels {
        let values = spectrum_builder.values();
        for &v in spectrum {
            values.append_value(v);
        }
        spectrum_builder.append(true);
    }
    let spectrum_array = spectrum_builder.finish();
    let row_array = Int64Array::from(pixels.iter().map(|p| p.0).collect::<Vec<_>>());
    let col_array = Int64Array::from(pixels.iter().map(|p| p.1).collect::<Vec<_>>());

    let schema = Arc::new(Schema::new(vec![
        Field::new("row", DataType::Int64, false),
        Field::new("col", DataType::Int64, false),
        Field::new(
            "spectrum",
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
            false,
        ),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(row_array), Arc::new(col_array), Arc::new(spectrum_array)],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Same cube as nested `[band][row][col]` JSON.
fn write_cube_json(path: &Path, pixels: &[(i64, i64, Vec<f64>)]) -> Result<()> {
    let mut bands = vec![vec![vec![0.0; COLS]; ROWS]; BANDS];
    for (row, col, spectrum) in pixels {
        for (b, &v) in spectrum.iter().enumerate() {
            bands[b][*row as usize][*col as usize] = v;
        }
    }
    let file = std::fs::File::create(path).context("creating cube JSON")?;
    serde_json::to_writer(std::io::BufWriter::new(file), &bands).context("writing cube JSON")?;
    Ok(())
}

fn write_library(path: &Path, wavelengths: &[f64]) -> Result<()> {
    let library: std::collections::BTreeMap<&str, Vec<f64>> = ["black", "green", "tan", "aluminum", "grass"]
        .into_iter()
        .map(|name| (name, wavelengths.iter().map(|&nm| reflectance(name, nm)).collect()))
        .collect();
    let file = std::fs::File::create(path).context("creating library JSON")?;
    serde_json::to_writer_pretty(file, &library).context("writing library JSON")?;
    Ok(())
}

fn write_truth(path: &Path, truth: &[Vec<u8>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context("creating ground truth CSV")?;
    for row in truth {
        writer.write_record(row.iter().map(u8::to_string))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_config(path: &Path) -> Result<()> {
    let (bright_row, bright_col) = panel_centre("aluminum");
    let (dark_row, dark_col) = panel_centre("black");
    let config = serde_json::json!({
        "cube": "cube.parquet",
        "library": "library.json",
        "ground_truth": "green_target.csv",
        "target": "green",
        "calibration": {
            "bright": { "material": "aluminum", "row": bright_row, "col": bright_col },
            "dark": { "material": "black", "row": dark_row, "col": dark_col }
        },
        "threshold_step": 1.0,
        "roc_output": "roc.csv",
        "score_image": "scores.png"
    });
    let file = std::fs::File::create(path).context("creating run config")?;
    serde_json::to_writer_pretty(file, &config).context("writing run config")?;
    Ok(())
}
