use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array, LargeListArray, ListArray};
use arrow::datatypes::DataType;
use ndarray::{Array1, Array2};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{GroundTruthMask, HyperspectralCube, SpectralLibrary};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a hyperspectral cube.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per pixel: `row`, `col` integer columns and a
///   `spectrum` list column (recommended for large scenes)
/// * `.json`    – nested `[band][row][col]` array
pub fn load_cube(path: &Path) -> Result<HyperspectralCube> {
    let cube = match extension(path).as_str() {
        "parquet" | "pq" => load_cube_parquet(path),
        "json" => load_cube_json(path),
        other => bail!("Unsupported cube file extension: .{other}"),
    }
    .with_context(|| format!("loading cube from {}", path.display()))?;

    log::debug!(
        "Loaded cube {}: {} bands, {}×{} pixels",
        path.display(),
        cube.bands(),
        cube.rows(),
        cube.cols()
    );
    Ok(cube)
}

/// Load a spectral library of named reference spectra.
///
/// Supported formats:
/// * `.json` – `{ "green": [0.04, 0.05, ...], "black": [...] }`
/// * `.csv`  – header row of material names, then one row per band
pub fn load_library(path: &Path) -> Result<SpectralLibrary> {
    match extension(path).as_str() {
        "json" => load_library_json(path),
        "csv" => load_library_csv(path),
        other => bail!("Unsupported library file extension: .{other}"),
    }
    .with_context(|| format!("loading spectral library from {}", path.display()))
}

/// Load a binary ground-truth mask (0 = absent, 1 = present).
///
/// Supported formats:
/// * `.json` – nested `[[0, 1, ...], ...]` array, one inner array per row
/// * `.csv`  – headerless grid, one line per image row
pub fn load_mask(path: &Path) -> Result<GroundTruthMask> {
    let values = match extension(path).as_str() {
        "json" => load_grid_json(path),
        "csv" => load_grid_csv(path),
        other => bail!("Unsupported mask file extension: .{other}"),
    }
    .with_context(|| format!("loading ground truth from {}", path.display()))?;

    Ok(GroundTruthMask::from_values(&values)?)
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// JSON loaders
// ---------------------------------------------------------------------------

fn load_cube_json(path: &Path) -> Result<HyperspectralCube> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let bands: Vec<Vec<Vec<f64>>> = serde_json::from_str(&text).context("parsing JSON cube")?;

    let n_bands = bands.len();
    let first = bands.first().context("cube has no bands")?;
    let rows = first.len();
    let cols = first.first().map_or(0, Vec::len);

    let mut values = Vec::with_capacity(n_bands * rows * cols);
    for (b, band) in bands.iter().enumerate() {
        if band.len() != rows {
            bail!("Band {b}: has {} rows but band 0 has {rows}", band.len());
        }
        for (r, row) in band.iter().enumerate() {
            if row.len() != cols {
                bail!("Band {b}, row {r}: has {} columns, expected {cols}", row.len());
            }
            values.extend_from_slice(row);
        }
    }

    Ok(HyperspectralCube::from_shape_vec(n_bands, rows, cols, values)?)
}

fn load_library_json(path: &Path) -> Result<SpectralLibrary> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let entries: BTreeMap<String, Vec<f64>> =
        serde_json::from_str(&text).context("parsing JSON library")?;

    let mut library = SpectralLibrary::default();
    for (name, values) in entries {
        library.insert(name, Array1::from(values));
    }
    Ok(library)
}

fn load_grid_json(path: &Path) -> Result<Array2<f64>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<Vec<f64>> = serde_json::from_str(&text).context("parsing JSON grid")?;
    grid_from_rows(rows)
}

// ---------------------------------------------------------------------------
// CSV loaders
// ---------------------------------------------------------------------------

/// Header row with material names; each following row is one band.
fn load_library_csv(path: &Path) -> Result<SpectralLibrary> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, field) in record.iter().enumerate() {
            let value = parse_float(field)
                .with_context(|| format!("Row {row_no}, column '{}'", headers[col_idx]))?;
            columns[col_idx].push(value);
        }
    }

    let mut library = SpectralLibrary::default();
    for (name, values) in headers.into_iter().zip(columns) {
        library.insert(name, Array1::from(values));
    }
    Ok(library)
}

fn load_grid_csv(path: &Path) -> Result<Array2<f64>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context("opening CSV")?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row = record
            .iter()
            .enumerate()
            .map(|(j, field)| parse_float(field).with_context(|| format!("Row {row_no}, column {j}")))
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }
    grid_from_rows(rows)
}

fn parse_float(field: &str) -> Result<f64> {
    let tok = field.trim();
    tok.parse::<f64>()
        .with_context(|| format!("'{tok}' is not a number"))
}

fn grid_from_rows(rows: Vec<Vec<f64>>) -> Result<Array2<f64>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if n_rows == 0 || n_cols == 0 {
        bail!("grid is empty");
    }

    let mut values = Vec::with_capacity(n_rows * n_cols);
    for (r, row) in rows.into_iter().enumerate() {
        if row.len() != n_cols {
            bail!("Row {r}: has {} values, expected {n_cols}", row.len());
        }
        values.extend(row);
    }
    Ok(Array2::from_shape_vec((n_rows, n_cols), values)?)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding one pixel per row.
///
/// Expected schema:
/// - `row`, `col`: Int64 or Int32 – zero-based pixel position
/// - `spectrum`: List<Float64|Float32> or LargeList – one value per band
///
/// Every position in the bounding grid must appear exactly once.
fn load_cube_parquet(path: &Path) -> Result<HyperspectralCube> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut pixels: Vec<(usize, usize, Vec<f64>)> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let row_idx = schema
            .index_of("row")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'row' column"))?;
        let col_idx = schema
            .index_of("col")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'col' column"))?;
        let spectrum_idx = schema
            .index_of("spectrum")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'spectrum' column"))?;

        let row_col = batch.column(row_idx);
        let col_col = batch.column(col_idx);
        let spectrum_col = batch.column(spectrum_idx);

        for i in 0..batch.num_rows() {
            let row = extract_index(row_col, i).with_context(|| format!("Record {i}: 'row'"))?;
            let col = extract_index(col_col, i).with_context(|| format!("Record {i}: 'col'"))?;
            let spectrum = extract_f64_list(spectrum_col, i)
                .with_context(|| format!("Record {i}: failed to read 'spectrum'"))?;
            pixels.push((row, col, spectrum));
        }
    }

    assemble_cube(pixels)
}

/// Scatter per-pixel spectra into band-major order.
fn assemble_cube(pixels: Vec<(usize, usize, Vec<f64>)>) -> Result<HyperspectralCube> {
    let bands = pixels.first().map(|(_, _, s)| s.len()).context("no pixels found")?;
    let rows = pixels.iter().map(|(r, _, _)| r + 1).max().unwrap_or(0);
    let cols = pixels.iter().map(|(_, c, _)| c + 1).max().unwrap_or(0);
    let plane = rows * cols;

    let mut values = vec![0.0; bands * plane];
    let mut seen = vec![false; plane];

    for (row, col, spectrum) in pixels {
        if spectrum.len() != bands {
            bail!(
                "Pixel ({row}, {col}): spectrum has {} bands, expected {bands}",
                spectrum.len()
            );
        }
        let p = row * cols + col;
        if std::mem::replace(&mut seen[p], true) {
            bail!("Pixel ({row}, {col}) appears more than once");
        }
        for (b, v) in spectrum.into_iter().enumerate() {
            values[b * plane + p] = v;
        }
    }

    if let Some(missing) = seen.iter().position(|&s| !s) {
        bail!("Pixel ({}, {}) is missing", missing / cols, missing % cols);
    }

    Ok(HyperspectralCube::from_shape_vec(bands, rows, cols, values)?)
}

// -- Parquet / Arrow helpers --

fn extract_index(col: &Arc<dyn Array>, row: usize) -> Result<usize> {
    if col.is_null(row) {
        bail!("null pixel index");
    }
    let value = match col.data_type() {
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            arr.value(row)
        }
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            i64::from(arr.value(row))
        }
        other => bail!("Expected Int64 or Int32 index column, got {other:?}"),
    };
    usize::try_from(value).with_context(|| format!("negative pixel index {value}"))
}

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    // The inner array can be Float64 or Float32
    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::array::{Float64Builder, ListBuilder};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn write_parquet(path: &Path, records: &[(i64, i64, Vec<f64>)]) {
        let mut spectrum_builder = ListBuilder::new(Float64Builder::new());
        for (_, _, spectrum) in records {
            let values = spectrum_builder.values();
            for &v in spectrum {
                values.append_value(v);
            }
            spectrum_builder.append(true);
        }

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
            vec![
                Arc::new(Int64Array::from(records.iter().map(|r| r.0).collect::<Vec<_>>())),
                Arc::new(Int64Array::from(records.iter().map(|r| r.1).collect::<Vec<_>>())),
                Arc::new(spectrum_builder.finish()),
            ],
        )
        .unwrap();

        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn json_cube_is_band_row_col() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "cube.json",
            "[[[1, 2, 3], [4, 5, 6]], [[10, 20, 30], [40, 50, 60]]]",
        );

        let cube = load_cube(&path).unwrap();
        assert_eq!(cube.bands(), 2);
        assert_eq!(cube.spatial_shape(), (2, 3));
        assert_eq!(cube.pixel(1, 0).unwrap().to_vec(), vec![4.0, 40.0]);
    }

    #[test]
    fn ragged_json_cube_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "cube.json", "[[[1, 2], [3]], [[1, 2], [3, 4]]]");
        let err = load_cube(&path).unwrap_err();
        assert!(format!("{err:#}").contains("columns"), "{err:#}");
    }

    #[test]
    fn parquet_cube_scatters_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.parquet");
        // Deliberately out of order.
        write_parquet(
            &path,
            &[
                (1, 1, vec![4.0, 40.0]),
                (0, 0, vec![1.0, 10.0]),
                (1, 0, vec![3.0, 30.0]),
                (0, 1, vec![2.0, 20.0]),
            ],
        );

        let cube = load_cube(&path).unwrap();
        assert_eq!(cube.bands(), 2);
        assert_eq!(cube.spatial_shape(), (2, 2));
        assert_eq!(cube.pixel(0, 1).unwrap().to_vec(), vec![2.0, 20.0]);
        assert_eq!(cube.pixel(1, 1).unwrap().to_vec(), vec![4.0, 40.0]);
    }

    #[test]
    fn parquet_cube_with_hole_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.parquet");
        write_parquet(&path, &[(0, 0, vec![1.0]), (1, 1, vec![2.0])]);

        let err = load_cube(&path).unwrap_err();
        assert!(format!("{err:#}").contains("missing"), "{err:#}");
    }

    #[test]
    fn library_from_json_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let json = write_file(&dir, "lib.json", r#"{"green": [0.1, 0.5], "black": [0.05, 0.04]}"#);
        let csv = write_file(&dir, "lib.csv", "green,black\n0.1,0.05\n0.5,0.04\n");

        let from_json = load_library(&json).unwrap();
        let from_csv = load_library(&csv).unwrap();
        assert_eq!(from_json, from_csv);
        assert_eq!(from_json.get("green").unwrap().to_vec(), vec![0.1, 0.5]);
    }

    #[test]
    fn mask_from_csv_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_file(&dir, "mask.csv", "0,0,1\n0,1,1\n");
        let json = write_file(&dir, "mask.json", "[[0, 0, 1], [0, 1, 1]]");

        let mask = load_mask(&csv).unwrap();
        assert_eq!(mask.shape(), (2, 3));
        assert_eq!(mask.positives(), 3);
        assert_eq!(mask, load_mask(&json).unwrap());
    }

    #[test]
    fn non_binary_mask_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "mask.csv", "0,2\n1,0\n");
        assert!(load_mask(&path).is_err());
    }

    #[test]
    fn unknown_extension_rejected() {
        let err = load_cube(Path::new("scene.mat")).unwrap_err();
        assert!(format!("{err:#}").contains(".mat"), "{err:#}");
    }
}
