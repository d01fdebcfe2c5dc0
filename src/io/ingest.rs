//! CSV ingest.
//!
//! Turns a delimited table with `x`, `y` and an optional `t` column into an
//! aligned `Observations` set.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Permissive values**: NaN, duplicate or unordered `t` are accepted as-is
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::{File, create_dir_all};
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::{Observations, TSource};
use crate::error::{AppError, ErrorKind};
use crate::math::linspace;

/// Loader output: observations plus provenance of `t`.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub observations: Observations,
    pub t_source: TSource,
    pub rows_read: usize,
}

/// Load observations from `path`.
///
/// When the table has no `t` column, `t` is synthesized as `n` evenly spaced
/// values over `t_span`.
pub fn load_observations(path: &Path, t_span: [f64; 2]) -> Result<LoadedData, AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| {
            AppError::new(
                ErrorKind::Io,
                format!("Failed to create data directory '{}': {e}", parent.display()),
            )
        })?;
    }

    if !path.is_file() {
        return Err(AppError::new(
            ErrorKind::DataNotFound,
            format!(
                "Data file not found at '{}'. Place a CSV with columns `x`, `y` (and optionally `t`) there.",
                path.display()
            ),
        ));
    }

    let file = File::open(path)
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(ErrorKind::InvalidData, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let x_idx = required_column(&header_map, "x")?;
    let y_idx = required_column(&header_map, "y")?;
    let t_idx = header_map.get("t").copied();

    let mut t = Vec::new();
    let mut x = Vec::new();
    let mut y = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, and lines are 1-based.
        let line = idx + 2;
        let record =
            result.map_err(|e| AppError::new(ErrorKind::InvalidData, format!("CSV parse error on line {line}: {e}")))?;

        x.push(parse_cell(&record, x_idx, "x", line)?);
        y.push(parse_cell(&record, y_idx, "y", line)?);
        if let Some(t_idx) = t_idx {
            t.push(parse_cell(&record, t_idx, "t", line)?);
        }
    }

    let rows_read = x.len();
    let t_source = if t_idx.is_some() {
        TSource::Column
    } else {
        t = linspace(t_span[0], t_span[1], rows_read);
        TSource::Synthesized
    };

    let observations = Observations::new(t, x, y)?;
    info!(path = %path.display(), n = rows_read, t_source = ?t_source, "loaded observations");
    debug!(t_range = ?observations.t_range(), "observation t range");

    Ok(LoadedData {
        observations,
        t_source,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn required_column(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
    header_map
        .get(name)
        .copied()
        .ok_or_else(|| AppError::new(ErrorKind::MissingColumn, format!("Missing required column: `{name}`")))
}

/// Parse one numeric cell. Empty or absent cells become NaN.
fn parse_cell(record: &StringRecord, idx: usize, name: &str, line: usize) -> Result<f64, AppError> {
    let raw = record.get(idx).map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|_| {
        AppError::new(
            ErrorKind::InvalidData,
            format!("Invalid numeric value '{raw}' in column `{name}` on line {line}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_file_is_data_not_found_and_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("xy_data.csv");
        let err = load_observations(&path, [6.0, 60.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataNotFound);
        assert!(err.to_string().contains("xy_data.csv"));
        // The data directory is created even though the file is absent.
        assert!(dir.path().join("data").is_dir());
    }

    #[test]
    fn t_column_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "a.csv", "t,x,y\n3.5,1,2\n-1,3,4\n3.5,5,6\n");
        let data = load_observations(&path, [6.0, 60.0]).unwrap();
        assert_eq!(data.t_source, TSource::Column);
        assert_eq!(data.observations.t(), &[3.5, -1.0, 3.5]);
        assert_eq!(data.observations.x(), &[1.0, 3.0, 5.0]);
        assert_eq!(data.observations.y(), &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn missing_t_column_synthesizes_even_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "b.csv", "x,y\n1,2\n3,4\n5,6\n7,8\n");
        let data = load_observations(&path, [6.0, 60.0]).unwrap();
        assert_eq!(data.t_source, TSource::Synthesized);
        assert_eq!(data.observations.t(), &[6.0, 24.0, 42.0, 60.0]);
    }

    #[test]
    fn missing_required_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "c.csv", "t,x\n1,2\n");
        let err = load_observations(&path, [6.0, 60.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingColumn);
        assert!(err.to_string().contains("`y`"));
    }

    #[test]
    fn headers_are_normalized_and_empty_cells_become_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "d.csv", "\u{feff} X , Y\n1,\nnan,4\n");
        let data = load_observations(&path, [6.0, 60.0]).unwrap();
        assert!(data.observations.y()[0].is_nan());
        assert!(data.observations.x()[1].is_nan());
        assert_eq!(data.rows_read, 2);
    }

    #[test]
    fn non_numeric_cell_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "e.csv", "x,y\n1,abc\n");
        let err = load_observations(&path, [6.0, 60.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn header_only_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "f.csv", "x,y\n");
        assert_eq!(load_observations(&path, [6.0, 60.0]).unwrap_err().kind(), ErrorKind::InvalidData);
    }
}
