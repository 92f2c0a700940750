//! Loader for labeled multivariate `.ts` files (sktime/aeon format).
//!
//! A `.ts` file has a header of `@`-prefixed attributes, a `@data` marker,
//! then one series per line:
//!
//! ```text
//! @problemName Toy
//! @univariate false
//! @classLabel true 1 2
//! @data
//! 0.1,0.2,0.3:1.0,1.1,1.2:1
//! 0.4,0.5:1.3,1.4:2
//! ```
//!
//! Dimensions are colon-separated, values comma-separated, the class label
//! comes last and `?` marks a missing value.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ndarray::Array1;

use crate::error::{DataError, Result};

/// Series parsed from a `.ts` source: one row of per-dimension cells per series.
#[derive(Debug, Clone, Default)]
pub struct TsTable {
    /// Rows of per-dimension sequences.
    pub rows: Vec<Vec<Array1<f32>>>,
    /// One label per row.
    pub labels: Vec<i64>,
}

/// Load a `.ts` file into a [`TsTable`].
///
/// # Errors
///
/// Returns [`DataError::Load`] with the offending line number on malformed
/// input, and [`DataError::IoError`] if the file cannot be read.
pub fn load_ts_file<P: AsRef<Path>>(path: P) -> Result<TsTable> {
    let file = File::open(path.as_ref())?;
    parse_ts_reader(BufReader::new(file))
}

/// Parse `.ts` content held in memory.
pub fn parse_ts_str(content: &str) -> Result<TsTable> {
    parse_ts_reader(content.as_bytes())
}

fn parse_ts_reader<R: BufRead>(reader: R) -> Result<TsTable> {
    let mut in_data = false;
    let mut n_dims: Option<usize> = None;
    let mut rows = Vec::new();
    let mut raw_labels = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if !in_data {
            if !line.starts_with('@') {
                return Err(DataError::load(line_no, "data line before @data marker"));
            }
            let lower = line.to_lowercase();
            if lower.starts_with("@data") {
                in_data = true;
            } else if lower.starts_with("@classlabel") {
                let flag = lower.split_whitespace().nth(1);
                if flag != Some("true") {
                    return Err(DataError::load(line_no, "series must carry class labels"));
                }
            }
            continue;
        }

        let (dims, label) = parse_ts_line(line).map_err(|reason| DataError::load(line_no, reason))?;
        match n_dims {
            None => n_dims = Some(dims.len()),
            Some(expected) if expected != dims.len() => {
                return Err(DataError::load(
                    line_no,
                    format!("expected {} dimensions, found {}", expected, dims.len()),
                ));
            }
            Some(_) => {}
        }
        rows.push(dims);
        raw_labels.push(label);
    }

    if !in_data {
        return Err(DataError::load(0, "missing @data marker"));
    }
    if rows.is_empty() {
        return Err(DataError::load(0, "no series in data section"));
    }

    Ok(TsTable {
        rows,
        labels: labels_as_int(&raw_labels),
    })
}

/// Parse a single data line into its dimensions and raw label.
fn parse_ts_line(line: &str) -> std::result::Result<(Vec<Array1<f32>>, String), String> {
    if line.contains('(') {
        return Err("timestamped values are not supported".to_string());
    }

    let parts: Vec<&str> = line.split(':').collect();
    if parts.len() < 2 {
        return Err("expected at least one dimension and a class label".to_string());
    }

    let label = parts[parts.len() - 1].trim();
    if label.is_empty() {
        return Err("missing class label".to_string());
    }

    let dims = parts[..parts.len() - 1]
        .iter()
        .enumerate()
        .map(|(d, dim_str)| {
            dim_str
                .split(',')
                .map(|s| match s.trim() {
                    "?" => Ok(f32::NAN),
                    "" => Err(format!("empty value in dimension {}", d)),
                    v => v
                        .parse::<f32>()
                        .map_err(|_| format!("invalid value {:?} in dimension {}", v, d)),
                })
                .collect::<std::result::Result<Vec<f32>, String>>()
                .map(Array1::from)
        })
        .collect::<std::result::Result<Vec<_>, String>>()?;

    Ok((dims, label.to_string()))
}

/// Convert raw labels to integers.
///
/// Numeric labels keep their value (truncated toward zero). Otherwise labels
/// are indexed by their position among the sorted distinct label strings.
fn labels_as_int(raw: &[String]) -> Vec<i64> {
    let numeric: Option<Vec<i64>> = raw
        .iter()
        .map(|l| l.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
        .collect();

    numeric.unwrap_or_else(|| {
        let mut unique: Vec<&String> = raw.iter().collect();
        unique.sort();
        unique.dedup();
        raw.iter()
            .map(|l| unique.iter().position(|u| *u == l).unwrap_or_default() as i64)
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# toy file
@problemName Toy
@univariate false
@classLabel true 1 2
@data
1.0,2.0,3.0:4.0,5.0,6.0:1
1.5,?,3.5:4.5,5.5,6.5:2.0
";

    #[test]
    fn test_parse_ts_line() {
        let (dims, label) = parse_ts_line("1.0,2.0,3.0:4.0,5.0,6.0:class1").unwrap();
        assert_eq!(dims.len(), 2);
        assert_eq!(dims[0].to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(dims[1].to_vec(), vec![4.0, 5.0, 6.0]);
        assert_eq!(label, "class1");
    }

    #[test]
    fn test_parse_ts_str() {
        let table = parse_ts_str(SAMPLE).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.labels, vec![1, 2]);
        assert!(table.rows[1][0][1].is_nan());
    }

    #[test]
    fn test_string_labels_are_indexed() {
        let table = parse_ts_str("@data\n1,2:b\n3,4:a\n5,6:b\n").unwrap();
        assert_eq!(table.labels, vec![1, 0, 1]);
    }

    #[test]
    fn test_malformed_value_reports_line() {
        let err = parse_ts_str("@data\n1,2:1\n1,x:2\n").unwrap_err();
        match err {
            DataError::Load { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_inconsistent_dimensions() {
        assert!(matches!(
            parse_ts_str("@data\n1,2:3,4:1\n1,2:1\n"),
            Err(DataError::Load { line: 3, .. })
        ));
    }

    #[test]
    fn test_missing_label_or_marker() {
        assert!(parse_ts_str("@data\n1,2,3\n").is_err());
        assert!(parse_ts_str("@problemName x\n").is_err());
        assert!(parse_ts_str("@data\n").is_err());
        assert!(parse_ts_str("@classLabel false\n@data\n1,2:1\n").is_err());
    }

    #[test]
    fn test_load_ts_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy_TRAIN.ts");
        std::fs::write(&path, SAMPLE).unwrap();
        let table = load_ts_file(&path).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert!(load_ts_file(dir.path().join("missing.ts")).is_err());
    }
}
