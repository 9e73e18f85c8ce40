//! Loading of sampler output: one directory per data section, each holding a
//! `values.txt` scalar file and any number of `<name>.txt` numeric arrays.

use ndarray::{Array1, Array2, Axis};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the scalar parameter file inside every section directory
pub const VALUES_FILE: &str = "values.txt";

/// Errors raised while reading a sample directory
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("no usable data in {}: {reason}", path.display())]
    DataUnavailable { path: PathBuf, reason: String },

    #[error("{}:{line}: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SampleError {
    /// True when the error only means "this sample lacks the data", which the
    /// driver turns into a skipped plot rather than a failed run.
    pub fn is_data_absence(&self) -> bool {
        matches!(
            self,
            SampleError::FileNotFound { .. } | SampleError::DataUnavailable { .. }
        )
    }

    pub(crate) fn unavailable(path: &Path, reason: impl Into<String>) -> Self {
        SampleError::DataUnavailable {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// A scalar read from `values.txt`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Float(f64),
    Int(i64),
    Text(String),
}

impl ScalarValue {
    /// Coerce a raw value: float first, then integer, otherwise keep the text
    pub fn coerce(raw: &str) -> Self {
        if let Ok(v) = raw.parse::<f64>() {
            return ScalarValue::Float(v);
        }
        if let Ok(v) = raw.parse::<i64>() {
            return ScalarValue::Int(v);
        }
        ScalarValue::Text(raw.to_string())
    }
}

/// Numeric data from a `<name>.txt` file
#[derive(Debug, Clone, PartialEq)]
pub enum NumericArray {
    OneD(Array1<f64>),
    TwoD(Array2<f64>),
}

impl NumericArray {
    /// All values in row-major order
    pub fn into_vec(self) -> Vec<f64> {
        match self {
            NumericArray::OneD(a) => a.to_vec(),
            NumericArray::TwoD(a) => a.iter().copied().collect(),
        }
    }

    /// View as a grid; a 1-D array of length n becomes a single row (1, n)
    pub fn into_2d(self) -> Array2<f64> {
        match self {
            NumericArray::OneD(a) => a.insert_axis(Axis(0)),
            NumericArray::TwoD(a) => a,
        }
    }
}

/// Read-only view of a sampler output directory
#[derive(Debug, Clone)]
pub struct SampleDirectory {
    root: PathBuf,
}

impl SampleDirectory {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn section_path(&self, section: &str) -> PathBuf {
        self.root.join(section)
    }

    /// Path of the array file `<root>/<section>/<name>.txt`
    pub fn array_path(&self, section: &str, name: &str) -> PathBuf {
        self.section_path(section).join(format!("{}.txt", name))
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.section_path(section).is_dir()
    }

    pub fn has_array(&self, section: &str, name: &str) -> bool {
        self.array_path(section, name).is_file()
    }

    /// Names of all section directories, sorted
    pub fn sections(&self) -> Result<Vec<String>, SampleError> {
        let entries = fs::read_dir(&self.root).map_err(|e| io_error(&self.root, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error(&self.root, e))?;
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Load the scalar parameters of a section from its `values.txt`
    pub fn load_values(&self, section: &str) -> Result<BTreeMap<String, ScalarValue>, SampleError> {
        let path = self.section_path(section).join(VALUES_FILE);
        let content = read_file(&path)?;
        parse_values(&path, &content)
    }

    /// Load a whitespace-delimited numeric array from `<section>/<name>.txt`
    pub fn load_array(&self, section: &str, name: &str) -> Result<NumericArray, SampleError> {
        let path = self.array_path(section, name);
        // Any unreadable array file only means this sample lacks the data
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SampleError::unavailable(&path, "file is missing"),
            _ => SampleError::unavailable(&path, e.to_string()),
        })?;
        parse_array(&path, &content)
    }

    /// Load an array and flatten it to a plain vector
    pub fn load_vec(&self, section: &str, name: &str) -> Result<Vec<f64>, SampleError> {
        Ok(self.load_array(section, name)?.into_vec())
    }
}

fn io_error(path: &Path, source: io::Error) -> SampleError {
    SampleError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_file(path: &Path) -> Result<String, SampleError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SampleError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => io_error(path, e),
    })
}

fn parse_values(path: &Path, content: &str) -> Result<BTreeMap<String, ScalarValue>, SampleError> {
    let mut values = BTreeMap::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (name, value) = line.split_once('=').ok_or_else(|| SampleError::Malformed {
            path: path.to_path_buf(),
            line: idx + 1,
            reason: format!("expected 'name = value', got '{}'", line),
        })?;
        values.insert(name.trim().to_string(), ScalarValue::coerce(value.trim()));
    }
    Ok(values)
}

fn parse_array(path: &Path, content: &str) -> Result<NumericArray, SampleError> {
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        // Strip comments, whole-line or trailing
        let data = line.split('#').next().unwrap_or("").trim();
        if data.is_empty() {
            continue;
        }
        let row = data
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f64>().map_err(|_| {
                    SampleError::unavailable(path, format!("line {}: '{}' is not a number", idx + 1, tok))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(SampleError::unavailable(
                    path,
                    format!(
                        "line {}: expected {} columns, found {}",
                        idx + 1,
                        first.len(),
                        row.len()
                    ),
                ));
            }
        }
        rows.push(row);
    }

    let nrows = rows.len();
    let ncols = match rows.first() {
        Some(row) => row.len(),
        None => return Err(SampleError::unavailable(path, "no numeric data")),
    };

    if nrows == 1 {
        Ok(NumericArray::OneD(Array1::from(rows.swap_remove(0))))
    } else if ncols == 1 {
        Ok(NumericArray::OneD(rows.into_iter().map(|r| r[0]).collect()))
    } else {
        Array2::from_shape_vec((nrows, ncols), rows.concat())
            .map(NumericArray::TwoD)
            .map_err(|e| SampleError::unavailable(path, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_with(files: &[(&str, &str)]) -> (TempDir, SampleDirectory) {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let sample = SampleDirectory::new(dir.path());
        (dir, sample)
    }

    #[test]
    fn test_load_values_coerces_floats() {
        let (_dir, sample) = sample_with(&[("cosmological_parameters/values.txt", "H0 = 70.0\nomega_m=0.3\n")]);
        let values = sample.load_values("cosmological_parameters").unwrap();

        assert_eq!(values.len(), 2);
        assert_eq!(values["H0"], ScalarValue::Float(70.0));
        assert_eq!(values["omega_m"], ScalarValue::Float(0.3));
    }

    #[test]
    fn test_load_values_keeps_text() {
        let (_dir, sample) = sample_with(&[("meta/values.txt", "\nname = some_text\n\n")]);
        let values = sample.load_values("meta").unwrap();

        assert_eq!(values.len(), 1);
        assert_eq!(values["name"], ScalarValue::Text("some_text".to_string()));
    }

    #[test]
    fn test_load_values_integers_parse_as_float_first() {
        let (_dir, sample) = sample_with(&[("meta/values.txt", "nbin = 3\n")]);
        let values = sample.load_values("meta").unwrap();
        assert_eq!(values["nbin"], ScalarValue::Float(3.0));
    }

    #[test]
    fn test_load_values_missing_file() {
        let (_dir, sample) = sample_with(&[]);
        let err = sample.load_values("distances").unwrap_err();
        assert!(matches!(err, SampleError::FileNotFound { .. }));
        assert!(err.is_data_absence());
    }

    #[test]
    fn test_load_values_line_without_separator() {
        let (_dir, sample) = sample_with(&[("meta/values.txt", "a = 1\njunk\n")]);
        let err = sample.load_values("meta").unwrap_err();
        assert!(matches!(err, SampleError::Malformed { line: 2, .. }));
        assert!(!err.is_data_absence());
    }

    #[test]
    fn test_load_array_column_is_1d() {
        let (_dir, sample) = sample_with(&[("distances/z.txt", "# z\n0.0\n0.5\n1.0\n")]);
        let array = sample.load_array("distances", "z").unwrap();
        assert_eq!(array, NumericArray::OneD(Array1::from(vec![0.0, 0.5, 1.0])));
    }

    #[test]
    fn test_load_array_single_row_is_1d() {
        let (_dir, sample) = sample_with(&[("distances/z.txt", "0.1 0.2 0.3\n")]);
        let array = sample.load_array("distances", "z").unwrap();
        assert!(matches!(array, NumericArray::OneD(ref a) if a.len() == 3));
    }

    #[test]
    fn test_load_array_grid_is_2d() {
        let (_dir, sample) = sample_with(&[("matter_power_lin/p_k.txt", "1 2 3\n4 5 6\n")]);
        let array = sample.load_array("matter_power_lin", "p_k").unwrap();
        assert!(matches!(array, NumericArray::TwoD(_)));

        let grid = array.into_2d();
        assert_eq!(grid.shape(), &[2, 3]);
        assert_eq!(grid[[1, 2]], 6.0);
    }

    #[test]
    fn test_into_2d_promotes_vector_to_row() {
        let array = NumericArray::OneD(Array1::from(vec![1.0, 2.0]));
        assert_eq!(array.into_2d().shape(), &[1, 2]);
    }

    #[test]
    fn test_load_array_missing_is_unavailable() {
        let (_dir, sample) = sample_with(&[]);
        let err = sample.load_array("cmb_cl", "ell").unwrap_err();
        assert!(matches!(err, SampleError::DataUnavailable { .. }));
        assert!(err.is_data_absence());
    }

    #[test]
    fn test_load_array_rejects_bad_content() {
        let (_dir, sample) = sample_with(&[
            ("s/text.txt", "1.0\nabc\n"),
            ("s/ragged.txt", "1 2\n3\n"),
            ("s/empty.txt", "# header only\n\n"),
        ]);

        for name in ["text", "ragged", "empty"] {
            let err = sample.load_array("s", name).unwrap_err();
            assert!(err.is_data_absence(), "{} should be unavailable", name);
        }
    }

    #[test]
    fn test_load_array_unreadable_is_unavailable() {
        let (dir, sample) = sample_with(&[("distances/d_a.txt", "1.0\n")]);
        fs::write(dir.path().join("distances/z.txt"), b"0.0\n\xff\xfe\n").unwrap();
        fs::create_dir_all(dir.path().join("distances/mu.txt")).unwrap();

        for name in ["z", "mu"] {
            let err = sample.load_array("distances", name).unwrap_err();
            assert!(matches!(err, SampleError::DataUnavailable { .. }), "{}: {}", name, err);
        }
    }

    #[test]
    fn test_sections_sorted() {
        let (_dir, sample) = sample_with(&[
            ("shear_cl/ell.txt", "1\n"),
            ("distances/z.txt", "1\n"),
            ("stray.txt", "not a section"),
        ]);
        assert_eq!(sample.sections().unwrap(), vec!["distances", "shear_cl"]);
        assert!(sample.has_section("distances"));
        assert!(sample.has_array("shear_cl", "ell"));
        assert!(!sample.has_array("shear_cl", "bin_1_1"));
    }
}
