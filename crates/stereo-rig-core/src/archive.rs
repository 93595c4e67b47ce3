//! Persisted calibration archive.
//!
//! The archive is a JSON object with six keys holding row-major nested
//! arrays:
//!
//! | key | shape |
//! |---|---|
//! | `cameraMatrix1`, `cameraMatrix2` | 3x3 |
//! | `distCoeffs1`, `distCoeffs2` | 1xN |
//! | `R` | 3x3 |
//! | `T` | 3x1 |

use crate::{CalibrationParameters, ParamsError};
use nalgebra::{Matrix3, Vector3};
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const KEY_CAMERA_MATRIX_LEFT: &str = "cameraMatrix1";
pub const KEY_DIST_COEFFS_LEFT: &str = "distCoeffs1";
pub const KEY_CAMERA_MATRIX_RIGHT: &str = "cameraMatrix2";
pub const KEY_DIST_COEFFS_RIGHT: &str = "distCoeffs2";
pub const KEY_ROTATION: &str = "R";
pub const KEY_TRANSLATION: &str = "T";

/// Every key a calibration archive must carry.
pub const CALIBRATION_KEYS: [&str; 6] = [
    KEY_CAMERA_MATRIX_LEFT,
    KEY_DIST_COEFFS_LEFT,
    KEY_CAMERA_MATRIX_RIGHT,
    KEY_DIST_COEFFS_RIGHT,
    KEY_ROTATION,
    KEY_TRANSLATION,
];

#[derive(thiserror::Error, Debug)]
pub enum CalibrationFileError {
    #[error("failed to read calibration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write calibration file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("calibration file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("calibration file {path} is not a JSON object")]
    NotAnObject { path: PathBuf },
    #[error("calibration file {path} is missing key `{key}`")]
    MissingKey { path: PathBuf, key: &'static str },
    #[error("calibration file {path}: key `{key}` is malformed: {reason}")]
    Malformed {
        path: PathBuf,
        key: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Handle to a calibration archive on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalibrationFile {
    path: PathBuf,
}

impl CalibrationFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the archive.
    pub fn load(&self) -> Result<CalibrationParameters, CalibrationFileError> {
        log::info!("reading calibration data from {}", self.path.display());
        let raw = fs::read_to_string(&self.path).map_err(|source| CalibrationFileError::Read {
            path: self.path.clone(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&raw).map_err(|source| CalibrationFileError::Parse {
                path: self.path.clone(),
                source,
            })?;
        let obj = value
            .as_object()
            .ok_or_else(|| CalibrationFileError::NotAnObject {
                path: self.path.clone(),
            })?;

        if let Some(key) = CALIBRATION_KEYS.into_iter().find(|k| !obj.contains_key(*k)) {
            return Err(CalibrationFileError::MissingKey {
                path: self.path.clone(),
                key,
            });
        }

        let fields = Fields {
            path: &self.path,
            obj,
        };
        let params = CalibrationParameters {
            intrinsics_left: fields.matrix3(KEY_CAMERA_MATRIX_LEFT)?,
            distortion_left: fields.row_vector(KEY_DIST_COEFFS_LEFT)?,
            intrinsics_right: fields.matrix3(KEY_CAMERA_MATRIX_RIGHT)?,
            distortion_right: fields.row_vector(KEY_DIST_COEFFS_RIGHT)?,
            rotation: fields.matrix3(KEY_ROTATION)?,
            translation: fields.column3(KEY_TRANSLATION)?,
        };
        params.validate()?;
        log::info!("calibration data loaded");
        Ok(params)
    }

    /// Write `params` as a pretty-printed archive, replacing any existing file.
    pub fn save(&self, params: &CalibrationParameters) -> Result<(), CalibrationFileError> {
        let mut obj = Map::new();
        obj.insert(
            KEY_CAMERA_MATRIX_LEFT.into(),
            rows_value(&params.intrinsics_left),
        );
        obj.insert(
            KEY_DIST_COEFFS_LEFT.into(),
            serde_json::to_value([&params.distortion_left])?,
        );
        obj.insert(
            KEY_CAMERA_MATRIX_RIGHT.into(),
            rows_value(&params.intrinsics_right),
        );
        obj.insert(
            KEY_DIST_COEFFS_RIGHT.into(),
            serde_json::to_value([&params.distortion_right])?,
        );
        obj.insert(KEY_ROTATION.into(), rows_value(&params.rotation));
        let t = &params.translation;
        obj.insert(
            KEY_TRANSLATION.into(),
            serde_json::to_value([[t.x], [t.y], [t.z]])?,
        );

        let json = serde_json::to_string_pretty(&Value::Object(obj))?;
        fs::write(&self.path, json).map_err(|source| CalibrationFileError::Write {
            path: self.path.clone(),
            source,
        })?;
        log::info!("calibration data written to {}", self.path.display());
        Ok(())
    }
}

fn rows_value(m: &Matrix3<f64>) -> Value {
    let rows: Vec<Vec<f64>> = (0..3)
        .map(|r| (0..3).map(|c| m[(r, c)]).collect())
        .collect();
    Value::from(rows)
}

/// Typed accessors over the parsed archive object.
struct Fields<'a> {
    path: &'a Path,
    obj: &'a Map<String, Value>,
}

impl Fields<'_> {
    fn malformed(&self, key: &'static str, reason: String) -> CalibrationFileError {
        CalibrationFileError::Malformed {
            path: self.path.to_path_buf(),
            key,
            reason,
        }
    }

    fn rows(&self, key: &'static str) -> Result<Vec<Vec<f64>>, CalibrationFileError> {
        let value = self.obj.get(key).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|e| self.malformed(key, format!("expected a nested numeric array ({e})")))
    }

    fn shape_error(
        &self,
        key: &'static str,
        expected: &str,
        rows: &[Vec<f64>],
    ) -> CalibrationFileError {
        let cols: Vec<usize> = rows.iter().map(Vec::len).collect();
        self.malformed(
            key,
            format!("expected shape {expected}, got {} rows with lengths {cols:?}", rows.len()),
        )
    }

    fn matrix3(&self, key: &'static str) -> Result<Matrix3<f64>, CalibrationFileError> {
        let rows = self.rows(key)?;
        if rows.len() != 3 || rows.iter().any(|r| r.len() != 3) {
            return Err(self.shape_error(key, "3x3", &rows));
        }
        Ok(Matrix3::from_fn(|r, c| rows[r][c]))
    }

    /// Accepts `1xN` as well as `Nx1`; both layouts occur in the wild.
    fn row_vector(&self, key: &'static str) -> Result<Vec<f64>, CalibrationFileError> {
        let rows = self.rows(key)?;
        match rows.as_slice() {
            [single] => Ok(single.clone()),
            many if !many.is_empty() && many.iter().all(|r| r.len() == 1) => {
                Ok(many.iter().map(|r| r[0]).collect())
            }
            _ => Err(self.shape_error(key, "1xN", &rows)),
        }
    }

    fn column3(&self, key: &'static str) -> Result<Vector3<f64>, CalibrationFileError> {
        let v = self.row_vector(key)?;
        if v.len() != 3 {
            return Err(self.malformed(key, format!("expected 3 elements, got {}", v.len())));
        }
        Ok(Vector3::new(v[0], v[1], v[2]))
    }
}
