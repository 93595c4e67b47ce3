use crate::Side;
use nalgebra::{Matrix3, Vector3};

/// Distortion vector lengths accepted by the rational/thin-prism/tilted models.
pub const DISTORTION_LENGTHS: [usize; 5] = [4, 5, 8, 12, 14];

const ROTATION_TOLERANCE: f64 = 1e-4;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("{field} contains non-finite values")]
    NonFinite { field: &'static str },
    #[error("{side} intrinsics are not a valid camera matrix (fx={fx}, fy={fy})")]
    InvalidIntrinsics { side: Side, fx: f64, fy: f64 },
    #[error("{side} distortion has {len} coefficients (expected one of 4, 5, 8, 12, 14)")]
    DistortionLength { side: Side, len: usize },
    #[error("rotation is not orthonormal (|R^T R - I| = {deviation:.3e}, det = {det:.6})")]
    RotationNotOrthonormal { deviation: f64, det: f64 },
    #[error("translation has zero length; the cameras share a centre")]
    ZeroBaseline,
}

/// Stereo intrinsics and extrinsics produced by calibration.
///
/// The pipeline never interprets these beyond [`CalibrationParameters::validate`];
/// they are forwarded to the rectification solver as-is.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationParameters {
    pub intrinsics_left: Matrix3<f64>,
    pub distortion_left: Vec<f64>,
    pub intrinsics_right: Matrix3<f64>,
    pub distortion_right: Vec<f64>,
    /// Rotation from the left to the right camera frame.
    pub rotation: Matrix3<f64>,
    /// Translation from the left to the right camera frame.
    pub translation: Vector3<f64>,
}

impl CalibrationParameters {
    pub fn intrinsics(&self, side: Side) -> &Matrix3<f64> {
        match side {
            Side::Left => &self.intrinsics_left,
            Side::Right => &self.intrinsics_right,
        }
    }

    pub fn distortion(&self, side: Side) -> &[f64] {
        match side {
            Side::Left => &self.distortion_left,
            Side::Right => &self.distortion_right,
        }
    }

    /// Check that every block is present, finite and structurally consistent.
    pub fn validate(&self) -> Result<(), ParamsError> {
        check_finite("intrinsics_left", self.intrinsics_left.iter())?;
        check_finite("intrinsics_right", self.intrinsics_right.iter())?;
        check_finite("distortion_left", self.distortion_left.iter())?;
        check_finite("distortion_right", self.distortion_right.iter())?;
        check_finite("rotation", self.rotation.iter())?;
        check_finite("translation", self.translation.iter())?;

        for side in [Side::Left, Side::Right] {
            let k = self.intrinsics(side);
            let (fx, fy) = (k[(0, 0)], k[(1, 1)]);
            let bottom_ok = k[(2, 0)] == 0.0 && k[(2, 1)] == 0.0 && (k[(2, 2)] - 1.0).abs() < 1e-9;
            if fx <= 0.0 || fy <= 0.0 || !bottom_ok {
                return Err(ParamsError::InvalidIntrinsics { side, fx, fy });
            }

            let len = self.distortion(side).len();
            if !DISTORTION_LENGTHS.contains(&len) {
                return Err(ParamsError::DistortionLength { side, len });
            }
        }

        let deviation = (self.rotation.transpose() * self.rotation - Matrix3::identity()).norm();
        let det = self.rotation.determinant();
        if deviation > ROTATION_TOLERANCE || (det - 1.0).abs() > ROTATION_TOLERANCE {
            return Err(ParamsError::RotationNotOrthonormal { deviation, det });
        }

        if self.translation.norm() <= f64::EPSILON {
            return Err(ParamsError::ZeroBaseline);
        }
        Ok(())
    }
}

fn check_finite<'a>(
    field: &'static str,
    mut values: impl Iterator<Item = &'a f64>,
) -> Result<(), ParamsError> {
    if values.all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ParamsError::NonFinite { field })
    }
}
