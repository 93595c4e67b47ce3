//! Core types for the stereo-rig pipeline.
//!
//! This crate is purely data and geometry: images and pixel formats, regions
//! of interest, frame pairs, stereo calibration parameters and their on-disk
//! archive. It does not talk to devices or run any solver.

mod archive;
mod convert;
pub mod draw;
mod frame;
mod image;
mod params;
mod roi;

pub use archive::{CalibrationFile, CalibrationFileError, CALIBRATION_KEYS};
pub use frame::{FramePair, Side};
pub use image::{
    sample_bilinear, sample_bilinear_u8, Image, ImageError, ImageSize, ImageView, PixelFormat,
};
pub use params::{CalibrationParameters, ParamsError, DISTORTION_LENGTHS};
pub use roi::Roi;

