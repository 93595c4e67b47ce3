//! Conversions between [`image`] buffers and the pipeline's [`Image`].
//!
//! `image` stores colour as RGB; pipeline images are BGR.

use crate::{PreviewFrame, PreviewView};
use std::path::{Path, PathBuf};
use stereo_rig_core::{Image, ImageError, PixelFormat};

#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: ::image::ImageError,
    },
}

/// Copy an `image::GrayImage` into a `Gray8` image.
pub fn from_gray_image(img: &::image::GrayImage) -> Result<Image, ImageError> {
    Image::new(
        img.width() as usize,
        img.height() as usize,
        PixelFormat::Gray8,
        img.as_raw().clone(),
    )
}

/// Copy an `image::RgbImage` into a `Bgr8` image.
pub fn from_rgb_image(img: &::image::RgbImage) -> Result<Image, ImageError> {
    let mut data = img.as_raw().clone();
    for px in data.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
    Image::new(
        img.width() as usize,
        img.height() as usize,
        PixelFormat::Bgr8,
        data,
    )
}

/// Any pipeline image as `image::RgbImage`; Bayer and gray inputs are
/// converted to BGR first.
pub fn to_rgb_image(image: &Image) -> ::image::RgbImage {
    let bgr = image.to_bgr();
    ::image::RgbImage::from_fn(bgr.width as u32, bgr.height as u32, |x, y| {
        let p = bgr.pixel(x as usize, y as usize);
        ::image::Rgb([p[2], p[1], p[0]])
    })
}

/// Write every view of `frame` as `<prefix>_<title>.png` under `dir`.
///
/// Returns the written paths in view order.
pub fn save_views(
    frame: &PreviewFrame,
    dir: impl AsRef<Path>,
    prefix: &str,
) -> Result<Vec<PathBuf>, ConvertError> {
    let dir = dir.as_ref();
    frame
        .views
        .iter()
        .map(|PreviewView { title, image }| {
            let path = dir.join(format!("{prefix}_{title}.png"));
            to_rgb_image(image)
                .save(&path)
                .map_err(|source| ConvertError::Write {
                    path: path.clone(),
                    source,
                })?;
            log::debug!("wrote {}", path.display());
            Ok(path)
        })
        .collect()
}
