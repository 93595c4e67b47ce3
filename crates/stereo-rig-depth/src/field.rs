use crate::colormap::jet;
use serde::{Deserialize, Serialize};
use stereo_rig_core::{Image, ImageSize, PixelFormat};

/// Fixed-point scale of matcher output: raw values are disparity * 16.
pub const DISPARITY_SCALE: f32 = 16.0;

/// Matcher output in fixed point (4 fractional bits).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawDisparity {
    pub width: usize,
    pub height: usize,
    pub data: Vec<i16>,
}

impl RawDisparity {
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }
}

/// Near/far indicator in disparity pixels.
///
/// This is a relative proxy: larger disparity means closer. No baseline or
/// focal length is applied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthBounds {
    pub min: f32,
    pub max: f32,
}

/// Per-pixel disparity in pixels, same extent as the matched images.
///
/// Pixels the matcher could not resolve sit below `min_disparity` and are
/// excluded from bounds and normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct DisparityField {
    width: usize,
    height: usize,
    min_disparity: f32,
    data: Vec<f32>,
}

impl DisparityField {
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            min_disparity: 0.0,
            data: Vec::new(),
        }
    }

    /// Scale raw matcher output to pixel units.
    pub fn from_raw(raw: &RawDisparity, min_disparity: i32) -> Self {
        Self {
            width: raw.width,
            height: raw.height,
            min_disparity: min_disparity as f32,
            data: raw
                .data
                .iter()
                .map(|&d| d as f32 / DISPARITY_SCALE)
                .collect(),
        }
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn is_valid(&self, d: f32) -> bool {
        d.is_finite() && d >= self.min_disparity
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&d| self.is_valid(d)).count()
    }

    /// Min and max over valid pixels; `None` if there are none.
    pub fn bounds(&self) -> Option<DepthBounds> {
        self.data
            .iter()
            .copied()
            .filter(|&d| self.is_valid(d))
            .fold(None, |acc, d| match acc {
                None => Some(DepthBounds { min: d, max: d }),
                Some(b) => Some(DepthBounds {
                    min: b.min.min(d),
                    max: b.max.max(d),
                }),
            })
    }

    /// Min-max stretch of valid pixels onto `0..=255`; invalid pixels map to 0.
    /// A constant field maps to 0 everywhere.
    pub fn normalized_u8(&self) -> Image {
        let mut out = Image::zeros(self.width, self.height, PixelFormat::Gray8);
        let Some(b) = self.bounds() else {
            return out;
        };
        let range = b.max - b.min;
        if range <= f32::EPSILON {
            return out;
        }
        let scale = 255.0 / range;
        for (o, &d) in out.data.iter_mut().zip(&self.data) {
            if self.is_valid(d) {
                *o = ((d - b.min) * scale).round().clamp(0.0, 255.0) as u8;
            }
        }
        out
    }

    /// JET-coloured BGR rendering of [`Self::normalized_u8`].
    pub fn colorize(&self) -> Image {
        let gray = self.normalized_u8();
        let mut out = Image::zeros(self.width, self.height, PixelFormat::Bgr8);
        for (px, &v) in out.data.chunks_exact_mut(3).zip(&gray.data) {
            px.copy_from_slice(&jet(v));
        }
        out
    }
}
