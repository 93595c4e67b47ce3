use crate::Roi;
use serde::{Deserialize, Serialize};

/// Byte layout of an [`Image`] buffer.
///
/// All formats are 8 bits per sample, row-major, tightly packed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    Gray8,
    /// Blue, green, red interleaved.
    Bgr8,
    /// Raw Bayer mosaics, named after the top-left 2x2 cell.
    BayerRg8,
    BayerGr8,
    BayerGb8,
    BayerBg8,
}

impl PixelFormat {
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Bgr8 => 3,
            _ => 1,
        }
    }

    #[inline]
    pub fn is_bayer(self) -> bool {
        matches!(
            self,
            PixelFormat::BayerRg8
                | PixelFormat::BayerGr8
                | PixelFormat::BayerGb8
                | PixelFormat::BayerBg8
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: usize,
    pub height: usize,
}

impl ImageSize {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("invalid image buffer length for {width}x{height} {format:?} (expected {expected} bytes, got {got})")]
    BufferLength {
        width: usize,
        height: usize,
        format: PixelFormat,
        expected: usize,
        got: usize,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub data: &'a [u8], // row-major, len = w*h*channels
}

/// Owned pixel buffer handed between pipeline stages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl Image {
    /// Wrap an existing buffer, checking its length against the layout.
    pub fn new(
        width: usize,
        height: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, ImageError> {
        let expected = width * height * format.channels();
        if data.len() != expected {
            return Err(ImageError::BufferLength {
                width,
                height,
                format,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn zeros(width: usize, height: usize, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: vec![0; width * height * format.channels()],
        }
    }

    #[inline]
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            width: self.width,
            height: self.height,
            format: self.format,
            data: &self.data,
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let c = self.channels();
        let i = (y * self.width + x) * c;
        &self.data[i..i + c]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [u8] {
        let c = self.channels();
        let i = (y * self.width + x) * c;
        &mut self.data[i..i + c]
    }

    /// Copy of the sub-rectangle `roi`, clamped to the image bounds.
    ///
    /// A ROI that falls entirely outside the image yields an empty image.
    pub fn crop(&self, roi: &Roi) -> Image {
        let x0 = roi.x.clamp(0, self.width as i32) as usize;
        let y0 = roi.y.clamp(0, self.height as i32) as usize;
        let x1 = roi.right().clamp(0, self.width as i32) as usize;
        let y1 = roi.bottom().clamp(0, self.height as i32) as usize;
        let w = x1.saturating_sub(x0);
        let h = y1.saturating_sub(y0);

        let c = self.channels();
        let mut data = Vec::with_capacity(w * h * c);
        for y in y0..y0 + h {
            let start = (y * self.width + x0) * c;
            data.extend_from_slice(&self.data[start..start + w * c]);
        }
        Image {
            width: w,
            height: h,
            format: self.format,
            data,
        }
    }

    /// Split a side-by-side frame at the vertical midpoint.
    ///
    /// Both halves are `width / 2` wide; for odd widths the last column is dropped.
    pub fn split_vertical(&self) -> (Image, Image) {
        let half = (self.width / 2) as i32;
        let h = self.height as i32;
        let left = self.crop(&Roi::new(0, 0, half, h));
        let right = self.crop(&Roi::new(half, 0, half, h));
        (left, right)
    }
}

#[inline]
fn get_sample(src: &ImageView<'_>, x: i32, y: i32, channel: usize) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return 0;
    }
    let c = src.format.channels();
    src.data[(y as usize * src.width + x as usize) * c + channel]
}

/// Bilinear sample of one channel; out-of-bounds neighbours read as 0.
#[inline]
pub fn sample_bilinear(src: &ImageView<'_>, x: f32, y: f32, channel: usize) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_sample(src, x0, y0, channel) as f32;
    let p10 = get_sample(src, x0 + 1, y0, channel) as f32;
    let p01 = get_sample(src, x0, y0 + 1, channel) as f32;
    let p11 = get_sample(src, x0 + 1, y0 + 1, channel) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[inline]
pub fn sample_bilinear_u8(src: &ImageView<'_>, x: f32, y: f32, channel: usize) -> u8 {
    sample_bilinear(src, x, y, channel).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> Image {
        let data = (0..width * height).map(|i| (i % 251) as u8).collect();
        Image::new(width, height, PixelFormat::Gray8, data).expect("valid buffer")
    }

    #[test]
    fn new_rejects_short_buffer() {
        let err = Image::new(4, 4, PixelFormat::Bgr8, vec![0; 16]).unwrap_err();
        assert_eq!(
            err,
            ImageError::BufferLength {
                width: 4,
                height: 4,
                format: PixelFormat::Bgr8,
                expected: 48,
                got: 16,
            }
        );
    }

    #[test]
    fn crop_copies_sub_rectangle() {
        let img = ramp(10, 8);
        let out = img.crop(&Roi::new(2, 3, 4, 2));
        assert_eq!(out.size(), ImageSize::new(4, 2));
        assert_eq!(out.pixel(0, 0), img.pixel(2, 3));
        assert_eq!(out.pixel(3, 1), img.pixel(5, 4));
    }

    #[test]
    fn crop_clamps_to_bounds() {
        let img = ramp(10, 8);
        let out = img.crop(&Roi::new(-3, 6, 20, 20));
        assert_eq!(out.size(), ImageSize::new(10, 2));

        let outside = img.crop(&Roi::new(50, 50, 5, 5));
        assert!(outside.is_empty());
        assert!(outside.data.is_empty());
    }

    #[test]
    fn split_vertical_drops_odd_column() {
        let img = ramp(7, 3);
        let (l, r) = img.split_vertical();
        assert_eq!(l.size(), ImageSize::new(3, 3));
        assert_eq!(r.size(), ImageSize::new(3, 3));
        assert_eq!(r.pixel(0, 0), img.pixel(3, 0));
        assert_eq!(r.pixel(2, 2), img.pixel(5, 2));
    }

    #[test]
    fn bilinear_interpolates_between_samples() {
        let img = Image::new(2, 1, PixelFormat::Gray8, vec![10, 30]).unwrap();
        let v = img.view();
        assert_eq!(sample_bilinear(&v, 0.5, 0.0, 0), 20.0);
        assert_eq!(sample_bilinear_u8(&v, 1.0, 0.0, 0), 30);
        assert_eq!(sample_bilinear(&v, -2.0, 0.0, 0), 0.0);
    }
}
