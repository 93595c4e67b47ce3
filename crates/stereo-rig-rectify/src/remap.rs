use stereo_rig_core::{sample_bilinear_u8, Image, ImageSize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RemapError {
    #[error("remap table {width}x{height} needs {expected} entries per map, got x={got_x}, y={got_y}")]
    Length {
        width: usize,
        height: usize,
        expected: usize,
        got_x: usize,
        got_y: usize,
    },
}

/// Dense per-pixel lookup: output pixel `(x, y)` samples the source image at
/// `(map_x[i], map_y[i])` with `i = y * width + x`.
#[derive(Clone, Debug, PartialEq)]
pub struct RemapTable {
    width: usize,
    height: usize,
    map_x: Vec<f32>,
    map_y: Vec<f32>,
}

impl RemapTable {
    pub fn new(
        width: usize,
        height: usize,
        map_x: Vec<f32>,
        map_y: Vec<f32>,
    ) -> Result<Self, RemapError> {
        let expected = width * height;
        if map_x.len() != expected || map_y.len() != expected {
            return Err(RemapError::Length {
                width,
                height,
                expected,
                got_x: map_x.len(),
                got_y: map_y.len(),
            });
        }
        Ok(Self {
            width,
            height,
            map_x,
            map_y,
        })
    }

    /// Build from a function of the output pixel coordinates.
    pub fn from_fn<F>(size: ImageSize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> (f32, f32),
    {
        let n = size.area();
        let mut map_x = Vec::with_capacity(n);
        let mut map_y = Vec::with_capacity(n);
        for y in 0..size.height {
            for x in 0..size.width {
                let (sx, sy) = f(x, y);
                map_x.push(sx);
                map_y.push(sy);
            }
        }
        Self {
            width: size.width,
            height: size.height,
            map_x,
            map_y,
        }
    }

    pub fn identity(size: ImageSize) -> Self {
        Self::from_fn(size, |x, y| (x as f32, y as f32))
    }

    #[inline]
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }

    #[inline]
    pub fn lookup(&self, x: usize, y: usize) -> (f32, f32) {
        let i = y * self.width + x;
        (self.map_x[i], self.map_y[i])
    }

    /// Resample `src` through the table. Samples falling outside `src` are
    /// black; the output keeps the source pixel format.
    pub fn remap(&self, src: &Image) -> Image {
        let view = src.view();
        let c = src.channels();
        let mut out = Image::zeros(self.width, self.height, src.format);
        for (i, px) in out.data.chunks_exact_mut(c).enumerate() {
            let (sx, sy) = (self.map_x[i], self.map_y[i]);
            for (ch, v) in px.iter_mut().enumerate() {
                *v = sample_bilinear_u8(&view, sx, sy, ch);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stereo_rig_core::PixelFormat;

    fn gradient(w: usize, h: usize) -> Image {
        let data = (0..w * h).map(|i| (i * 7 % 251) as u8).collect();
        Image::new(w, h, PixelFormat::Gray8, data).expect("image")
    }

    #[test]
    fn identity_table_reproduces_input() {
        let src = gradient(9, 5);
        let table = RemapTable::identity(src.size());
        assert_eq!(table.remap(&src), src);
    }

    #[test]
    fn integer_shift_moves_pixels() {
        let src = gradient(6, 4);
        let table = RemapTable::from_fn(src.size(), |x, y| (x as f32 + 1.0, y as f32));
        let out = table.remap(&src);
        assert_eq!(out.pixel(0, 2), src.pixel(1, 2));
        assert_eq!(out.pixel(4, 3), src.pixel(5, 3));
        // the last column samples past the edge
        assert_eq!(out.pixel(5, 0), &[0]);
    }

    #[test]
    fn half_pixel_offset_interpolates() {
        let src = Image::new(2, 1, PixelFormat::Gray8, vec![10, 30]).expect("image");
        let table = RemapTable::from_fn(ImageSize::new(1, 1), |_, _| (0.5, 0.0));
        assert_eq!(table.remap(&src).data, vec![20]);
    }

    #[test]
    fn color_channels_are_sampled_independently() {
        let src = Image::new(1, 1, PixelFormat::Bgr8, vec![1, 2, 3]).expect("image");
        let out = RemapTable::identity(src.size()).remap(&src);
        assert_eq!(out.format, PixelFormat::Bgr8);
        assert_eq!(out.data, vec![1, 2, 3]);
    }

    #[test]
    fn new_checks_lengths() {
        let err = RemapTable::new(2, 2, vec![0.0; 4], vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, RemapError::Length { expected: 4, got_y: 3, .. }));
    }
}
