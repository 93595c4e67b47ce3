//! Pixel-format conversion.
//!
//! Every frame leaving a frame source is 3-channel BGR; matchers and pattern
//! detectors consume single-channel intensity. Gray weights follow ITU-R
//! BT.601 in 14-bit fixed point.

use crate::{Image, PixelFormat};

#[cfg(feature = "tracing")]
use tracing::instrument;

const GRAY_SHIFT: u32 = 14;
const GRAY_R: u32 = 4899;
const GRAY_G: u32 = 9617;
const GRAY_B: u32 = 1868;

#[inline]
fn luma(b: u8, g: u8, r: u8) -> u8 {
    let v = GRAY_B * b as u32 + GRAY_G * g as u32 + GRAY_R * r as u32 + (1 << (GRAY_SHIFT - 1));
    (v >> GRAY_SHIFT).min(255) as u8
}

/// Superpixel demosaic: every pixel takes R and B from its 2x2 cell and the
/// mean of the two greens.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "trace", skip_all, fields(width = src.width, height = src.height))
)]
fn demosaic(src: &Image, red: (usize, usize), blue: (usize, usize)) -> Image {
    let mut out = Image::zeros(src.width, src.height, PixelFormat::Bgr8);
    if src.width < 2 || src.height < 2 {
        for (dst, &v) in out.data.chunks_exact_mut(3).zip(src.data.iter()) {
            dst.fill(v);
        }
        return out;
    }

    let at = |x: usize, y: usize| src.data[y * src.width + x];
    for y in 0..src.height {
        let by = (y & !1).min(src.height - 2);
        for x in 0..src.width {
            let bx = (x & !1).min(src.width - 2);
            let r = at(bx + red.0, by + red.1);
            let b = at(bx + blue.0, by + blue.1);
            // The two greens sit on the anti-diagonal of the red/blue pair.
            let g0 = at(bx + blue.0, by + red.1) as u16;
            let g1 = at(bx + red.0, by + blue.1) as u16;
            let g = ((g0 + g1 + 1) / 2) as u8;
            out.pixel_mut(x, y).copy_from_slice(&[b, g, r]);
        }
    }
    out
}

impl Image {
    /// Convert to the 3-channel BGR contract used by every frame source.
    pub fn to_bgr(&self) -> Image {
        match self.format {
            PixelFormat::Bgr8 => self.clone(),
            PixelFormat::Gray8 => {
                let data = self.data.iter().flat_map(|&v| [v, v, v]).collect();
                Image {
                    width: self.width,
                    height: self.height,
                    format: PixelFormat::Bgr8,
                    data,
                }
            }
            // (red, blue) offsets inside the 2x2 cell.
            PixelFormat::BayerRg8 => demosaic(self, (0, 0), (1, 1)),
            PixelFormat::BayerGr8 => demosaic(self, (1, 0), (0, 1)),
            PixelFormat::BayerGb8 => demosaic(self, (0, 1), (1, 0)),
            PixelFormat::BayerBg8 => demosaic(self, (1, 1), (0, 0)),
        }
    }

    /// Convert to single-channel intensity.
    pub fn to_gray(&self) -> Image {
        match self.format {
            PixelFormat::Gray8 => self.clone(),
            PixelFormat::Bgr8 => {
                let data = self
                    .data
                    .chunks_exact(3)
                    .map(|p| luma(p[0], p[1], p[2]))
                    .collect();
                Image {
                    width: self.width,
                    height: self.height,
                    format: PixelFormat::Gray8,
                    data,
                }
            }
            _ => self.to_bgr().to_gray(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_to_bgr_replicates_channels() {
        let img = Image::new(2, 1, PixelFormat::Gray8, vec![7, 200]).unwrap();
        let bgr = img.to_bgr();
        assert_eq!(bgr.format, PixelFormat::Bgr8);
        assert_eq!(bgr.data, vec![7, 7, 7, 200, 200, 200]);
    }

    #[test]
    fn bgr_to_gray_uses_bt601_weights() {
        let img = Image::new(
            4,
            1,
            PixelFormat::Bgr8,
            vec![0, 0, 255, 0, 255, 0, 255, 0, 0, 90, 90, 90],
        )
        .unwrap();
        let gray = img.to_gray();
        assert_eq!(gray.data, vec![76, 150, 29, 90]);
    }

    #[test]
    fn bayer_rg_demosaics_uniform_cells() {
        // One RGGB cell: R=200, G=100/120, B=50.
        let img = Image::new(2, 2, PixelFormat::BayerRg8, vec![200, 100, 120, 50]).unwrap();
        let bgr = img.to_bgr();
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(bgr.pixel(x, y), &[50, 110, 200]);
            }
        }
    }

    #[test]
    fn bayer_bg_swaps_red_and_blue() {
        let img = Image::new(2, 2, PixelFormat::BayerBg8, vec![50, 100, 120, 200]).unwrap();
        let bgr = img.to_bgr();
        assert_eq!(bgr.pixel(1, 1), &[50, 110, 200]);
    }

    #[test]
    fn odd_sized_bayer_clamps_to_last_full_cell() {
        let data = vec![
            10, 20, 10, //
            20, 30, 20, //
            10, 20, 10,
        ];
        let img = Image::new(3, 3, PixelFormat::BayerRg8, data).unwrap();
        let bgr = img.to_bgr();
        assert_eq!(bgr.size(), img.size());
        // (2, 2) reads the cell anchored at (1, 1): R=30, G=20, B=10.
        assert_eq!(bgr.pixel(2, 2), &[10, 20, 30]);
        assert_eq!(bgr.pixel(0, 0), &[30, 20, 10]);
    }
}
