//! Overlay primitives for preview frames.

use crate::{Image, PixelFormat, Roi};

/// BGR colour; gray images receive its luma.
pub type Color = [u8; 3];

pub const GUIDE_GREEN: Color = [0, 128, 0];
pub const ROI_BLUE: Color = [255, 0, 0];
pub const OVERLAP_GREEN: Color = [0, 255, 0];

fn put(image: &mut Image, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 || x >= image.width as i32 || y >= image.height as i32 {
        return;
    }
    let format = image.format;
    let px = image.pixel_mut(x as usize, y as usize);
    match format {
        PixelFormat::Bgr8 => px.copy_from_slice(&color),
        _ => {
            let [b, g, r] = color.map(u32::from);
            px[0] = ((114 * b + 587 * g + 299 * r) / 1000) as u8;
        }
    }
}

/// Horizontal line across the full width.
pub fn draw_hline(image: &mut Image, y: i32, color: Color) {
    for x in 0..image.width as i32 {
        put(image, x, y, color);
    }
}

/// `lines` evenly spaced horizontal guides for judging row alignment.
///
/// Guides sit at `i * height / (lines + 1)` for `i` in `0..=lines`. Zero
/// lines draws nothing.
pub fn draw_guides(image: &mut Image, lines: usize, color: Color) {
    if lines == 0 {
        return;
    }
    let interval = image.height / (lines + 1);
    for i in 0..=lines {
        draw_hline(image, (i * interval) as i32, color);
    }
}

/// Rectangle outline, `thickness` pixels wide, drawn inside `roi`.
pub fn draw_rect(image: &mut Image, roi: &Roi, color: Color, thickness: i32) {
    if roi.is_empty() {
        return;
    }
    let t = thickness.max(1).min(roi.width).min(roi.height);
    let (inner_x, inner_y) = (roi.x.saturating_add(t), roi.y.saturating_add(t));
    let (outer_x, outer_y) = (roi.right() - t, roi.bottom() - t);
    let ys = roi.y.max(0)..roi.bottom().min(image.height as i32);
    for y in ys {
        for x in roi.x.max(0)..roi.right().min(image.width as i32) {
            let on_edge = x < inner_x || x >= outer_x || y < inner_y || y >= outer_y;
            if on_edge {
                put(image, x, y, color);
            }
        }
    }
}
