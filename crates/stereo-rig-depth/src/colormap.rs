//! JET false-colour map.

/// BGR colour for intensity `v`: blue at 0 through cyan, yellow, to red at 255.
#[inline]
pub fn jet(v: u8) -> [u8; 3] {
    let t = v as f32 / 255.0;
    let channel = |center: f32| {
        let c = (1.5 - (4.0 * t - center).abs()).clamp(0.0, 1.0);
        (c * 255.0).round() as u8
    };
    [channel(1.0), channel(2.0), channel(3.0)]
}
