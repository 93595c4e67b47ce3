use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in post-rectification pixel coordinates.
///
/// `x`/`y` are the top-left corner; the rectangle spans `[x, x + width)` by
/// `[y, y + height)`. Edges saturate at the `i32` range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Roi {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_array(v: [i32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }

    pub fn to_array(&self) -> [i32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[inline]
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    /// Common region of two rectangles, or `None` when they do not overlap.
    ///
    /// Touching edges (`x1 == x2` or `y1 == y2`) count as no overlap.
    pub fn intersect(&self, other: &Roi) -> Option<Roi> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x1 < x2 && y1 < y2 {
            Some(Roi::new(x1, y1, x2 - x1, y2 - y1))
        } else {
            None
        }
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Roi) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

impl std::fmt::Display for Roi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_rois_do_not_overlap() {
        let a = Roi::new(0, 0, 10, 10);
        let b = Roi::new(20, 20, 10, 10);
        assert_eq!(a.intersect(&b), None);
        assert_eq!(b.intersect(&a), None);
    }

    #[test]
    fn partial_overlap_is_clipped() {
        let a = Roi::new(0, 0, 10, 10);
        let b = Roi::new(5, 5, 10, 10);
        assert_eq!(a.intersect(&b), Some(Roi::new(5, 5, 5, 5)));
    }

    #[test]
    fn touching_edges_are_not_an_overlap() {
        let a = Roi::new(0, 0, 10, 10);
        let b = Roi::new(10, 0, 10, 10);
        assert_eq!(a.intersect(&b), None);
    }

    #[test]
    fn intersection_is_commutative_and_contained() {
        let rois = [
            Roi::new(0, 0, 10, 10),
            Roi::new(5, 5, 10, 10),
            Roi::new(-4, 3, 30, 2),
            Roi::new(2, -8, 3, 40),
            Roi::new(20, 20, 10, 10),
            Roi::new(1, 1, 0, 5),
            Roi::new(7, 0, 100, 100),
        ];
        for a in &rois {
            for b in &rois {
                let ab = a.intersect(b);
                assert_eq!(ab, b.intersect(a), "{a} vs {b}");
                if let Some(r) = ab {
                    assert!(!r.is_empty());
                    assert!(a.contains(&r) && b.contains(&r), "{r} not inside {a} and {b}");
                }
            }
        }
    }

    #[test]
    fn extreme_rois_intersect_without_overflow() {
        let far = Roi::new(i32::MAX - 5, 0, 10, 10);
        assert_eq!(far.right(), i32::MAX);
        assert_eq!(far.intersect(&Roi::new(0, 0, 10, 10)), None);
        assert_eq!(
            far.intersect(&Roi::new(i32::MAX - 8, 2, 6, 6)),
            Some(Roi::new(i32::MAX - 5, 2, 3, 6))
        );
        let huge = Roi::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        let everything = Roi::new(-1, -1, i32::MAX, i32::MAX);
        let r = huge.intersect(&everything);
        assert_eq!(r, None);
    }

    #[test]
    fn offset_square_rois_overlap_by_ninety() {
        let a = Roi::new(0, 0, 100, 100);
        let b = Roi::new(10, 10, 100, 100);
        assert_eq!(a.intersect(&b), Some(Roi::new(10, 10, 90, 90)));
    }

    #[test]
    fn area_of_degenerate_roi_is_zero() {
        assert_eq!(Roi::new(3, 3, -2, 5).area(), 0);
        assert_eq!(Roi::new(0, 0, 4, 5).area(), 20);
    }
}
