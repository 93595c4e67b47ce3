use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Inner-corner grid size of a chessboard pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternSize {
    pub cols: u32,
    pub rows: u32,
}

impl PatternSize {
    pub const fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }

    #[inline]
    pub fn corner_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

impl std::fmt::Display for PatternSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// Physical description of the calibration board.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSpec {
    /// Inner corners per row.
    pub cols: u32,
    /// Inner corners per column.
    pub rows: u32,
    /// Edge length of one square in world units (metres by convention).
    pub square_size: f32,
}

impl Default for BoardSpec {
    fn default() -> Self {
        Self {
            cols: 8,
            rows: 6,
            square_size: 0.025,
        }
    }
}

impl BoardSpec {
    pub fn pattern(&self) -> PatternSize {
        PatternSize::new(self.cols, self.rows)
    }

    /// Board-frame corner positions on the `z = 0` plane.
    ///
    /// Row-major: the column index varies fastest, matching the order in
    /// which detectors report corners.
    pub fn object_points(&self) -> Vec<Point3<f32>> {
        let mut pts = Vec::with_capacity(self.pattern().corner_count());
        for j in 0..self.rows {
            for i in 0..self.cols {
                pts.push(Point3::new(
                    i as f32 * self.square_size,
                    j as f32 * self.square_size,
                    0.0,
                ));
            }
        }
        pts
    }
}
