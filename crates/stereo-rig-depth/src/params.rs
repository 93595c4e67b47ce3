use serde::{Deserialize, Serialize};

/// Semi-global block matching settings, passed to the matcher verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherParams {
    pub min_disparity: i32,
    /// Search range; a positive multiple of 16.
    pub num_disparities: i32,
    /// Odd matching window size.
    pub block_size: i32,
    /// Margin in percent by which the best cost must beat the runner-up.
    pub uniqueness_ratio: i32,
    /// Largest blob treated as speckle noise; 0 disables the filter.
    pub speckle_window_size: i32,
    /// Max disparity variation inside a connected component.
    pub speckle_range: i32,
}

impl Default for MatcherParams {
    fn default() -> Self {
        Self {
            min_disparity: 0,
            num_disparities: 16,
            block_size: 5,
            uniqueness_ratio: 15,
            speckle_window_size: 150,
            speckle_range: 1,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid matcher parameter `{field}` = {value}: {expected}")]
pub struct InvalidParams {
    pub field: &'static str,
    pub value: i32,
    pub expected: &'static str,
}

impl MatcherParams {
    /// Range sanity only; matching quality is the matcher's concern.
    pub fn validate(&self) -> Result<(), InvalidParams> {
        let fail = |field, value, expected| {
            Err(InvalidParams {
                field,
                value,
                expected,
            })
        };
        if self.num_disparities <= 0 || self.num_disparities % 16 != 0 {
            return fail(
                "num_disparities",
                self.num_disparities,
                "positive multiple of 16",
            );
        }
        if self.block_size < 1 || self.block_size % 2 == 0 {
            return fail("block_size", self.block_size, "odd and >= 1");
        }
        if !(0..=100).contains(&self.uniqueness_ratio) {
            return fail("uniqueness_ratio", self.uniqueness_ratio, "0..=100");
        }
        if self.speckle_window_size < 0 {
            return fail("speckle_window_size", self.speckle_window_size, ">= 0");
        }
        if self.speckle_range < 0 {
            return fail("speckle_range", self.speckle_range, ">= 0");
        }
        Ok(())
    }
}
