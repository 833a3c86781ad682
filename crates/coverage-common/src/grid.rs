//! Raster-space rectangles.

use serde::{Deserialize, Serialize};

use crate::error::{CoverageError, CoverageResult};

/// An integer pixel window in raster space.
///
/// `x`/`y` locate the upper-left pixel and may be negative once a window has
/// been padded past the raster origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRange {
    pub x: i64,
    pub y: i64,
    pub width: usize,
    pub height: usize,
}

impl GridRange {
    /// Create a new grid range.
    pub fn new(x: i64, y: i64, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A window anchored at the raster origin.
    pub fn from_size(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Create a grid range, rejecting empty windows.
    pub fn try_new(x: i64, y: i64, width: usize, height: usize) -> CoverageResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoverageError::invalid_grid_range(format!(
                "{}x{} window at ({}, {}) is empty",
                width, height, x, y
            )));
        }
        Ok(Self::new(x, y, width, height))
    }

    /// One past the last column.
    pub fn max_x(&self) -> i64 {
        self.x.saturating_add(to_offset(self.width))
    }

    /// One past the last row.
    pub fn max_y(&self) -> i64 {
        self.y.saturating_add(to_offset(self.height))
    }

    /// Span along an axis (0 = x, 1 = y).
    pub fn span(&self, axis: usize) -> usize {
        if axis == 0 {
            self.width
        } else {
            self.height
        }
    }

    /// Check if the window covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Grow the window by `pad_x` columns and `pad_y` rows on every side.
    ///
    /// Saturates instead of overflowing for absurdly large pads.
    pub fn expand(&self, pad_x: usize, pad_y: usize) -> Self {
        Self {
            x: self.x.saturating_sub(to_offset(pad_x)),
            y: self.y.saturating_sub(to_offset(pad_y)),
            width: self.width.saturating_add(pad_x.saturating_mul(2)),
            height: self.height.saturating_add(pad_y.saturating_mul(2)),
        }
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }
}

fn to_offset(span: usize) -> i64 {
    i64::try_from(span).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand() {
        let range = GridRange::new(0, 5, 256, 128).expand(10, 3);
        assert_eq!(range, GridRange::new(-10, 2, 276, 134));
        assert_eq!(range.max_x(), 266);
        assert_eq!(range.max_y(), 136);
    }

    #[test]
    fn test_expand_saturates() {
        let range = GridRange::from_size(10, 10).expand(usize::MAX, usize::MAX / 2 + 1);
        assert_eq!(range.x, i64::MIN + 1);
        assert_eq!(range.y, i64::MIN + 1);
        assert_eq!(range.width, usize::MAX);
        assert_eq!(range.height, usize::MAX);
        assert_eq!(GridRange::new(i64::MAX - 5, 0, 10, 10).max_x(), i64::MAX);
    }

    #[test]
    fn test_try_new_rejects_empty() {
        assert!(GridRange::try_new(0, 0, 0, 10).is_err());
        assert!(GridRange::try_new(0, 0, 10, 10).is_ok());
        assert!(GridRange::from_size(0, 4).is_empty());
    }
}
