//! Common types shared by the coverage reading crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;

pub use bbox::BoundingBox;
pub use crs::{AxisOrder, Crs, CrsCode};
pub use error::{CoverageError, CoverageResult};
pub use grid::GridRange;
