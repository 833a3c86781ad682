//! Read planning for multi-resolution rasters.
//!
//! Given a requested output grid, this crate decides which stored level of a
//! coverage (full resolution or one of its overviews) to decode, how much
//! the decoder may subsample that level, and how far to grow the requested
//! window so an interpolating resampler has enough context at the edges.
//! It never touches pixel data.
//!
//! # Architecture
//!
//! ```text
//! Read request (GridGeometry + ReadParameters)
//!      │
//!      ▼
//! CoverageReader::plan_read
//!      │
//!      ├─► ReadPaddingCalculator: grow window for the interpolation kernel
//!      │
//!      ├─► RequestedResolutionCalculator: requested resolution in native CRS
//!      │         │
//!      │         ├─► same CRS: pixel size of the grid-to-world transform
//!      │         │
//!      │         └─► other CRS: classic or accurate estimate
//!      │
//!      ├─► ResolutionLevels::pick_level (OverviewPolicy)
//!      │
//!      └─► DecimationController: subsampling of the chosen level
//!               │
//!               ▼
//!          ReadPlan handed to the decoder
//! ```
//!
//! # Example
//!
//! ```ignore
//! use coverage_reader::{CoverageInfo, CoverageReader, GridGeometry, ReadParameters, ReaderConfig};
//!
//! let info = CoverageInfo::new(crs, envelope, 4096, 4096).with_power_of_two_overviews(4);
//! let reader = CoverageReader::new(info, ReaderConfig::from_env());
//!
//! let request = GridGeometry::from_envelope(bbox, 256, 256, crs)?;
//! let plan = reader.plan_read(&request, &ReadParameters::default())?;
//! decoder.read(plan.level_index, plan.subsampling, &plan.read_geometry)?;
//! ```

pub mod config;
pub mod decimation;
pub mod error;
pub mod metadata;
pub mod overview;
pub mod padding;
pub mod reader;
pub mod resolution;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{ReadParameters, ReaderConfig};
pub use decimation::{compute_subsampling, DecimationController};
pub use error::{ReaderError, Result};
pub use metadata::{CoverageInfo, OverviewInfo, ReaderMetadata};
pub use overview::{OverviewsController, ResolutionLevel, ResolutionLevels};
pub use padding::{ReadPaddingCalculator, DEFAULT_PADDING, MAX_PADDING};
pub use reader::CoverageReader;
pub use resolution::{RequestedResolutionCalculator, ACCURATE_SAMPLES_PER_AXIS};
pub use types::{
    DecimationPolicy, GridGeometry, GridToWorld, InterpolationMethod, OverviewPolicy, Padding,
    ReadPlan, Resolution, SubsamplingFactors, FULL_RESOLUTION_LEVEL,
};
