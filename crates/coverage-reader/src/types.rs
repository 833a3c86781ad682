//! Core types for read planning.

use coverage_common::{BoundingBox, Crs, GridRange};
use projection::{AffineTransform, GridToEnvelopeMapper};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Index of the full-resolution level.
pub const FULL_RESOLUTION_LEVEL: usize = 0;

/// Ground distance covered by one pixel, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub x: f64,
    pub y: f64,
}

impl Resolution {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Same resolution on both axes.
    pub fn uniform(value: f64) -> Self {
        Self::new(value, value)
    }

    /// Both axes finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x > 0.0 && self.y > 0.0
    }

    /// Resolution of `width` x `height` pixels spread over `envelope`.
    pub fn from_envelope(envelope: &BoundingBox, width: usize, height: usize) -> Self {
        Self::new(
            envelope.width() / width as f64,
            envelope.height() / height as f64,
        )
    }

    /// Value along an axis (0 = x, 1 = y).
    pub fn axis(&self, axis: usize) -> f64 {
        if axis == 0 {
            self.x
        } else {
            self.y
        }
    }
}

impl From<(f64, f64)> for Resolution {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Strategy for choosing between two overview levels that bracket the
/// requested resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverviewPolicy {
    /// Always read the full-resolution level.
    Ignore,
    /// Pick the level closest to the requested resolution.
    #[default]
    Nearest,
    /// Pick the higher-resolution level; never under-resolve.
    Quality,
    /// Pick the lower-resolution level; minimise I/O.
    Speed,
}

impl OverviewPolicy {
    /// Default policy of the per-read format parameters.
    ///
    /// Reader-level configuration defaults to [`OverviewPolicy::Nearest`]
    /// through `Default`; explicit read parameters default to `Quality`.
    pub const FORMAT_DEFAULT: OverviewPolicy = OverviewPolicy::Quality;

    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ignore" => Self::Ignore,
            "quality" => Self::Quality,
            "speed" => Self::Speed,
            _ => Self::Nearest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Nearest => "nearest",
            Self::Quality => "quality",
            Self::Speed => "speed",
        }
    }
}

impl std::fmt::Display for OverviewPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether the decoder may subsample the chosen level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecimationPolicy {
    #[default]
    Allow,
    Disallow,
}

impl DecimationPolicy {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "disallow" | "false" | "0" => Self::Disallow,
            _ => Self::Allow,
        }
    }
}

impl std::fmt::Display for DecimationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Disallow => write!(f, "disallow"),
        }
    }
}

/// Interpolation kernel used when resampling the read raster.
///
/// Only the distinction between nearest neighbour and wider kernels matters
/// for read planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Nearest neighbor (preserves exact values).
    #[default]
    Nearest,
    /// Bilinear interpolation (smooth, slight value changes).
    Bilinear,
    /// Bicubic interpolation (smoothest, more compute).
    Cubic,
}

impl InterpolationMethod {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "bilinear" => Self::Bilinear,
            "cubic" | "bicubic" => Self::Cubic,
            _ => Self::Nearest,
        }
    }

    pub fn is_nearest(&self) -> bool {
        matches!(self, Self::Nearest)
    }
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Bilinear => write!(f, "bilinear"),
            Self::Cubic => write!(f, "cubic"),
        }
    }
}

/// Source subsampling handed to the decoder: read every `x`th column and
/// every `y`th row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubsamplingFactors {
    pub x: u32,
    pub y: u32,
}

impl SubsamplingFactors {
    /// No decimation.
    pub const NONE: SubsamplingFactors = SubsamplingFactors { x: 1, y: 1 };

    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Size of the decoded raster when subsampling a `width` x `height` level.
    pub fn output_size(&self, width: usize, height: usize) -> (usize, usize) {
        (width / self.x as usize, height / self.y as usize)
    }
}

impl Default for SubsamplingFactors {
    fn default() -> Self {
        Self::NONE
    }
}

/// Extra pixels read on every side of a requested window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Padding {
    pub x: usize,
    pub y: usize,
}

impl Padding {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn uniform(pixels: usize) -> Self {
        Self::new(pixels, pixels)
    }
}

/// Mapping from raster pixel coordinates to world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum GridToWorld {
    Affine(AffineTransform),
    /// A mapping that cannot be expressed as an affine transform, such as a
    /// geostationary scan-angle grid or a ground-control-point warp.
    NonLinear { description: String },
}

impl GridToWorld {
    pub fn as_affine(&self) -> Option<&AffineTransform> {
        match self {
            Self::Affine(transform) => Some(transform),
            Self::NonLinear { .. } => None,
        }
    }

    pub fn is_affine(&self) -> bool {
        self.as_affine().is_some()
    }
}

impl std::fmt::Display for GridToWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Affine(transform) => write!(f, "affine {:?}", transform.to_gdal()),
            Self::NonLinear { description } => write!(f, "non-linear ({})", description),
        }
    }
}

/// The grid a caller wants to read into: a pixel window, how it maps to
/// world coordinates, and the world envelope it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    pub raster_window: GridRange,
    pub grid_to_world: GridToWorld,
    pub crs: Crs,
    pub envelope: BoundingBox,
}

impl GridGeometry {
    /// Geometry for an affine grid; the envelope is derived from the window.
    pub fn new(raster_window: GridRange, grid_to_world: AffineTransform, crs: Crs) -> Self {
        let envelope = grid_to_world.transform_range(&raster_window);
        Self {
            raster_window,
            grid_to_world: GridToWorld::Affine(grid_to_world),
            crs,
            envelope,
        }
    }

    /// North-up geometry mapping `width` x `height` pixels onto `envelope`,
    /// the usual shape of a rendering request.
    pub fn from_envelope(envelope: BoundingBox, width: usize, height: usize, crs: Crs) -> Result<Self> {
        let raster_window = GridRange::try_new(0, 0, width, height)?;
        let envelope = BoundingBox::try_new(envelope.min_x, envelope.min_y, envelope.max_x, envelope.max_y)?;
        let grid_to_world = GridToEnvelopeMapper::new(raster_window, envelope).create_affine_transform()?;
        Ok(Self {
            raster_window,
            grid_to_world: GridToWorld::Affine(grid_to_world),
            crs,
            envelope,
        })
    }

    /// Geometry whose grid-to-world mapping is not affine.
    pub fn non_linear(
        raster_window: GridRange,
        description: impl Into<String>,
        crs: Crs,
        envelope: BoundingBox,
    ) -> Self {
        Self {
            raster_window,
            grid_to_world: GridToWorld::NonLinear {
                description: description.into(),
            },
            crs,
            envelope,
        }
    }

    /// The same grid seen through a different pixel window.
    ///
    /// Affine geometries keep their grid-to-world transform and re-derive the
    /// envelope from the new window. Non-linear geometries extend the
    /// envelope by the average pixel size of the current one.
    pub fn with_window(&self, window: GridRange) -> Self {
        let envelope = match &self.grid_to_world {
            GridToWorld::Affine(transform) => transform.transform_range(&window),
            GridToWorld::NonLinear { .. } => {
                let old = self.raster_window;
                if old.is_empty() {
                    self.envelope
                } else {
                    let pixel_w = self.envelope.width() / old.width as f64;
                    let pixel_h = self.envelope.height() / old.height as f64;
                    BoundingBox::new(
                        self.envelope.min_x - (old.x - window.x) as f64 * pixel_w,
                        self.envelope.min_y - (window.max_y() - old.max_y()) as f64 * pixel_h,
                        self.envelope.max_x + (window.max_x() - old.max_x()) as f64 * pixel_w,
                        self.envelope.max_y + (old.y - window.y) as f64 * pixel_h,
                    )
                }
            }
        };

        Self {
            raster_window: window,
            grid_to_world: self.grid_to_world.clone(),
            crs: self.crs.clone(),
            envelope,
        }
    }

    /// Envelope span divided by window size, ignoring rotation.
    pub fn envelope_resolution(&self) -> Resolution {
        Resolution::from_envelope(
            &self.envelope,
            self.raster_window.width,
            self.raster_window.height,
        )
    }
}

/// Everything the decoder needs to perform one read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPlan {
    /// Index of the level to decode (0 = full resolution).
    pub level_index: usize,
    /// Subsampling to apply while decoding that level.
    pub subsampling: SubsamplingFactors,
    /// Resolution the caller effectively asked for, in native CRS units.
    pub requested_resolution: Resolution,
    /// Native resolution of the chosen level.
    pub level_resolution: Resolution,
    /// Raster size of the chosen level.
    pub level_raster_size: (usize, usize),
    /// Padding applied to the requested window.
    pub padding: Padding,
    /// Requested geometry, padded for interpolation when requested.
    pub read_geometry: GridGeometry,
}
