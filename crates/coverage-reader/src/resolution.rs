//! Estimating the resolution a read request effectively asks for.
//!
//! The requested grid is expressed in the caller's CRS; overview selection
//! works in the native CRS of the coverage. When both match, the answer is
//! simply the pixel size of the requested grid-to-world transform. Otherwise
//! it has to be estimated in one of two ways:
//!
//! - **classic**: locate the read bounds (the request envelope in native
//!   coordinates, clipped to the coverage) in the requested raster, map that
//!   part of the raster window onto them and take the resulting pixel size.
//!   Cheap, but averages out any distortion of the reprojection.
//! - **accurate**: sample a 3x3 grid of pixels across the requested raster,
//!   push half-pixel probes around each sample through the reprojection and
//!   keep the smallest distance per axis.
//!
//! Reprojection failures never abort a read; the calculator logs them and
//! falls back to the full native resolution.

use coverage_common::{BoundingBox, Crs, GridRange};
use projection::{
    scale_x0, scale_y0, AffineTransform, CoordinateTransform, GridToEnvelopeMapper,
    TransformFactory,
};

use crate::error::{ReaderError, Result};
use crate::types::{GridGeometry, Resolution};

/// Samples per axis taken by the accurate estimate.
pub const ACCURATE_SAMPLES_PER_AXIS: usize = 3;

/// Probe distances at or below this are treated as collapsed.
const DEGENERATE_DISTANCE: f64 = 1e-12;

/// Computes the resolution of a requested grid in native CRS units.
pub struct RequestedResolutionCalculator<'a> {
    requested: &'a GridGeometry,
    native_crs: &'a Crs,
    full_resolution: Resolution,
    factory: &'a dyn TransformFactory,
    accurate: bool,
}

impl<'a> RequestedResolutionCalculator<'a> {
    /// Create a calculator for `requested`.
    ///
    /// `full_resolution` is the native resolution of the coverage, used as
    /// the fallback answer; when it is missing or invalid the envelope
    /// resolution of the request stands in.
    pub fn new(
        requested: &'a GridGeometry,
        native_crs: &'a Crs,
        full_resolution: Option<Resolution>,
        factory: &'a dyn TransformFactory,
    ) -> Self {
        let full_resolution = full_resolution
            .filter(Resolution::is_valid)
            .unwrap_or_else(|| requested.envelope_resolution());
        Self {
            requested,
            native_crs,
            full_resolution,
            factory,
            accurate: false,
        }
    }

    /// Use the sampled estimate for cross-CRS requests.
    pub fn accurate(mut self, accurate: bool) -> Self {
        self.accurate = accurate;
        self
    }

    /// The answer returned whenever an estimate cannot be made.
    pub fn full_resolution(&self) -> Resolution {
        self.full_resolution
    }

    /// The affine grid-to-world transform of the request.
    ///
    /// Fails with [`ReaderError::UnsupportedTransformKind`] for non-linear
    /// grids. This is the only error a caller ever sees.
    pub fn grid_to_world(&self) -> Result<&'a AffineTransform> {
        self.requested.grid_to_world.as_affine().ok_or_else(|| {
            ReaderError::unsupported_transform(format!(
                "expected an affine grid-to-world transform, got {}",
                self.requested.grid_to_world
            ))
        })
    }

    /// Resolution the request asks for, in native CRS units.
    ///
    /// `read_bounds` is the request envelope expressed in the native CRS,
    /// usually clipped to the coverage envelope.
    pub fn compute_requested_resolution(&self, read_bounds: &BoundingBox) -> Result<Resolution> {
        let grid_to_world = self.grid_to_world()?;

        if self.requested.crs.equals_ignore_metadata(self.native_crs) {
            return Ok(Resolution::new(scale_x0(grid_to_world), scale_y0(grid_to_world)));
        }

        let to_native = match self.factory.find_transform(&self.requested.crs, self.native_crs) {
            Ok(transform) => transform,
            Err(err) => return Ok(self.fall_back(&err.into())),
        };
        if to_native.is_identity() {
            return Ok(Resolution::new(scale_x0(grid_to_world), scale_y0(grid_to_world)));
        }

        let estimate = if self.accurate {
            self.accurate_resolution(grid_to_world, to_native.as_ref(), read_bounds)
        } else {
            self.classic_resolution(grid_to_world, read_bounds)
        };

        match estimate {
            Ok(resolution) => Ok(resolution),
            Err(err) if err.is_recoverable() => Ok(self.fall_back(&err)),
            Err(err) => Err(err),
        }
    }

    fn fall_back(&self, err: &ReaderError) -> Resolution {
        tracing::info!(
            error = %err,
            requested_crs = %self.requested.crs,
            native_crs = %self.native_crs,
            accurate = self.accurate,
            "Unable to compute requested resolution, using full resolution"
        );
        self.full_resolution
    }

    /// Pixel size of the part of the requested window that covers the read
    /// bounds, stretched over those bounds.
    fn classic_resolution(
        &self,
        grid_to_world: &AffineTransform,
        read_bounds: &BoundingBox,
    ) -> Result<Resolution> {
        let raster_bounds = self.sampled_raster_bounds(grid_to_world, read_bounds)?;
        let window = covering_window(&raster_bounds);
        let transform = GridToEnvelopeMapper::new(window, *read_bounds).create_affine_transform()?;
        let resolution = Resolution::new(scale_x0(&transform), scale_y0(&transform));
        if !resolution.is_valid() {
            return Err(ReaderError::degenerate(format!(
                "read bounds {:?} give resolution {:?}",
                read_bounds, resolution
            )));
        }
        Ok(resolution)
    }

    /// Smallest native distance between half-pixel probes, per axis.
    fn accurate_resolution(
        &self,
        grid_to_world: &AffineTransform,
        to_native: &dyn CoordinateTransform,
        read_bounds: &BoundingBox,
    ) -> Result<Resolution> {
        let raster_bounds = self.sampled_raster_bounds(grid_to_world, read_bounds)?;

        let n = ACCURATE_SAMPLES_PER_AXIS;
        let mut probes = Vec::with_capacity(n * n * 4);
        for row in 0..n {
            let y = sample_position(raster_bounds.min_y, raster_bounds.height(), row, n);
            for col in 0..n {
                let x = sample_position(raster_bounds.min_x, raster_bounds.width(), col, n);
                probes.push((x - 0.5, y));
                probes.push((x + 0.5, y));
                probes.push((x, y - 0.5));
                probes.push((x, y + 0.5));
            }
        }

        grid_to_world.transform_points(&mut probes);
        to_native.transform_points(&mut probes)?;

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        for sample in probes.chunks_exact(4) {
            let dx = distance(sample[0], sample[1]);
            let dy = distance(sample[2], sample[3]);
            if dx.is_finite() {
                min_x = min_x.min(dx);
            }
            if dy.is_finite() {
                min_y = min_y.min(dy);
            }
        }

        Ok(Resolution::new(
            self.clamp_degenerate(min_x, self.full_resolution.x, "x"),
            self.clamp_degenerate(min_y, self.full_resolution.y, "y"),
        ))
    }

    /// The part of the requested raster that falls inside the read bounds,
    /// in pixel coordinates. The whole raster window is sampled when the
    /// read bounds cannot be located in it.
    fn sampled_raster_bounds(
        &self,
        grid_to_world: &AffineTransform,
        read_bounds: &BoundingBox,
    ) -> Result<BoundingBox> {
        let window = self.requested.raster_window;
        let window_bounds = BoundingBox::new(
            window.x as f64,
            window.y as f64,
            window.max_x() as f64,
            window.max_y() as f64,
        );

        let located = self
            .factory
            .find_transform(self.native_crs, &self.requested.crs)
            .and_then(|to_requested| to_requested.transform_envelope(read_bounds))
            .and_then(|request_bounds| {
                let world_to_grid = grid_to_world.inverse()?;
                let corners = request_bounds
                    .corners()
                    .map(|(x, y)| world_to_grid.transform(x, y));
                Ok(BoundingBox::from_points(corners))
            });

        match located {
            Ok(Some(bounds)) => Ok(bounds.intersection(&window_bounds).unwrap_or(window_bounds)),
            Ok(None) => Ok(window_bounds),
            Err(err) => {
                tracing::debug!(
                    error = %err,
                    "Read bounds not located in requested raster, sampling full window"
                );
                Ok(window_bounds)
            }
        }
    }

    fn clamp_degenerate(&self, value: f64, fallback: f64, axis: &str) -> f64 {
        if value.is_finite() && value > DEGENERATE_DISTANCE {
            value
        } else {
            tracing::debug!(
                axis,
                distance = value,
                fallback,
                "Degenerate probe distance, clamping to full resolution"
            );
            fallback
        }
    }
}

/// Pixel-center position of sample `index` out of `count` spread across
/// `[start, start + extent]`.
fn sample_position(start: f64, extent: f64, index: usize, count: usize) -> f64 {
    let usable = (extent - 1.0).max(0.0);
    let frac = if count > 1 {
        index as f64 / (count - 1) as f64
    } else {
        0.5
    };
    start + 0.5 + frac * usable
}

/// Whole-pixel window closest to fractional pixel bounds, at least one pixel
/// wide on each axis.
fn covering_window(bounds: &BoundingBox) -> GridRange {
    let min_x = bounds.min_x.round();
    let min_y = bounds.min_y.round();
    let width = (bounds.max_x.round() - min_x).max(1.0);
    let height = (bounds.max_y.round() - min_y).max(1.0);
    GridRange::new(min_x as i64, min_y as i64, width as usize, height as usize)
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}
