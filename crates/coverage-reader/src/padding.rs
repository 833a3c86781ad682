//! Padding requested windows for interpolation.
//!
//! Interpolating kernels wider than nearest neighbour need source pixels
//! beyond the edge of the requested window. The base padding covers that at
//! native resolution; when the request is finer than the native data each
//! native pixel spans several output pixels, so the padding grows by the
//! same ratio.

use coverage_common::Crs;
use projection::TransformFactory;

use crate::error::Result;
use crate::resolution::RequestedResolutionCalculator;
use crate::types::{GridGeometry, InterpolationMethod, Padding, Resolution};

/// Default base padding, in pixels.
pub const DEFAULT_PADDING: usize = 10;

/// Largest padding ever applied, and the largest base padding accepted by
/// [`ReaderConfig::validate`](crate::ReaderConfig::validate).
pub const MAX_PADDING: usize = 1024;

/// Computes how far to grow a requested window before reading.
pub struct ReadPaddingCalculator<'a> {
    padding: usize,
    interpolation: InterpolationMethod,
    native_resolution: Option<Resolution>,
    native_crs: &'a Crs,
    factory: &'a dyn TransformFactory,
    accurate: bool,
}

impl<'a> ReadPaddingCalculator<'a> {
    pub fn new(native_crs: &'a Crs, factory: &'a dyn TransformFactory) -> Self {
        Self {
            padding: DEFAULT_PADDING,
            interpolation: InterpolationMethod::default(),
            native_resolution: None,
            native_crs,
            factory,
            accurate: false,
        }
    }

    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_interpolation(mut self, interpolation: InterpolationMethod) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Native resolution of the coverage; without it the base padding is
    /// never scaled.
    pub fn with_native_resolution(mut self, resolution: Option<Resolution>) -> Self {
        self.native_resolution = resolution;
        self
    }

    pub fn accurate(mut self, accurate: bool) -> Self {
        self.accurate = accurate;
        self
    }

    /// Padding for `requested`.
    ///
    /// Falls back to the base padding whenever scaling is not possible.
    pub fn compute_padding(&self, requested: &GridGeometry) -> Padding {
        let base = Padding::uniform(self.padding);
        if self.interpolation.is_nearest() {
            return base;
        }

        let Some(native) = self.native_resolution.filter(Resolution::is_valid) else {
            return base;
        };
        if !requested.grid_to_world.is_affine() {
            return base;
        }

        match self.scaled_padding(requested, native) {
            Ok(padding) => padding,
            Err(err) => {
                tracing::info!(
                    error = %err,
                    interpolation = %self.interpolation,
                    "Unable to scale read padding, using base padding"
                );
                base
            }
        }
    }

    /// `requested` with its raster window grown by [`Self::compute_padding`]
    /// on every side and its envelope re-derived from the new window.
    pub fn pad_grid_geometry(&self, requested: &GridGeometry) -> GridGeometry {
        let padding = self.compute_padding(requested);
        let window = requested.raster_window.expand(padding.x, padding.y);
        tracing::debug!(
            pad_x = padding.x,
            pad_y = padding.y,
            width = window.width,
            height = window.height,
            "Padded requested window"
        );
        requested.with_window(window)
    }

    fn scaled_padding(&self, requested: &GridGeometry, native: Resolution) -> Result<Padding> {
        let read_bounds = self
            .factory
            .find_transform(&requested.crs, self.native_crs)?
            .transform_envelope(&requested.envelope)?;

        let requested_resolution =
            RequestedResolutionCalculator::new(requested, self.native_crs, Some(native), self.factory)
                .accurate(self.accurate)
                .compute_requested_resolution(&read_bounds)?;

        Ok(Padding::new(
            scale_axis(self.padding, native.x, requested_resolution.x),
            scale_axis(self.padding, native.y, requested_resolution.y),
        ))
    }
}

/// Base padding grown by how many requested pixels one native pixel spans,
/// capped at [`MAX_PADDING`] (or the base padding, if larger).
fn scale_axis(base: usize, native: f64, requested: f64) -> usize {
    if requested > 0.0 && native > requested {
        let cap = MAX_PADDING.max(base);
        let scaled = (native / requested * base as f64).round();
        if scaled.is_finite() && scaled < cap as f64 {
            scaled as usize
        } else {
            cap
        }
    } else {
        base
    }
}
