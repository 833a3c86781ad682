//! What the planner needs to know about a stored coverage.

use coverage_common::{BoundingBox, Crs};
use serde::{Deserialize, Serialize};

use crate::types::Resolution;

/// Read-only description of a coverage and its overviews.
///
/// Implemented by format readers; the planner never touches pixel data.
pub trait ReaderMetadata: Send + Sync {
    /// Resolution of the full-resolution level.
    fn native_resolution(&self) -> Resolution;

    /// Resolutions of the overviews, in storage order (overview `k` is
    /// level `k + 1`).
    fn overview_resolutions(&self) -> Vec<Resolution>;

    /// `(width, height)` of the full-resolution level.
    fn native_raster_size(&self) -> (usize, usize);

    fn native_crs(&self) -> &Crs;

    fn native_envelope(&self) -> BoundingBox;

    /// `(width, height)` of overview `overview` (0-based).
    ///
    /// Defaults to the native envelope divided by the overview resolution,
    /// rounded to whole pixels.
    fn overview_raster_size(&self, overview: usize) -> Option<(usize, usize)> {
        let resolution = self.overview_resolutions().get(overview).copied()?;
        if !resolution.is_valid() {
            return None;
        }
        let envelope = self.native_envelope();
        Some((
            (envelope.width() / resolution.x).round() as usize,
            (envelope.height() / resolution.y).round() as usize,
        ))
    }
}

/// One stored overview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverviewInfo {
    pub resolution: Resolution,
    /// Stored raster size, when the format records it.
    #[serde(default)]
    pub raster_size: Option<(usize, usize)>,
}

/// Plain [`ReaderMetadata`] implementation, e.g. loaded from a JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageInfo {
    pub crs: Crs,
    pub envelope: BoundingBox,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub overviews: Vec<OverviewInfo>,
}

impl CoverageInfo {
    pub fn new(crs: Crs, envelope: BoundingBox, width: usize, height: usize) -> Self {
        Self {
            crs,
            envelope,
            width,
            height,
            overviews: Vec::new(),
        }
    }

    /// Add an overview known only by its resolution.
    pub fn with_overview(mut self, resolution: Resolution) -> Self {
        self.overviews.push(OverviewInfo {
            resolution,
            raster_size: None,
        });
        self
    }

    /// Add an overview stored as a `width` x `height` raster over the
    /// native envelope.
    pub fn with_overview_size(mut self, width: usize, height: usize) -> Self {
        self.overviews.push(OverviewInfo {
            resolution: Resolution::from_envelope(&self.envelope, width, height),
            raster_size: Some((width, height)),
        });
        self
    }

    /// Add `count` overviews, each halving the previous one.
    pub fn with_power_of_two_overviews(mut self, count: usize) -> Self {
        let (mut width, mut height) = (self.width, self.height);
        for _ in 0..count {
            width = (width / 2).max(1);
            height = (height / 2).max(1);
            self = self.with_overview_size(width, height);
        }
        self
    }
}

impl ReaderMetadata for CoverageInfo {
    fn native_resolution(&self) -> Resolution {
        Resolution::from_envelope(&self.envelope, self.width, self.height)
    }

    fn overview_resolutions(&self) -> Vec<Resolution> {
        self.overviews.iter().map(|o| o.resolution).collect()
    }

    fn native_raster_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn native_crs(&self) -> &Crs {
        &self.crs
    }

    fn native_envelope(&self) -> BoundingBox {
        self.envelope
    }

    fn overview_raster_size(&self, overview: usize) -> Option<(usize, usize)> {
        let info = self.overviews.get(overview)?;
        if let Some(size) = info.raster_size {
            return Some(size);
        }
        if !info.resolution.is_valid() {
            return None;
        }
        Some((
            (self.envelope.width() / info.resolution.x).round() as usize,
            (self.envelope.height() / info.resolution.y).round() as usize,
        ))
    }
}
