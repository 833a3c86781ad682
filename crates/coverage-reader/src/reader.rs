//! The read-planning facade.

use std::sync::Arc;

use coverage_common::BoundingBox;
use projection::{DefaultTransformFactory, TransformError, TransformFactory};

use crate::config::{ReadParameters, ReaderConfig};
use crate::decimation::DecimationController;
use crate::error::{ReaderError, Result};
use crate::metadata::ReaderMetadata;
use crate::overview::{OverviewsController, ResolutionLevel, ResolutionLevels};
use crate::padding::ReadPaddingCalculator;
use crate::resolution::RequestedResolutionCalculator;
use crate::types::{
    DecimationPolicy, GridGeometry, InterpolationMethod, OverviewPolicy, Padding, ReadPlan,
    Resolution, FULL_RESOLUTION_LEVEL,
};

/// Plans reads against one coverage.
///
/// Holds the coverage metadata, the reader configuration and the lazily
/// built level table. All planning methods take `&self` and can be called
/// from many threads at once.
pub struct CoverageReader<M: ReaderMetadata> {
    metadata: M,
    config: ReaderConfig,
    factory: Arc<dyn TransformFactory>,
    overviews: OverviewsController,
}

impl<M: ReaderMetadata> CoverageReader<M> {
    /// Create a reader using the built-in transform factory.
    pub fn new(metadata: M, config: ReaderConfig) -> Self {
        Self::with_transform_factory(metadata, config, Arc::new(DefaultTransformFactory))
    }

    /// Create a reader after validating `config`.
    pub fn try_new(metadata: M, config: ReaderConfig) -> Result<Self> {
        config.validate().map_err(ReaderError::config)?;
        Ok(Self::new(metadata, config))
    }

    pub fn with_transform_factory(
        metadata: M,
        config: ReaderConfig,
        factory: Arc<dyn TransformFactory>,
    ) -> Self {
        Self {
            metadata,
            config,
            factory,
            overviews: OverviewsController::new(),
        }
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// The level table, built from the metadata on first use.
    ///
    /// `None` when the native resolution is unusable; reads then always go
    /// to the full-resolution level.
    pub fn resolution_levels(&self) -> Option<Arc<ResolutionLevels>> {
        self.overviews.resolution_levels(|| {
            ResolutionLevels::build(
                self.metadata.native_resolution(),
                &self.metadata.overview_resolutions(),
            )
        })
    }

    /// Choose the level and subsampling to read `geometry` with.
    ///
    /// `policy` and `decimation` fall back to the reader configuration.
    /// Fails only when `geometry` has a non-affine grid-to-world transform.
    pub fn pick_level_and_subsampling(
        &self,
        geometry: &GridGeometry,
        policy: Option<OverviewPolicy>,
        decimation: Option<DecimationPolicy>,
    ) -> Result<ReadPlan> {
        let policy = policy.unwrap_or(self.config.overview_policy);
        let decimation = decimation.unwrap_or(self.config.decimation_policy);

        let requested = self.requested_resolution(geometry)?;
        let level = self.pick_level(policy, requested);
        let level_index = level.map(|l| l.level_index).unwrap_or(FULL_RESOLUTION_LEVEL);
        let level_resolution = level
            .map(|l| l.resolution())
            .unwrap_or_else(|| self.metadata.native_resolution());
        let level_raster_size = self.level_raster_size(level_index, level_resolution);

        let subsampling = DecimationController::new(decimation).subsampling(
            Some(requested),
            level_raster_size,
            level_resolution,
        );

        tracing::debug!(
            %policy,
            %decimation,
            requested_x = requested.x,
            requested_y = requested.y,
            level = level_index,
            subsample_x = subsampling.x,
            subsample_y = subsampling.y,
            "Planned overview read"
        );

        Ok(ReadPlan {
            level_index,
            subsampling,
            requested_resolution: requested,
            level_resolution,
            level_raster_size,
            padding: Padding::default(),
            read_geometry: geometry.clone(),
        })
    }

    /// `geometry` padded for resampling with `interpolation`.
    pub fn pad_for_interpolation(
        &self,
        geometry: &GridGeometry,
        interpolation: InterpolationMethod,
    ) -> GridGeometry {
        self.padding_calculator(interpolation).pad_grid_geometry(geometry)
    }

    /// Native resolution of the level `policy` would pick for `requested`.
    ///
    /// This is the resolution the decoder actually delivers before any
    /// subsampling.
    pub fn reading_resolution(&self, policy: Option<OverviewPolicy>, requested: Resolution) -> Resolution {
        let policy = policy.unwrap_or(self.config.overview_policy);
        self.pick_level(policy, requested)
            .map(|l| l.resolution())
            .unwrap_or_else(|| self.metadata.native_resolution())
    }

    /// Full plan for one read: padding, level and subsampling.
    pub fn plan_read(&self, geometry: &GridGeometry, params: &ReadParameters) -> Result<ReadPlan> {
        let interpolation = params.interpolation.unwrap_or(self.config.interpolation);
        let calculator = self.padding_calculator(interpolation);
        let padding = calculator.compute_padding(geometry);

        let mut plan = self.pick_level_and_subsampling(
            geometry,
            Some(params.overview_policy),
            Some(params.decimation_policy),
        )?;

        let window = geometry.raster_window.expand(padding.x, padding.y);
        plan.padding = padding;
        plan.read_geometry = geometry.with_window(window);

        tracing::debug!(
            %interpolation,
            level = plan.level_index,
            pad_x = padding.x,
            pad_y = padding.y,
            "Planned read"
        );

        Ok(plan)
    }

    /// Resolution `geometry` asks for, in native CRS units.
    pub fn requested_resolution(&self, geometry: &GridGeometry) -> Result<Resolution> {
        let full = self.resolution_levels().map(|levels| levels.full_resolution());
        let native_crs = self.metadata.native_crs();
        let calculator =
            RequestedResolutionCalculator::new(geometry, native_crs, full, self.factory.as_ref())
                .accurate(self.config.accurate_resolution);

        match self.read_bounds(geometry) {
            Ok(read_bounds) => calculator.compute_requested_resolution(&read_bounds),
            Err(err) => {
                calculator.grid_to_world()?;
                tracing::info!(
                    error = %err,
                    requested_crs = %geometry.crs,
                    native_crs = %native_crs,
                    "Unable to compute read bounds, using full resolution"
                );
                Ok(calculator.full_resolution())
            }
        }
    }

    /// The request envelope in native coordinates, clipped to the coverage.
    fn read_bounds(&self, geometry: &GridGeometry) -> std::result::Result<BoundingBox, TransformError> {
        let bounds = self
            .factory
            .find_transform(&geometry.crs, self.metadata.native_crs())?
            .transform_envelope(&geometry.envelope)?;
        Ok(bounds
            .intersection(&self.metadata.native_envelope())
            .unwrap_or(bounds))
    }

    fn pick_level(&self, policy: OverviewPolicy, requested: Resolution) -> Option<ResolutionLevel> {
        let levels = self.resolution_levels()?;
        let level_index = levels.pick_level(policy, requested);
        levels.level(level_index).copied()
    }

    /// Raster size of a level, preferring what the metadata records.
    fn level_raster_size(&self, level_index: usize, level_resolution: Resolution) -> (usize, usize) {
        if level_index == FULL_RESOLUTION_LEVEL {
            return self.metadata.native_raster_size();
        }
        self.metadata
            .overview_raster_size(level_index - 1)
            .unwrap_or_else(|| {
                let envelope = self.metadata.native_envelope();
                (
                    ((envelope.width() / level_resolution.x).round() as usize).max(1),
                    ((envelope.height() / level_resolution.y).round() as usize).max(1),
                )
            })
    }

    fn padding_calculator(&self, interpolation: InterpolationMethod) -> ReadPaddingCalculator<'_> {
        ReadPaddingCalculator::new(self.metadata.native_crs(), self.factory.as_ref())
            .with_padding(self.config.padding)
            .with_interpolation(interpolation)
            .with_native_resolution(self.resolution_levels().map(|levels| levels.full_resolution()))
            .accurate(self.config.accurate_resolution)
    }
}

impl<M: ReaderMetadata + std::fmt::Debug> std::fmt::Debug for CoverageReader<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverageReader")
            .field("metadata", &self.metadata)
            .field("config", &self.config)
            .field("overviews", &self.overviews)
            .finish()
    }
}
