//! Transform factories with predictable behavior for tests.

use coverage_common::Crs;
use projection::{CoordinateTransform, IdentityTransform, TransformError, TransformFactory};

/// Knows no transform except the identity between equal CRSs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingTransformFactory;

impl TransformFactory for FailingTransformFactory {
    fn find_transform(
        &self,
        source: &Crs,
        target: &Crs,
    ) -> Result<Box<dyn CoordinateTransform>, TransformError> {
        if source.equals_ignore_metadata(target) {
            return Ok(Box::new(IdentityTransform));
        }
        Err(TransformError::not_found(source, target))
    }
}

/// Multiplies both coordinates by a constant.
#[derive(Debug, Clone, Copy)]
pub struct ScaleTransform {
    pub factor: f64,
}

impl CoordinateTransform for ScaleTransform {
    fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), TransformError> {
        Ok((x * self.factor, y * self.factor))
    }
}

/// Relates two CRSs by a uniform scale: coordinates in `from` times
/// `factor` are coordinates in any other CRS, and back.
#[derive(Debug, Clone)]
pub struct ScalingTransformFactory {
    pub from: Crs,
    pub factor: f64,
}

impl ScalingTransformFactory {
    pub fn new(from: Crs, factor: f64) -> Self {
        Self { from, factor }
    }
}

impl TransformFactory for ScalingTransformFactory {
    fn find_transform(
        &self,
        source: &Crs,
        target: &Crs,
    ) -> Result<Box<dyn CoordinateTransform>, TransformError> {
        if source.equals_ignore_metadata(target) {
            return Ok(Box::new(IdentityTransform));
        }
        let factor = if source.equals_ignore_metadata(&self.from) {
            self.factor
        } else {
            1.0 / self.factor
        };
        Ok(Box::new(ScaleTransform { factor }))
    }
}

/// Sends every point to the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollapsingTransform;

impl CoordinateTransform for CollapsingTransform {
    fn transform_point(&self, _x: f64, _y: f64) -> Result<(f64, f64), TransformError> {
        Ok((0.0, 0.0))
    }
}

/// Collapses points going to `target`; the reverse direction is the identity
/// mapping of coordinates.
#[derive(Debug, Clone)]
pub struct CollapsingTransformFactory {
    pub target: Crs,
}

impl TransformFactory for CollapsingTransformFactory {
    fn find_transform(
        &self,
        source: &Crs,
        target: &Crs,
    ) -> Result<Box<dyn CoordinateTransform>, TransformError> {
        if source.equals_ignore_metadata(target) {
            return Ok(Box::new(IdentityTransform));
        }
        if target.equals_ignore_metadata(&self.target) {
            Ok(Box::new(CollapsingTransform))
        } else {
            Ok(Box::new(ScaleTransform { factor: 1.0 }))
        }
    }
}
