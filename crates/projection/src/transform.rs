//! Coordinate transforms between reference systems.
//!
//! The reading engine only needs three operations from a reprojection
//! library: look up a transform for a CRS pair, transform a batch of points,
//! and transform an envelope. [`TransformFactory`] and
//! [`CoordinateTransform`] are that seam; [`DefaultTransformFactory`] covers
//! the identity case and geographic ↔ Web Mercator.

use std::fmt;

use coverage_common::{BoundingBox, Crs, CrsCode};
use thiserror::Error;

use crate::mercator;

/// Number of segments each envelope edge is split into when transforming
/// envelopes, so curved edges are captured.
pub const ENVELOPE_EDGE_SEGMENTS: usize = 20;

/// Errors raised by coordinate transforms.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// No transform is known between the two reference systems.
    #[error("no transform from {source_crs} to {target_crs}")]
    NotFound {
        source_crs: String,
        target_crs: String,
    },

    /// The transform cannot be inverted.
    #[error("non-invertible transform: {0}")]
    NonInvertible(String),

    /// A coordinate is outside the domain of validity of the transform.
    #[error("coordinate ({x}, {y}) outside the domain of {transform}")]
    OutOfDomain { x: f64, y: f64, transform: String },

    /// Any other failure.
    #[error("transform failed: {0}")]
    Failed(String),
}

impl TransformError {
    /// Create a NotFound error for a CRS pair.
    pub fn not_found(source: &Crs, target: &Crs) -> Self {
        Self::NotFound {
            source_crs: source.to_string(),
            target_crs: target.to_string(),
        }
    }
}

/// A transform from one CRS to another.
pub trait CoordinateTransform: Send + Sync + fmt::Debug {
    /// Transform a single point.
    fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), TransformError>;

    /// Transform a batch of points in place.
    ///
    /// Fails as a whole if any point fails.
    fn transform_points(&self, points: &mut [(f64, f64)]) -> Result<(), TransformError> {
        for point in points.iter_mut() {
            *point = self.transform_point(point.0, point.1)?;
        }
        Ok(())
    }

    /// Transform an envelope by densifying its edges and taking the bounds of
    /// every sample that projects successfully.
    fn transform_envelope(&self, envelope: &BoundingBox) -> Result<BoundingBox, TransformError> {
        if self.is_identity() {
            return Ok(*envelope);
        }

        let n = ENVELOPE_EDGE_SEGMENTS;
        let mut projected = Vec::with_capacity(4 * (n + 1));
        for t in 0..=n {
            let frac = t as f64 / n as f64;
            let x = envelope.min_x + frac * envelope.width();
            let y = envelope.min_y + frac * envelope.height();

            let edges = [
                (x, envelope.max_y), // Top
                (x, envelope.min_y), // Bottom
                (envelope.min_x, y), // Left
                (envelope.max_x, y), // Right
            ];

            for (px, py) in edges {
                if let Ok(point) = self.transform_point(px, py) {
                    projected.push(point);
                }
            }
        }

        BoundingBox::from_points(projected).ok_or_else(|| {
            TransformError::Failed(format!("no point of {:?} could be transformed", envelope))
        })
    }

    /// True when the transform leaves every coordinate unchanged.
    fn is_identity(&self) -> bool {
        false
    }
}

/// Looks up transforms between reference systems.
pub trait TransformFactory: Send + Sync {
    fn find_transform(
        &self,
        source: &Crs,
        target: &Crs,
    ) -> Result<Box<dyn CoordinateTransform>, TransformError>;
}

/// The transform between two equal reference systems.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl CoordinateTransform for IdentityTransform {
    fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), TransformError> {
        Ok((x, y))
    }

    fn is_identity(&self) -> bool {
        true
    }
}

/// Direction of a [`MercatorTransform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MercatorDirection {
    /// Geographic degrees to Web Mercator meters.
    Forward,
    /// Web Mercator meters to geographic degrees.
    Inverse,
}

/// Geographic (EPSG:4326 / EPSG:4269) ↔ Web Mercator (EPSG:3857).
#[derive(Debug, Clone, Copy)]
pub struct MercatorTransform {
    direction: MercatorDirection,
}

impl MercatorTransform {
    pub fn forward() -> Self {
        Self {
            direction: MercatorDirection::Forward,
        }
    }

    pub fn inverse() -> Self {
        Self {
            direction: MercatorDirection::Inverse,
        }
    }

    pub fn direction(&self) -> MercatorDirection {
        self.direction
    }
}

impl CoordinateTransform for MercatorTransform {
    fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), TransformError> {
        let result = match self.direction {
            MercatorDirection::Forward => mercator::forward(x, y),
            MercatorDirection::Inverse => mercator::inverse(x, y),
        };
        result.ok_or_else(|| TransformError::OutOfDomain {
            x,
            y,
            transform: format!("{:?}", self),
        })
    }
}

/// Transform lookup for the reference systems this workspace can handle
/// without an external reprojection library.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTransformFactory;

impl TransformFactory for DefaultTransformFactory {
    fn find_transform(
        &self,
        source: &Crs,
        target: &Crs,
    ) -> Result<Box<dyn CoordinateTransform>, TransformError> {
        if source.equals_ignore_metadata(target) {
            return Ok(Box::new(IdentityTransform));
        }

        match (source.code, target.code) {
            (CrsCode::Epsg4326 | CrsCode::Epsg4269, CrsCode::Epsg3857) => {
                Ok(Box::new(MercatorTransform::forward()))
            }
            (CrsCode::Epsg3857, CrsCode::Epsg4326 | CrsCode::Epsg4269) => {
                Ok(Box::new(MercatorTransform::inverse()))
            }
            _ => Err(TransformError::not_found(source, target)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_for_equal_crs() {
        let factory = DefaultTransformFactory;
        let a = Crs::wgs84();
        let b = Crs::named(CrsCode::Epsg4326, "WGS 84");
        let transform = factory.find_transform(&a, &b).unwrap();
        assert!(transform.is_identity());

        let env = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(transform.transform_envelope(&env).unwrap(), env);
    }

    #[test]
    fn test_unknown_pair() {
        let factory = DefaultTransformFactory;
        let err = factory
            .find_transform(&Crs::wgs84(), &Crs::new(CrsCode::Epsg5070))
            .unwrap_err();
        assert!(matches!(err, TransformError::NotFound { .. }));
        assert!(err.to_string().contains("EPSG:5070"));
    }

    #[test]
    fn test_envelope_world() {
        let transform = DefaultTransformFactory
            .find_transform(&Crs::wgs84(), &Crs::web_mercator())
            .unwrap();
        let env = transform
            .transform_envelope(&BoundingBox::new(-180.0, -85.0, 180.0, 85.0))
            .unwrap();
        assert!((env.min_x + mercator::MAX_EXTENT).abs() < 1e-6);
        assert!((env.max_x - mercator::MAX_EXTENT).abs() < 1e-6);
        assert!(env.max_y > 19_000_000.0 && env.max_y < mercator::MAX_EXTENT);
    }

    #[test]
    fn test_batch_fails_as_a_whole() {
        let transform = MercatorTransform::forward();
        let mut points = vec![(0.0, 0.0), (0.0, 95.0)];
        assert!(transform.transform_points(&mut points).is_err());
    }

    #[test]
    fn test_roundtrip_through_factory() {
        let factory = DefaultTransformFactory;
        let fwd = factory.find_transform(&Crs::wgs84(), &Crs::web_mercator()).unwrap();
        let inv = factory.find_transform(&Crs::web_mercator(), &Crs::wgs84()).unwrap();

        let mut points = vec![(10.0, 45.0), (-120.0, -33.5)];
        fwd.transform_points(&mut points).unwrap();
        inv.transform_points(&mut points).unwrap();

        assert!((points[0].0 - 10.0).abs() < 1e-9);
        assert!((points[0].1 - 45.0).abs() < 1e-9);
        assert!((points[1].0 + 120.0).abs() < 1e-9);
        assert!((points[1].1 + 33.5).abs() < 1e-9);
    }
}
