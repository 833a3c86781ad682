//! Affine grid math and coordinate reference system transformations.
//!
//! Only the pieces a coverage reader needs for planning reads are here: 2D
//! affine transforms, the transform lookup seam, and a spherical Web Mercator
//! projection.

pub mod affine;
pub mod mercator;
pub mod transform;

pub use affine::{scale_x0, scale_y0, AffineTransform, GridToEnvelopeMapper};
pub use transform::{
    CoordinateTransform, DefaultTransformFactory, IdentityTransform, MercatorTransform,
    TransformError, TransformFactory,
};
