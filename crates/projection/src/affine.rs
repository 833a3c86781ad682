//! 2D affine transforms between raster and world coordinates.
//!
//! A grid-to-world transform maps pixel coordinates `(col, row)` to world
//! coordinates `(x, y)`:
//!
//! ```text
//! x = scale_x * col + shear_x * row + translate_x
//! y = shear_y * col + scale_y * row + translate_y
//! ```
//!
//! For north-up rasters the shear terms are zero and `scale_y` is negative.
//! The matrix is stored as a homogeneous `nalgebra::Matrix3`.

use coverage_common::{BoundingBox, GridRange};
use nalgebra::{Matrix3, Vector3};

use crate::transform::TransformError;

/// Determinants smaller than this are treated as singular.
const SINGULAR_EPS: f64 = 1e-12;

/// A 2D affine transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    matrix: Matrix3<f64>,
}

impl AffineTransform {
    /// Create a transform from its six coefficients.
    pub fn new(
        scale_x: f64,
        shear_y: f64,
        shear_x: f64,
        scale_y: f64,
        translate_x: f64,
        translate_y: f64,
    ) -> Self {
        Self {
            matrix: Matrix3::new(
                scale_x, shear_x, translate_x, //
                shear_y, scale_y, translate_y, //
                0.0, 0.0, 1.0,
            ),
        }
    }

    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    /// Scale-and-translate transform without rotation.
    pub fn from_scale_translate(scale_x: f64, scale_y: f64, translate_x: f64, translate_y: f64) -> Self {
        Self::new(scale_x, 0.0, 0.0, scale_y, translate_x, translate_y)
    }

    /// Create from a GDAL-style geotransform
    /// `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self::new(
            coeffs[1], coeffs[4], coeffs[2], coeffs[5], coeffs[0], coeffs[3],
        )
    }

    /// Convert to a GDAL-style geotransform.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.translate_x(),
            self.scale_x(),
            self.shear_x(),
            self.translate_y(),
            self.shear_y(),
            self.scale_y(),
        ]
    }

    pub fn scale_x(&self) -> f64 {
        self.matrix[(0, 0)]
    }

    pub fn shear_x(&self) -> f64 {
        self.matrix[(0, 1)]
    }

    pub fn translate_x(&self) -> f64 {
        self.matrix[(0, 2)]
    }

    pub fn shear_y(&self) -> f64 {
        self.matrix[(1, 0)]
    }

    pub fn scale_y(&self) -> f64 {
        self.matrix[(1, 1)]
    }

    pub fn translate_y(&self) -> f64 {
        self.matrix[(1, 2)]
    }

    /// Ground distance covered by one step along the raster x axis.
    ///
    /// This is the norm of the first matrix column, so it stays correct for
    /// rotated and sheared transforms; it reduces to `|scale_x|` when the
    /// transform is axis aligned.
    pub fn scale_x0(&self) -> f64 {
        let (scale, shear) = (self.scale_x(), self.shear_y());
        if shear == 0.0 {
            return scale.abs();
        }
        if scale == 0.0 {
            return shear.abs();
        }
        scale.hypot(shear)
    }

    /// Ground distance covered by one step along the raster y axis.
    pub fn scale_y0(&self) -> f64 {
        let (scale, shear) = (self.scale_y(), self.shear_x());
        if shear == 0.0 {
            return scale.abs();
        }
        if scale == 0.0 {
            return shear.abs();
        }
        scale.hypot(shear)
    }

    pub fn determinant(&self) -> f64 {
        self.scale_x() * self.scale_y() - self.shear_x() * self.shear_y()
    }

    pub fn is_identity(&self) -> bool {
        self.matrix == Matrix3::identity()
    }

    /// Apply the transform to a single point.
    pub fn transform(&self, x: f64, y: f64) -> (f64, f64) {
        let out = self.matrix * Vector3::new(x, y, 1.0);
        (out.x, out.y)
    }

    /// Apply the transform to every point in place.
    pub fn transform_points(&self, points: &mut [(f64, f64)]) {
        for point in points.iter_mut() {
            *point = self.transform(point.0, point.1);
        }
    }

    /// The inverse transform (world to grid).
    pub fn inverse(&self) -> Result<AffineTransform, TransformError> {
        if self.determinant().abs() < SINGULAR_EPS {
            return Err(TransformError::NonInvertible(format!(
                "affine transform with determinant {}",
                self.determinant()
            )));
        }
        self.matrix
            .try_inverse()
            .map(|matrix| Self { matrix })
            .ok_or_else(|| TransformError::NonInvertible("singular affine matrix".to_string()))
    }

    /// Envelope covered by a pixel window, from its four outer corners.
    pub fn transform_range(&self, range: &GridRange) -> BoundingBox {
        let (x0, y0) = (range.x as f64, range.y as f64);
        let (x1, y1) = (range.max_x() as f64, range.max_y() as f64);
        let corners = [
            self.transform(x0, y0),
            self.transform(x1, y0),
            self.transform(x1, y1),
            self.transform(x0, y1),
        ];
        // Corners of a finite affine image are always finite.
        BoundingBox::from_points(corners).unwrap_or_else(|| BoundingBox::new(x0, y0, x1, y1))
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Ground distance per pixel along x implied by `transform`.
pub fn scale_x0(transform: &AffineTransform) -> f64 {
    transform.scale_x0()
}

/// Ground distance per pixel along y implied by `transform`.
pub fn scale_y0(transform: &AffineTransform) -> f64 {
    transform.scale_y0()
}

/// Builds the north-up grid-to-world transform that maps a pixel window
/// onto an envelope.
///
/// The upper-left corner of the window lands on `(min_x, max_y)`; rows grow
/// southwards.
#[derive(Debug, Clone, Copy)]
pub struct GridToEnvelopeMapper {
    range: GridRange,
    envelope: BoundingBox,
}

impl GridToEnvelopeMapper {
    pub fn new(range: GridRange, envelope: BoundingBox) -> Self {
        Self { range, envelope }
    }

    pub fn create_affine_transform(&self) -> Result<AffineTransform, TransformError> {
        if self.range.is_empty() {
            return Err(TransformError::Failed(format!(
                "cannot map empty grid range {:?}",
                self.range
            )));
        }
        if !self.envelope.is_valid() {
            return Err(TransformError::Failed(format!(
                "cannot map onto invalid envelope {:?}",
                self.envelope
            )));
        }

        let scale_x = self.envelope.width() / self.range.width as f64;
        let scale_y = -self.envelope.height() / self.range.height as f64;
        let translate_x = self.envelope.min_x - scale_x * self.range.x as f64;
        let translate_y = self.envelope.max_y - scale_y * self.range.y as f64;

        Ok(AffineTransform::from_scale_translate(
            scale_x,
            scale_y,
            translate_x,
            translate_y,
        ))
    }
}
