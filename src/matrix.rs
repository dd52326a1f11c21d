//! Transformation matrices: the CTM and the text matrices.

use serde_derive::{Deserialize, Serialize};

/// A 3×3 affine matrix in the PDF row-vector convention, stored as the six
/// free coefficients `[a b c d e f]`:
///
/// ```text
/// | a b 0 |
/// | c d 0 |
/// | e f 1 |
/// ```
///
/// Points transform as `(x', y') = (x·a + y·c + e, x·b + y·d + f)`;
/// composition is right-multiplication, so `cm` computes `M · CTM`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::identity()
    }
}

impl Matrix {
    pub fn identity() -> Self {
        Matrix {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Translation matrix: `1 0 0 1 tx ty`.
    pub fn translate(tx: f32, ty: f32) -> Self {
        Matrix {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: tx,
            f: ty,
        }
    }

    /// Scale matrix: `sx 0 0 sy 0 0`.
    pub fn scale(sx: f32, sy: f32) -> Self {
        Matrix {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn from_array(m: [f32; 6]) -> Self {
        Matrix {
            a: m[0],
            b: m[1],
            c: m[2],
            d: m[3],
            e: m[4],
            f: m[5],
        }
    }

    pub fn as_array(&self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Matrix product `self · other`. With row vectors this applies `self`
    /// first, then `other`.
    pub fn mul(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Map a user-space point to device space.
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_neutral() {
        let m = Matrix::from_array([2.0, 0.0, 0.0, 2.0, 5.0, 7.0]);
        assert_eq!(m.mul(&Matrix::identity()), m);
        assert_eq!(Matrix::identity().mul(&m), m);
    }

    #[test]
    fn test_translate_then_scale() {
        // translate first, scale second: the offset is scaled too
        let m = Matrix::translate(10.0, 0.0).mul(&Matrix::scale(2.0, 2.0));
        assert_eq!(m.transform_point(0.0, 0.0), (20.0, 0.0));
        assert_eq!(m.transform_point(1.0, 1.0), (22.0, 2.0));
    }

    #[test]
    fn test_zero_translation_is_noop() {
        let tlm = Matrix::from_array([1.0, 0.0, 0.0, 1.0, 100.0, 700.0]);
        assert_eq!(Matrix::translate(0.0, 0.0).mul(&tlm), tlm);
    }
}
