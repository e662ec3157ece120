//! 4x4 transformation matrix.
//!
//! Cells are stored column-major (OpenGL convention), so the translation lives
//! in cells 12..=14 and the slice can be handed to `uniformMatrix4fv`-style
//! calls without transposing.

use std::ops::{Index, IndexMut, Mul};

/// A column-major 4x4 matrix of `f32`.
///
/// All transform operations mutate the receiver and return `&mut Self` so they
/// can be chained:
///
/// ```
/// use scene_ngin::data_structures::matrix::Matrix4;
///
/// let mut m = Matrix4::new();
/// m.rotate(std::f32::consts::FRAC_PI_2, [0.0, 1.0, 0.0])
///     .translate([0.0, 0.0, 1.0]);
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Matrix4([f32; 16]);

impl Matrix4 {
    pub const IDENTITY: Matrix4 = Matrix4([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    /// Create a new identity matrix.
    pub fn new() -> Self {
        Self::IDENTITY
    }

    pub fn from_cols_array(cells: [f32; 16]) -> Self {
        Self(cells)
    }

    pub fn as_array(&self) -> &[f32; 16] {
        &self.0
    }

    /// Reset to the identity matrix.
    pub fn identity(&mut self) -> &mut Self {
        self.0 = Self::IDENTITY.0;
        self
    }

    /// `self = self × other`.
    ///
    /// With column vectors this applies `other` first and `self` second, so
    /// `parent.multiply(&child)` places `child` inside `parent`'s frame.
    pub fn multiply(&mut self, other: &Matrix4) -> &mut Self {
        let a = self.0;
        let b = &other.0;
        for col in 0..4 {
            for row in 0..4 {
                self.0[col * 4 + row] = a[row] * b[col * 4]
                    + a[4 + row] * b[col * 4 + 1]
                    + a[8 + row] * b[col * 4 + 2]
                    + a[12 + row] * b[col * 4 + 3];
            }
        }
        self
    }

    /// Scale the three basis columns by `v`.
    pub fn scale(&mut self, v: [f32; 3]) -> &mut Self {
        for (col, factor) in v.iter().enumerate() {
            for row in 0..4 {
                self.0[col * 4 + row] *= factor;
            }
        }
        self
    }

    /// Translate along the matrix's own (local) axes.
    ///
    /// The offset is expressed in the current basis before being added to the
    /// translation column, i.e. `self = self × T(v)`.
    pub fn translate(&mut self, v: [f32; 3]) -> &mut Self {
        let m = &mut self.0;
        for row in 0..4 {
            m[12 + row] += m[row] * v[0] + m[4 + row] * v[1] + m[8 + row] * v[2];
        }
        self
    }

    /// Rotate by `angle` radians around `axis` (Rodrigues' formula), i.e.
    /// `self = self × R(angle, axis)`.
    ///
    /// The axis is normalised first. A zero-length axis leaves the matrix
    /// untouched.
    pub fn rotate(&mut self, angle: f32, axis: [f32; 3]) -> &mut Self {
        let len = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
        if len == 0.0 {
            return self;
        }
        let (x, y, z) = (axis[0] / len, axis[1] / len, axis[2] / len);
        let (sin, cos) = angle.sin_cos();
        let t = 1.0 - cos;

        // Columns of the 3x3 rotation block.
        let r = [
            [x * x * t + cos, y * x * t + z * sin, z * x * t - y * sin],
            [x * y * t - z * sin, y * y * t + cos, z * y * t + x * sin],
            [x * z * t + y * sin, y * z * t - x * sin, z * z * t + cos],
        ];

        let m = self.0;
        for (col, r_col) in r.iter().enumerate() {
            for row in 0..4 {
                self.0[col * 4 + row] =
                    m[row] * r_col[0] + m[4 + row] * r_col[1] + m[8 + row] * r_col[2];
            }
        }
        self
    }

    /// Build a right-handed view matrix looking from `eye` towards `center`.
    ///
    /// When `eye == center` there is no view direction and the matrix is reset
    /// to identity instead of filling up with NaNs.
    pub fn look_at(&mut self, eye: [f32; 3], center: [f32; 3], up: [f32; 3]) -> &mut Self {
        if eye == center {
            return self.identity();
        }

        let z = normalize_or_zero(sub(eye, center));
        let x = normalize_or_zero(cross(up, z));
        let y = normalize_or_zero(cross(z, x));

        self.0 = [
            x[0], y[0], z[0], 0.0, //
            x[1], y[1], z[1], 0.0, //
            x[2], y[2], z[2], 0.0, //
            -dot(x, eye), -dot(y, eye), -dot(z, eye), 1.0,
        ];
        self
    }

    /// Build a perspective projection.
    ///
    /// `fov_y` is the vertical field of view in degrees. Depth maps to the
    /// OpenGL clip range with `w = -z_eye`.
    pub fn perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) -> &mut Self {
        let top = near * (fov_y.to_radians() / 2.0).tan();
        let right = top * aspect;
        let depth = far - near;

        self.0 = [
            near / right, 0.0, 0.0, 0.0, //
            0.0, near / top, 0.0, 0.0, //
            0.0, 0.0, -(far + near) / depth, -1.0, //
            0.0, 0.0, -(far * near * 2.0) / depth, 0.0,
        ];
        self
    }

    pub fn transpose(&mut self) -> &mut Self {
        for col in 0..4 {
            for row in (col + 1)..4 {
                self.0.swap(col * 4 + row, row * 4 + col);
            }
        }
        self
    }

    /// Invert in place using cofactor expansion.
    ///
    /// A singular matrix yields non-finite cells; callers must not invert
    /// degenerate transforms.
    pub fn inverse(&mut self) -> &mut Self {
        let [a, b, c, d, e, f, g, h, i, j, k, l, m, n, o, p] = self.0;

        let q = a * f - b * e;
        let r = a * g - c * e;
        let s = a * h - d * e;
        let t = b * g - c * f;
        let u = b * h - d * f;
        let v = c * h - d * g;
        let w = i * n - j * m;
        let x = i * o - k * m;
        let y = i * p - l * m;
        let z = j * o - k * n;
        let aa = j * p - l * n;
        let bb = k * p - l * o;
        let inv_det = 1.0 / (q * bb - r * aa + s * z + t * y - u * x + v * w);

        self.0 = [
            (f * bb - g * aa + h * z) * inv_det,
            (-b * bb + c * aa - d * z) * inv_det,
            (n * v - o * u + p * t) * inv_det,
            (-j * v + k * u - l * t) * inv_det,
            (-e * bb + g * y - h * x) * inv_det,
            (a * bb - c * y + d * x) * inv_det,
            (-m * v + o * s - p * r) * inv_det,
            (i * v - k * s + l * r) * inv_det,
            (e * aa - f * y + h * w) * inv_det,
            (-a * aa + b * y - d * w) * inv_det,
            (m * u - n * s + p * q) * inv_det,
            (-i * u + j * s - l * q) * inv_det,
            (-e * z + f * x - g * w) * inv_det,
            (a * z - b * x + c * w) * inv_det,
            (-m * t + n * r - o * q) * inv_det,
            (i * t - j * r + k * q) * inv_det,
        ];
        self
    }

    /// Transform a point (w = 1), dividing by the resulting w when it is not 1.
    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 3] {
        let m = &self.0;
        let mut out = [0.0; 4];
        for (row, cell) in out.iter_mut().enumerate() {
            *cell = m[row] * p[0] + m[4 + row] * p[1] + m[8 + row] * p[2] + m[12 + row];
        }
        if out[3] != 0.0 && out[3] != 1.0 {
            [out[0] / out[3], out[1] / out[3], out[2] / out[3]]
        } else {
            [out[0], out[1], out[2]]
        }
    }

    /// Compare cell by cell with an absolute tolerance.
    pub fn approx_eq(&self, other: &Matrix4, epsilon: f32) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for Matrix4 {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

impl IndexMut<usize> for Matrix4 {
    fn index_mut(&mut self, index: usize) -> &mut f32 {
        &mut self.0[index]
    }
}

impl Mul<Matrix4> for Matrix4 {
    type Output = Matrix4;

    fn mul(mut self, rhs: Matrix4) -> Matrix4 {
        self.multiply(&rhs);
        self
    }
}

impl<'a, 'b> Mul<&'b Matrix4> for &'a Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: &'b Matrix4) -> Matrix4 {
        let mut out = *self;
        out.multiply(rhs);
        out
    }
}

impl From<cgmath::Matrix4<f32>> for Matrix4 {
    fn from(m: cgmath::Matrix4<f32>) -> Self {
        let cols: [[f32; 4]; 4] = m.into();
        Self(bytemuck::cast(cols))
    }
}

impl From<Matrix4> for cgmath::Matrix4<f32> {
    fn from(m: Matrix4) -> Self {
        let cols: [[f32; 4]; 4] = bytemuck::cast(m.0);
        cols.into()
    }
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize_or_zero(v: [f32; 3]) -> [f32; 3] {
    let len = dot(v, v).sqrt();
    if len == 0.0 {
        [0.0; 3]
    } else {
        [v[0] / len, v[1] / len, v[2] / len]
    }
}
