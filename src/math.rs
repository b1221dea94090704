//! Column-major 4x4 matrix helpers used by the frame loop.
//!
//! Matrices are plain `[f32; 16]` arrays so they can be uploaded to the GPU
//! without conversion. Nothing here fails: degenerate input produces
//! well-defined but meaningless output.

use glam::{Mat4, Vec3};

/// 16 floats, column-major (`m[col * 4 + row]`).
pub type Matrix4 = [f32; 16];

#[rustfmt::skip]
pub const IDENTITY: Matrix4 = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

pub fn identity() -> Matrix4 {
    IDENTITY
}

/// Right-handed perspective projection into GL clip space (depth in `[-1, 1]`).
///
/// Preconditions, not checked: `fov_radians` in `(0, π)`, `near > 0`,
/// `far > near`.
pub fn perspective(fov_radians: f32, aspect: f32, near: f32, far: f32) -> Matrix4 {
    let f = 1.0 / (fov_radians * 0.5).tan();
    let range_inv = 1.0 / (near - far);
    let mut out = [0.0; 16];
    out[0] = f / aspect;
    out[5] = f;
    out[10] = (near + far) * range_inv;
    out[11] = -1.0;
    out[14] = 2.0 * near * far * range_inv;
    out
}

/// Pure translation matrix.
pub fn translation(x: f32, y: f32, z: f32) -> Matrix4 {
    let mut out = IDENTITY;
    out[12] = x;
    out[13] = y;
    out[14] = z;
    out
}

/// Post-multiplies `m` by a rotation about X, mixing its Y and Z columns.
pub fn rotate_x(m: &mut Matrix4, angle: f32) {
    let (s, c) = angle.sin_cos();
    for row in 0..4 {
        let y = m[4 + row];
        let z = m[8 + row];
        m[4 + row] = y * c + z * s;
        m[8 + row] = z * c - y * s;
    }
}

/// Post-multiplies `m` by a rotation about Y, mixing its X and Z columns.
pub fn rotate_y(m: &mut Matrix4, angle: f32) {
    let (s, c) = angle.sin_cos();
    for row in 0..4 {
        let x = m[row];
        let z = m[8 + row];
        m[row] = x * c - z * s;
        m[8 + row] = x * s + z * c;
    }
}

/// Scales the upper 3x3 block column by column.
pub fn scale(m: &mut Matrix4, sx: f32, sy: f32, sz: f32) {
    for (col, factor) in [sx, sy, sz].into_iter().enumerate() {
        for row in 0..3 {
            m[col * 4 + row] *= factor;
        }
    }
}

/// Writes `b · a` into `out`.
///
/// The operand order is reversed on purpose: `multiply(world, view, out)`
/// yields `view · world`, which is how the frame loop chains
/// world → view → projection.
pub fn multiply(a: &Matrix4, b: &Matrix4, out: &mut Matrix4) {
    for col in 0..4 {
        for row in 0..4 {
            let mut sum = 0.0;
            for k in 0..4 {
                sum += b[k * 4 + row] * a[col * 4 + k];
            }
            out[col * 4 + row] = sum;
        }
    }
}

pub fn transpose(m: &Matrix4) -> Matrix4 {
    let mut out = [0.0; 16];
    for col in 0..4 {
        for row in 0..4 {
            out[row * 4 + col] = m[col * 4 + row];
        }
    }
    out
}

/// Inverse of `m`, or `None` when it is singular.
pub fn inverse(m: &Matrix4) -> Option<Matrix4> {
    let mat = Mat4::from_cols_array(m);
    let det = mat.determinant();
    if det.abs() <= f32::EPSILON || !det.is_finite() {
        return None;
    }
    Some(mat.inverse().to_cols_array())
}

/// Applies `m` to the homogeneous point `(p, 1)` and returns the clip-space `[x, y, z, w]`.
pub fn transform_point(m: &Matrix4, p: Vec3) -> [f32; 4] {
    Mat4::from_cols_array(m)
        .mul_vec4(p.extend(1.0))
        .to_array()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn assert_close(a: &Matrix4, b: &Matrix4) {
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < 1e-6, "element {i}: {x} != {y}");
        }
    }

    fn sample() -> Matrix4 {
        let mut m = translation(1.0, -2.0, 3.5);
        rotate_y(&mut m, 0.7);
        scale(&mut m, 2.0, 0.5, 1.5);
        m
    }

    #[test]
    fn identity_is_neutral_for_multiply() {
        let m = sample();
        let mut out = [0.0; 16];
        multiply(&identity(), &m, &mut out);
        assert_close(&out, &m);
        multiply(&m, &identity(), &mut out);
        assert_close(&out, &m);
    }

    #[test]
    fn multiply_computes_second_operand_times_first() {
        let a = sample();
        let mut b = translation(0.0, 0.0, -5.0);
        rotate_x(&mut b, 0.3);
        let mut out = [0.0; 16];
        multiply(&a, &b, &mut out);
        let expected = Mat4::from_cols_array(&b) * Mat4::from_cols_array(&a);
        assert_close(&out, &expected.to_cols_array());
    }

    #[test]
    fn rotate_x_round_trips() {
        let original = sample();
        let mut m = original;
        rotate_x(&mut m, 1.234);
        rotate_x(&mut m, -1.234);
        assert_close(&m, &original);
    }

    #[test]
    fn rotations_post_multiply_existing_transform() {
        let base = sample();
        let mut m = base;
        rotate_y(&mut m, 0.4);
        let expected = Mat4::from_cols_array(&base) * Mat4::from_rotation_y(0.4);
        assert_close(&m, &expected.to_cols_array());

        let mut m = base;
        rotate_x(&mut m, -0.9);
        let expected = Mat4::from_cols_array(&base) * Mat4::from_rotation_x(-0.9);
        assert_close(&m, &expected.to_cols_array());
    }

    #[test]
    fn scale_leaves_translation_untouched() {
        let mut m = translation(4.0, 5.0, 6.0);
        scale(&mut m, 2.0, 3.0, 4.0);
        assert_eq!(&m[12..16], &[4.0, 5.0, 6.0, 1.0]);
        assert_eq!(m[0], 2.0);
        assert_eq!(m[5], 3.0);
        assert_eq!(m[10], 4.0);
    }

    #[test]
    fn perspective_keeps_points_on_view_axis_in_front() {
        let projection = perspective(PI / 4.0, 1.0, 0.1, 100.0);
        let clip = transform_point(&projection, Vec3::new(0.0, 0.0, -5.0));
        assert!(clip.iter().all(|c| c.is_finite()));
        assert!(clip[3] > 0.0);
        assert!((clip[3] - 5.0).abs() < 1e-6);
        let depth = clip[2] / clip[3];
        assert!((-1.0..=1.0).contains(&depth));
    }

    #[test]
    fn perspective_matches_glam_gl_projection() {
        let ours = perspective(PI / 4.0, 4.0 / 3.0, 0.1, 100.0);
        let reference = Mat4::perspective_rh_gl(PI / 4.0, 4.0 / 3.0, 0.1, 100.0);
        assert_close(&ours, &reference.to_cols_array());
    }

    #[test]
    fn inverse_undoes_the_transform() {
        let m = sample();
        let inv = inverse(&m).unwrap();
        let mut out = [0.0; 16];
        multiply(&m, &inv, &mut out);
        for (i, value) in out.iter().enumerate() {
            let expected = IDENTITY[i];
            assert!((value - expected).abs() < 1e-5);
        }
        assert!(inverse(&[0.0; 16]).is_none());
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let m = sample();
        let t = transpose(&m);
        assert_eq!(t[1], m[4]);
        assert_eq!(t[12], m[3]);
        assert_close(&transpose(&t), &m);
    }
}
