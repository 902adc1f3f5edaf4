//! Root transform conversion
//!
//! The scene is Z-up, the object format is Y-up: vectors are written as
//! `(x, z, y)`. Rotation is stored as Euler angles in `YXZ` order, meaning
//! the Y rotation is applied first, then X, then Z: `R = Rz * Rx * Ry`.

use glam::{Mat3, Mat4, Vec3};

/// Below this |cos(x)| the YXZ decomposition is in gimbal lock
const GIMBAL_EPSILON: f32 = 16.0 * f32::EPSILON;

/// Swap the second and third components
pub fn convert(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

/// Build a glam matrix from snapshot rows
pub fn world_matrix(rows: &[[f32; 4]; 4]) -> Mat4 {
    Mat4::from_cols_array_2d(rows).transpose()
}

/// YXZ Euler angles of the rotation part of `matrix`, scale removed
///
/// Of the two angle triples that produce the rotation, the one with the
/// smaller `|x| + |y| + |z|` is returned. In gimbal lock `z` is 0.
pub fn euler_yxz(matrix: &Mat4) -> Vec3 {
    let m = Mat3::from_mat4(*matrix);
    let m = Mat3::from_cols(
        m.x_axis.normalize_or_zero(),
        m.y_axis.normalize_or_zero(),
        m.z_axis.normalize_or_zero(),
    );

    // m_rc = row r, column c
    let m00 = m.x_axis.x;
    let m20 = m.x_axis.z;
    let m01 = m.y_axis.x;
    let m11 = m.y_axis.y;
    let m21 = m.y_axis.z;
    let m02 = m.z_axis.x;
    let m22 = m.z_axis.z;

    // |cos(x)|
    let cx = m20.hypot(m22);
    if cx <= GIMBAL_EPSILON {
        return Vec3::new(m21.atan2(cx), m02.atan2(m00), 0.0);
    }

    let first = Vec3::new(m21.atan2(cx), (-m20).atan2(m22), (-m01).atan2(m11));
    let second = Vec3::new(m21.atan2(-cx), m20.atan2(-m22), m01.atan2(-m11));
    if first.abs().element_sum() > second.abs().element_sum() {
        second
    } else {
        first
    }
}

/// Rotation matrix for YXZ Euler angles, inverse of [`euler_yxz`]
pub fn rotation_yxz(euler: Vec3) -> Mat3 {
    Mat3::from_rotation_z(euler.z) * Mat3::from_rotation_x(euler.x) * Mat3::from_rotation_y(euler.y)
}

/// Converted `(translation, euler)` of a root matrix, `None` for identity
pub fn root_transform(rows: &[[f32; 4]; 4]) -> Option<(Vec3, Vec3)> {
    let matrix = world_matrix(rows);
    if matrix == Mat4::IDENTITY {
        return None;
    }

    let translation = matrix.w_axis.truncate();
    Some((convert(translation), convert(euler_yxz(&matrix))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};
    use xrobject_core::IDENTITY_MATRIX;

    fn rows_of(matrix: Mat4) -> [[f32; 4]; 4] {
        matrix.transpose().to_cols_array_2d()
    }

    #[test]
    fn test_convert_swaps_y_z() {
        assert_eq!(convert(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 3.0, 2.0));
    }

    #[test]
    fn test_world_matrix_reads_rows() {
        let mut rows = IDENTITY_MATRIX;
        rows[0][3] = 5.0;
        rows[1][3] = 6.0;
        rows[2][3] = 7.0;

        assert_eq!(world_matrix(&rows).w_axis.truncate(), Vec3::new(5.0, 6.0, 7.0));
    }

    #[test]
    fn test_identity_has_no_transform() {
        assert!(root_transform(&IDENTITY_MATRIX).is_none());
    }

    #[test]
    fn test_translation_only() {
        let rows = rows_of(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        let (translation, euler) = root_transform(&rows).unwrap();

        assert_eq!(translation, Vec3::new(1.0, 3.0, 2.0));
        assert!(euler.abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn test_euler_roundtrip() {
        let cases = [
            Vec3::new(0.3, -0.7, 1.2),
            Vec3::new(-1.0, 2.5, -0.4),
            Vec3::new(0.0, 0.0, 3.0),
        ];
        for euler in cases {
            let rotation = rotation_yxz(euler);
            let back = euler_yxz(&Mat4::from_mat3(rotation));
            assert!(rotation_yxz(back).abs_diff_eq(rotation, 1e-5), "{euler:?} -> {back:?}");
        }
    }

    #[test]
    fn test_scale_is_ignored() {
        let euler = Vec3::new(0.2, 0.4, -0.6);
        let matrix = Mat4::from_mat3(rotation_yxz(euler)) * Mat4::from_scale(Vec3::splat(3.0));
        assert!(euler_yxz(&matrix).abs_diff_eq(euler, 1e-5));
    }

    #[test]
    fn test_picks_smaller_solution() {
        let rotation = rotation_yxz(Vec3::new(0.3, 3.0, 3.0));
        let back = euler_yxz(&Mat4::from_mat3(rotation));

        let expected = Vec3::new(PI - 0.3, 3.0 - PI, 3.0 - PI);
        assert!(back.abs_diff_eq(expected, 1e-5), "{back:?}");
        assert!(rotation_yxz(back).abs_diff_eq(rotation, 1e-5));
    }

    #[test]
    fn test_keeps_first_solution_when_smaller() {
        let euler = Vec3::new(-0.5, 1.0, 0.25);
        let back = euler_yxz(&Mat4::from_mat3(rotation_yxz(euler)));
        assert!(back.abs_diff_eq(euler, 1e-5), "{back:?}");
    }

    #[test]
    fn test_gimbal_lock_pins_z() {
        let rotation = rotation_yxz(Vec3::new(FRAC_PI_2, 0.5, 0.25));
        let back = euler_yxz(&Mat4::from_mat3(rotation));

        assert_eq!(back.z, 0.0);
        assert!((back.x - FRAC_PI_2).abs() < 1e-5);
        assert!((back.y - 0.75).abs() < 1e-4, "{back:?}");
        assert!(rotation_yxz(back).abs_diff_eq(rotation, 1e-4));
    }

    #[test]
    fn test_gimbal_lock_negative_pitch() {
        let rotation = rotation_yxz(Vec3::new(-FRAC_PI_2, 0.5, 0.25));
        let back = euler_yxz(&Mat4::from_mat3(rotation));

        assert_eq!(back.z, 0.0);
        assert!((back.y - 0.25).abs() < 1e-4, "{back:?}");
        assert!(rotation_yxz(back).abs_diff_eq(rotation, 1e-4));
    }
}
