//! Math type re-exports and small vector helpers.
//!
//! Transform values are exchanged as double precision `glam` types
//! regardless of the precision they are stored with.

pub use glam::{
    // Single precision
    Vec3, Quat, Mat3, Mat4,
    // Double precision
    DVec3, DQuat, DMat3, DMat4,
    EulerRot,
};

/// Tolerance used when deciding whether a stored vector is zero.
pub const ZERO_EPSILON: f64 = 1e-4;

/// Check that every component of `v` is within `eps` of zero.
#[inline]
pub fn is_near_zero(v: DVec3, eps: f64) -> bool {
    v.x.abs() <= eps && v.y.abs() <= eps && v.z.abs() <= eps
}

/// Component-wise comparison with tolerance.
#[inline]
pub fn approx_eq(a: DVec3, b: DVec3, eps: f64) -> bool {
    is_near_zero(a - b, eps)
}

/// Build a shear matrix from the (xy, xz, yz) shear factors.
///
/// Row-vector convention, matching how the shear op is stored.
pub fn shear_matrix(shear: DVec3) -> DMat4 {
    let mut m = DMat4::IDENTITY;
    m.y_axis.x = shear.x;
    m.z_axis.x = shear.y;
    m.z_axis.y = shear.z;
    m
}

/// Extract (xy, xz, yz) shear factors from a matrix built by [`shear_matrix`].
pub fn shear_from_matrix(m: &DMat4) -> DVec3 {
    DVec3::new(m.y_axis.x, m.z_axis.x, m.z_axis.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_near_zero() {
        assert!(is_near_zero(DVec3::ZERO, ZERO_EPSILON));
        assert!(is_near_zero(DVec3::splat(5e-5), ZERO_EPSILON));
        assert!(!is_near_zero(DVec3::new(0.0, 0.001, 0.0), ZERO_EPSILON));
    }

    #[test]
    fn test_shear_matrix() {
        let s = DVec3::new(0.5, -0.25, 2.0);
        let m = shear_matrix(s);
        assert_eq!(shear_from_matrix(&m), s);
        assert_eq!(shear_matrix(DVec3::ZERO), DMat4::IDENTITY);
    }
}
