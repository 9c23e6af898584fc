//! Conversions between a canonical XYZ Euler rotation and stored rotation
//! encodings.
//!
//! All angles are in degrees. A `rotateABC` op applies A first, then B,
//! then C, so with column vectors its matrix is `R_C * R_B * R_A`.
//! Single-axis encodings carry their angle in the `x` slot of the encoded
//! vector.

use crate::util::{DQuat, DVec3, EulerRot};
use std::fmt;

/// Stored rotation encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RotationKind {
    X,
    Y,
    Z,
    XYZ,
    XZY,
    YXZ,
    YZX,
    ZXY,
    ZYX,
    /// Quaternion; no Euler conversion is provided.
    Orient,
}

impl RotationKind {
    pub const ALL: [RotationKind; 10] = [
        Self::X,
        Self::Y,
        Self::Z,
        Self::XYZ,
        Self::XZY,
        Self::YXZ,
        Self::YZX,
        Self::ZXY,
        Self::ZYX,
        Self::Orient,
    ];

    #[inline]
    pub const fn is_single_axis(self) -> bool {
        matches!(self, Self::X | Self::Y | Self::Z)
    }

    #[inline]
    pub const fn is_three_axis(self) -> bool {
        !self.is_single_axis() && !matches!(self, Self::Orient)
    }

    /// Component of the canonical triple a single-axis kind keeps.
    const fn axis(self) -> Option<usize> {
        match self {
            Self::X => Some(0),
            Self::Y => Some(1),
            Self::Z => Some(2),
            _ => None,
        }
    }
}

impl fmt::Display for RotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Pure rotation conversion, degrees in, degrees out.
pub type RotationConvert = fn(DVec3) -> DVec3;

/// Quaternion for a rotation stored with `kind` (three-axis kinds only).
fn compose(kind: RotationKind, deg: DVec3) -> DQuat {
    let (x, y, z) = (deg.x.to_radians(), deg.y.to_radians(), deg.z.to_radians());
    match kind {
        RotationKind::XZY => DQuat::from_euler(EulerRot::YZX, y, z, x),
        RotationKind::YXZ => DQuat::from_euler(EulerRot::ZXY, z, x, y),
        RotationKind::YZX => DQuat::from_euler(EulerRot::XZY, x, z, y),
        RotationKind::ZXY => DQuat::from_euler(EulerRot::YXZ, y, x, z),
        RotationKind::ZYX => DQuat::from_euler(EulerRot::XYZ, x, y, z),
        _ => DQuat::from_euler(EulerRot::ZYX, z, y, x),
    }
}

/// Angles (degrees) of `q` for a rotation stored with `kind`.
fn decompose(kind: RotationKind, q: DQuat) -> DVec3 {
    let (x, y, z) = match kind {
        RotationKind::XZY => {
            let (y, z, x) = q.to_euler(EulerRot::YZX);
            (x, y, z)
        }
        RotationKind::YXZ => {
            let (z, x, y) = q.to_euler(EulerRot::ZXY);
            (x, y, z)
        }
        RotationKind::YZX => {
            let (x, z, y) = q.to_euler(EulerRot::XZY);
            (x, y, z)
        }
        RotationKind::ZXY => {
            let (y, x, z) = q.to_euler(EulerRot::YXZ);
            (x, y, z)
        }
        RotationKind::ZYX => q.to_euler(EulerRot::XYZ),
        _ => {
            let (z, y, x) = q.to_euler(EulerRot::ZYX);
            (x, y, z)
        }
    };
    DVec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

/// Quaternion of a canonical XYZ Euler rotation in degrees.
pub fn quat_from_xyz(deg: DVec3) -> DQuat {
    compose(RotationKind::XYZ, deg)
}

/// Canonical XYZ Euler angles (degrees) of a quaternion.
pub fn xyz_from_quat(q: DQuat) -> DVec3 {
    decompose(RotationKind::XYZ, q)
}

fn to_x(v: DVec3) -> DVec3 {
    DVec3::new(v.x, 0.0, 0.0)
}
fn to_y(v: DVec3) -> DVec3 {
    DVec3::new(v.y, 0.0, 0.0)
}
fn to_z(v: DVec3) -> DVec3 {
    DVec3::new(v.z, 0.0, 0.0)
}
fn from_x(v: DVec3) -> DVec3 {
    DVec3::new(v.x, 0.0, 0.0)
}
fn from_y(v: DVec3) -> DVec3 {
    DVec3::new(0.0, v.x, 0.0)
}
fn from_z(v: DVec3) -> DVec3 {
    DVec3::new(0.0, 0.0, v.x)
}
fn identity(v: DVec3) -> DVec3 {
    v
}
fn to_xzy(v: DVec3) -> DVec3 {
    decompose(RotationKind::XZY, quat_from_xyz(v))
}
fn to_yxz(v: DVec3) -> DVec3 {
    decompose(RotationKind::YXZ, quat_from_xyz(v))
}
fn to_yzx(v: DVec3) -> DVec3 {
    decompose(RotationKind::YZX, quat_from_xyz(v))
}
fn to_zxy(v: DVec3) -> DVec3 {
    decompose(RotationKind::ZXY, quat_from_xyz(v))
}
fn to_zyx(v: DVec3) -> DVec3 {
    decompose(RotationKind::ZYX, quat_from_xyz(v))
}
fn from_xzy(v: DVec3) -> DVec3 {
    xyz_from_quat(compose(RotationKind::XZY, v))
}
fn from_yxz(v: DVec3) -> DVec3 {
    xyz_from_quat(compose(RotationKind::YXZ, v))
}
fn from_yzx(v: DVec3) -> DVec3 {
    xyz_from_quat(compose(RotationKind::YZX, v))
}
fn from_zxy(v: DVec3) -> DVec3 {
    xyz_from_quat(compose(RotationKind::ZXY, v))
}
fn from_zyx(v: DVec3) -> DVec3 {
    xyz_from_quat(compose(RotationKind::ZYX, v))
}

/// Conversion from canonical XYZ degrees to the value stored for `kind`.
///
/// Single-axis kinds drop the other two components. `Orient` has no
/// conversion.
pub fn to_encoding(kind: RotationKind) -> Option<RotationConvert> {
    Some(match kind {
        RotationKind::X => to_x,
        RotationKind::Y => to_y,
        RotationKind::Z => to_z,
        RotationKind::XYZ => identity,
        RotationKind::XZY => to_xzy,
        RotationKind::YXZ => to_yxz,
        RotationKind::YZX => to_yzx,
        RotationKind::ZXY => to_zxy,
        RotationKind::ZYX => to_zyx,
        RotationKind::Orient => return None,
    })
}

/// Conversion from the value stored for `kind` to canonical XYZ degrees.
///
/// Single-axis kinds zero-fill the other components. `Orient` has no
/// conversion.
pub fn from_encoding(kind: RotationKind) -> Option<RotationConvert> {
    Some(match kind {
        RotationKind::X => from_x,
        RotationKind::Y => from_y,
        RotationKind::Z => from_z,
        RotationKind::XYZ => identity,
        RotationKind::XZY => from_xzy,
        RotationKind::YXZ => from_yxz,
        RotationKind::YZX => from_yzx,
        RotationKind::ZXY => from_zxy,
        RotationKind::ZYX => from_zyx,
        RotationKind::Orient => return None,
    })
}

/// True if converting `v` to `kind` loses components.
pub fn is_lossy(kind: RotationKind, v: DVec3) -> bool {
    match kind.axis() {
        Some(axis) => (0..3).any(|i| i != axis && v[i] != 0.0),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::approx_eq;

    const EPS: f64 = 1e-4;

    const SAMPLES: [[f64; 3]; 6] = [
        [0.0, 0.0, 0.0],
        [10.0, 20.0, 30.0],
        [-45.0, 60.0, 170.0],
        [120.0, -30.0, -150.0],
        [30.0, -70.0, 80.0],
        [-5.5, 44.0, 0.25],
    ];

    #[test]
    fn test_three_axis_roundtrip() {
        for kind in RotationKind::ALL.into_iter().filter(|k| k.is_three_axis()) {
            let to = to_encoding(kind).unwrap();
            let from = from_encoding(kind).unwrap();
            for s in SAMPLES {
                let v = DVec3::from_array(s);
                let back = from(to(v));
                assert!(approx_eq(back, v, EPS), "{kind}: {v:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn test_single_axis_roundtrip() {
        let cases = [
            (RotationKind::X, DVec3::new(30.0, 0.0, 0.0)),
            (RotationKind::Y, DVec3::new(0.0, -12.5, 0.0)),
            (RotationKind::Z, DVec3::new(0.0, 0.0, 270.0)),
        ];
        for (kind, v) in cases {
            let back = from_encoding(kind).unwrap()(to_encoding(kind).unwrap()(v));
            assert_eq!(back, v, "{kind}");
        }
    }

    #[test]
    fn test_single_axis_truncation_zero_fills() {
        let v = DVec3::new(10.0, 20.0, 30.0);
        let back = from_encoding(RotationKind::Y).unwrap()(to_encoding(RotationKind::Y).unwrap()(v));
        assert_eq!(back, DVec3::new(0.0, 20.0, 0.0));
        assert!(is_lossy(RotationKind::Y, v));
        assert!(!is_lossy(RotationKind::Z, DVec3::new(0.0, 0.0, 5.0)));
        assert!(!is_lossy(RotationKind::XYZ, v));
    }

    #[test]
    fn test_orient_unsupported() {
        assert!(to_encoding(RotationKind::Orient).is_none());
        assert!(from_encoding(RotationKind::Orient).is_none());
    }

    #[test]
    fn test_encodings_describe_same_rotation() {
        let v = DVec3::new(10.0, 20.0, 30.0);
        let q = quat_from_xyz(v);
        for kind in RotationKind::ALL.into_iter().filter(|k| k.is_three_axis()) {
            let encoded = to_encoding(kind).unwrap()(v);
            let qk = compose(kind, encoded);
            // q and -q are the same rotation
            assert!(q.dot(qk).abs() > 1.0 - 1e-9, "{kind}");
        }
    }

    #[test]
    fn test_single_axis_matches_three_axis() {
        // rotateZ(30) == rotateXYZ(0, 0, 30)
        let q = compose(RotationKind::XYZ, DVec3::new(0.0, 0.0, 30.0));
        let expected = DQuat::from_rotation_z(30f64.to_radians());
        assert!(q.dot(expected).abs() > 1.0 - 1e-12);
    }
}
