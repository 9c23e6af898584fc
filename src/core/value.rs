//! Typed attribute values.
//!
//! A [`ValueType`] is fixed when an attribute is created; every later
//! write must carry a [`Value`] of exactly that type.

use crate::util::{DMat4, DQuat, DVec3, Error, Quat, Result, Vec3};
use half::f16;
use std::fmt;

/// Floating point precision of a stored value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Precision {
    /// 16-bit (IEEE 754 half precision)
    Half,
    /// 32-bit
    Float,
    /// 64-bit
    Double,
}

impl Precision {
    /// Short name used in type names ("h", "f", "d").
    #[inline]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Half => "h",
            Self::Float => "f",
            Self::Double => "d",
        }
    }
}

/// Declared type of an attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Half,
    Float,
    Double,
    Vec3h,
    Vec3f,
    Vec3d,
    Quatf,
    Quatd,
    Matrix4d,
    TokenArray,
}

impl ValueType {
    /// Scalar type with the given precision.
    #[inline]
    pub const fn scalar(precision: Precision) -> Self {
        match precision {
            Precision::Half => Self::Half,
            Precision::Float => Self::Float,
            Precision::Double => Self::Double,
        }
    }

    /// 3-vector type with the given precision.
    #[inline]
    pub const fn vec3(precision: Precision) -> Self {
        match precision {
            Precision::Half => Self::Vec3h,
            Precision::Float => Self::Vec3f,
            Precision::Double => Self::Vec3d,
        }
    }

    /// Precision of the floating point components, if any.
    pub const fn precision(self) -> Option<Precision> {
        match self {
            Self::Half | Self::Vec3h => Some(Precision::Half),
            Self::Float | Self::Vec3f | Self::Quatf => Some(Precision::Float),
            Self::Double | Self::Vec3d | Self::Quatd | Self::Matrix4d => Some(Precision::Double),
            Self::TokenArray => None,
        }
    }

    #[inline]
    pub const fn is_scalar(self) -> bool {
        matches!(self, Self::Half | Self::Float | Self::Double)
    }

    #[inline]
    pub const fn is_vec3(self) -> bool {
        matches!(self, Self::Vec3h | Self::Vec3f | Self::Vec3d)
    }

    /// Type name as written in scene description.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Half => "half",
            Self::Float => "float",
            Self::Double => "double",
            Self::Vec3h => "half3",
            Self::Vec3f => "float3",
            Self::Vec3d => "double3",
            Self::Quatf => "quatf",
            Self::Quatd => "quatd",
            Self::Matrix4d => "matrix4d",
            Self::TokenArray => "token[]",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Half(f16),
    Float(f32),
    Double(f64),
    Vec3h([f16; 3]),
    Vec3f(Vec3),
    Vec3d(DVec3),
    Quatf(Quat),
    Quatd(DQuat),
    Matrix4d(DMat4),
    TokenArray(Vec<String>),
}

impl Value {
    /// Type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Half(_) => ValueType::Half,
            Self::Float(_) => ValueType::Float,
            Self::Double(_) => ValueType::Double,
            Self::Vec3h(_) => ValueType::Vec3h,
            Self::Vec3f(_) => ValueType::Vec3f,
            Self::Vec3d(_) => ValueType::Vec3d,
            Self::Quatf(_) => ValueType::Quatf,
            Self::Quatd(_) => ValueType::Quatd,
            Self::Matrix4d(_) => ValueType::Matrix4d,
            Self::TokenArray(_) => ValueType::TokenArray,
        }
    }

    /// Build a 3-vector value of the given type from double components.
    pub fn from_vec3(ty: ValueType, v: DVec3) -> Result<Self> {
        Ok(match ty {
            ValueType::Vec3h => Self::Vec3h([f16::from_f64(v.x), f16::from_f64(v.y), f16::from_f64(v.z)]),
            ValueType::Vec3f => Self::Vec3f(v.as_vec3()),
            ValueType::Vec3d => Self::Vec3d(v),
            other => return Err(Error::mismatch("3-vector", other.name())),
        })
    }

    /// Build a scalar value of the given type.
    pub fn from_scalar(ty: ValueType, s: f64) -> Result<Self> {
        Ok(match ty {
            ValueType::Half => Self::Half(f16::from_f64(s)),
            ValueType::Float => Self::Float(s as f32),
            ValueType::Double => Self::Double(s),
            other => return Err(Error::mismatch("scalar", other.name())),
        })
    }

    /// Scalar value widened to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Half(v) => Some(v.to_f64()),
            Self::Float(v) => Some(v as f64),
            Self::Double(v) => Some(v),
            _ => None,
        }
    }

    /// 3-vector value widened to double precision.
    pub fn as_dvec3(&self) -> Option<DVec3> {
        match self {
            Self::Vec3h(v) => Some(DVec3::new(v[0].to_f64(), v[1].to_f64(), v[2].to_f64())),
            Self::Vec3f(v) => Some(v.as_dvec3()),
            Self::Vec3d(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_dmat4(&self) -> Option<DMat4> {
        match self {
            Self::Matrix4d(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_dquat(&self) -> Option<DQuat> {
        match self {
            Self::Quatf(q) => Some(q.as_dquat()),
            Self::Quatd(q) => Some(*q),
            _ => None,
        }
    }

    pub fn as_tokens(&self) -> Option<&[String]> {
        match self {
            Self::TokenArray(t) => Some(t),
            _ => None,
        }
    }
}
