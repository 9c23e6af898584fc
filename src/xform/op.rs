//! Transform operation names and types.
//!
//! An op-order entry has the form
//! `[!invert!]xformOp:<type>[:<token>...]`; the attribute it refers to is
//! the entry without the `!invert!` prefix, so a pivot and its inverse
//! share one attribute.

use super::RotationKind;
use crate::core::{Precision, Prim, TimeCode, Value, ValueType};
use crate::util::{Error, Result};
use std::fmt;

/// Namespace prefix of every transform op attribute.
pub const XFORM_OP_PREFIX: &str = "xformOp:";

/// Prefix marking an inverse op in the op order.
pub const INVERT_PREFIX: &str = "!invert!";

/// Transform operation type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum XformOpType {
    // Scalar
    TranslateX,
    TranslateY,
    TranslateZ,
    // Vec3
    Translate,

    // Scalar
    ScaleX,
    ScaleY,
    ScaleZ,
    // Vec3
    Scale,

    // Scalar
    RotateX,
    RotateY,
    RotateZ,

    // Vec3
    RotateXYZ,
    RotateXZY,
    RotateYXZ,
    RotateYZX,
    RotateZXY,
    RotateZYX,

    // Quat
    Orient,

    // Matrix4
    Transform,
}

impl XformOpType {
    pub const ALL: [XformOpType; 19] = [
        Self::TranslateX,
        Self::TranslateY,
        Self::TranslateZ,
        Self::Translate,
        Self::ScaleX,
        Self::ScaleY,
        Self::ScaleZ,
        Self::Scale,
        Self::RotateX,
        Self::RotateY,
        Self::RotateZ,
        Self::RotateXYZ,
        Self::RotateXZY,
        Self::RotateYXZ,
        Self::RotateYZX,
        Self::RotateZXY,
        Self::RotateZYX,
        Self::Orient,
        Self::Transform,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TranslateX => "translateX",
            Self::TranslateY => "translateY",
            Self::TranslateZ => "translateZ",
            Self::Translate => "translate",
            Self::ScaleX => "scaleX",
            Self::ScaleY => "scaleY",
            Self::ScaleZ => "scaleZ",
            Self::Scale => "scale",
            Self::RotateX => "rotateX",
            Self::RotateY => "rotateY",
            Self::RotateZ => "rotateZ",
            Self::RotateXYZ => "rotateXYZ",
            Self::RotateXZY => "rotateXZY",
            Self::RotateYXZ => "rotateYXZ",
            Self::RotateYZX => "rotateYZX",
            Self::RotateZXY => "rotateZXY",
            Self::RotateZYX => "rotateZYX",
            Self::Orient => "orient",
            Self::Transform => "transform",
        }
    }

    /// Rotation encoding for rotate and orient ops.
    pub const fn rotation_kind(self) -> Option<RotationKind> {
        Some(match self {
            Self::RotateX => RotationKind::X,
            Self::RotateY => RotationKind::Y,
            Self::RotateZ => RotationKind::Z,
            Self::RotateXYZ => RotationKind::XYZ,
            Self::RotateXZY => RotationKind::XZY,
            Self::RotateYXZ => RotationKind::YXZ,
            Self::RotateYZX => RotationKind::YZX,
            Self::RotateZXY => RotationKind::ZXY,
            Self::RotateZYX => RotationKind::ZYX,
            Self::Orient => RotationKind::Orient,
            _ => return None,
        })
    }

    /// Op type storing the given rotation encoding.
    pub const fn from_rotation_kind(kind: RotationKind) -> Self {
        match kind {
            RotationKind::X => Self::RotateX,
            RotationKind::Y => Self::RotateY,
            RotationKind::Z => Self::RotateZ,
            RotationKind::XYZ => Self::RotateXYZ,
            RotationKind::XZY => Self::RotateXZY,
            RotationKind::YXZ => Self::RotateYXZ,
            RotationKind::YZX => Self::RotateYZX,
            RotationKind::ZXY => Self::RotateZXY,
            RotationKind::ZYX => Self::RotateZYX,
            RotationKind::Orient => Self::Orient,
        }
    }

    /// Attribute type holding a value of this op at the given precision.
    pub const fn value_type(self, precision: Precision) -> ValueType {
        match self {
            Self::TranslateX
            | Self::TranslateY
            | Self::TranslateZ
            | Self::ScaleX
            | Self::ScaleY
            | Self::ScaleZ
            | Self::RotateX
            | Self::RotateY
            | Self::RotateZ => ValueType::scalar(precision),
            Self::Translate
            | Self::Scale
            | Self::RotateXYZ
            | Self::RotateXZY
            | Self::RotateYXZ
            | Self::RotateYZX
            | Self::RotateZXY
            | Self::RotateZYX => ValueType::vec3(precision),
            Self::Orient => match precision {
                Precision::Double => ValueType::Quatd,
                _ => ValueType::Quatf,
            },
            Self::Transform => ValueType::Matrix4d,
        }
    }
}

impl TryFrom<&str> for XformOpType {
    type Error = Error;
    fn try_from(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidOpName(s.to_string()))
    }
}

impl fmt::Display for XformOpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a prim's op order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XformOp {
    /// Entry as written in the op order (including `!invert!`).
    name: String,
    op_type: XformOpType,
    /// Namespace tokens after the type (suffix and/or role).
    tokens: Vec<String>,
    is_inverse: bool,
}

impl XformOp {
    /// Parse an op-order entry.
    pub fn parse(entry: &str) -> Result<Self> {
        let (is_inverse, attr) = match entry.strip_prefix(INVERT_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, entry),
        };
        let body = attr
            .strip_prefix(XFORM_OP_PREFIX)
            .ok_or_else(|| Error::InvalidOpName(entry.to_string()))?;

        let mut parts = body.split(':');
        let op_type = XformOpType::try_from(parts.next().unwrap_or(""))
            .map_err(|_| Error::InvalidOpName(entry.to_string()))?;
        let tokens: Vec<String> = parts.map(str::to_string).collect();
        if tokens.iter().any(String::is_empty) {
            return Err(Error::InvalidOpName(entry.to_string()));
        }

        Ok(Self {
            name: entry.to_string(),
            op_type,
            tokens,
            is_inverse,
        })
    }

    /// Build the op-order entry for a type and namespace tokens.
    pub fn entry_name(op_type: XformOpType, tokens: &[&str], is_inverse: bool) -> String {
        let mut name = String::new();
        if is_inverse {
            name.push_str(INVERT_PREFIX);
        }
        name.push_str(XFORM_OP_PREFIX);
        name.push_str(op_type.as_str());
        for token in tokens {
            name.push(':');
            name.push_str(token);
        }
        name
    }

    /// Entry as it appears in the op order.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing attribute name.
    pub fn attr_name(&self) -> &str {
        self.name.strip_prefix(INVERT_PREFIX).unwrap_or(&self.name)
    }

    pub fn op_type(&self) -> XformOpType {
        self.op_type
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_inverse(&self) -> bool {
        self.is_inverse
    }

    /// Declared type of the backing attribute.
    pub fn value_type(&self, prim: &Prim) -> Option<ValueType> {
        prim.attribute_type(self.attr_name())
    }

    /// Precision of the backing attribute.
    pub fn precision(&self, prim: &Prim) -> Option<Precision> {
        self.value_type(prim).and_then(ValueType::precision)
    }

    pub fn get(&self, prim: &Prim, time: TimeCode) -> Option<Value> {
        prim.get(self.attr_name(), time)
    }
}

impl fmt::Display for XformOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let op = XformOp::parse("xformOp:translate").unwrap();
        assert_eq!(op.op_type(), XformOpType::Translate);
        assert!(op.tokens().is_empty());
        assert!(!op.is_inverse());
        assert_eq!(op.attr_name(), "xformOp:translate");
    }

    #[test]
    fn test_parse_inverse_pivot() {
        let op = XformOp::parse("!invert!xformOp:translate:rotatePivot").unwrap();
        assert!(op.is_inverse());
        assert_eq!(op.tokens(), ["rotatePivot".to_string()]);
        assert_eq!(op.attr_name(), "xformOp:translate:rotatePivot");
        assert_eq!(op.name(), "!invert!xformOp:translate:rotatePivot");
    }

    #[test]
    fn test_parse_rejects() {
        assert!(XformOp::parse("translate").is_err());
        assert!(XformOp::parse("xformOp:spin").is_err());
        assert!(XformOp::parse("xformOp:rotateXYZ::rotateAxis").is_err());
    }

    #[test]
    fn test_entry_name() {
        assert_eq!(
            XformOp::entry_name(XformOpType::Translate, &["maya_fallback", "scalePivot"], true),
            "!invert!xformOp:translate:maya_fallback:scalePivot"
        );
        assert_eq!(XformOp::entry_name(XformOpType::Scale, &[], false), "xformOp:scale");
    }

    #[test]
    fn test_value_types() {
        assert_eq!(XformOpType::RotateZ.value_type(Precision::Float), ValueType::Float);
        assert_eq!(XformOpType::RotateYXZ.value_type(Precision::Double), ValueType::Vec3d);
        assert_eq!(XformOpType::Transform.value_type(Precision::Float), ValueType::Matrix4d);
        assert_eq!(XformOpType::Orient.value_type(Precision::Half), ValueType::Quatf);
    }

    #[test]
    fn test_rotation_kind_roundtrip() {
        for t in XformOpType::ALL {
            if let Some(kind) = t.rotation_kind() {
                assert_eq!(XformOpType::from_rotation_kind(kind), t);
            }
        }
    }
}
