//! Canonical Maya transform stack positions.
//!
//! Each op a Maya-compatible stack may hold has a fixed position
//! ([`OpIndex`]). The name -> position table is built once from the name
//! grammar `[!invert!]xformOp:<type>[:<suffix>][:<role>]` and never
//! mutated afterwards.

use super::{XformOp, XformOpType};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Position of an op in the canonical stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpIndex {
    Translate = 0,
    Pivot,
    RotatePivotTranslate,
    RotatePivot,
    Rotate,
    RotateAxis,
    RotatePivotInverse,
    ScalePivotTranslate,
    ScalePivot,
    Shear,
    Scale,
    ScalePivotInverse,
    PivotInverse,
}

/// Rotate op types accepted at the rotate and rotate-axis positions.
const ROTATE_TYPES: [XformOpType; 9] = [
    XformOpType::RotateX,
    XformOpType::RotateY,
    XformOpType::RotateZ,
    XformOpType::RotateXYZ,
    XformOpType::RotateXZY,
    XformOpType::RotateYXZ,
    XformOpType::RotateYZX,
    XformOpType::RotateZXY,
    XformOpType::RotateZYX,
];

impl OpIndex {
    pub const COUNT: usize = 13;

    pub const ALL: [OpIndex; Self::COUNT] = [
        Self::Translate,
        Self::Pivot,
        Self::RotatePivotTranslate,
        Self::RotatePivot,
        Self::Rotate,
        Self::RotateAxis,
        Self::RotatePivotInverse,
        Self::ScalePivotTranslate,
        Self::ScalePivot,
        Self::Shear,
        Self::Scale,
        Self::ScalePivotInverse,
        Self::PivotInverse,
    ];

    #[inline]
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// Role token following the type (and suffix) in the op name.
    pub const fn role(self) -> Option<&'static str> {
        match self {
            Self::Translate | Self::Rotate | Self::Scale => None,
            Self::Pivot | Self::PivotInverse => Some("pivot"),
            Self::RotatePivotTranslate => Some("rotatePivotTranslate"),
            Self::RotatePivot | Self::RotatePivotInverse => Some("rotatePivot"),
            Self::RotateAxis => Some("rotateAxis"),
            Self::ScalePivotTranslate => Some("scalePivotTranslate"),
            Self::ScalePivot | Self::ScalePivotInverse => Some("scalePivot"),
            Self::Shear => Some("shear"),
        }
    }

    pub const fn is_inverse(self) -> bool {
        matches!(self, Self::RotatePivotInverse | Self::ScalePivotInverse | Self::PivotInverse)
    }

    /// The other half of a pivot pair.
    pub const fn partner(self) -> Option<OpIndex> {
        match self {
            Self::Pivot => Some(Self::PivotInverse),
            Self::PivotInverse => Some(Self::Pivot),
            Self::RotatePivot => Some(Self::RotatePivotInverse),
            Self::RotatePivotInverse => Some(Self::RotatePivot),
            Self::ScalePivot => Some(Self::ScalePivotInverse),
            Self::ScalePivotInverse => Some(Self::ScalePivot),
            _ => None,
        }
    }

    /// Op type authored when the stack creates this op.
    pub const fn default_op_type(self) -> XformOpType {
        match self {
            Self::Rotate | Self::RotateAxis => XformOpType::RotateXYZ,
            Self::Shear => XformOpType::Transform,
            Self::Scale => XformOpType::Scale,
            _ => XformOpType::Translate,
        }
    }

    /// Op types legal at this position.
    pub fn op_types(self) -> &'static [XformOpType] {
        match self {
            Self::Rotate | Self::RotateAxis => &ROTATE_TYPES,
            Self::Shear => &[XformOpType::Transform],
            Self::Scale => &[XformOpType::Scale],
            _ => &[XformOpType::Translate],
        }
    }

    /// Canonical (suffix-free) op-order entry for an op type at this position.
    pub fn canonical_name(self, op_type: XformOpType) -> String {
        let tokens: Vec<&str> = self.role().into_iter().collect();
        XformOp::entry_name(op_type, &tokens, self.is_inverse())
    }
}

impl fmt::Display for OpIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn build_table() -> HashMap<String, OpIndex> {
    let mut table = HashMap::new();
    for index in OpIndex::ALL {
        for &op_type in index.op_types() {
            let prev = table.insert(index.canonical_name(op_type), index);
            debug_assert!(prev.is_none());
        }
    }
    table
}

fn table() -> &'static HashMap<String, OpIndex> {
    static TABLE: OnceLock<HashMap<String, OpIndex>> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

/// Resolve an op-order entry to its canonical position.
///
/// `suffix` is the stack's namespace token: when set, the token right
/// after the op type must equal it. `None` means "not part of a
/// Maya-compatible stack".
pub fn ordinal_of(name: &str, suffix: Option<&str>) -> Option<OpIndex> {
    match suffix {
        None => table().get(name).copied(),
        Some(suffix) => {
            let canonical = strip_suffix(name, suffix)?;
            table().get(&canonical).copied()
        }
    }
}

/// Remove the `:<suffix>` token following the op type.
fn strip_suffix(name: &str, suffix: &str) -> Option<String> {
    let (head, rest) = match name.strip_prefix(super::INVERT_PREFIX) {
        Some(rest) => (super::INVERT_PREFIX, rest),
        None => ("", name),
    };
    let body = rest.strip_prefix(super::XFORM_OP_PREFIX)?;
    let mut parts = body.split(':');
    let op_type = parts.next()?;
    if parts.next()? != suffix {
        return None;
    }
    let mut canonical = format!("{head}{}{op_type}", super::XFORM_OP_PREFIX);
    for part in parts {
        canonical.push(':');
        canonical.push_str(part);
    }
    Some(canonical)
}

/// Builds op names for one stack flavour.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpNaming {
    suffix: Option<String>,
}

impl OpNaming {
    pub fn new(suffix: Option<String>) -> Self {
        Self {
            suffix: suffix.filter(|s| !s.is_empty()),
        }
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    fn tokens(&self, index: OpIndex) -> Vec<&str> {
        self.suffix().into_iter().chain(index.role()).collect()
    }

    /// Backing attribute name for an op at `index`.
    pub fn attr_name(&self, index: OpIndex, op_type: XformOpType) -> String {
        XformOp::entry_name(op_type, &self.tokens(index), false)
    }

    /// Op-order entry for an op at `index` (with `!invert!` for inverses).
    pub fn entry_name(&self, index: OpIndex, op_type: XformOpType) -> String {
        XformOp::entry_name(op_type, &self.tokens(index), index.is_inverse())
    }

    /// Name of the single matrix op holding a whole transform.
    pub fn matrix_attr_name(&self) -> String {
        let tokens: Vec<&str> = self.suffix().into_iter().collect();
        XformOp::entry_name(XformOpType::Transform, &tokens, false)
    }

    /// Position of an op-order entry for this naming.
    pub fn ordinal_of(&self, name: &str) -> Option<OpIndex> {
        ordinal_of(name, self.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_canonical_names() {
        assert_eq!(ordinal_of("xformOp:translate", None), Some(OpIndex::Translate));
        assert_eq!(ordinal_of("xformOp:translate:pivot", None), Some(OpIndex::Pivot));
        assert_eq!(
            ordinal_of("!invert!xformOp:translate:rotatePivot", None),
            Some(OpIndex::RotatePivotInverse)
        );
        assert_eq!(ordinal_of("xformOp:rotateZ", None), Some(OpIndex::Rotate));
        assert_eq!(ordinal_of("xformOp:rotateYZX:rotateAxis", None), Some(OpIndex::RotateAxis));
        assert_eq!(ordinal_of("xformOp:transform:shear", None), Some(OpIndex::Shear));
        assert_eq!(ordinal_of("!invert!xformOp:translate:pivot", None), Some(OpIndex::PivotInverse));
    }

    #[test]
    fn test_incompatible_names() {
        assert_eq!(ordinal_of("xformOp:orient", None), None);
        assert_eq!(ordinal_of("xformOp:transform", None), None);
        assert_eq!(ordinal_of("xformOp:translateX", None), None);
        assert_eq!(ordinal_of("xformOp:translate:foo", None), None);
        assert_eq!(ordinal_of("!invert!xformOp:translate", None), None);
        assert_eq!(ordinal_of("!invert!xformOp:rotateXYZ", None), None);
    }

    #[test]
    fn test_suffixed_names() {
        assert_eq!(
            ordinal_of("xformOp:translate:maya_fallback", Some("maya_fallback")),
            Some(OpIndex::Translate)
        );
        assert_eq!(
            ordinal_of("!invert!xformOp:translate:maya_fallback:scalePivot", Some("maya_fallback")),
            Some(OpIndex::ScalePivotInverse)
        );
        // Suffix is mandatory once configured.
        assert_eq!(ordinal_of("xformOp:translate", Some("maya_fallback")), None);
        assert_eq!(ordinal_of("xformOp:translate:other", Some("maya_fallback")), None);
    }

    #[test]
    fn test_ordinals_total_and_unique() {
        let naming_variants = [OpNaming::default(), OpNaming::new(Some("edit".into()))];
        for naming in &naming_variants {
            let mut seen: HashMap<String, OpIndex> = HashMap::new();
            for index in OpIndex::ALL {
                for &op_type in index.op_types() {
                    let name = naming.entry_name(index, op_type);
                    assert_eq!(naming.ordinal_of(&name), Some(index), "{name}");
                    assert!(seen.insert(name, index).is_none());
                }
            }

            // Only the rotate aliases share an ordinal.
            for index in OpIndex::ALL {
                let names = seen.values().filter(|&&i| i == index).count();
                let expected = if matches!(index, OpIndex::Rotate | OpIndex::RotateAxis) { 9 } else { 1 };
                assert_eq!(names, expected, "{index}");
            }
        }
    }

    #[test]
    fn test_order_matches_positions() {
        let ordinals: Vec<usize> = OpIndex::ALL.iter().map(|i| i.ordinal()).collect();
        assert_eq!(ordinals, (0..OpIndex::COUNT).collect::<Vec<_>>());
        assert!(OpIndex::Translate < OpIndex::RotatePivotTranslate);
        assert!(OpIndex::RotateAxis < OpIndex::RotatePivotInverse);
        assert!(OpIndex::Shear < OpIndex::Scale);
        assert!(OpIndex::Scale < OpIndex::ScalePivotInverse);
    }

    #[test]
    fn test_partners() {
        let pairs: HashSet<(OpIndex, OpIndex)> = OpIndex::ALL
            .iter()
            .filter_map(|&i| i.partner().map(|p| (i, p)))
            .collect();
        for (a, b) in &pairs {
            assert_eq!(b.partner(), Some(*a));
            assert_ne!(a.is_inverse(), b.is_inverse());
            assert_eq!(a.role(), b.role());
        }
        assert_eq!(pairs.len(), 6);
    }
}
