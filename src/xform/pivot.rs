//! Shared-pivot consolidation.
//!
//! Some stacks carry a single `xformOp:translate:pivot` pair used for both
//! rotation and scaling. Maya keeps separate rotate and scale pivots, so a
//! non-zero shared pivot is folded into both of them and zeroed before any
//! pivot is edited. The resulting transform is unchanged: the shared pair
//! cancels out once zeroed, and `rp + p` / `sp + p` keep every point where
//! it was.

use super::stack::{ensure_attribute, insert_ops};
use super::{OpIndex, OpNaming, XformOpType};
use crate::core::{Prim, TimeCode, Value, ValueType};
use crate::util::{is_near_zero, DVec3, Error, Result, ZERO_EPSILON};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Which Maya pivot an edit targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PivotKind {
    Rotate,
    Scale,
}

impl PivotKind {
    /// Stack position of the pivot (the inverse is its partner).
    pub const fn index(self) -> OpIndex {
        match self {
            Self::Rotate => OpIndex::RotatePivot,
            Self::Scale => OpIndex::ScalePivot,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Rotate => "rotatePivot",
            Self::Scale => "scalePivot",
        }
    }
}

/// Every authored time of `attr`: the default (if set) and each sample.
fn authored_times(prim: &Prim, attr: &str) -> Vec<TimeCode> {
    let default = prim.get(attr, TimeCode::Default).map(|_| TimeCode::Default);
    default
        .into_iter()
        .chain(prim.sample_times(attr).into_iter().map(TimeCode::At))
        .collect()
}

/// True if the shared pivot exists and any authored value (default or
/// sample) is not (near) zero.
pub fn needs_conversion(prim: &Prim, naming: &OpNaming) -> bool {
    let attr = naming.attr_name(OpIndex::Pivot, XformOpType::Translate);
    authored_times(prim, &attr).into_iter().any(|time| {
        prim.get(&attr, time)
            .and_then(|v| v.as_dvec3())
            .is_some_and(|p| !is_near_zero(p, ZERO_EPSILON))
    })
}

/// Declared type for a pivot target; missing attributes will be float.
fn target_type(prim: &Prim, attr: &str) -> Result<ValueType> {
    match prim.attribute_type(attr) {
        None => Ok(ValueType::Vec3f),
        Some(ty) if ty.is_vec3() => Ok(ty),
        Some(ty) => Err(Error::AttributeCreation {
            name: attr.to_string(),
            reason: format!("pivot authored as {ty}, expected a 3-vector"),
        }),
    }
}

/// Values to author on one pivot so it absorbs the shared pivot.
///
/// The default folds the shared default; every time sampled on either
/// attribute gets `own(t) + shared(t)`. Held interpolation makes the
/// result exact between samples.
fn folded_values(prim: &Prim, attr: &str, ty: ValueType, shared: &str) -> Result<Vec<(TimeCode, Value)>> {
    let read = |name: &str, time: TimeCode| prim.get(name, time).and_then(|v| v.as_dvec3());
    let mut writes = Vec::new();

    if let Some(p) = read(shared, TimeCode::Default) {
        let own = read(attr, TimeCode::Default).unwrap_or(DVec3::ZERO);
        writes.push((TimeCode::Default, Value::from_vec3(ty, own + p)?));
    }

    let mut times = prim.sample_times(shared);
    times.extend(prim.sample_times(attr));
    times.sort_by(f64::total_cmp);
    times.dedup();
    for t in times {
        let time = TimeCode::At(t);
        let own = read(attr, time).unwrap_or(DVec3::ZERO);
        let p = read(shared, time).unwrap_or(DVec3::ZERO);
        writes.push((time, Value::from_vec3(ty, own + p)?));
    }
    Ok(writes)
}

/// Fold the shared pivot into the rotate and scale pivots and zero it.
///
/// Both pivot attributes are validated and every value is computed before
/// anything is written, so a failure leaves the stored pivots untouched
/// and a retry cannot apply the shared pivot twice. Missing rotate/scale
/// pivot pairs are created (float precision) and inserted in canonical
/// order. Does not enter a change guard; callers coalesce notices
/// themselves.
pub fn convert(prim: &Prim, naming: &OpNaming) -> Result<()> {
    if !needs_conversion(prim, naming) {
        return Ok(());
    }
    let shared = naming.attr_name(OpIndex::Pivot, XformOpType::Translate);
    let Some(shared_ty) = prim.attribute_type(&shared) else {
        return Ok(());
    };
    let shared_times = authored_times(prim, &shared);

    let mut targets = Vec::with_capacity(2);
    for kind in [PivotKind::Rotate, PivotKind::Scale] {
        let attr = naming.attr_name(kind.index(), XformOpType::Translate);
        let ty = target_type(prim, &attr)?;
        targets.push((kind, attr, ty));
    }
    let mut folded = Vec::with_capacity(targets.len());
    for (kind, attr, ty) in &targets {
        folded.push((*kind, attr.as_str(), folded_values(prim, attr, *ty, &shared)?));
    }
    let zero = Value::from_vec3(shared_ty, DVec3::ZERO)?;

    let mut entries = Vec::with_capacity(4);
    for (kind, attr, ty) in &targets {
        ensure_attribute(prim, attr, *ty)?;
        let ndx = kind.index();
        let inverse = OpIndex::partner(ndx).unwrap_or(ndx);
        entries.push(naming.entry_name(ndx, XformOpType::Translate));
        entries.push(naming.entry_name(inverse, XformOpType::Translate));
    }
    insert_ops(prim, naming, &entries)?;

    for (kind, attr, writes) in folded {
        for (time, value) in writes {
            debug!(path = prim.path(), pivot = kind.label(), ?time, ?value, "pivot folded");
            prim.set(attr, value, time)?;
        }
    }
    for time in shared_times {
        prim.set(&shared, zero.clone(), time)?;
    }
    info!(path = prim.path(), "converted shared pivot to rotate/scale pivots");
    Ok(())
}

/// Lazily performed pivot conversion for one stack.
///
/// The flag is shared between clones of a stack handle, so the conversion
/// runs at most once per successful attempt.
#[derive(Clone, Debug, Default)]
pub struct PivotConversion {
    needed: Arc<AtomicBool>,
}

impl PivotConversion {
    /// Capture whether `prim` currently needs conversion.
    pub fn detect(prim: &Prim, naming: &OpNaming) -> Self {
        Self {
            needed: Arc::new(AtomicBool::new(needs_conversion(prim, naming))),
        }
    }

    pub fn is_needed(&self) -> bool {
        self.needed.load(Ordering::Acquire)
    }

    /// Run the conversion if still pending. Returns true if it ran now.
    ///
    /// A failed attempt leaves the flag set so a later call retries.
    pub fn run(&self, prim: &Prim, naming: &OpNaming) -> Result<bool> {
        if !self.is_needed() {
            return Ok(false);
        }
        convert(prim, naming)?;
        self.needed.store(false, Ordering::Release);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Stage;

    fn pivot_value(prim: &Prim, attr: &str) -> Option<DVec3> {
        prim.get(attr, TimeCode::Default).and_then(|v| v.as_dvec3())
    }

    fn prim_with_shared_pivot(p: DVec3) -> Prim {
        let stage = Stage::new();
        let prim = stage.define_prim("/A", "Xform").unwrap();
        prim.create_attribute("xformOp:translate:pivot", ValueType::Vec3f).unwrap();
        prim.set("xformOp:translate:pivot", Value::from_vec3(ValueType::Vec3f, p).unwrap(), TimeCode::Default)
            .unwrap();
        prim.set_xform_op_order(vec![
            "xformOp:translate".into(),
            "xformOp:translate:pivot".into(),
            "xformOp:rotateXYZ".into(),
            "!invert!xformOp:translate:pivot".into(),
        ])
        .unwrap();
        prim
    }

    #[test]
    fn test_needs_conversion() {
        let naming = OpNaming::default();
        let prim = prim_with_shared_pivot(DVec3::new(1.0, 2.0, 3.0));
        assert!(needs_conversion(&prim, &naming));

        let zero = prim_with_shared_pivot(DVec3::splat(1e-6));
        assert!(!needs_conversion(&zero, &naming));

        let stage = Stage::new();
        let bare = stage.define_prim("/B", "Xform").unwrap();
        assert!(!needs_conversion(&bare, &naming));
    }

    #[test]
    fn test_convert_folds_into_both_pivots() {
        let naming = OpNaming::default();
        let prim = prim_with_shared_pivot(DVec3::new(1.0, 2.0, 3.0));
        convert(&prim, &naming).unwrap();

        let p = DVec3::new(1.0, 2.0, 3.0);
        assert_eq!(pivot_value(&prim, "xformOp:translate:pivot"), Some(DVec3::ZERO));
        assert_eq!(pivot_value(&prim, "xformOp:translate:rotatePivot"), Some(p));
        assert_eq!(pivot_value(&prim, "xformOp:translate:scalePivot"), Some(p));
        assert_eq!(
            prim.xform_op_order(),
            vec![
                "xformOp:translate",
                "xformOp:translate:pivot",
                "xformOp:translate:rotatePivot",
                "xformOp:rotateXYZ",
                "!invert!xformOp:translate:rotatePivot",
                "xformOp:translate:scalePivot",
                "!invert!xformOp:translate:scalePivot",
                "!invert!xformOp:translate:pivot",
            ]
        );
        assert!(!needs_conversion(&prim, &naming));
    }

    #[test]
    fn test_flag_runs_once() {
        let naming = OpNaming::default();
        let prim = prim_with_shared_pivot(DVec3::X);
        let flag = PivotConversion::detect(&prim, &naming);
        let shared = flag.clone();
        assert!(flag.run(&prim, &naming).unwrap());
        assert!(!shared.is_needed());
        assert!(!shared.run(&prim, &naming).unwrap());
        assert_eq!(pivot_value(&prim, "xformOp:translate:rotatePivot"), Some(DVec3::X));
    }

    #[test]
    fn test_failed_conversion_stays_pending() {
        let naming = OpNaming::default();
        let prim = prim_with_shared_pivot(DVec3::X);
        let flag = PivotConversion::detect(&prim, &naming);
        prim.stage().set_read_only(true);
        assert!(flag.run(&prim, &naming).is_err());
        assert!(flag.is_needed());
    }

    #[test]
    fn test_mistyped_pivot_writes_nothing() {
        let naming = OpNaming::default();
        let prim = prim_with_shared_pivot(DVec3::new(1.0, 2.0, 3.0));
        prim.create_attribute("xformOp:translate:scalePivot", ValueType::Double).unwrap();
        let order = prim.xform_op_order();

        for _ in 0..2 {
            assert!(matches!(convert(&prim, &naming), Err(Error::AttributeCreation { .. })));
        }
        assert!(!prim.has_attribute("xformOp:translate:rotatePivot"));
        assert_eq!(prim.xform_op_order(), order);
        assert_eq!(pivot_value(&prim, "xformOp:translate:pivot"), Some(DVec3::new(1.0, 2.0, 3.0)));
        assert!(needs_conversion(&prim, &naming));
    }

    #[test]
    fn test_sampled_pivot_folds_every_sample() {
        let naming = OpNaming::default();
        let stage = Stage::new();
        let prim = stage.define_prim("/A", "Xform").unwrap();
        let shared = "xformOp:translate:pivot";
        let rotate = "xformOp:translate:rotatePivot";
        prim.create_attribute(shared, ValueType::Vec3f).unwrap();
        prim.set(shared, Value::from_vec3(ValueType::Vec3f, DVec3::X).unwrap(), TimeCode::At(0.0))
            .unwrap();
        prim.set(shared, Value::from_vec3(ValueType::Vec3f, DVec3::Y).unwrap(), TimeCode::At(10.0))
            .unwrap();
        prim.create_attribute(rotate, ValueType::Vec3f).unwrap();
        prim.set(rotate, Value::from_vec3(ValueType::Vec3f, DVec3::Z).unwrap(), TimeCode::At(5.0))
            .unwrap();
        prim.set_xform_op_order(vec![shared.into(), format!("!invert!{shared}")]).unwrap();
        assert!(needs_conversion(&prim, &naming));

        convert(&prim, &naming).unwrap();
        assert!(!needs_conversion(&prim, &naming));
        assert_eq!(prim.sample_times(shared), vec![0.0, 10.0]);
        assert_eq!(prim.get(shared, TimeCode::Default), None);

        let at = |attr: &str, t: f64| prim.get(attr, TimeCode::At(t)).and_then(|v| v.as_dvec3());
        for t in [-1.0, 0.0, 5.0, 7.0, 10.0, 20.0] {
            assert_eq!(at(shared, t), Some(DVec3::ZERO));
        }
        assert_eq!(prim.sample_times(rotate), vec![0.0, 5.0, 10.0]);
        assert_eq!(at(rotate, -1.0), Some(DVec3::Z + DVec3::X));
        assert_eq!(at(rotate, 7.0), Some(DVec3::Z + DVec3::X));
        assert_eq!(at(rotate, 20.0), Some(DVec3::Z + DVec3::Y));
        // Scale pivot had no value; it takes the shared samples as they were.
        assert_eq!(at("xformOp:translate:scalePivot", 3.0), Some(DVec3::X));
        assert_eq!(at("xformOp:translate:scalePivot", 12.0), Some(DVec3::Y));

        // A second run is a no-op.
        convert(&prim, &naming).unwrap();
        assert_eq!(at(rotate, 20.0), Some(DVec3::Z + DVec3::Y));
    }
}
