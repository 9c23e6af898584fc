//! Maya-compatible transform op stack.
//!
//! A [`MayaXformStack`] edits a prim whose op order is a subsequence of the
//! canonical Maya stack (see [`OpIndex`]). It never caches the op list: every
//! read and every factory rescans the prim's op order, so ops created by
//! earlier commands are visible immediately.
//!
//! Two flavours exist. The primary stack owns every op on the prim. The
//! fallback stack writes suffixed ops (`xformOp:translate:maya_fallback`)
//! appended after whatever foreign ops the prim already has, so prims that
//! do not fit the Maya layout can still be edited.

use super::rotation::{from_encoding, is_lossy, to_encoding};
use super::{
    CreateOpFn, EncodeFn, MatchResult, OpIndex, OpNaming, PivotConversion, PivotKind, RotationKind,
    SetValueCommand, Transform3d, XformOp, XformOpType,
};
use crate::config::{Settings, SingleAxisPolicy, WriteTime};
use crate::core::{Host, Precision, Prim, TimeCode, TransformChangeGuard, Value, ValueType};
use crate::util::{shear_from_matrix, shear_matrix, DVec3, Error, Result, Vec3};
use half::f16;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Suffix of ops written by the fallback stack.
pub const FALLBACK_SUFFIX: &str = "maya_fallback";

/// Which op namespace a stack manages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StackFlavor {
    /// Owns the whole op order.
    Primary,
    /// Appends suffixed ops after foreign ones.
    Fallback,
}

impl StackFlavor {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Primary => "maya",
            Self::Fallback => "maya_fallback",
        }
    }
}

/// Vector types a caller may hand to [`MayaXformStack::set_vector3_cmd`].
///
/// The type picks the precision of an op created by the command.
pub trait Vector3Value: Copy {
    const PRECISION: Precision;
    fn to_dvec3(self) -> DVec3;
}

impl Vector3Value for DVec3 {
    const PRECISION: Precision = Precision::Double;
    fn to_dvec3(self) -> DVec3 {
        self
    }
}

impl Vector3Value for Vec3 {
    const PRECISION: Precision = Precision::Float;
    fn to_dvec3(self) -> DVec3 {
        self.as_dvec3()
    }
}

impl Vector3Value for [f16; 3] {
    const PRECISION: Precision = Precision::Half;
    fn to_dvec3(self) -> DVec3 {
        DVec3::new(self[0].to_f64(), self[1].to_f64(), self[2].to_f64())
    }
}

fn creation_error(attr: &str, err: Error) -> Error {
    match err {
        e if e.is_edit_refusal() => e,
        e @ Error::PrimNotFound(_) => e,
        e => Error::AttributeCreation {
            name: attr.to_string(),
            reason: e.to_string(),
        },
    }
}

/// Make sure `attr` exists with a type of the same shape as `ty`.
///
/// An existing attribute keeps its declared type (and so its precision);
/// that type is returned.
pub(crate) fn ensure_attribute(prim: &Prim, attr: &str, ty: ValueType) -> Result<ValueType> {
    match prim.attribute_type(attr) {
        Some(existing)
            if existing == ty
                || (existing.is_vec3() && ty.is_vec3())
                || (existing.is_scalar() && ty.is_scalar()) =>
        {
            Ok(existing)
        }
        Some(existing) => Err(Error::AttributeCreation {
            name: attr.to_string(),
            reason: format!("authored as {existing}, expected {ty}"),
        }),
        None => {
            prim.create_attribute(attr, ty).map_err(|e| creation_error(attr, e))?;
            Ok(ty)
        }
    }
}

/// Add `entries` to the op order in canonical position.
///
/// Foreign ops (no position under `naming`) stay first in their original
/// relative order; managed ops are stably sorted by position.
pub(crate) fn insert_ops(prim: &Prim, naming: &OpNaming, entries: &[String]) -> Result<()> {
    let mut order = prim.xform_op_order();
    let before = order.len();
    for entry in entries {
        if !order.contains(entry) {
            order.push(entry.clone());
        }
    }
    if order.len() == before {
        return Ok(());
    }

    let (foreign, mut managed): (Vec<String>, Vec<String>) =
        order.into_iter().partition(|name| naming.ordinal_of(name).is_none());
    managed.sort_by_key(|name| naming.ordinal_of(name));
    let order: Vec<String> = foreign.into_iter().chain(managed).collect();
    debug!(path = prim.path(), ?order, "inserted transform ops");
    prim.set_xform_op_order(order)
}

/// Creation strategy: ensure the attribute, then insert its op-order entries.
pub(crate) fn create_ops(attr: String, ty: ValueType, entries: Vec<String>, naming: OpNaming) -> CreateOpFn {
    Box::new(move |prim: &Prim| {
        ensure_attribute(prim, &attr, ty)?;
        insert_ops(prim, &naming, &entries)
    })
}

/// Creation strategy: swap an existing op-order entry for a new op in place.
fn replace_op(attr: String, ty: ValueType, old_entry: String, new_entry: String, naming: OpNaming) -> CreateOpFn {
    Box::new(move |prim: &Prim| {
        ensure_attribute(prim, &attr, ty)?;
        let mut order = prim.xform_op_order();
        match order.iter().position(|name| *name == old_entry) {
            Some(i) => {
                order[i] = new_entry;
                debug!(path = prim.path(), from = %old_entry, to = %order[i], "replaced transform op");
                prim.set_xform_op_order(order)
            }
            None => insert_ops(prim, &naming, &[new_entry]),
        }
    })
}

fn encode_vec3() -> EncodeFn {
    Box::new(|ty, _current, v| Value::from_vec3(ty, v))
}

fn encode_rotation(kind: RotationKind) -> Result<EncodeFn> {
    let convert = to_encoding(kind).ok_or_else(|| Error::UnsupportedRotation(kind.to_string()))?;
    Ok(Box::new(move |ty, _current, v| {
        let encoded = convert(v);
        if ty.is_scalar() {
            Value::from_scalar(ty, encoded.x)
        } else {
            Value::from_vec3(ty, encoded)
        }
    }))
}

fn encode_shear() -> EncodeFn {
    Box::new(|ty, _current, v| match ty {
        ValueType::Matrix4d => Ok(Value::Matrix4d(shear_matrix(v))),
        other => Err(Error::mismatch(ValueType::Matrix4d.name(), other.name())),
    })
}

/// Op stack of a prim laid out in Maya's canonical transform order.
#[derive(Clone)]
pub struct MayaXformStack {
    prim: Prim,
    host: Arc<dyn Host>,
    flavor: StackFlavor,
    naming: OpNaming,
    single_axis: SingleAxisPolicy,
    write_time: WriteTime,
    pivots: PivotConversion,
}

impl MayaXformStack {
    /// Build a stack for `prim` if its op order fits this flavour.
    pub fn match_prim(prim: &Prim, host: Arc<dyn Host>, settings: &Settings, flavor: StackFlavor) -> MatchResult<Self> {
        if !prim.is_valid() {
            return MatchResult::NoMatch;
        }
        let (naming, single_axis) = match flavor {
            StackFlavor::Primary => (OpNaming::new(settings.op_suffix.clone()), settings.single_axis_rotation),
            StackFlavor::Fallback => (
                OpNaming::new(Some(FALLBACK_SUFFIX.to_string())),
                settings.fallback_single_axis_rotation,
            ),
        };

        let order = prim.xform_op_order();
        if !Self::is_compatible(&order, &naming, flavor) {
            debug!(path = prim.path(), flavor = flavor.name(), ?order, "op order does not match");
            return MatchResult::NoMatch;
        }

        let pivots = PivotConversion::detect(prim, &naming);
        MatchResult::Matched(Self {
            prim: prim.clone(),
            host,
            flavor,
            naming,
            single_axis,
            write_time: settings.write_time,
            pivots,
        })
    }

    /// Check an op order against the canonical layout.
    ///
    /// Managed ops must appear in strictly increasing position and pivots
    /// must come with their inverses. The primary flavour rejects any
    /// foreign op; the fallback flavour accepts foreign ops only before
    /// its own.
    pub fn is_compatible(order: &[String], naming: &OpNaming, flavor: StackFlavor) -> bool {
        let mut present = [false; OpIndex::COUNT];
        let mut last: Option<OpIndex> = None;
        for name in order {
            match naming.ordinal_of(name) {
                Some(ndx) => {
                    if last.is_some_and(|prev| prev >= ndx) {
                        return false;
                    }
                    last = Some(ndx);
                    present[ndx.ordinal()] = true;
                }
                None => {
                    if flavor == StackFlavor::Primary || last.is_some() {
                        return false;
                    }
                }
            }
        }
        OpIndex::ALL.iter().all(|ndx| match ndx.partner() {
            Some(partner) => present[ndx.ordinal()] == present[partner.ordinal()],
            None => true,
        })
    }

    pub fn flavor(&self) -> StackFlavor {
        self.flavor
    }

    pub fn naming(&self) -> &OpNaming {
        &self.naming
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// Managed ops currently on the prim, in op-order sequence.
    pub fn ops(&self) -> Vec<(OpIndex, XformOp)> {
        self.prim
            .xform_op_order()
            .iter()
            .filter_map(|name| {
                let ndx = self.naming.ordinal_of(name)?;
                XformOp::parse(name).ok().map(|op| (ndx, op))
            })
            .collect()
    }

    fn find_op(&self, ndx: OpIndex) -> Option<XformOp> {
        self.prim
            .xform_op_order()
            .iter()
            .find(|name| self.naming.ordinal_of(name) == Some(ndx))
            .and_then(|name| XformOp::parse(name).ok())
    }

    pub fn has_op(&self, ndx: OpIndex) -> bool {
        self.find_op(ndx).is_some()
    }

    /// Op at `ndx`; fails with [`Error::OpNotFound`] when absent.
    pub fn get_op(&self, ndx: OpIndex) -> Result<XformOp> {
        self.find_op(ndx).ok_or_else(|| Error::OpNotFound(ndx.to_string()))
    }

    fn read_time(&self) -> TimeCode {
        self.host.stage_time(&self.prim)
    }

    fn write_time(&self) -> TimeCode {
        match self.write_time {
            WriteTime::Default => TimeCode::Default,
            WriteTime::Current => self.read_time(),
        }
    }

    fn vec3_of(&self, ndx: OpIndex) -> Option<DVec3> {
        let op = self.find_op(ndx)?;
        op.get(&self.prim, self.read_time())?.as_dvec3()
    }

    fn rotation_of(&self, ndx: OpIndex) -> DVec3 {
        let Some(op) = self.find_op(ndx) else {
            return DVec3::ZERO;
        };
        let Some(from) = op.op_type().rotation_kind().and_then(from_encoding) else {
            return DVec3::ZERO;
        };
        let encoded = match op.get(&self.prim, self.read_time()) {
            Some(value) => match value.as_f64() {
                Some(angle) => DVec3::new(angle, 0.0, 0.0),
                None => value.as_dvec3().unwrap_or(DVec3::ZERO),
            },
            None => return DVec3::ZERO,
        };
        from(encoded)
    }

    /// True while a shared pivot is waiting to be folded into the Maya pivots.
    pub fn needs_pivot_conversion(&self) -> bool {
        self.pivots.is_needed()
    }

    /// Run the pending pivot conversion under a change guard.
    ///
    /// Returns true if the conversion ran now.
    pub fn convert_pivots(&self) -> Result<bool> {
        if !self.pivots.is_needed() {
            return Ok(false);
        }
        let _guard = TransformChangeGuard::enter(self.prim.stage().notices(), self.prim.path())?;
        self.pivots.run(&self.prim, &self.naming)
    }

    /// Shared pivot value at the read time (zero once converted).
    pub fn common_pivot(&self) -> DVec3 {
        let attr = self.naming.attr_name(OpIndex::Pivot, XformOpType::Translate);
        self.prim
            .get(&attr, self.read_time())
            .and_then(|v| v.as_dvec3())
            .unwrap_or(DVec3::ZERO)
    }

    fn pivot_of(&self, kind: PivotKind) -> DVec3 {
        let own = || self.vec3_of(kind.index()).unwrap_or(DVec3::ZERO);
        match self.convert_pivots() {
            Ok(_) => own(),
            Err(e) => {
                warn!(path = self.prim.path(), error = %e, "pivot conversion failed; reading combined pivot");
                own() + self.common_pivot()
            }
        }
    }

    /// Consult the host; a refusal is `Ok(false)`, anything else propagates.
    fn edit_allowed(&self, attr: &str) -> Result<bool> {
        match self.host.check_edit(&self.prim, attr) {
            Ok(()) => Ok(true),
            Err(e) if e.is_edit_refusal() => {
                info!(path = self.prim.path(), attribute = attr, reason = %e, "edit refused");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn command(&self, label: &str, attr: &str) -> SetValueCommand {
        SetValueCommand::new(label, &self.prim, attr, self.write_time())
    }

    /// Command setting a plain vector op (translate, scale or a
    /// pivot-translate). Pivot positions are routed to [`pivot_cmd`](Self::pivot_cmd).
    ///
    /// An op created by the command takes the precision of `V`.
    pub fn set_vector3_cmd<V: Vector3Value>(&self, value: V, ndx: OpIndex) -> Result<Option<SetValueCommand>> {
        let v = value.to_dvec3();
        match ndx {
            OpIndex::Translate | OpIndex::RotatePivotTranslate | OpIndex::ScalePivotTranslate | OpIndex::Scale => {}
            OpIndex::RotatePivot => return self.pivot_cmd(PivotKind::Rotate, v.x, v.y, v.z),
            OpIndex::ScalePivot => return self.pivot_cmd(PivotKind::Scale, v.x, v.y, v.z),
            other => return Err(Error::other(format!("{other} cannot be set as a plain vector"))),
        }

        let existing = self.find_op(ndx);
        let op_type = ndx.default_op_type();
        let attr = match &existing {
            Some(op) => op.attr_name().to_string(),
            None => self.naming.attr_name(ndx, op_type),
        };
        if !self.edit_allowed(&attr)? {
            return Ok(None);
        }

        let mut cmd = self
            .command(&ndx.to_string(), &attr)
            .with_encode(encode_vec3())
            .with_value(v);
        if existing.is_none() {
            cmd = cmd.with_create(create_ops(
                attr,
                op_type.value_type(V::PRECISION),
                vec![self.naming.entry_name(ndx, op_type)],
                self.naming.clone(),
            ));
        }
        Ok(Some(cmd))
    }

    /// Command setting a rotate or scale pivot; a missing pivot is created
    /// together with its inverse.
    pub fn pivot_cmd(&self, kind: PivotKind, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>> {
        let ndx = kind.index();
        let inverse = ndx.partner().unwrap_or(ndx);
        let attr = self.naming.attr_name(ndx, XformOpType::Translate);
        if !self.edit_allowed(&attr)? {
            return Ok(None);
        }
        match self.convert_pivots() {
            Ok(_) => {}
            Err(e) if e.is_edit_refusal() => {
                info!(path = self.prim.path(), reason = %e, "pivot conversion refused");
                return Ok(None);
            }
            Err(e) => return Err(e),
        }

        let mut cmd = self
            .command(kind.label(), &attr)
            .with_encode(encode_vec3())
            .with_value(DVec3::new(x, y, z));
        if !(self.has_op(ndx) && self.has_op(inverse)) {
            cmd = cmd.with_create(create_ops(
                attr,
                ValueType::Vec3f,
                vec![
                    self.naming.entry_name(ndx, XformOpType::Translate),
                    self.naming.entry_name(inverse, XformOpType::Translate),
                ],
                self.naming.clone(),
            ));
        }
        Ok(Some(cmd))
    }

    /// Command for the rotate or rotate-axis op, keeping its encoding.
    fn rotation_cmd(&self, ndx: OpIndex, v: DVec3) -> Result<Option<SetValueCommand>> {
        let label = ndx.to_string();
        let Some(op) = self.find_op(ndx) else {
            let attr = self.naming.attr_name(ndx, XformOpType::RotateXYZ);
            if !self.edit_allowed(&attr)? {
                return Ok(None);
            }
            let cmd = self
                .command(&label, &attr)
                .with_encode(encode_rotation(RotationKind::XYZ)?)
                .with_value(v)
                .with_create(create_ops(
                    attr,
                    ValueType::Vec3f,
                    vec![self.naming.entry_name(ndx, XformOpType::RotateXYZ)],
                    self.naming.clone(),
                ));
            return Ok(Some(cmd));
        };

        let kind = op
            .op_type()
            .rotation_kind()
            .ok_or_else(|| Error::UnsupportedRotation(op.name().to_string()))?;

        if kind.is_single_axis() && is_lossy(kind, v) {
            if self.single_axis == SingleAxisPolicy::PromoteToThreeAxis {
                let attr = self.naming.attr_name(ndx, XformOpType::RotateXYZ);
                if !self.edit_allowed(&attr)? {
                    return Ok(None);
                }
                debug!(path = self.prim.path(), from = %op, "promoting single-axis rotation");
                let ty = op
                    .precision(&self.prim)
                    .map(ValueType::vec3)
                    .unwrap_or(ValueType::Vec3f);
                let cmd = self
                    .command(&label, &attr)
                    .with_encode(encode_rotation(RotationKind::XYZ)?)
                    .with_value(v)
                    .with_create(replace_op(
                        attr,
                        ty,
                        op.name().to_string(),
                        self.naming.entry_name(ndx, XformOpType::RotateXYZ),
                        self.naming.clone(),
                    ));
                return Ok(Some(cmd));
            }
            debug!(path = self.prim.path(), op = %op, value = ?v, "single-axis rotation drops components");
        }

        let attr = op.attr_name().to_string();
        if !self.edit_allowed(&attr)? {
            return Ok(None);
        }
        let cmd = self
            .command(&label, &attr)
            .with_encode(encode_rotation(kind)?)
            .with_value(v);
        Ok(Some(cmd))
    }
}

impl Transform3d for MayaXformStack {
    fn prim(&self) -> &Prim {
        &self.prim
    }

    fn kind(&self) -> &'static str {
        self.flavor.name()
    }

    fn translation(&self) -> DVec3 {
        self.vec3_of(OpIndex::Translate).unwrap_or(DVec3::ZERO)
    }

    fn rotation(&self) -> DVec3 {
        self.rotation_of(OpIndex::Rotate)
    }

    fn scale(&self) -> DVec3 {
        self.vec3_of(OpIndex::Scale).unwrap_or(DVec3::ONE)
    }

    fn rotate_pivot(&self) -> DVec3 {
        self.pivot_of(PivotKind::Rotate)
    }

    fn scale_pivot(&self) -> DVec3 {
        self.pivot_of(PivotKind::Scale)
    }

    fn rotate_pivot_translation(&self) -> DVec3 {
        self.vec3_of(OpIndex::RotatePivotTranslate).unwrap_or(DVec3::ZERO)
    }

    fn scale_pivot_translation(&self) -> DVec3 {
        self.vec3_of(OpIndex::ScalePivotTranslate).unwrap_or(DVec3::ZERO)
    }

    fn rotate_axis(&self) -> DVec3 {
        self.rotation_of(OpIndex::RotateAxis)
    }

    fn shear(&self) -> DVec3 {
        self.find_op(OpIndex::Shear)
            .and_then(|op| op.get(&self.prim, self.read_time()))
            .and_then(|v| v.as_dmat4())
            .map(|m| shear_from_matrix(&m))
            .unwrap_or(DVec3::ZERO)
    }

    fn translate_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>> {
        self.set_vector3_cmd(DVec3::new(x, y, z), OpIndex::Translate)
    }

    fn rotate_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>> {
        self.rotation_cmd(OpIndex::Rotate, DVec3::new(x, y, z))
    }

    fn scale_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>> {
        self.set_vector3_cmd(DVec3::new(x, y, z).as_vec3(), OpIndex::Scale)
    }

    fn rotate_pivot_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>> {
        self.pivot_cmd(PivotKind::Rotate, x, y, z)
    }

    fn scale_pivot_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>> {
        self.pivot_cmd(PivotKind::Scale, x, y, z)
    }

    fn rotate_pivot_translate_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>> {
        self.set_vector3_cmd(DVec3::new(x, y, z).as_vec3(), OpIndex::RotatePivotTranslate)
    }

    fn scale_pivot_translate_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>> {
        self.set_vector3_cmd(DVec3::new(x, y, z).as_vec3(), OpIndex::ScalePivotTranslate)
    }

    fn rotate_axis_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>> {
        self.rotation_cmd(OpIndex::RotateAxis, DVec3::new(x, y, z))
    }

    fn shear_cmd(&self, xy: f64, xz: f64, yz: f64) -> Result<Option<SetValueCommand>> {
        let existing = self.find_op(OpIndex::Shear);
        let attr = match &existing {
            Some(op) => op.attr_name().to_string(),
            None => self.naming.attr_name(OpIndex::Shear, XformOpType::Transform),
        };
        if !self.edit_allowed(&attr)? {
            return Ok(None);
        }
        let mut cmd = self
            .command("shear", &attr)
            .with_encode(encode_shear())
            .with_value(DVec3::new(xy, xz, yz));
        if existing.is_none() {
            cmd = cmd.with_create(create_ops(
                attr,
                ValueType::Matrix4d,
                vec![self.naming.entry_name(OpIndex::Shear, XformOpType::Transform)],
                self.naming.clone(),
            ));
        }
        Ok(Some(cmd))
    }
}

impl fmt::Debug for MayaXformStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MayaXformStack")
            .field("prim", &self.prim.path())
            .field("flavor", &self.flavor)
            .field("suffix", &self.naming.suffix())
            .finish()
    }
}
