//! Single matrix op transform.
//!
//! Handles prims whose whole transform is one `xformOp:transform` op, and
//! empty prims when matrix ops are preferred. Edits decompose the matrix
//! into scale, rotation and translation, replace one part and recompose.
//! Pivots, rotate axis and shear cannot be expressed and their factories
//! return `Ok(None)`.

use super::rotation::{quat_from_xyz, xyz_from_quat};
use super::stack::create_ops;
use super::{EncodeFn, MatchResult, OpNaming, SetValueCommand, Transform3d, XformOp, XformOpType};
use crate::config::{Settings, WriteTime};
use crate::core::{Host, Prim, TimeCode, Value, ValueType};
use crate::util::{DMat4, DQuat, DVec3, Error, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Which part of the decomposed matrix a command replaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Component {
    Translate,
    Rotate,
    Scale,
}

fn encode_component(component: Component) -> EncodeFn {
    Box::new(move |ty, current, v| {
        if ty != ValueType::Matrix4d {
            return Err(Error::mismatch(ValueType::Matrix4d.name(), ty.name()));
        }
        let m = current.and_then(Value::as_dmat4).unwrap_or(DMat4::IDENTITY);
        let (mut s, mut r, mut t) = m.to_scale_rotation_translation();
        match component {
            Component::Translate => t = v,
            Component::Rotate => r = quat_from_xyz(v),
            Component::Scale => s = v,
        }
        Ok(Value::Matrix4d(DMat4::from_scale_rotation_translation(s, r, t)))
    })
}

/// Transform held in a single 4x4 matrix op.
#[derive(Clone)]
pub struct MatrixOpStack {
    prim: Prim,
    host: Arc<dyn Host>,
    naming: OpNaming,
    /// Op-order entry of the matrix op (existing or to be created).
    entry: String,
    write_time: WriteTime,
}

impl MatrixOpStack {
    pub fn match_prim(prim: &Prim, host: Arc<dyn Host>, settings: &Settings) -> MatchResult<Self> {
        if !prim.is_valid() {
            return MatchResult::NoMatch;
        }
        let naming = OpNaming::new(settings.op_suffix.clone());
        let order = prim.xform_op_order();
        let entry = match order.as_slice() {
            [] if settings.use_matrix_ops => naming.matrix_attr_name(),
            [only] => match XformOp::parse(only) {
                Ok(op) if Self::is_matrix_op(&op) => only.clone(),
                _ => return MatchResult::NoMatch,
            },
            _ => return MatchResult::NoMatch,
        };
        MatchResult::Matched(Self {
            prim: prim.clone(),
            host,
            naming,
            entry,
            write_time: settings.write_time,
        })
    }

    /// A plain matrix op: transform type, not inverted, no Maya role.
    fn is_matrix_op(op: &XformOp) -> bool {
        op.op_type() == XformOpType::Transform && !op.is_inverse() && !op.tokens().iter().any(|t| t == "shear")
    }

    /// Op-order entry of the matrix op.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    fn read_time(&self) -> TimeCode {
        self.host.stage_time(&self.prim)
    }

    /// Current matrix; identity when unauthored.
    pub fn matrix(&self) -> DMat4 {
        self.prim
            .get(&self.entry, self.read_time())
            .and_then(|v| v.as_dmat4())
            .unwrap_or(DMat4::IDENTITY)
    }

    fn decomposed(&self) -> (DVec3, DQuat, DVec3) {
        self.matrix().to_scale_rotation_translation()
    }

    fn component_cmd(&self, component: Component, label: &str, v: DVec3) -> Result<Option<SetValueCommand>> {
        if let Err(e) = self.host.check_edit(&self.prim, &self.entry) {
            if e.is_edit_refusal() {
                info!(path = self.prim.path(), attribute = %self.entry, reason = %e, "edit refused");
                return Ok(None);
            }
            return Err(e);
        }
        let time = match self.write_time {
            WriteTime::Default => TimeCode::Default,
            WriteTime::Current => self.read_time(),
        };
        let mut cmd = SetValueCommand::new(label, &self.prim, self.entry.clone(), time)
            .with_encode(encode_component(component))
            .with_value(v);
        if !self.prim.xform_op_order().contains(&self.entry) || !self.prim.has_attribute(&self.entry) {
            cmd = cmd.with_create(create_ops(
                self.entry.clone(),
                ValueType::Matrix4d,
                vec![self.entry.clone()],
                self.naming.clone(),
            ));
        }
        Ok(Some(cmd))
    }

    fn unsupported(&self, what: &str) -> Result<Option<SetValueCommand>> {
        debug!(path = self.prim.path(), what, "not expressible with a matrix op");
        Ok(None)
    }
}

impl Transform3d for MatrixOpStack {
    fn prim(&self) -> &Prim {
        &self.prim
    }

    fn kind(&self) -> &'static str {
        "matrix"
    }

    fn translation(&self) -> DVec3 {
        self.decomposed().2
    }

    fn rotation(&self) -> DVec3 {
        xyz_from_quat(self.decomposed().1)
    }

    fn scale(&self) -> DVec3 {
        self.decomposed().0
    }

    fn rotate_pivot(&self) -> DVec3 {
        DVec3::ZERO
    }

    fn scale_pivot(&self) -> DVec3 {
        DVec3::ZERO
    }

    fn rotate_pivot_translation(&self) -> DVec3 {
        DVec3::ZERO
    }

    fn scale_pivot_translation(&self) -> DVec3 {
        DVec3::ZERO
    }

    fn rotate_axis(&self) -> DVec3 {
        DVec3::ZERO
    }

    fn shear(&self) -> DVec3 {
        DVec3::ZERO
    }

    fn translate_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>> {
        self.component_cmd(Component::Translate, "translate", DVec3::new(x, y, z))
    }

    fn rotate_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>> {
        self.component_cmd(Component::Rotate, "rotate", DVec3::new(x, y, z))
    }

    fn scale_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>> {
        self.component_cmd(Component::Scale, "scale", DVec3::new(x, y, z))
    }

    fn rotate_pivot_cmd(&self, _x: f64, _y: f64, _z: f64) -> Result<Option<SetValueCommand>> {
        self.unsupported("rotatePivot")
    }

    fn scale_pivot_cmd(&self, _x: f64, _y: f64, _z: f64) -> Result<Option<SetValueCommand>> {
        self.unsupported("scalePivot")
    }

    fn rotate_pivot_translate_cmd(&self, _x: f64, _y: f64, _z: f64) -> Result<Option<SetValueCommand>> {
        self.unsupported("rotatePivotTranslate")
    }

    fn scale_pivot_translate_cmd(&self, _x: f64, _y: f64, _z: f64) -> Result<Option<SetValueCommand>> {
        self.unsupported("scalePivotTranslate")
    }

    fn rotate_axis_cmd(&self, _x: f64, _y: f64, _z: f64) -> Result<Option<SetValueCommand>> {
        self.unsupported("rotateAxis")
    }

    fn shear_cmd(&self, _xy: f64, _xz: f64, _yz: f64) -> Result<Option<SetValueCommand>> {
        self.unsupported("shear")
    }
}
