//! Undoable value-set command for one transform op.
//!
//! A [`SetValueCommand`] is built by a stack factory and does not touch the
//! store until it is first executed or `set`. The backing op is created
//! at that point (and only there), so a command that is built and thrown
//! away leaves nothing behind. Undoing an edit whose op had no value clears
//! the value again; the attribute stays declared but unauthored and its op
//! leaves `xformOpOrder`. `undo` and `redo` re-resolve the prim by
//! path on every call; the prim may have been replaced or removed by other
//! commands in between.

use crate::core::{Prim, Stage, TimeCode, TransformChangeGuard, Value, ValueType};
use crate::util::{DVec3, Error, Result};
use std::fmt;
use tracing::{debug, trace, warn};

/// Creates the backing op (attribute plus op-order entries) on first bind.
pub type CreateOpFn = Box<dyn FnOnce(&Prim) -> Result<()> + Send>;

/// Turns a canonical vector into the op's native value.
///
/// Receives the attribute's declared type and its current value, if any.
pub type EncodeFn = Box<dyn Fn(ValueType, Option<&Value>, DVec3) -> Result<Value> + Send + Sync>;

/// Interface the host undo stack drives.
pub trait UndoableCommand {
    fn execute(&mut self) -> Result<()>;
    fn undo(&mut self) -> Result<()>;
    fn redo(&mut self) -> Result<()>;
}

/// Binding state of a [`SetValueCommand`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandState {
    /// Constructed; no op resolved or created yet.
    Unbound,
    /// Op resolved (created if needed) and previous value captured.
    Bound,
}

#[derive(Clone, Debug)]
struct OrderChange {
    before: Vec<String>,
    after: Vec<String>,
}

/// Sets the value of a single transform op, with deferred op creation.
pub struct SetValueCommand {
    label: String,
    stage: Stage,
    path: String,
    attribute: String,
    time: TimeCode,
    /// Value for [`execute`](Self::execute); updated by every `set`.
    pending: Option<DVec3>,
    create_op: Option<CreateOpFn>,
    encode: EncodeFn,
    state: CommandState,
    prev: Option<Value>,
    new: Option<Value>,
    order: Option<OrderChange>,
}

fn encode_vec3(ty: ValueType, _current: Option<&Value>, v: DVec3) -> Result<Value> {
    Value::from_vec3(ty, v)
}

impl SetValueCommand {
    /// Command writing `attribute` on `prim` at `time`.
    ///
    /// The attribute's current value is captured now if it exists.
    pub fn new(label: impl Into<String>, prim: &Prim, attribute: impl Into<String>, time: TimeCode) -> Self {
        let attribute = attribute.into();
        let prev = prim.get(&attribute, time);
        Self {
            label: label.into(),
            stage: prim.stage().clone(),
            path: prim.path().to_string(),
            attribute,
            time,
            pending: None,
            create_op: None,
            encode: Box::new(encode_vec3),
            state: CommandState::Unbound,
            prev,
            new: None,
            order: None,
        }
    }

    pub fn with_create(mut self, create: CreateOpFn) -> Self {
        self.create_op = Some(create);
        self
    }

    pub fn with_encode(mut self, encode: EncodeFn) -> Self {
        self.encode = encode;
        self
    }

    /// Value written by [`execute`](Self::execute).
    pub fn with_value(mut self, value: DVec3) -> Self {
        self.pending = Some(value);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Attribute this command writes.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn time(&self) -> TimeCode {
        self.time
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    /// True if executing will create the op.
    pub fn creates_op(&self) -> bool {
        self.create_op.is_some()
    }

    /// Value captured before the first write, if the op had one.
    pub fn previous_value(&self) -> Option<&Value> {
        self.prev.as_ref()
    }

    /// Last value written.
    pub fn new_value(&self) -> Option<&Value> {
        self.new.as_ref()
    }

    /// Write a new value, creating the op on the first call.
    ///
    /// Returns `Ok(false)` when the prim no longer exists.
    pub fn set(&mut self, x: f64, y: f64, z: f64) -> Result<bool> {
        self.set_vec(DVec3::new(x, y, z))
    }

    pub fn set_vec(&mut self, v: DVec3) -> Result<bool> {
        let _span = tracing::debug_span!("set", cmd = %self.label, path = %self.path).entered();
        let Some(prim) = self.stage.prim(&self.path) else {
            warn!(path = %self.path, "prim vanished before set");
            return Ok(false);
        };

        let stage = self.stage.clone();
        let _guard = TransformChangeGuard::enter(stage.notices(), &self.path)?;

        self.bind(&prim)?;
        let ty = prim
            .attribute_type(&self.attribute)
            .ok_or_else(|| Error::AttributeNotFound(self.attribute.clone()))?;
        let current = prim.get(&self.attribute, self.time);
        let value = (self.encode)(ty, current.as_ref(), v)?;
        trace!(attribute = %self.attribute, ?value, "write");
        prim.set(&self.attribute, value.clone(), self.time)?;

        self.new = Some(value);
        self.pending = Some(v);
        Ok(true)
    }

    /// Resolve the op, running the creation strategy the first time.
    fn bind(&mut self, prim: &Prim) -> Result<()> {
        if self.state == CommandState::Bound {
            return Ok(());
        }
        if let Some(create) = self.create_op.take() {
            let before = prim.xform_op_order();
            create(prim)?;
            let after = prim.xform_op_order();
            if before != after {
                debug!(attribute = %self.attribute, ?after, "created transform op");
                self.order = Some(OrderChange { before, after });
            }
        }
        if self.prev.is_none() {
            self.prev = prim.get(&self.attribute, self.time);
        }
        self.state = CommandState::Bound;
        Ok(())
    }

    /// Prim holding the attribute, or `None` (logged) if either is gone.
    fn resolve(&self, step: &str) -> Option<Prim> {
        let Some(prim) = self.stage.prim(&self.path) else {
            warn!(path = %self.path, step, "prim vanished; skipping");
            return None;
        };
        if !prim.has_attribute(&self.attribute) {
            warn!(path = %self.path, attribute = %self.attribute, step, "attribute vanished; skipping");
            return None;
        }
        Some(prim)
    }

    /// Restore the op order (`before` for undo, `after` for redo) and write
    /// `value`; `None` clears the value authored at the command's time.
    fn write_back(&self, step: &str, after: bool, value: Option<Value>) -> Result<()> {
        let _span = tracing::debug_span!("restore", cmd = %self.label, path = %self.path, step).entered();
        if self.state == CommandState::Unbound {
            debug!("command never bound; nothing to {step}");
            return Ok(());
        }
        let Some(prim) = self.resolve(step) else {
            return Ok(());
        };

        let stage = self.stage.clone();
        let _guard = TransformChangeGuard::enter(stage.notices(), &self.path)?;

        if let Some(order) = &self.order {
            let entries = if after { &order.after } else { &order.before };
            prim.set_xform_op_order(entries.clone())?;
        }
        match value {
            Some(v) => prim.set(&self.attribute, v, self.time),
            None => prim.clear(&self.attribute, self.time),
        }
    }
}

impl UndoableCommand for SetValueCommand {
    /// Write the value supplied at construction (or the last `set` value).
    fn execute(&mut self) -> Result<()> {
        match self.pending {
            Some(v) => self.set_vec(v).map(|_| ()),
            None => Ok(()),
        }
    }

    fn undo(&mut self) -> Result<()> {
        self.write_back("undo", false, self.prev.clone())
    }

    fn redo(&mut self) -> Result<()> {
        if self.new.is_none() {
            return Ok(());
        }
        self.write_back("redo", true, self.new.clone())
    }
}

impl fmt::Debug for SetValueCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetValueCommand")
            .field("label", &self.label)
            .field("path", &self.path)
            .field("attribute", &self.attribute)
            .field("state", &self.state)
            .field("creates_op", &self.create_op.is_some())
            .finish()
    }
}

/// Runs children in order; undoes them in reverse.
#[derive(Default)]
pub struct CompositeCommand {
    children: Vec<Box<dyn UndoableCommand + Send>>,
}

impl CompositeCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: impl UndoableCommand + Send + 'static) {
        self.children.push(Box::new(cmd));
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl UndoableCommand for CompositeCommand {
    fn execute(&mut self) -> Result<()> {
        self.children.iter_mut().try_for_each(|c| c.execute())
    }

    fn undo(&mut self) -> Result<()> {
        self.children.iter_mut().rev().try_for_each(|c| c.undo())
    }

    fn redo(&mut self) -> Result<()> {
        self.children.iter_mut().try_for_each(|c| c.redo())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::XFORM_OP_ORDER;

    fn create_translate() -> CreateOpFn {
        Box::new(|prim: &Prim| {
            prim.create_attribute("xformOp:translate", ValueType::Vec3d)?;
            prim.set_xform_op_order(vec!["xformOp:translate".into()])
        })
    }

    fn translate_cmd(prim: &Prim, v: DVec3) -> SetValueCommand {
        SetValueCommand::new("translate", prim, "xformOp:translate", TimeCode::Default)
            .with_create(create_translate())
            .with_value(v)
    }

    #[test]
    fn test_construction_does_not_touch_store() {
        let stage = Stage::new();
        let prim = stage.define_prim("/A", "Xform").unwrap();
        let cmd = translate_cmd(&prim, DVec3::X);
        assert_eq!(cmd.state(), CommandState::Unbound);
        assert!(cmd.creates_op());
        assert!(prim.attribute_names().is_empty());
        drop(cmd);
        assert!(prim.attribute_names().is_empty());
    }

    #[test]
    fn test_undo_before_execute_is_noop() {
        let stage = Stage::new();
        let prim = stage.define_prim("/A", "Xform").unwrap();
        let mut cmd = translate_cmd(&prim, DVec3::X);
        cmd.undo().unwrap();
        cmd.redo().unwrap();
        assert!(!prim.has_attribute("xformOp:translate"));
        assert!(!prim.has_attribute(XFORM_OP_ORDER));
    }

    #[test]
    fn test_execute_undo_redo() {
        let stage = Stage::new();
        let prim = stage.define_prim("/A", "Xform").unwrap();
        let mut cmd = translate_cmd(&prim, DVec3::new(1.0, 2.0, 3.0));

        cmd.execute().unwrap();
        assert_eq!(cmd.state(), CommandState::Bound);
        assert_eq!(
            prim.get("xformOp:translate", TimeCode::Default),
            Some(Value::Vec3d(DVec3::new(1.0, 2.0, 3.0)))
        );
        assert!(cmd.previous_value().is_none());

        cmd.undo().unwrap();
        assert!(prim.xform_op_order().is_empty());
        assert_eq!(prim.get("xformOp:translate", TimeCode::Default), None);
        assert!(!prim.has_authored_value("xformOp:translate"));

        cmd.redo().unwrap();
        assert_eq!(prim.xform_op_order(), vec!["xformOp:translate".to_string()]);
        assert_eq!(
            prim.get("xformOp:translate", TimeCode::Default),
            Some(Value::Vec3d(DVec3::new(1.0, 2.0, 3.0)))
        );
    }

    #[test]
    fn test_repeated_set_keeps_first_previous() {
        let stage = Stage::new();
        let prim = stage.define_prim("/A", "Xform").unwrap();
        prim.create_attribute("xformOp:translate", ValueType::Vec3d).unwrap();
        prim.set("xformOp:translate", Value::Vec3d(DVec3::Y), TimeCode::Default)
            .unwrap();

        let mut cmd = SetValueCommand::new("translate", &prim, "xformOp:translate", TimeCode::Default);
        assert!(cmd.set(1.0, 0.0, 0.0).unwrap());
        assert!(cmd.set(2.0, 0.0, 0.0).unwrap());
        assert_eq!(cmd.previous_value(), Some(&Value::Vec3d(DVec3::Y)));

        cmd.undo().unwrap();
        assert_eq!(
            prim.get("xformOp:translate", TimeCode::Default),
            Some(Value::Vec3d(DVec3::Y))
        );
        cmd.redo().unwrap();
        assert_eq!(
            prim.get("xformOp:translate", TimeCode::Default),
            Some(Value::Vec3d(DVec3::new(2.0, 0.0, 0.0)))
        );
    }

    #[test]
    fn test_vanished_prim() {
        let stage = Stage::new();
        let prim = stage.define_prim("/A", "Xform").unwrap();
        let mut cmd = translate_cmd(&prim, DVec3::X);
        cmd.execute().unwrap();

        stage.remove_prim("/A").unwrap();
        cmd.undo().unwrap();
        cmd.redo().unwrap();
        assert!(!cmd.set(5.0, 0.0, 0.0).unwrap());
    }

    #[test]
    fn test_creation_failure_propagates() {
        let stage = Stage::new();
        let prim = stage.define_prim("/A", "Xform").unwrap();
        let mut cmd = SetValueCommand::new("broken", &prim, "x", TimeCode::Default)
            .with_create(Box::new(|_: &Prim| {
                Err(Error::AttributeCreation { name: "x".into(), reason: "store full".into() })
            }))
            .with_value(DVec3::X);
        assert!(matches!(cmd.execute(), Err(Error::AttributeCreation { .. })));
        assert_eq!(cmd.state(), CommandState::Unbound);
        // Guard was released on the error path.
        assert!(stage.notices().guarded_path().is_none());
    }

    #[test]
    fn test_composite_reverse_undo() {
        let stage = Stage::new();
        let prim = stage.define_prim("/A", "Xform").unwrap();
        let mut composite = CompositeCommand::new();
        composite.push(translate_cmd(&prim, DVec3::X));
        composite.push(
            SetValueCommand::new("translate", &prim, "xformOp:translate", TimeCode::Default)
                .with_value(DVec3::Z),
        );
        assert_eq!(composite.len(), 2);

        composite.execute().unwrap();
        assert_eq!(
            prim.get("xformOp:translate", TimeCode::Default),
            Some(Value::Vec3d(DVec3::Z))
        );
        composite.undo().unwrap();
        assert!(prim.xform_op_order().is_empty());
        assert_eq!(
            prim.get("xformOp:translate", TimeCode::Default),
            Some(Value::Vec3d(DVec3::ZERO))
        );
    }
}
