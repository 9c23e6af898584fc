//! In-memory scene data store.
//!
//! A [`Stage`] owns prims keyed by absolute path. A [`Prim`] is a cheap
//! handle (stage + path) that is resolved on every call, so a handle
//! outlives the prim it names and simply reports `is_valid() == false`
//! once the prim is removed.

use super::{held_sample_index, Chrono, MetaData, NotificationCenter, TimeCode, TimeRemap, Value, ValueType};
use crate::util::{Error, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Name of the attribute holding the ordered op list.
pub const XFORM_OP_ORDER: &str = "xformOpOrder";

/// Storage for one attribute.
#[derive(Clone, Debug)]
struct AttributeData {
    value_type: ValueType,
    default: Option<Value>,
    /// Sorted by time.
    samples: Vec<(Chrono, Value)>,
    metadata: MetaData,
}

impl AttributeData {
    fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            default: None,
            samples: Vec::new(),
            metadata: MetaData::new(),
        }
    }

    fn get(&self, time: TimeCode) -> Option<&Value> {
        match time {
            TimeCode::Default => self.default.as_ref(),
            TimeCode::At(t) => {
                if self.samples.is_empty() {
                    return self.default.as_ref();
                }
                let times: Vec<Chrono> = self.samples.iter().map(|(t, _)| *t).collect();
                held_sample_index(&times, t).map(|i| &self.samples[i].1)
            }
        }
    }

    fn set(&mut self, value: Value, time: TimeCode) {
        match time {
            TimeCode::Default => self.default = Some(value),
            TimeCode::At(t) => {
                match self.samples.binary_search_by(|(st, _)| st.total_cmp(&t)) {
                    Ok(i) => self.samples[i].1 = value,
                    Err(i) => self.samples.insert(i, (t, value)),
                }
            }
        }
    }

    /// Drop the value authored at `time`; true if there was one.
    fn clear(&mut self, time: TimeCode) -> bool {
        match time {
            TimeCode::Default => self.default.take().is_some(),
            TimeCode::At(t) => match self.samples.binary_search_by(|(st, _)| st.total_cmp(&t)) {
                Ok(i) => {
                    self.samples.remove(i);
                    true
                }
                Err(_) => false,
            },
        }
    }

    fn has_value(&self) -> bool {
        self.default.is_some() || !self.samples.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
struct PrimData {
    type_name: String,
    attributes: BTreeMap<String, AttributeData>,
    metadata: MetaData,
}

#[derive(Default)]
struct StageData {
    prims: HashMap<String, PrimData>,
    read_only: bool,
    time_remap: TimeRemap,
}

struct StageInner {
    data: RwLock<StageData>,
    notices: NotificationCenter,
}

/// Shared handle to a scene data store.
#[derive(Clone)]
pub struct Stage {
    inner: Arc<StageInner>,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    /// Create an empty, writable stage.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StageInner {
                data: RwLock::new(StageData::default()),
                notices: NotificationCenter::new(),
            }),
        }
    }

    /// Define (or re-type) a prim at `path` and return a handle to it.
    pub fn define_prim(&self, path: &str, type_name: &str) -> Result<Prim> {
        if !path.starts_with('/') {
            return Err(Error::other(format!("prim path must be absolute: {path}")));
        }
        {
            let mut data = self.inner.data.write();
            if data.read_only {
                return Err(Error::ReadOnly);
            }
            data.prims.entry(path.to_string()).or_default().type_name = type_name.to_string();
        }
        Ok(self.prim_at(path))
    }

    /// Resolve a prim by path; `None` if it does not exist.
    pub fn prim(&self, path: &str) -> Option<Prim> {
        self.inner
            .data
            .read()
            .prims
            .contains_key(path)
            .then(|| self.prim_at(path))
    }

    /// Handle to `path`, whether or not a prim exists there.
    pub fn prim_at(&self, path: &str) -> Prim {
        Prim {
            stage: self.clone(),
            path: path.to_string(),
        }
    }

    /// Remove a prim. Returns false if there was none.
    pub fn remove_prim(&self, path: &str) -> Result<bool> {
        let mut data = self.inner.data.write();
        if data.read_only {
            return Err(Error::ReadOnly);
        }
        Ok(data.prims.remove(path).is_some())
    }

    /// Paths of all prims, sorted.
    pub fn prim_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.inner.data.read().prims.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Make the edit target (non-)modifiable.
    pub fn set_read_only(&self, read_only: bool) {
        self.inner.data.write().read_only = read_only;
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.data.read().read_only
    }

    pub fn set_time_remap(&self, remap: TimeRemap) {
        self.inner.data.write().time_remap = remap;
    }

    pub fn time_remap(&self) -> TimeRemap {
        self.inner.data.read().time_remap
    }

    pub fn notices(&self) -> &NotificationCenter {
        &self.inner.notices
    }

    /// Check whether two handles share the same store.
    pub fn same_stage(&self, other: &Stage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn read<R>(&self, path: &str, f: impl FnOnce(&PrimData) -> R) -> Option<R> {
        self.inner.data.read().prims.get(path).map(f)
    }

    fn write<R>(&self, path: &str, f: impl FnOnce(&mut PrimData) -> Result<R>) -> Result<R> {
        let mut data = self.inner.data.write();
        if data.read_only {
            return Err(Error::ReadOnly);
        }
        let prim = data
            .prims
            .get_mut(path)
            .ok_or_else(|| Error::PrimNotFound(path.to_string()))?;
        f(prim)
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.data.read();
        f.debug_struct("Stage")
            .field("prims", &data.prims.len())
            .field("read_only", &data.read_only)
            .finish()
    }
}

/// Handle to a prim on a stage, resolved by path on every access.
#[derive(Clone)]
pub struct Prim {
    stage: Stage,
    path: String,
}

impl Prim {
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path element.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    /// True while a prim exists at this handle's path.
    pub fn is_valid(&self) -> bool {
        self.stage.read(&self.path, |_| ()).is_some()
    }

    pub fn type_name(&self) -> Option<String> {
        self.stage.read(&self.path, |p| p.type_name.clone())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.stage
            .read(&self.path, |p| p.attributes.contains_key(name))
            .unwrap_or(false)
    }

    /// True if the attribute exists and has a default or any time sample.
    pub fn has_authored_value(&self, name: &str) -> bool {
        self.stage
            .read(&self.path, |p| p.attributes.get(name).is_some_and(AttributeData::has_value))
            .unwrap_or(false)
    }

    pub fn attribute_type(&self, name: &str) -> Option<ValueType> {
        self.stage
            .read(&self.path, |p| p.attributes.get(name).map(|a| a.value_type))
            .flatten()
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.stage
            .read(&self.path, |p| p.attributes.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Create an attribute. Creating an existing attribute with the same
    /// type is a no-op; a different type is an error.
    pub fn create_attribute(&self, name: &str, value_type: ValueType) -> Result<()> {
        let created = self.stage.write(&self.path, |p| match p.attributes.get(name) {
            Some(a) if a.value_type == value_type => Ok(false),
            Some(_) => Err(Error::AttributeExists(name.to_string())),
            None => {
                p.attributes.insert(name.to_string(), AttributeData::new(value_type));
                Ok(true)
            }
        })?;
        if created {
            self.stage.notices().attribute_changed(&self.path, name);
        }
        Ok(())
    }

    /// Read a value; `None` if the prim, attribute or value is missing.
    pub fn get(&self, name: &str, time: TimeCode) -> Option<Value> {
        self.stage
            .read(&self.path, |p| p.attributes.get(name).and_then(|a| a.get(time).cloned()))
            .flatten()
    }

    /// Write a value; its type must match the attribute's declared type.
    pub fn set(&self, name: &str, value: Value, time: TimeCode) -> Result<()> {
        self.stage.write(&self.path, |p| {
            let attr = p
                .attributes
                .get_mut(name)
                .ok_or_else(|| Error::AttributeNotFound(name.to_string()))?;
            if attr.value_type != value.value_type() {
                return Err(Error::mismatch(attr.value_type.name(), value.value_type().name()));
            }
            attr.set(value, time);
            Ok(())
        })?;
        self.stage.notices().attribute_changed(&self.path, name);
        Ok(())
    }

    /// Remove the value authored at `time`, leaving the attribute declared.
    pub fn clear(&self, name: &str, time: TimeCode) -> Result<()> {
        let cleared = self.stage.write(&self.path, |p| {
            let attr = p
                .attributes
                .get_mut(name)
                .ok_or_else(|| Error::AttributeNotFound(name.to_string()))?;
            Ok(attr.clear(time))
        })?;
        if cleared {
            self.stage.notices().attribute_changed(&self.path, name);
        }
        Ok(())
    }

    /// Times of the authored samples, ascending.
    pub fn sample_times(&self, name: &str) -> Vec<Chrono> {
        self.stage
            .read(&self.path, |p| {
                p.attributes
                    .get(name)
                    .map(|a| a.samples.iter().map(|(t, _)| *t).collect())
            })
            .flatten()
            .unwrap_or_default()
    }

    /// Ordered op names; empty when unauthored.
    pub fn xform_op_order(&self) -> Vec<String> {
        match self.get(XFORM_OP_ORDER, TimeCode::Default) {
            Some(Value::TokenArray(tokens)) => tokens,
            _ => Vec::new(),
        }
    }

    /// Author the op order, creating the attribute on first use.
    pub fn set_xform_op_order(&self, order: Vec<String>) -> Result<()> {
        if !self.has_attribute(XFORM_OP_ORDER) {
            self.create_attribute(XFORM_OP_ORDER, ValueType::TokenArray)?;
        }
        self.set(XFORM_OP_ORDER, Value::TokenArray(order), TimeCode::Default)
    }

    pub fn metadata(&self, key: &str) -> Option<String> {
        self.stage
            .read(&self.path, |p| p.metadata.get(key).map(str::to_string))
            .flatten()
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.stage.write(&self.path, |p| {
            p.metadata.set(key, value);
            Ok(())
        })
    }

    pub fn attribute_metadata(&self, name: &str, key: &str) -> Option<String> {
        self.stage
            .read(&self.path, |p| {
                p.attributes
                    .get(name)
                    .and_then(|a| a.metadata.get(key).map(str::to_string))
            })
            .flatten()
    }

    pub fn set_attribute_metadata(&self, name: &str, key: &str, value: &str) -> Result<()> {
        self.stage.write(&self.path, |p| {
            let attr = p
                .attributes
                .get_mut(name)
                .ok_or_else(|| Error::AttributeNotFound(name.to_string()))?;
            attr.metadata.set(key, value);
            Ok(())
        })
    }

    /// Check the lock flag on an attribute.
    pub fn is_attribute_locked(&self, name: &str) -> bool {
        self.stage
            .read(&self.path, |p| p.attributes.get(name).is_some_and(|a| a.metadata.is_locked()))
            .unwrap_or(false)
    }
}

impl fmt::Debug for Prim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Prim").field(&self.path).finish()
    }
}
