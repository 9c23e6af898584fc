//! Host application seam: edit permission and current time.

use super::{Chrono, Prim, TimeCode};
use crate::util::{Error, Result};
use parking_lot::Mutex;

/// Services the hosting application provides to transform edits.
pub trait Host: Send + Sync {
    /// Veto an edit of `attribute` on `prim`.
    ///
    /// Refusals must be reported as [`Error::EditNotPermitted`] (or
    /// [`Error::ReadOnly`]); command factories turn those into "no command".
    fn check_edit(&self, prim: &Prim, attribute: &str) -> Result<()>;

    /// Current UI time, before any stage remapping.
    fn current_time(&self) -> Chrono;

    /// Current time mapped into the prim's stage.
    fn stage_time(&self, prim: &Prim) -> TimeCode {
        TimeCode::At(prim.stage().time_remap().apply(self.current_time()))
    }
}

/// Host that refuses edits on read-only stages and locked attributes.
#[derive(Debug, Default)]
pub struct DefaultHost {
    time: Mutex<Chrono>,
}

impl DefaultHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time(time: Chrono) -> Self {
        Self { time: Mutex::new(time) }
    }

    pub fn set_current_time(&self, time: Chrono) {
        *self.time.lock() = time;
    }
}

impl Host for DefaultHost {
    fn check_edit(&self, prim: &Prim, attribute: &str) -> Result<()> {
        if !prim.is_valid() {
            return Err(Error::PrimNotFound(prim.path().to_string()));
        }
        if prim.stage().is_read_only() {
            return Err(Error::not_permitted(attribute, "edit target is not modifiable"));
        }
        if prim.is_attribute_locked(attribute) {
            return Err(Error::not_permitted(attribute, "attribute is locked"));
        }
        Ok(())
    }

    fn current_time(&self) -> Chrono {
        *self.time.lock()
    }
}
