//! Change notices and the transform-change guard.
//!
//! Every store write emits [`Notice::AttributeChanged`]. Multi-step edits
//! (create attribute, reorder ops, write value) run under a
//! [`TransformChangeGuard`]: while it is held, attribute notices are
//! swallowed, and dropping it emits a single [`Notice::Transform3dChanged`].

use crate::util::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// A change notification.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    /// One attribute (or the op order) of a prim was written.
    AttributeChanged { path: String, attribute: String },
    /// A coalesced transform edit finished on a prim.
    Transform3dChanged { path: String },
}

impl Notice {
    pub fn path(&self) -> &str {
        match self {
            Self::AttributeChanged { path, .. } | Self::Transform3dChanged { path } => path,
        }
    }
}

/// Receiver of change notices.
pub trait Observer: Send + Sync {
    fn notify(&self, notice: &Notice);
}

#[derive(Default)]
struct GuardState {
    held: Option<String>,
    suppressed: usize,
}

/// Observer registry plus guard bookkeeping, owned by a stage.
#[derive(Default)]
pub struct NotificationCenter {
    observers: RwLock<Vec<Arc<dyn Observer>>>,
    guard: Mutex<GuardState>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&self, observer: Arc<dyn Observer>) {
        self.observers.write().push(observer);
    }

    /// Remove a previously added observer. Returns false if it was not registered.
    pub fn remove_observer(&self, observer: &Arc<dyn Observer>) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|o| !Arc::ptr_eq(o, observer));
        observers.len() != before
    }

    pub fn num_observers(&self) -> usize {
        self.observers.read().len()
    }

    /// Path the guard is currently held for, if any.
    pub fn guarded_path(&self) -> Option<String> {
        self.guard.lock().held.clone()
    }

    /// Report a single attribute write.
    pub fn attribute_changed(&self, path: &str, attribute: &str) {
        {
            let mut state = self.guard.lock();
            if state.held.is_some() {
                state.suppressed += 1;
                return;
            }
        }
        self.emit(Notice::AttributeChanged {
            path: path.to_string(),
            attribute: attribute.to_string(),
        });
    }

    fn emit(&self, notice: Notice) {
        // Snapshot so observers may register or unregister from inside notify.
        let observers: Vec<Arc<dyn Observer>> = self.observers.read().clone();
        for observer in &observers {
            observer.notify(&notice);
        }
    }
}

/// Scoped edit-transaction token for one prim.
///
/// Not reentrant: entering while any guard is held on the same center
/// fails with [`Error::NestedGuard`].
pub struct TransformChangeGuard<'a> {
    center: &'a NotificationCenter,
    path: String,
}

impl<'a> TransformChangeGuard<'a> {
    pub fn enter(center: &'a NotificationCenter, path: &str) -> Result<Self> {
        let mut state = center.guard.lock();
        if let Some(held) = &state.held {
            tracing::error!(path, held = %held, "nested transform change guard");
            return Err(Error::NestedGuard {
                path: path.to_string(),
                held: held.clone(),
            });
        }
        state.held = Some(path.to_string());
        state.suppressed = 0;
        Ok(Self {
            center,
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Drop for TransformChangeGuard<'_> {
    fn drop(&mut self) {
        let suppressed = {
            let mut state = self.center.guard.lock();
            state.held = None;
            std::mem::take(&mut state.suppressed)
        };
        tracing::trace!(path = %self.path, suppressed, "transform change guard released");
        self.center.emit(Notice::Transform3dChanged {
            path: std::mem::take(&mut self.path),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Notice>>);

    impl Observer for Recorder {
        fn notify(&self, notice: &Notice) {
            self.0.lock().push(notice.clone());
        }
    }

    #[test]
    fn test_unguarded_writes_notify_each() {
        let center = NotificationCenter::new();
        let rec = Arc::new(Recorder::default());
        center.add_observer(rec.clone());

        center.attribute_changed("/a", "x");
        center.attribute_changed("/a", "y");
        assert_eq!(rec.0.lock().len(), 2);
    }

    #[test]
    fn test_guard_coalesces() {
        let center = NotificationCenter::new();
        let rec = Arc::new(Recorder::default());
        center.add_observer(rec.clone());

        {
            let _g = TransformChangeGuard::enter(&center, "/a").unwrap();
            center.attribute_changed("/a", "x");
            center.attribute_changed("/a", "y");
            assert!(rec.0.lock().is_empty());
            assert_eq!(center.guarded_path().as_deref(), Some("/a"));
        }

        let notices = rec.0.lock();
        assert_eq!(*notices, vec![Notice::Transform3dChanged { path: "/a".into() }]);
        assert!(center.guarded_path().is_none());
    }

    #[test]
    fn test_nested_guard_rejected() {
        let center = NotificationCenter::new();
        let _outer = TransformChangeGuard::enter(&center, "/a").unwrap();
        let inner = TransformChangeGuard::enter(&center, "/b");
        assert!(matches!(inner, Err(Error::NestedGuard { .. })));
    }

    #[test]
    fn test_guard_released_on_error_path() {
        let center = NotificationCenter::new();
        let failing = || -> Result<()> {
            let _g = TransformChangeGuard::enter(&center, "/a")?;
            Err(Error::other("boom"))
        };
        assert!(failing().is_err());
        assert!(TransformChangeGuard::enter(&center, "/a").is_ok());
    }

    #[test]
    fn test_remove_observer() {
        let center = NotificationCenter::new();
        let rec: Arc<dyn Observer> = Arc::new(Recorder::default());
        center.add_observer(rec.clone());
        assert_eq!(center.num_observers(), 1);
        assert!(center.remove_observer(&rec));
        assert!(!center.remove_observer(&rec));
    }
}
