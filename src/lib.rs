//! # xformstack
//!
//! Maya-compatible editing of ordered transform op stacks, with undo.
//!
//! A prim's transform is an ordered list of named, typed ops
//! (`xformOp:translate`, `xformOp:rotateXYZ`, `!invert!xformOp:translate:rotatePivot`, ...).
//! This crate maps that flexible list onto Maya's fixed transform layout and
//! builds undoable commands that create ops lazily, keep them in canonical
//! order and restore both values and op order on undo.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math re-exports, tracing setup
//! - [`core`] - In-memory stage, values, time codes, notices, host seam
//! - [`xform`] - Op naming, rotation conversion, pivots, commands, stacks
//! - [`config`] - Settings and environment overrides
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use xformstack::prelude::*;
//!
//! let stage = Stage::new();
//! let prim = stage.define_prim("/World/Cube", "Xform")?;
//! let chain = HandlerChain::with_defaults(Settings::default(), Arc::new(DefaultHost::new()));
//!
//! let xform = chain.transform3d(&prim).expect("empty prims always match");
//! if let Some(mut cmd) = xform.translate_cmd(5.0, 0.0, 0.0)? {
//!     cmd.execute()?;
//!     assert_eq!(xform.translation(), DVec3::new(5.0, 0.0, 0.0));
//!     cmd.undo()?;
//! }
//! ```

pub mod util;
pub mod core;
pub mod xform;
pub mod config;

// Re-export commonly used types
pub use util::{Error, Result};
pub use config::Settings;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{DVec3, Error, Result};
    pub use crate::core::{DefaultHost, Host, Prim, Stage, TimeCode, Value, ValueType};
    pub use crate::config::{Settings, SingleAxisPolicy, WriteTime};
    pub use crate::xform::{
        HandlerChain, MatchResult, MatrixOpStack, MayaXformStack, OpIndex, PivotKind, SetValueCommand,
        StackFlavor, Transform3d, UndoableCommand,
    };
}
