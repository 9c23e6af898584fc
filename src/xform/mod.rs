//! Transform op editing.
//!
//! This module provides:
//! - [`XformOp`] / [`XformOpType`] - Op-order entries and their types
//! - [`OpIndex`] / [`OpNaming`] - Canonical Maya stack positions and op names
//! - [`RotationKind`] and conversions between rotation encodings
//! - [`PivotConversion`] - Folding a shared pivot into rotate/scale pivots
//! - [`SetValueCommand`] - Undoable value edit with deferred op creation
//! - [`MayaXformStack`] / [`MatrixOpStack`] - [`Transform3d`] implementations
//! - [`HandlerChain`] - First-match-wins lookup of a prim's transform handler

mod op;
mod op_index;
pub mod rotation;
pub mod pivot;
mod command;
mod transform3d;
mod stack;
mod matrix;
mod handler;

pub use op::{XformOp, XformOpType, INVERT_PREFIX, XFORM_OP_PREFIX};
pub use op_index::{ordinal_of, OpIndex, OpNaming};
pub use rotation::{from_encoding, to_encoding, RotationConvert, RotationKind};
pub use pivot::{PivotConversion, PivotKind};
pub use command::{CommandState, CompositeCommand, CreateOpFn, EncodeFn, SetValueCommand, UndoableCommand};
pub use transform3d::Transform3d;
pub use stack::{MayaXformStack, StackFlavor, Vector3Value, FALLBACK_SUFFIX};
pub use matrix::MatrixOpStack;
pub use handler::{HandlerChain, HandlerContext, MatchResult, Matcher};
