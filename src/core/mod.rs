//! Core layer - the data store and host seams transform edits run against.
//!
//! This module provides:
//! - [`Stage`] / [`Prim`] - In-memory prims with typed, time-sampled attributes
//! - [`Value`] / [`ValueType`] - Attribute values and their declared types
//! - [`TimeCode`] / [`TimeRemap`] - Read/write times and container remapping
//! - [`MetaData`] - Key-value metadata storage
//! - [`NotificationCenter`] / [`TransformChangeGuard`] - Change notices and coalescing
//! - [`Host`] - Edit permission and current UI time

mod time;
mod value;
mod metadata;
mod notice;
mod stage;
mod host;

pub use time::{Chrono, TimeCode, TimeRemap, held_sample_index};
pub use value::{Precision, Value, ValueType};
pub use metadata::MetaData;
pub use notice::{Notice, NotificationCenter, Observer, TransformChangeGuard};
pub use stage::{Prim, Stage, XFORM_OP_ORDER};
pub use host::{DefaultHost, Host};
