//! Utility types and functions.
//!
//! This module contains fundamental pieces used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam and vector helpers
//! - [`init_tracing`] - Subscriber setup for the `tracing` events emitted here

mod error;
mod math;
mod logging;

pub use error::*;
pub use math::*;
pub use logging::*;
