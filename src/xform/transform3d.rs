//! Uniform transform editing interface.
//!
//! A [`Transform3d`] is what a [`HandlerChain`](super::HandlerChain) hands
//! back for a prim. Reads return canonical values (XYZ Euler degrees,
//! double precision); `*_cmd` factories return `Ok(None)` when the host
//! refuses the edit or the implementation cannot express it.

use super::SetValueCommand;
use crate::core::Prim;
use crate::util::{DVec3, Result};

pub trait Transform3d {
    /// Prim being edited.
    fn prim(&self) -> &Prim;

    /// Short name of the implementation, for logs and diagnostics.
    fn kind(&self) -> &'static str;

    fn translation(&self) -> DVec3;
    fn rotation(&self) -> DVec3;
    fn scale(&self) -> DVec3;
    fn rotate_pivot(&self) -> DVec3;
    fn scale_pivot(&self) -> DVec3;
    fn rotate_pivot_translation(&self) -> DVec3;
    fn scale_pivot_translation(&self) -> DVec3;
    fn rotate_axis(&self) -> DVec3;
    fn shear(&self) -> DVec3;

    fn translate_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>>;
    fn rotate_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>>;
    fn scale_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>>;
    fn rotate_pivot_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>>;
    fn scale_pivot_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>>;
    fn rotate_pivot_translate_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>>;
    fn scale_pivot_translate_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>>;
    fn rotate_axis_cmd(&self, x: f64, y: f64, z: f64) -> Result<Option<SetValueCommand>>;
    fn shear_cmd(&self, xy: f64, xz: f64, yz: f64) -> Result<Option<SetValueCommand>>;
}
