//! Transform stack settings.
//!
//! Loaded from JSON (missing fields take their defaults) with environment
//! overrides applied on top. [`Settings::global`] reads the environment
//! once per process; later changes to the environment are not observed.

use crate::util::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Namespace suffix for ops written by the primary stack.
pub const ENV_OP_SUFFIX: &str = "XFORMSTACK_OP_SUFFIX";
/// `1`/`true` makes empty prims use a single matrix op.
pub const ENV_MATRIX_OPS: &str = "XFORMSTACK_MATRIX_OPS";
/// `current` writes at the host's current time instead of the default time.
pub const ENV_WRITE_TIME: &str = "XFORMSTACK_WRITE_TIME";

/// What a rotate edit does when the existing op is single-axis and the
/// new value has components on the other axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleAxisPolicy {
    /// Keep the op; the extra components are dropped.
    Reuse,
    /// Replace the op with a `rotateXYZ` op at the same position.
    PromoteToThreeAxis,
}

/// Time at which commands write values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteTime {
    /// The attribute's default (unanimated) value.
    #[default]
    Default,
    /// The host's current time, remapped into the stage.
    Current,
}

/// Transform stack settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Naming
    pub op_suffix: Option<String>,

    // Matching
    pub use_matrix_ops: bool,

    // Rotation
    pub single_axis_rotation: SingleAxisPolicy,
    pub fallback_single_axis_rotation: SingleAxisPolicy,

    // Writing
    pub write_time: WriteTime,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            op_suffix: None,
            use_matrix_ops: false,
            single_axis_rotation: SingleAxisPolicy::Reuse,
            fallback_single_axis_rotation: SingleAxisPolicy::PromoteToThreeAxis,
            write_time: WriteTime::Default,
        }
    }
}

fn env_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl Settings {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env();
        settings
    }

    /// Apply environment overrides on top of the current values.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(suffix) = var(ENV_OP_SUFFIX) {
            self.op_suffix = Some(suffix).filter(|s| !s.is_empty());
        }
        if let Some(flag) = var(ENV_MATRIX_OPS) {
            self.use_matrix_ops = env_flag(&flag);
        }
        if let Some(time) = var(ENV_WRITE_TIME) {
            self.write_time = match time.trim().to_ascii_lowercase().as_str() {
                "current" => WriteTime::Current,
                _ => WriteTime::Default,
            };
        }
    }

    /// Load settings from a JSON file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut settings: Self = serde_json::from_str(&text)?;
        settings.apply_env();
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Process-wide settings, read from the environment on first use.
    pub fn global() -> &'static Settings {
        static GLOBAL: OnceLock<Settings> = OnceLock::new();
        GLOBAL.get_or_init(Settings::from_env)
    }
}
