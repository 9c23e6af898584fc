//! Time codes for attribute reads and writes.
//!
//! Attributes hold an optional static (default) value plus time samples.
//! Reads at a time use held interpolation: the latest sample at or before
//! the requested time, the first sample before that, or the default value
//! when no samples exist.

/// Chrono type - time value (frames or seconds, opaque to this library).
pub type Chrono = f64;

/// Where a value is read from or written to.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum TimeCode {
    /// The static, non-animated value.
    #[default]
    Default,
    /// A time sample.
    At(Chrono),
}

impl TimeCode {
    #[inline]
    pub const fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl From<Chrono> for TimeCode {
    fn from(time: Chrono) -> Self {
        Self::At(time)
    }
}

/// Affine time mapping applied by an enclosing container
/// (`stage_time = host_time * scale + offset`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeRemap {
    pub offset: Chrono,
    pub scale: Chrono,
}

impl TimeRemap {
    pub const IDENTITY: Self = Self { offset: 0.0, scale: 1.0 };

    pub const fn new(offset: Chrono, scale: Chrono) -> Self {
        Self { offset, scale }
    }

    /// Map a host time into stage time.
    #[inline]
    pub fn apply(&self, time: Chrono) -> Chrono {
        time * self.scale + self.offset
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for TimeRemap {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Index of the held sample for `time` in a sorted time list.
///
/// Times before the first sample hold the first sample.
pub fn held_sample_index(times: &[Chrono], time: Chrono) -> Option<usize> {
    if times.is_empty() {
        return None;
    }
    // partition_point: first index whose time is > `time`
    let after = times.partition_point(|&t| t <= time);
    Some(after.saturating_sub(1))
}
