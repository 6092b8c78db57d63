//! Wraparound-tolerant protocol timestamps.
//!
//! Input events carry a 32-bit millisecond clock that wraps roughly every
//! 49.7 days. [`Clock`] extends it into a monotonic 64-bit timeline using the
//! latest timestamp seen as reference; raw values within ±2³¹ ms of that
//! reference are placed before or after it accordingly.

use std::time::Duration;

/// Extends raw 32-bit event times into a monotonic timeline.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    latest: Option<(u32, u64)>,
}

impl Clock {
    /// Create a clock with no reference yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `raw` on the extended timeline and advance the reference if it
    /// is newer than anything seen so far.
    pub fn extend(&mut self, raw: u32) -> Duration {
        let extended = match self.latest {
            None => {
                self.latest = Some((raw, raw as u64));
                raw as u64
            },
            Some((latest_raw, latest_ext)) => {
                let delta = raw.wrapping_sub(latest_raw) as i32;
                let extended = if delta >= 0 {
                    latest_ext + delta as u64
                } else {
                    latest_ext.saturating_sub(delta.unsigned_abs() as u64)
                };
                if delta > 0 {
                    self.latest = Some((raw, extended));
                }
                extended
            },
        };
        Duration::from_millis(extended)
    }
}
