//! Timestamps for playback windows.

/// Source of wall-clock timestamps in milliseconds since the Unix epoch.
pub trait Clock {
    /// Current time in milliseconds.
    fn now_ms(&self) -> u64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        // Clocks set before 1970 read as the epoch.
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}
