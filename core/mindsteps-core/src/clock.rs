//! Time source abstraction.
//!
//! Production code injects [`SystemClock`]; tests inject a manual clock so
//! elapsed-time behaviour is deterministic.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over wall-clock time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current wall-clock time in milliseconds since UNIX epoch.
    fn now_ms(&self) -> u64;
}

/// Production clock backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_past_2020() {
        // 2020-01-01T00:00:00Z in ms.
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
