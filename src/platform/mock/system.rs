//! System-control recorder for tests

use crate::platform::traits::{ResetReason, SystemInterface};

/// Records restarts, watchdog and cache-flush calls
pub struct MockSystem {
    /// Number of restart requests observed
    pub restarts: u32,
    /// Reset reason returned to the platform
    pub reset_reason: ResetReason,
    /// Watchdog timeout, once armed
    pub watchdog_timeout_ms: Option<u32>,
    /// Number of feeds observed
    pub feeds: u32,
    /// Whether the watchdog is currently suspended
    pub watchdog_suspended: bool,
    /// Number of cache flushes observed
    pub cache_flushes: u32,
    /// Free-heap value reported to the diagnostics page
    pub free_heap: usize,
}

impl MockSystem {
    /// Fresh recorder, reset reason `PowerOn`
    pub fn new() -> Self {
        Self {
            restarts: 0,
            reset_reason: ResetReason::PowerOn,
            watchdog_timeout_ms: None,
            feeds: 0,
            watchdog_suspended: false,
            cache_flushes: 0,
            free_heap: 128 * 1024,
        }
    }
}

impl Default for MockSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemInterface for MockSystem {
    fn restart(&mut self) {
        self.restarts += 1;
    }

    fn reset_reason(&self) -> ResetReason {
        self.reset_reason
    }

    fn watchdog_begin(&mut self, timeout_ms: u32) {
        self.watchdog_timeout_ms = Some(timeout_ms);
        self.watchdog_suspended = false;
    }

    fn watchdog_feed(&mut self) {
        self.feeds += 1;
    }

    fn watchdog_suspend(&mut self) {
        self.watchdog_suspended = true;
    }

    fn watchdog_resume(&mut self) {
        self.watchdog_suspended = false;
    }

    fn flush_caches(&mut self) {
        self.cache_flushes += 1;
    }

    fn free_heap(&self) -> usize {
        self.free_heap
    }
}
