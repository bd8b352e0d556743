//! System control interface: restart, reset reason, watchdog, caches

/// Why the device last reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetReason {
    /// Cold power-on
    PowerOn,
    /// External reset pin
    External,
    /// Software-requested restart
    Software,
    /// Watchdog fired
    Watchdog,
    /// Supply voltage dipped
    Brownout,
    /// Anything the target cannot classify
    Unknown,
}

impl ResetReason {
    /// Human-readable form used in the boot event-log entry
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetReason::PowerOn => "Power-on",
            ResetReason::External => "External reset",
            ResetReason::Software => "Software restart",
            ResetReason::Watchdog => "Watchdog reset",
            ResetReason::Brownout => "Brownout",
            ResetReason::Unknown => "Unknown reset",
        }
    }
}

/// Device-level control operations
pub trait SystemInterface {
    /// Restart the device. On hardware this does not return; the mock
    /// records the call instead.
    fn restart(&mut self);

    /// Reason for the last reset, for the boot event-log entry.
    fn reset_reason(&self) -> ResetReason;

    /// Arm the watchdog with the given timeout.
    fn watchdog_begin(&mut self, timeout_ms: u32);

    /// Feed the watchdog.
    fn watchdog_feed(&mut self);

    /// Suspend watchdog supervision (OTA, long scans).
    fn watchdog_suspend(&mut self);

    /// Resume watchdog supervision.
    fn watchdog_resume(&mut self);

    /// Flush filesystem/storage caches. Called before an OTA transfer.
    fn flush_caches(&mut self);

    /// Free heap in bytes, for the diagnostics page.
    fn free_heap(&self) -> usize;
}
