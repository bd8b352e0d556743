//! Clock and SNTP interface

use crate::platform::Result;

/// `epoch_seconds` below this value means "not yet synchronized"
pub const EPOCH_VALID_AFTER: u32 = 100_000;

/// Monotonic and wall-clock time source
pub trait ClockInterface {
    /// Milliseconds since boot. Monotonic, never wraps in practice (u64).
    fn millis(&self) -> u64;

    /// Blocking delay. Only used by the synchronous FTP wrapper.
    fn delay_ms(&mut self, ms: u32);

    /// Start SNTP against `server` with the given POSIX TZ string.
    fn sntp_begin(&mut self, server: &str, tz: &str) -> Result<()>;

    /// Current UTC epoch seconds, 0 (or another value `<= EPOCH_VALID_AFTER`)
    /// until SNTP has synchronized.
    fn epoch_seconds(&self) -> u32;
}
