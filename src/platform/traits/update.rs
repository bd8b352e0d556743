//! Over-the-air update channel interface

use crate::platform::Result;

/// Events reported by the OTA channel, polled once per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateEvent {
    /// Nothing happening
    Idle,
    /// A transfer has begun
    Started,
    /// The transfer completed; the target will reboot into the new image
    Finished,
    /// The transfer aborted mid-stream
    Failed,
}

/// Host-provided OTA protocol handle
pub trait UpdateInterface {
    /// Start the OTA listener, advertised under `hostname`.
    fn begin(&mut self, hostname: &str) -> Result<()>;

    /// Service the channel and report at most one event.
    fn poll(&mut self) -> UpdateEvent;
}
