//! Manually advanced clock for tests

use crate::platform::traits::ClockInterface;
use crate::platform::Result;
use alloc::string::{String, ToString};
use core::cell::{Cell, RefCell};

/// Mock clock; time moves only when the test advances it
pub struct MockClock {
    now_ms: Cell<u64>,
    epoch: Cell<u32>,
    /// Epoch value installed `sync_after_polls` polls after `sntp_begin`
    pending_epoch: Cell<Option<u32>>,
    sntp: RefCell<Option<(String, String)>>,
}

impl MockClock {
    /// Clock starting at t = 0 ms, epoch unsynchronized
    pub fn new() -> Self {
        Self {
            now_ms: Cell::new(0),
            epoch: Cell::new(0),
            pending_epoch: Cell::new(None),
            sntp: RefCell::new(None),
        }
    }

    /// Move time forward
    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }

    /// Install the wall-clock time directly
    pub fn set_epoch(&self, epoch: u32) {
        self.epoch.set(epoch);
    }

    /// Arrange for `sntp_begin` to "synchronize" to this epoch immediately
    pub fn script_sntp_epoch(&self, epoch: u32) {
        self.pending_epoch.set(Some(epoch));
    }

    /// Server passed to the last `sntp_begin`, if any
    pub fn sntp_server(&self) -> Option<String> {
        self.sntp.borrow().as_ref().map(|(s, _)| s.clone())
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockInterface for MockClock {
    fn millis(&self) -> u64 {
        self.now_ms.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(ms as u64);
    }

    fn sntp_begin(&mut self, server: &str, tz: &str) -> Result<()> {
        *self.sntp.borrow_mut() = Some((server.to_string(), tz.to_string()));
        if let Some(epoch) = self.pending_epoch.take() {
            self.epoch.set(epoch);
        }
        Ok(())
    }

    fn epoch_seconds(&self) -> u32 {
        let epoch = self.epoch.get();
        if epoch == 0 {
            return 0;
        }
        // Wall clock follows the mock monotonic clock once synced
        epoch + (self.now_ms.get() / 1000) as u32
    }
}
