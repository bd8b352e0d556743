//! Event log
//!
//! Timestamped, human-readable appliance events (boots, associations, NTP
//! sync, FTP syncs, configuration changes) in a bounded [`TextLog`].
//!
//! On dual-core targets wrap the log in an `EmbassyState` so `log_event`
//! calls are serialized; on single-core targets `SingleCoreState` is the
//! documented no-op.

use super::ring::{MemRegion, TextLog, TextIter};
use core::fmt::Write;

/// Bytes per event entry, timestamp included
pub const EVENT_WIDTH: usize = 128;

/// Bounded log of timestamped event strings
pub struct EventLog {
    log: TextLog,
}

impl EventLog {
    /// Log holding `size` events
    pub fn new(size: usize) -> Self {
        Self {
            log: TextLog::new(size, EVENT_WIDTH, MemRegion::Internal),
        }
    }

    /// Append `message` stamped with `stamp`
    ///
    /// Entries appear in call order; every entry's stamp is at least as
    /// late as the previous one's.
    pub fn log_event(&mut self, stamp: &str, message: &str) {
        let mut line: heapless::String<EVENT_WIDTH> = heapless::String::new();
        if stamp.is_empty() {
            let _ = line.push_str(message);
        } else {
            let _ = write!(line, "{} {}", stamp, message);
        }
        self.log.add(&line);
    }

    /// Entry at `index`; negative indices count from the end
    pub fn at(&self, index: isize) -> Option<&str> {
        self.log.at(index)
    }

    /// Forward iterator, oldest first
    pub fn iter(&self) -> TextIter<'_> {
        self.log.iter()
    }

    /// Current number of entries
    pub fn count(&self) -> usize {
        self.log.count()
    }

    /// Maximum number of entries
    pub fn size(&self) -> usize {
        self.log.size()
    }

    /// Whether any event was recorded
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Discard all events
    pub fn clear(&mut self) {
        self.log.clear();
    }

    /// Whether any entry contains `needle` (test and page helper)
    pub fn contains(&self, needle: &str) -> bool {
        self.iter().any(|e| e.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_carry_stamp_and_order() {
        let mut log = EventLog::new(4);
        log.log_event("2026-02-01 10:00:00", "WiFi connected");
        log.log_event("2026-02-01 10:00:01", "WiFi initialized");
        assert_eq!(log.count(), 2);
        assert_eq!(log.at(0), Some("2026-02-01 10:00:00 WiFi connected"));
        assert!(log.contains("WiFi initialized"));
    }

    #[test]
    fn unstamped_entries_pass_through() {
        let mut log = EventLog::new(4);
        log.log_event("", "Power-on");
        assert_eq!(log.at(0), Some("Power-on"));
    }
}
