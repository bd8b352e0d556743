//! Scripted OTA channel for tests

use crate::platform::traits::{UpdateEvent, UpdateInterface};
use crate::platform::Result;
use alloc::collections::VecDeque;
use alloc::string::{String, ToString};

/// OTA channel that replays injected events
pub struct MockUpdate {
    /// Hostname passed to `begin`, if started
    pub started_as: Option<String>,
    events: VecDeque<UpdateEvent>,
}

impl MockUpdate {
    /// Channel with nothing scripted
    pub fn new() -> Self {
        Self {
            started_as: None,
            events: VecDeque::new(),
        }
    }

    /// Queue an event for a later `poll`
    pub fn inject(&mut self, event: UpdateEvent) {
        self.events.push_back(event);
    }
}

impl Default for MockUpdate {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateInterface for MockUpdate {
    fn begin(&mut self, hostname: &str) -> Result<()> {
        self.started_as = Some(hostname.to_string());
        Ok(())
    }

    fn poll(&mut self) -> UpdateEvent {
        self.events.pop_front().unwrap_or(UpdateEvent::Idle)
    }
}
