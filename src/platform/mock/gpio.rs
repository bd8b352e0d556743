//! GPIO recorder for tests

use crate::platform::traits::GpioInterface;
use alloc::vec::Vec;

/// Records every level change
pub struct MockGpio {
    level: bool,
    /// All levels driven, oldest first
    pub transitions: Vec<bool>,
}

impl MockGpio {
    /// Pin starting low
    pub fn new() -> Self {
        Self {
            level: false,
            transitions: Vec::new(),
        }
    }
}

impl Default for MockGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioInterface for MockGpio {
    fn set_high(&mut self) {
        self.level = true;
        self.transitions.push(true);
    }

    fn set_low(&mut self) {
        self.level = false;
        self.transitions.push(false);
    }

    fn is_set_high(&self) -> bool {
        self.level
    }
}
