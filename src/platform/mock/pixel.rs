//! RGB pixel recorder for tests

use crate::platform::traits::PixelInterface;
use crate::platform::Result;
use alloc::vec::Vec;
use rgb::RGB8;

/// Records every color latched onto the pixel
pub struct MockPixel {
    /// All colors written, oldest first
    pub writes: Vec<RGB8>,
}

impl MockPixel {
    /// Pixel with no writes yet
    pub fn new() -> Self {
        Self { writes: Vec::new() }
    }

    /// Last color written, if any
    pub fn last(&self) -> Option<RGB8> {
        self.writes.last().copied()
    }
}

impl Default for MockPixel {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelInterface for MockPixel {
    fn write(&mut self, color: RGB8) -> Result<()> {
        self.writes.push(color);
        Ok(())
    }
}
