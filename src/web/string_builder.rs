//! Growable character buffer with a low-space callback
//!
//! The buffer owns a contiguous region with a deterministic ceiling; when
//! the unused tail falls below the threshold the registered callback is
//! handed the content and the buffer is cleared. The chunked-response
//! adapter registers a callback that sends one HTTP chunk.

use crate::core::ring::MemRegion;
use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

/// Default low-space threshold in bytes
pub const LOW_SPACE_THRESHOLD: usize = 256;

/// Bounded string sink with an optional low-space callback
pub struct StringBuilder<'a> {
    buf: String,
    max: usize,
    threshold: usize,
    region: MemRegion,
    overflowed: bool,
    on_low_space: Option<Box<dyn FnMut(&str) + 'a>>,
}

impl<'a> StringBuilder<'a> {
    /// Buffer with a `max`-byte ceiling, placed per `region`
    pub fn new(max: usize, region: MemRegion) -> Self {
        Self {
            buf: String::with_capacity(max.min(4096)),
            max,
            threshold: LOW_SPACE_THRESHOLD,
            region,
            overflowed: false,
            on_low_space: None,
        }
    }

    /// Install the low-space callback; it receives the content to flush,
    /// after which the buffer is cleared
    pub fn on_low_space(&mut self, callback: impl FnMut(&str) + 'a) {
        self.on_low_space = Some(Box::new(callback));
    }

    /// Override the low-space threshold
    pub fn set_threshold(&mut self, threshold: usize) {
        self.threshold = threshold;
    }

    /// Current content
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Current length in bytes
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Whether a write was truncated by the ceiling
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Placement hint of the buffer
    pub fn region(&self) -> MemRegion {
        self.region
    }

    /// Drop the content
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Flush through the callback regardless of fill level
    pub fn flush(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        if let Some(mut cb) = self.on_low_space.take() {
            cb(&self.buf);
            self.on_low_space = Some(cb);
            self.buf.clear();
        }
    }

    fn maybe_flush(&mut self) {
        if self.on_low_space.is_some() && self.max - self.buf.len() < self.threshold {
            self.flush();
        }
    }
}

impl fmt::Write for StringBuilder<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut s = s;
        // Writes larger than the remaining space flush first; without a
        // callback they truncate at the ceiling.
        while !s.is_empty() {
            let free = self.max - self.buf.len();
            if s.len() <= free {
                self.buf.push_str(s);
                break;
            }
            let mut cut = free;
            while cut > 0 && !s.is_char_boundary(cut) {
                cut -= 1;
            }
            self.buf.push_str(&s[..cut]);
            s = &s[cut..];
            if self.on_low_space.is_none() {
                self.overflowed = true;
                return Ok(());
            }
            self.flush();
        }
        self.maybe_flush();
        Ok(())
    }
}
