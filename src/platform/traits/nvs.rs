//! Non-volatile settings storage interface
//!
//! One reserved block at a fixed offset. `write` stages data; `commit`
//! makes it durable. A torn write is caught by the checksum on the next
//! boot, so implementations need no journaling.

use crate::platform::Result;

/// Byte-addressed non-volatile storage for the settings block
pub trait NvsInterface {
    /// Read `buf.len()` bytes starting at `offset`.
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()>;

    /// Stage a write of `data` at `offset`.
    ///
    /// # Errors
    ///
    /// `NvsError::OutOfRange` when the write exceeds the reserved block.
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<()>;

    /// Commit staged writes to the backing medium.
    fn commit(&mut self) -> Result<()>;

    /// Size of the reserved block in bytes.
    fn capacity(&self) -> u32;
}
