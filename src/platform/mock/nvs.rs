//! In-memory settings storage with commit staging and corruption injection

use crate::platform::error::NvsError;
use crate::platform::traits::NvsInterface;
use crate::platform::Result;
use alloc::vec;
use alloc::vec::Vec;

const DEFAULT_CAPACITY: u32 = 4096;

/// Mock non-volatile storage
///
/// `write` stages bytes; `commit` makes them durable. [`MockNvs::reopen`]
/// simulates a power cycle by discarding anything staged but not committed.
pub struct MockNvs {
    staged: Vec<u8>,
    committed: Vec<u8>,
    commit_count: u32,
}

impl MockNvs {
    /// Empty (erased, 0xFF) storage of the default 4 KB capacity
    pub fn new() -> Self {
        Self {
            staged: vec![0xFF; DEFAULT_CAPACITY as usize],
            committed: vec![0xFF; DEFAULT_CAPACITY as usize],
            commit_count: 0,
        }
    }

    /// Flip bits in the committed image (simulated corruption)
    pub fn corrupt(&mut self, offset: u32, len: usize) {
        for i in 0..len {
            self.committed[offset as usize + i] ^= 0xA5;
        }
        self.staged = self.committed.clone();
    }

    /// Simulate a power cycle: staged-but-uncommitted data is lost
    pub fn reopen(&mut self) {
        self.staged = self.committed.clone();
    }

    /// Number of commits performed
    pub fn commit_count(&self) -> u32 {
        self.commit_count
    }

    /// Committed contents, for test verification
    pub fn contents(&self, offset: u32, len: usize) -> Vec<u8> {
        self.committed[offset as usize..offset as usize + len].to_vec()
    }
}

impl Default for MockNvs {
    fn default() -> Self {
        Self::new()
    }
}

impl NvsInterface for MockNvs {
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()> {
        let end = offset as usize + buf.len();
        if end > self.committed.len() {
            return Err(NvsError::OutOfRange.into());
        }
        buf.copy_from_slice(&self.committed[offset as usize..end]);
        Ok(())
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        let end = offset as usize + data.len();
        if end > self.staged.len() {
            return Err(NvsError::OutOfRange.into());
        }
        self.staged[offset as usize..end].copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.committed = self.staged.clone();
        self.commit_count += 1;
        Ok(())
    }

    fn capacity(&self) -> u32 {
        self.committed.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_writes_survive_only_after_commit() {
        let mut nvs = MockNvs::new();
        nvs.write(0, b"hello").unwrap();
        nvs.reopen();

        let mut buf = [0u8; 5];
        nvs.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0xFF; 5]);

        nvs.write(0, b"hello").unwrap();
        nvs.commit().unwrap();
        nvs.reopen();
        nvs.read(0, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn out_of_range_write_fails() {
        let mut nvs = MockNvs::new();
        let cap = nvs.capacity();
        assert!(nvs.write(cap - 2, b"xxxx").is_err());
    }
}
