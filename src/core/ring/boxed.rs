//! Pointer ring log: owns heap entries, destroys them on eviction

use super::resolve_index;
use alloc::boxed::Box;
use alloc::collections::VecDeque;

/// Bounded FIFO of owned heap entries
///
/// `add` takes ownership; evicting or clearing drops the entry.
pub struct BoxLog<T: ?Sized> {
    entries: VecDeque<Box<T>>,
    size: usize,
}

impl<T: ?Sized> BoxLog<T> {
    /// Log holding up to `size` entries
    pub fn new(size: usize) -> Self {
        debug_assert!(size > 0);
        Self {
            entries: VecDeque::with_capacity(size),
            size,
        }
    }

    /// Take ownership of an entry; the oldest is dropped when full
    pub fn add(&mut self, entry: Box<T>) {
        if self.entries.len() == self.size {
            drop(self.entries.pop_front());
        }
        self.entries.push_back(entry);
    }

    /// Entry at `index`; negative indices count from the end, clamped
    pub fn at(&self, index: isize) -> Option<&T> {
        let index = resolve_index(index, self.entries.len())?;
        self.entries.get(index).map(|b| &**b)
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Current occupancy
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Maximum occupancy
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forward iterator in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|b| &**b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct DropProbe<'a> {
        drops: &'a Cell<usize>,
        value: i32,
    }

    impl Drop for DropProbe<'_> {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn eviction_drops_each_evicted_entry_once() {
        let drops = Cell::new(0);
        let mut log: BoxLog<DropProbe<'_>> = BoxLog::new(3);
        for value in 0..7 {
            log.add(Box::new(DropProbe {
                drops: &drops,
                value,
            }));
        }
        // 7 adds into a log of 3: exactly 4 evictions
        assert_eq!(drops.get(), 4);
        assert_eq!(log.count(), 3);
        let values: alloc::vec::Vec<i32> = log.iter().map(|p| p.value).collect();
        assert_eq!(values, [4, 5, 6]);

        log.clear();
        assert_eq!(drops.get(), 7);
        assert!(log.is_empty());
    }

    #[test]
    fn relative_indexing() {
        let mut log: BoxLog<i32> = BoxLog::new(4);
        for i in 0..4 {
            log.add(Box::new(i));
        }
        assert_eq!(log.at(-1), Some(&3));
        assert_eq!(log.at(-4), Some(&0));
        assert_eq!(log.at(-10), Some(&0));
        assert_eq!(log.at(4), None);
    }

    #[test]
    fn works_with_unsized_entries() {
        let mut log: BoxLog<str> = BoxLog::new(2);
        log.add("alpha".into());
        log.add("beta".into());
        log.add("gamma".into());
        let joined: alloc::vec::Vec<&str> = log.iter().collect();
        assert_eq!(joined, ["beta", "gamma"]);
    }
}
