//! Synchronized state abstraction
//!
//! The REST request slot is shared between the main tick and the client's
//! background worker; the event log may be shared between cores. The
//! [`SharedState`] trait abstracts the locking so core code stays
//! platform-agnostic:
//! - [`SingleCoreState`] is the no-op variant for single-core targets and
//!   host tests (plain `RefCell`)
//! - `EmbassyState` (feature `embassy`) wraps a critical-section mutex for
//!   dual-core / interrupt contexts

/// Platform-agnostic synchronized state access
pub trait SharedState<T> {
    /// Access state immutably.
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R;

    /// Access state mutably.
    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R;
}

/// Unsynchronized variant for single-core targets
///
/// # Panics
///
/// Panics when borrowing rules are violated; with the cooperative
/// single-threaded tick that indicates a bug, not a race.
pub struct SingleCoreState<T> {
    inner: core::cell::RefCell<T>,
}

impl<T> SingleCoreState<T> {
    /// Wrap a value. `const`, so statics work.
    pub const fn new(value: T) -> Self {
        Self {
            inner: core::cell::RefCell::new(value),
        }
    }
}

impl<T> SharedState<T> for SingleCoreState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.inner.borrow())
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        f(&mut self.inner.borrow_mut())
    }
}

#[cfg(feature = "embassy")]
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

/// Critical-section mutex variant for dual-core targets
#[cfg(feature = "embassy")]
pub struct EmbassyState<T> {
    inner: Mutex<CriticalSectionRawMutex, core::cell::RefCell<T>>,
}

#[cfg(feature = "embassy")]
impl<T> EmbassyState<T> {
    /// Wrap a value. `const`, so statics work.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(core::cell::RefCell::new(value)),
        }
    }
}

#[cfg(feature = "embassy")]
impl<T> SharedState<T> for EmbassyState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        self.inner.lock(|cell| f(&cell.borrow()))
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}
