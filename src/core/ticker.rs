//! Fixed-interval callback ticker
//!
//! A small registry of short callbacks (watchdog feed, sensor poll, blink
//! bookkeeping) serviced from the main tick. Callbacks are plain function
//! pointers over the application context, so the registry stays `'static`
//! and allocation-free after setup.

use alloc::vec::Vec;

struct Entry<C> {
    name: &'static str,
    interval_ms: u32,
    next_due: u64,
    callback: fn(&mut C),
}

/// Registry of fixed-interval callbacks
pub struct Ticker<C> {
    entries: Vec<Entry<C>>,
}

impl<C> Ticker<C> {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `callback` to run every `interval_ms`
    pub fn register(&mut self, name: &'static str, interval_ms: u32, callback: fn(&mut C)) {
        self.entries.push(Entry {
            name,
            interval_ms,
            next_due: 0,
            callback,
        });
    }

    /// Run every callback that is due at `now_ms`; returns how many ran
    pub fn service(&mut self, now_ms: u64, ctx: &mut C) -> usize {
        let mut fired = 0;
        for entry in &mut self.entries {
            if now_ms >= entry.next_due {
                (entry.callback)(ctx);
                entry.next_due = now_ms + entry.interval_ms as u64;
                fired += 1;
            }
        }
        fired
    }

    /// Names of registered callbacks (diagnostics page)
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }
}

impl<C> Default for Ticker<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callbacks_fire_at_their_interval() {
        let mut ticker: Ticker<u32> = Ticker::new();
        ticker.register("count", 100, |c| *c += 1);

        let mut count = 0;
        ticker.service(0, &mut count);
        ticker.service(50, &mut count);
        ticker.service(100, &mut count);
        ticker.service(250, &mut count);
        assert_eq!(count, 3);
    }

    #[test]
    fn independent_intervals() {
        let mut ticker: Ticker<(u32, u32)> = Ticker::new();
        ticker.register("fast", 10, |c| c.0 += 1);
        ticker.register("slow", 100, |c| c.1 += 1);

        let mut counts = (0, 0);
        for t in (0..=100).step_by(10) {
            ticker.service(t, &mut counts);
        }
        assert_eq!(counts.0, 11);
        assert_eq!(counts.1, 2);
    }
}
