//! Telemetry log
//!
//! Applications sample their own telemetry struct at a fixed interval and
//! add it here; the log only stores samples that differ from the previous
//! one, so runs of identical readings compress to a single entry. A fresh
//! counter drives the scheduled FTP export.

use super::ring::{MemRegion, ValueLog};
use core::fmt;

/// One application-defined telemetry record
pub trait TelemetrySample: Copy {
    /// Equality predicate deciding whether a new sample is worth storing.
    /// Timestamps are normally excluded from the comparison.
    fn matches(&self, previous: &Self) -> bool;

    /// Append one CSV row (no trailing newline) for this sample.
    fn write_row(&self, out: &mut dyn fmt::Write) -> fmt::Result;

    /// Append the CSV header row (no trailing newline).
    fn write_header(out: &mut dyn fmt::Write) -> fmt::Result;
}

/// Run-compressed bounded telemetry log
pub struct TelemetryLog<T: TelemetrySample> {
    log: ValueLog<T>,
    fresh: usize,
}

impl<T: TelemetrySample> TelemetryLog<T> {
    /// Log holding `size` samples, slab placed per `region`
    pub fn new(size: usize, region: MemRegion) -> Self {
        Self {
            log: ValueLog::new(size, region),
            fresh: 0,
        }
    }

    /// Store `sample` unless it matches the newest entry.
    ///
    /// Returns whether the sample was stored.
    pub fn add(&mut self, sample: T) -> bool {
        if let Some(last) = self.log.at(-1) {
            if sample.matches(last) {
                return false;
            }
        }
        self.log.add(sample);
        if self.fresh < self.log.size() {
            self.fresh += 1;
        }
        true
    }

    /// Entries stored since the last [`mark_synced`](Self::mark_synced)
    pub fn fresh(&self) -> usize {
        self.fresh.min(self.log.count())
    }

    /// Reset the fresh counter after a successful export
    pub fn mark_synced(&mut self) {
        self.fresh = 0;
    }

    /// Render header plus all not-yet-exported rows as CSV
    pub fn write_fresh_csv(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        T::write_header(out)?;
        out.write_char('\n')?;
        let fresh = self.fresh();
        let start = (self.log.count() - fresh) as isize;
        for index in start..self.log.count() as isize {
            if let Some(sample) = self.log.at(index) {
                sample.write_row(out)?;
                out.write_char('\n')?;
            }
        }
        Ok(())
    }

    /// Underlying ring log (pages iterate it directly)
    pub fn entries(&self) -> &ValueLog<T> {
        &self.log
    }

    /// Discard all samples and reset the fresh counter
    pub fn clear(&mut self) {
        self.log.clear();
        self.fresh = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Sample {
        time: u32,
        watts: i32,
    }

    impl TelemetrySample for Sample {
        fn matches(&self, previous: &Self) -> bool {
            self.watts == previous.watts
        }

        fn write_row(&self, out: &mut dyn fmt::Write) -> fmt::Result {
            write!(out, "{};{}", self.time, self.watts)
        }

        fn write_header(out: &mut dyn fmt::Write) -> fmt::Result {
            write!(out, "time;watts")
        }
    }

    #[test]
    fn identical_runs_compress() {
        let mut log = TelemetryLog::new(16, MemRegion::Internal);
        assert!(log.add(Sample { time: 1, watts: 100 }));
        assert!(!log.add(Sample { time: 2, watts: 100 }));
        assert!(log.add(Sample { time: 3, watts: 150 }));
        assert_eq!(log.entries().count(), 2);
        assert_eq!(log.fresh(), 2);
    }

    #[test]
    fn csv_covers_only_fresh_rows() {
        let mut log = TelemetryLog::new(16, MemRegion::Internal);
        log.add(Sample { time: 1, watts: 1 });
        log.add(Sample { time: 2, watts: 2 });
        log.mark_synced();
        log.add(Sample { time: 3, watts: 3 });

        let mut csv = String::new();
        log.write_fresh_csv(&mut csv).unwrap();
        assert_eq!(csv, "time;watts\n3;3\n");
    }
}
