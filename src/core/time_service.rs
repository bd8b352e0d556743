//! Time service
//!
//! Wall-clock acquisition via SNTP and local-time formatting. The service
//! records the boot epoch on first sync so event stamps stay monotonic,
//! and formats Central European local time (the default POSIX TZ rule,
//! DST included) without a timezone database.

use crate::platform::traits::{ClockInterface, EPOCH_VALID_AFTER};
use crate::platform::Result;
use alloc::string::{String, ToString};
use core::fmt;
use core::fmt::Write;

/// Default POSIX TZ string: Central European with EU DST rules
pub const TZ_CET: &str = "CET-1CEST,M3.5.0,M10.5.0/3";

const SECS_PER_DAY: u64 = 86_400;

/// Wall-clock bookkeeping on top of [`ClockInterface`]
pub struct TimeService {
    ntp_server: String,
    boot_epoch: u32,
    synced: bool,
}

impl TimeService {
    /// Service using `ntp_server` for SNTP
    pub fn new(ntp_server: &str) -> Self {
        Self {
            ntp_server: ntp_server.to_string(),
            boot_epoch: 0,
            synced: false,
        }
    }

    /// The configured SNTP server
    pub fn ntp_server(&self) -> &str {
        &self.ntp_server
    }

    /// Kick off SNTP with the default Central European TZ rule
    pub fn sntp_start(&mut self, clock: &mut impl ClockInterface) -> Result<()> {
        clock.sntp_begin(&self.ntp_server, TZ_CET)
    }

    /// Poll for sync; records the boot epoch on the first plausible time.
    ///
    /// A returned epoch is plausible when it is past `EPOCH_VALID_AFTER`.
    pub fn poll_synced(&mut self, clock: &impl ClockInterface) -> bool {
        if self.synced {
            return true;
        }
        let epoch = clock.epoch_seconds();
        if epoch > EPOCH_VALID_AFTER {
            let uptime = (clock.millis() / 1000) as u32;
            self.boot_epoch = epoch.saturating_sub(uptime);
            self.synced = true;
        }
        self.synced
    }

    /// Declare the clock good without SNTP (soft-AP mode, no internet)
    pub fn mark_synced_without_ntp(&mut self) {
        self.synced = true;
    }

    /// Whether a wall-clock time is available
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Epoch recorded for the moment of boot (0 until synced)
    pub fn boot_epoch(&self) -> u32 {
        self.boot_epoch
    }

    /// Current epoch seconds; falls back to uptime when never synced
    pub fn now(&self, clock: &impl ClockInterface) -> u32 {
        let epoch = clock.epoch_seconds();
        if epoch > EPOCH_VALID_AFTER {
            epoch
        } else {
            (clock.millis() / 1000) as u32
        }
    }

    /// Seconds since boot
    pub fn uptime_seconds(&self, clock: &impl ClockInterface) -> u32 {
        (clock.millis() / 1000) as u32
    }

    /// `YYYY-MM-DD HH:MM:SS` stamp of the current local time.
    ///
    /// Before the first sync the stamp counts from boot instead
    /// (`boot+<seconds>s`), so pre-sync events remain ordered.
    pub fn stamp(&self, clock: &impl ClockInterface) -> heapless::String<20> {
        let mut out = heapless::String::new();
        let epoch = clock.epoch_seconds();
        if epoch > EPOCH_VALID_AFTER {
            let _ = format_local(epoch, &mut out);
        } else {
            let _ = write!(out, "boot+{}s", self.uptime_seconds(clock));
        }
        out
    }
}

/// Render `epoch` (UTC) as Central European local time
pub fn format_local(epoch: u32, out: &mut dyn fmt::Write) -> fmt::Result {
    let offset = if is_cest(epoch) { 7200 } else { 3600 };
    let local = epoch as u64 + offset;
    let days = local / SECS_PER_DAY;
    let secs = local % SECS_PER_DAY;
    let (year, month, day) = civil_from_days(days as i64);
    write!(
        out,
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year,
        month,
        day,
        secs / 3600,
        (secs / 60) % 60,
        secs % 60
    )
}

/// EU DST: CEST from the last Sunday of March 01:00 UTC until the last
/// Sunday of October 01:00 UTC
fn is_cest(epoch: u32) -> bool {
    let (year, _, _) = civil_from_days(epoch as i64 / SECS_PER_DAY as i64);
    let start = last_sunday_epoch(year, 3) + 3600;
    let end = last_sunday_epoch(year, 10) + 3600;
    (epoch as i64) >= start && (epoch as i64) < end
}

/// Epoch seconds of 00:00 UTC on the last Sunday of `month`
fn last_sunday_epoch(year: i64, month: u32) -> i64 {
    // March and October both have 31 days
    let last_day = days_from_civil(year, month, 31);
    let weekday = (last_day + 4).rem_euclid(7); // 0 = Sunday
    (last_day - weekday) * SECS_PER_DAY as i64
}

// Civil-calendar conversions after Howard Hinnant's algorithms.

fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = y.div_euclid(400);
    let yoe = y.rem_euclid(400);
    let mp = if m > 2 { m - 3 } else { m + 9 } as i64;
    let doy = (153 * mp + 2) / 5 + d as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockClock;
    use alloc::string::String;

    #[test]
    fn civil_round_trip() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(days_from_civil(1970, 1, 1), 0);
        assert_eq!(civil_from_days(days_from_civil(2026, 8, 6)), (2026, 8, 6));
    }

    #[test]
    fn winter_is_cet_summer_is_cest() {
        let mut out = String::new();
        // 2026-01-15 12:00:00 UTC -> 13:00 CET
        format_local(1_768_478_400, &mut out).unwrap();
        assert_eq!(out, "2026-01-15 13:00:00");

        out.clear();
        // 2026-07-15 12:00:00 UTC -> 14:00 CEST
        format_local(1_784_116_800, &mut out).unwrap();
        assert_eq!(out, "2026-07-15 14:00:00");
    }

    #[test]
    fn sync_records_boot_epoch() {
        let clock = MockClock::new();
        clock.advance(30_000);
        let mut time = TimeService::new("pool.ntp.org");
        assert!(!time.poll_synced(&clock));

        clock.set_epoch(1_700_000_000);
        assert!(time.poll_synced(&clock));
        assert_eq!(time.boot_epoch(), clock.epoch_seconds() - 30);
        assert!(time.is_synced());
    }

    #[test]
    fn stamp_counts_from_boot_until_synced() {
        let clock = MockClock::new();
        clock.advance(5_000);
        let time = TimeService::new("pool.ntp.org");
        assert_eq!(time.stamp(&clock).as_str(), "boot+5s");
    }
}
