//! Wi-Fi driver interface
//!
//! Station mode, soft-AP fallback and the passive single-channel scan used
//! by the roaming policy. Implementations map their driver's event/status
//! model onto [`WifiStatus`]; the connectivity state machine polls `status`
//! once per tick and never blocks on the driver.

use crate::platform::Result;
use core::fmt::Write;

/// Upper bound on scan results kept per scan
pub const MAX_SCAN_RESULTS: usize = 16;

/// Coarse association status, polled by the connectivity state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WifiStatus {
    /// Driver idle, no station configuration active
    Idle,
    /// Association in progress
    Connecting,
    /// Associated and (when DHCP) addressed
    Connected,
    /// Association failed (bad key, AP rejected)
    ConnectFailed,
    /// The configured SSID was not found
    NoSsidAvailable,
    /// Previously associated, now disconnected
    Disconnected,
}

/// One access point seen by a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanResult {
    /// Access point BSSID
    pub bssid: [u8; 6],
    /// Received signal strength in dBm
    pub rssi: i8,
    /// Channel the beacon was seen on
    pub channel: u8,
}

/// Wi-Fi driver operations used by the platform
pub trait WifiInterface {
    /// Set the DHCP/mDNS host name. Must be called before `begin_station`.
    fn set_hostname(&mut self, name: &str) -> Result<()>;

    /// Enable or disable the driver's persistent credential cache.
    ///
    /// The platform keeps credentials in its own settings record and always
    /// disables the driver cache.
    fn set_persistent(&mut self, enabled: bool);

    /// Enable or disable driver-level automatic reconnect.
    fn set_auto_reconnect(&mut self, enabled: bool);

    /// Configure station mode and start associating.
    fn begin_station(&mut self, ssid: &str, key: &str) -> Result<()>;

    /// Like `begin_station`, but pinned to a specific BSSID (roaming).
    fn begin_station_pinned(&mut self, ssid: &str, key: &str, bssid: [u8; 6]) -> Result<()>;

    /// Start an open soft-AP with the given SSID.
    fn begin_soft_ap(&mut self, ssid: &str) -> Result<()>;

    /// Number of stations currently associated with the soft-AP.
    fn soft_ap_station_count(&self) -> usize;

    /// Current association status.
    fn status(&self) -> WifiStatus;

    /// Local IPv4 address, `[0, 0, 0, 0]` when unaddressed.
    fn local_ip(&self) -> [u8; 4];

    /// BSSID of the currently associated access point.
    fn current_bssid(&self) -> Option<[u8; 6]>;

    /// RSSI of the current association in dBm.
    fn current_rssi(&self) -> i8;

    /// Channel of the current association.
    fn channel(&self) -> u8;

    /// Start a passive scan for `ssid` pinned to `channel`.
    ///
    /// # Errors
    ///
    /// Returns `WifiError::ScanBusy` while a previous scan is running.
    fn start_scan(&mut self, ssid: &str, channel: u8) -> Result<()>;

    /// Fetch scan results once, `None` while the scan is still running.
    fn scan_complete(&mut self) -> Option<heapless::Vec<ScanResult, MAX_SCAN_RESULTS>>;

    /// Drop the current association.
    fn disconnect(&mut self) -> Result<()>;
}

/// Render a BSSID as `aa:bb:cc:dd:ee:ff`
pub fn format_bssid(bssid: &[u8; 6]) -> heapless::String<17> {
    let mut out = heapless::String::new();
    for (i, b) in bssid.iter().enumerate() {
        if i > 0 {
            let _ = out.push(':');
        }
        let _ = write!(out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bssid_formatting() {
        let bssid = [0xde, 0xad, 0xbe, 0xef, 0x00, 0x42];
        assert_eq!(format_bssid(&bssid).as_str(), "de:ad:be:ef:00:42");
    }
}
