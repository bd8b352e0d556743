//! Scripted Wi-Fi driver for tests

use crate::platform::error::WifiError;
use crate::platform::traits::{ScanResult, WifiInterface, WifiStatus, MAX_SCAN_RESULTS};
use crate::platform::Result;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::Cell;

/// What the mock driver was last asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockWifiMode {
    /// Nothing configured
    Off,
    /// Station mode; `bssid` is set when pinned
    Station {
        /// Configured SSID
        ssid: String,
        /// Configured pre-shared key
        key: String,
        /// Pinned BSSID, when roaming forced one
        bssid: Option<[u8; 6]>,
    },
    /// Open soft-AP
    SoftAp {
        /// Advertised SSID
        ssid: String,
    },
}

/// Mock Wi-Fi driver; the test scripts status, scan results and association
pub struct MockWifi {
    /// Current mode, as configured through the trait
    pub mode: MockWifiMode,
    /// Every mode change, oldest first
    pub mode_log: Vec<MockWifiMode>,
    hostname: String,
    persistent: bool,
    auto_reconnect: bool,
    status: Cell<WifiStatus>,
    soft_ap_stations: Cell<usize>,
    ip: [u8; 4],
    bssid: Option<[u8; 6]>,
    rssi: i8,
    channel: u8,
    scan_running: bool,
    scan_request: Option<(String, u8)>,
    scan_results: Option<heapless::Vec<ScanResult, MAX_SCAN_RESULTS>>,
}

impl MockWifi {
    /// Driver in the `Off` state
    pub fn new() -> Self {
        Self {
            mode: MockWifiMode::Off,
            mode_log: Vec::new(),
            hostname: String::new(),
            persistent: true,
            auto_reconnect: true,
            status: Cell::new(WifiStatus::Idle),
            soft_ap_stations: Cell::new(0),
            ip: [0; 4],
            bssid: None,
            rssi: -127,
            channel: 0,
            scan_running: false,
            scan_request: None,
            scan_results: None,
        }
    }

    /// Script the next status the machine will observe
    pub fn set_status(&self, status: WifiStatus) {
        self.status.set(status);
    }

    /// Simulate a successful association
    pub fn associate(&mut self, ip: [u8; 4], bssid: [u8; 6], rssi: i8, channel: u8) {
        self.ip = ip;
        self.bssid = Some(bssid);
        self.rssi = rssi;
        self.channel = channel;
        self.status.set(WifiStatus::Connected);
    }

    /// Simulate an association loss
    pub fn drop_association(&mut self) {
        self.ip = [0; 4];
        self.status.set(WifiStatus::Disconnected);
    }

    /// Script the number of soft-AP clients
    pub fn set_soft_ap_stations(&self, count: usize) {
        self.soft_ap_stations.set(count);
    }

    /// Provide the results the running scan will deliver
    pub fn script_scan_results(&mut self, results: &[ScanResult]) {
        let mut v = heapless::Vec::new();
        for r in results {
            let _ = v.push(*r);
        }
        self.scan_results = Some(v);
    }

    /// The (ssid, channel) of the last scan request, if any
    pub fn scan_request(&self) -> Option<(String, u8)> {
        self.scan_request.clone()
    }

    /// Hostname the platform configured
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Whether driver credential caching was left enabled
    pub fn persistent(&self) -> bool {
        self.persistent
    }

    fn set_mode(&mut self, mode: MockWifiMode) {
        self.mode_log.push(mode.clone());
        self.mode = mode;
    }
}

impl Default for MockWifi {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiInterface for MockWifi {
    fn set_hostname(&mut self, name: &str) -> Result<()> {
        self.hostname = name.to_string();
        Ok(())
    }

    fn set_persistent(&mut self, enabled: bool) {
        self.persistent = enabled;
    }

    fn set_auto_reconnect(&mut self, enabled: bool) {
        self.auto_reconnect = enabled;
    }

    fn begin_station(&mut self, ssid: &str, key: &str) -> Result<()> {
        self.set_mode(MockWifiMode::Station {
            ssid: ssid.to_string(),
            key: key.to_string(),
            bssid: None,
        });
        self.status.set(WifiStatus::Connecting);
        Ok(())
    }

    fn begin_station_pinned(&mut self, ssid: &str, key: &str, bssid: [u8; 6]) -> Result<()> {
        self.set_mode(MockWifiMode::Station {
            ssid: ssid.to_string(),
            key: key.to_string(),
            bssid: Some(bssid),
        });
        self.status.set(WifiStatus::Connecting);
        Ok(())
    }

    fn begin_soft_ap(&mut self, ssid: &str) -> Result<()> {
        self.set_mode(MockWifiMode::SoftAp {
            ssid: ssid.to_string(),
        });
        self.status.set(WifiStatus::Idle);
        Ok(())
    }

    fn soft_ap_station_count(&self) -> usize {
        self.soft_ap_stations.get()
    }

    fn status(&self) -> WifiStatus {
        self.status.get()
    }

    fn local_ip(&self) -> [u8; 4] {
        self.ip
    }

    fn current_bssid(&self) -> Option<[u8; 6]> {
        self.bssid
    }

    fn current_rssi(&self) -> i8 {
        self.rssi
    }

    fn channel(&self) -> u8 {
        self.channel
    }

    fn start_scan(&mut self, ssid: &str, channel: u8) -> Result<()> {
        if self.scan_running {
            return Err(WifiError::ScanBusy.into());
        }
        self.scan_running = true;
        self.scan_request = Some((ssid.to_string(), channel));
        Ok(())
    }

    fn scan_complete(&mut self) -> Option<heapless::Vec<ScanResult, MAX_SCAN_RESULTS>> {
        if !self.scan_running {
            return None;
        }
        match self.scan_results.take() {
            Some(results) => {
                self.scan_running = false;
                Some(results)
            }
            None => None,
        }
    }

    fn disconnect(&mut self) -> Result<()> {
        self.status.set(WifiStatus::Disconnected);
        self.ip = [0; 4];
        Ok(())
    }
}
