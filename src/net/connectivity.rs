//! Connectivity state machine
//!
//! Takes the appliance from cold boot to "associated, time-synced, ready
//! to serve" and keeps it there across outages, roaming handovers and OTA
//! updates. The machine is stepped once per main tick and never blocks:
//! SNTP is polled, scans run in the driver's background, and reconnect
//! backoff is pure bookkeeping against the monotonic clock.
//!
//! State flow (station mode):
//!
//! ```text
//! Booting -> Initializing -> Connecting -> Connected
//!         -> TimeServerInitializing -> TimeServerSyncing
//!         -> TimeServerSynced -> Initialized
//! ```
//!
//! With no SSID configured, `Initializing` starts an open soft-AP named
//! after the host name and the first associated client short-circuits to
//! `TimeServerSynced` (no internet is assumed, so no SNTP).

use crate::core::event_log::EventLog;
use crate::core::time_service::TimeService;
use crate::platform::traits::wifi::format_bssid;
use crate::platform::traits::{
    ClockInterface, ScanResult, SystemInterface, UpdateEvent, UpdateInterface, WifiInterface,
    WifiStatus,
};
use alloc::string::{String, ToString};
use core::fmt::Write;
use rgb::RGB8;

/// Association attempt timeout
pub const CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Initial reconnect backoff
pub const RETRY_MIN_MS: u64 = 5_000;

/// Backoff ceiling
pub const RETRY_MAX_MS: u64 = 300_000;

/// SNTP poll spacing and budget per attempt
const SNTP_POLL_MS: u64 = 100;
const SNTP_POLLS_PER_ATTEMPT: u32 = 20;

/// Delay between a reset request and the restart, leaving an in-flight
/// HTTP response time to complete
const RESET_DELAY_MS: u64 = 1_000;

/// Connectivity lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnState {
    /// Power applied, `begin` not yet called
    Booting,
    /// Selecting station vs soft-AP mode
    Initializing,
    /// Soft-AP up, waiting for a provisioning client
    AwaitingConnection,
    /// Station association in progress
    Connecting,
    /// Association failed; waiting out the retry interval
    ConnectFailed,
    /// Associated and addressed
    Connected,
    /// Starting SNTP
    TimeServerInitializing,
    /// Polling for the first plausible wall-clock time
    TimeServerSyncing,
    /// Wall clock ready (or declared ready in soft-AP mode)
    TimeServerSynced,
    /// Steady state
    Initialized,
    /// Association lost; waiting out the backoff
    ConnectionLost,
    /// Re-association in progress
    Reconnecting,
    /// Handover to a better access point in progress
    SwitchingAp,
    /// OTA transfer in progress
    Updating,
}

impl ConnState {
    /// Display name for pages and events
    pub fn name(&self) -> &'static str {
        match self {
            ConnState::Booting => "Booting",
            ConnState::Initializing => "Initializing",
            ConnState::AwaitingConnection => "Awaiting connection",
            ConnState::Connecting => "Connecting",
            ConnState::ConnectFailed => "Connect failed",
            ConnState::Connected => "Connected",
            ConnState::TimeServerInitializing => "Time server initializing",
            ConnState::TimeServerSyncing => "Time server syncing",
            ConnState::TimeServerSynced => "Time server synced",
            ConnState::Initialized => "Initialized",
            ConnState::ConnectionLost => "Connection lost",
            ConnState::Reconnecting => "Reconnecting",
            ConnState::SwitchingAp => "Switching AP",
            ConnState::Updating => "Updating",
        }
    }
}

/// Per-state application callbacks
///
/// `on_enter` fires once per transition, `on_tick` on every tick spent in
/// the state. The application typically starts its HTTP listener on
/// entering `Connected`/`TimeServerSynced` and runs its steady-state work
/// from `on_tick(Initialized)`.
pub trait ConnectivityHooks {
    /// One-shot, fired when the machine enters `state`
    fn on_enter(&mut self, _state: ConnState) {}

    /// Fired on every tick spent in `state`
    fn on_tick(&mut self, _state: ConnState) {}
}

/// Hook implementation that ignores everything
pub struct NullHooks;

impl ConnectivityHooks for NullHooks {}

/// Machine configuration, taken from the settings record at boot
#[derive(Debug, Clone)]
pub struct ConnectivityConfig {
    /// Station SSID; empty boots the soft-AP
    pub ssid: String,
    /// Pre-shared key
    pub key: String,
    /// Host name; doubles as the soft-AP SSID
    pub host_name: String,
    /// Enable AP-scan roaming
    pub roaming: bool,
    /// Minimum RSSI improvement before switching APs (dB)
    pub roam_threshold_db: i8,
    /// Scan period while associated
    pub roam_scan_period_ms: u64,
    /// Extra dwell after a forced handover
    pub roam_dwell_ms: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            key: String::new(),
            host_name: "embernet".to_string(),
            roaming: false,
            roam_threshold_db: 6,
            roam_scan_period_ms: 300_000,
            roam_dwell_ms: 10_000,
        }
    }
}

/// The connectivity state machine
pub struct ConnectivityMachine {
    config: ConnectivityConfig,
    state: ConnState,
    state_since_ms: u64,
    state_stamp: String,
    retry_interval_ms: u64,
    soft_ap: bool,
    sntp_polls: u32,
    sntp_last_poll_ms: u64,
    scan_due_ms: u64,
    scanning: bool,
    reset_at_ms: Option<u64>,
    ip: [u8; 4],
}

impl ConnectivityMachine {
    /// Machine in `Booting`; call [`begin`](Self::begin) to start
    pub fn new(config: ConnectivityConfig) -> Self {
        Self {
            config,
            state: ConnState::Booting,
            state_since_ms: 0,
            state_stamp: String::new(),
            retry_interval_ms: RETRY_MIN_MS,
            soft_ap: false,
            sntp_polls: 0,
            sntp_last_poll_ms: 0,
            scan_due_ms: 0,
            scanning: false,
            reset_at_ms: None,
            ip: [0; 4],
        }
    }

    /// Current state
    pub fn state(&self) -> ConnState {
        self.state
    }

    /// Milliseconds already spent in the current state
    pub fn state_elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.state_since_ms)
    }

    /// Timestamp of the last transition, as formatted at transition time
    pub fn state_stamp(&self) -> &str {
        &self.state_stamp
    }

    /// Whether the machine runs the provisioning soft-AP
    pub fn is_soft_ap(&self) -> bool {
        self.soft_ap
    }

    /// IP address recorded on association
    pub fn ip(&self) -> [u8; 4] {
        self.ip
    }

    /// Current reconnect backoff
    pub fn retry_interval_ms(&self) -> u64 {
        self.retry_interval_ms
    }

    /// Status-LED pattern for the current state: color, blink period
    /// (0 = steady), breathing step (0 = none)
    pub fn led_pattern(&self) -> (RGB8, u32, u32) {
        match self.state {
            ConnState::AwaitingConnection => (RGB8::new(0, 0, 255), 1000, 0),
            ConnState::Connecting | ConnState::Reconnecting | ConnState::SwitchingAp => {
                (RGB8::new(0, 255, 0), 333, 0)
            }
            ConnState::ConnectFailed | ConnState::ConnectionLost => (RGB8::new(255, 0, 0), 1000, 0),
            ConnState::Updating => (RGB8::new(255, 0, 255), 0, 40),
            ConnState::Initialized => (RGB8::new(0, 255, 0), 0, 0),
            _ => (RGB8::new(255, 160, 0), 0, 0),
        }
    }

    /// Restart the device [`RESET_DELAY_MS`] from now, giving an in-flight
    /// HTTP response time to complete
    pub fn request_reset(&mut self, clock: &impl ClockInterface) {
        self.reset_at_ms = Some(clock.millis() + RESET_DELAY_MS);
    }

    /// Start the lifecycle
    pub fn begin<C, H>(&mut self, clock: &mut C, time: &TimeService, hooks: &mut H)
    where
        C: ClockInterface,
        H: ConnectivityHooks,
    {
        self.set_state(ConnState::Initializing, clock, time, hooks);
    }

    fn set_state<C, H>(&mut self, state: ConnState, clock: &C, time: &TimeService, hooks: &mut H)
    where
        C: ClockInterface,
        H: ConnectivityHooks,
    {
        self.state = state;
        self.state_since_ms = clock.millis();
        self.state_stamp = time.stamp(clock).as_str().to_string();
        hooks.on_enter(state);
    }

    /// Advance the machine one step. Call once per main tick.
    #[allow(clippy::too_many_arguments)]
    pub fn tick<W, C, U, SY, H>(
        &mut self,
        wifi: &mut W,
        clock: &mut C,
        update: &mut U,
        system: &mut SY,
        time: &mut TimeService,
        events: &mut EventLog,
        hooks: &mut H,
    ) where
        W: WifiInterface,
        C: ClockInterface,
        U: UpdateInterface,
        SY: SystemInterface,
        H: ConnectivityHooks,
    {
        let now = clock.millis();

        if let Some(reset_at) = self.reset_at_ms {
            if now >= reset_at {
                self.reset_at_ms = None;
                system.restart();
                return;
            }
        }

        hooks.on_tick(self.state);

        match self.state {
            ConnState::Booting => {}

            ConnState::Initializing => {
                if self.config.ssid.is_empty() {
                    self.soft_ap = true;
                    if wifi.begin_soft_ap(&self.config.host_name).is_ok() {
                        self.set_state(ConnState::AwaitingConnection, clock, time, hooks);
                    }
                } else {
                    self.soft_ap = false;
                    let mut started = wifi.set_hostname(&self.config.host_name).is_ok();
                    wifi.set_persistent(false);
                    wifi.set_auto_reconnect(false);
                    if started {
                        started = wifi
                            .begin_station(&self.config.ssid, &self.config.key)
                            .is_ok();
                    }
                    if started {
                        self.set_state(ConnState::Connecting, clock, time, hooks);
                    } else {
                        self.set_state(ConnState::ConnectFailed, clock, time, hooks);
                    }
                }
            }

            ConnState::AwaitingConnection => {
                if wifi.soft_ap_station_count() > 0 {
                    time.mark_synced_without_ntp();
                    self.set_state(ConnState::TimeServerSynced, clock, time, hooks);
                }
            }

            ConnState::Connecting => match wifi.status() {
                WifiStatus::Connected => {
                    self.on_associated(wifi, clock, update, time, events, hooks);
                }
                WifiStatus::ConnectFailed | WifiStatus::NoSsidAvailable => {
                    self.set_state(ConnState::ConnectFailed, clock, time, hooks);
                }
                _ => {
                    if self.state_elapsed_ms(now) >= CONNECT_TIMEOUT_MS {
                        self.set_state(ConnState::ConnectFailed, clock, time, hooks);
                    }
                }
            },

            ConnState::ConnectFailed => {
                if self.state_elapsed_ms(now) >= self.retry_interval_ms {
                    self.retry_interval_ms = (self.retry_interval_ms * 2).min(RETRY_MAX_MS);
                    self.set_state(ConnState::Initializing, clock, time, hooks);
                }
            }

            ConnState::Connected => {
                self.set_state(ConnState::TimeServerInitializing, clock, time, hooks);
            }

            ConnState::TimeServerInitializing => {
                if time.sntp_start(clock).is_ok() {
                    self.sntp_polls = 0;
                    self.sntp_last_poll_ms = now;
                    self.set_state(ConnState::TimeServerSyncing, clock, time, hooks);
                }
            }

            ConnState::TimeServerSyncing => {
                if now.saturating_sub(self.sntp_last_poll_ms) >= SNTP_POLL_MS {
                    self.sntp_last_poll_ms = now;
                    self.sntp_polls += 1;
                    if time.poll_synced(clock) {
                        let mut msg: heapless::String<96> = heapless::String::new();
                        let _ = write!(
                            msg,
                            "Time synchronized using NTP server: {}",
                            time.ntp_server()
                        );
                        events.log_event(time.stamp(clock).as_str(), &msg);
                        self.set_state(ConnState::TimeServerSynced, clock, time, hooks);
                    } else if self.sntp_polls >= SNTP_POLLS_PER_ATTEMPT {
                        self.set_state(ConnState::TimeServerInitializing, clock, time, hooks);
                    }
                }
            }

            ConnState::TimeServerSynced => {
                events.log_event(time.stamp(clock).as_str(), "WiFi initialized");
                self.scan_due_ms = now + self.config.roam_scan_period_ms;
                self.set_state(ConnState::Initialized, clock, time, hooks);
            }

            ConnState::Initialized => {
                match update.poll() {
                    UpdateEvent::Started => {
                        events.log_event(time.stamp(clock).as_str(), "Firmware update started");
                        system.flush_caches();
                        system.watchdog_suspend();
                        self.set_state(ConnState::Updating, clock, time, hooks);
                        return;
                    }
                    UpdateEvent::Finished | UpdateEvent::Failed | UpdateEvent::Idle => {}
                }

                if !self.soft_ap {
                    if wifi.status() != WifiStatus::Connected {
                        events.log_event(time.stamp(clock).as_str(), "WiFi connection lost");
                        self.scanning = false;
                        self.set_state(ConnState::ConnectionLost, clock, time, hooks);
                        return;
                    }
                    self.roaming_step(wifi, clock, time, events, hooks, now);
                }
            }

            ConnState::ConnectionLost => {
                // A driver-level re-association short-circuits the backoff
                if wifi.status() == WifiStatus::Connected {
                    self.on_associated(wifi, clock, update, time, events, hooks);
                } else if wifi
                    .begin_station(&self.config.ssid, &self.config.key)
                    .is_ok()
                {
                    self.set_state(ConnState::Reconnecting, clock, time, hooks);
                }
            }

            ConnState::Reconnecting | ConnState::SwitchingAp => {
                let timeout = if self.state == ConnState::SwitchingAp {
                    CONNECT_TIMEOUT_MS + self.config.roam_dwell_ms
                } else {
                    CONNECT_TIMEOUT_MS
                };
                match wifi.status() {
                    WifiStatus::Connected => {
                        self.on_associated(wifi, clock, update, time, events, hooks);
                    }
                    WifiStatus::ConnectFailed | WifiStatus::NoSsidAvailable => {
                        self.set_state(ConnState::ConnectFailed, clock, time, hooks);
                    }
                    _ => {
                        if self.state_elapsed_ms(now) >= timeout {
                            self.set_state(ConnState::ConnectFailed, clock, time, hooks);
                        }
                    }
                }
            }

            ConnState::Updating => match update.poll() {
                UpdateEvent::Finished => {
                    events.log_event(time.stamp(clock).as_str(), "Firmware update finished");
                    system.watchdog_resume();
                    self.set_state(ConnState::Initialized, clock, time, hooks);
                }
                UpdateEvent::Failed => {
                    events.log_event(time.stamp(clock).as_str(), "Firmware update failed");
                    system.watchdog_resume();
                    self.set_state(ConnState::Initialized, clock, time, hooks);
                }
                UpdateEvent::Idle | UpdateEvent::Started => {}
            },
        }
    }

    fn on_associated<W, C, U, H>(
        &mut self,
        wifi: &mut W,
        clock: &mut C,
        update: &mut U,
        time: &TimeService,
        events: &mut EventLog,
        hooks: &mut H,
    ) where
        W: WifiInterface,
        C: ClockInterface,
        U: UpdateInterface,
        H: ConnectivityHooks,
    {
        self.ip = wifi.local_ip();
        self.retry_interval_ms = RETRY_MIN_MS;
        let mut msg: heapless::String<96> = heapless::String::new();
        let _ = write!(msg, "WiFi connected. Access Point ");
        match wifi.current_bssid() {
            Some(bssid) => {
                let _ = msg.push_str(format_bssid(&bssid).as_str());
            }
            None => {
                let _ = msg.push_str("unknown");
            }
        }
        events.log_event(time.stamp(clock).as_str(), &msg);
        let _ = update.begin(&self.config.host_name);

        if time.is_synced() {
            // Reconnect path: the wall clock is already good
            self.scan_due_ms = clock.millis() + self.config.roam_scan_period_ms;
            self.set_state(ConnState::Initialized, clock, time, hooks);
        } else {
            self.set_state(ConnState::Connected, clock, time, hooks);
        }
    }

    fn roaming_step<W, C, H>(
        &mut self,
        wifi: &mut W,
        clock: &C,
        time: &TimeService,
        events: &mut EventLog,
        hooks: &mut H,
        now: u64,
    ) where
        W: WifiInterface,
        C: ClockInterface,
        H: ConnectivityHooks,
    {
        if !self.config.roaming {
            return;
        }

        if !self.scanning {
            if now >= self.scan_due_ms && wifi.start_scan(&self.config.ssid, wifi.channel()).is_ok()
            {
                self.scanning = true;
            }
            return;
        }

        let Some(results) = wifi.scan_complete() else {
            return;
        };
        self.scanning = false;

        let current_bssid = wifi.current_bssid();
        let current_rssi = wifi.current_rssi();
        match best_candidate(&results, current_bssid) {
            Some(best) if best.rssi as i16 >= current_rssi as i16 + self.config.roam_threshold_db as i16 => {
                let mut msg: heapless::String<96> = heapless::String::new();
                let _ = write!(
                    msg,
                    "Found better Access Point: {} ({} dBm)",
                    format_bssid(&best.bssid),
                    best.rssi
                );
                events.log_event(time.stamp(clock).as_str(), &msg);
                if wifi
                    .begin_station_pinned(&self.config.ssid, &self.config.key, best.bssid)
                    .is_ok()
                {
                    self.set_state(ConnState::SwitchingAp, clock, time, hooks);
                }
            }
            _ => {
                self.scan_due_ms = now + self.config.roam_scan_period_ms;
            }
        }
    }
}

/// Best scan result that is not the current AP.
///
/// Duplicate BSSIDs keep their strongest reading; ties on RSSI go to the
/// numerically lowest BSSID so the choice is deterministic.
fn best_candidate(results: &[ScanResult], current: Option<[u8; 6]>) -> Option<ScanResult> {
    let mut best: Option<ScanResult> = None;
    for r in results {
        if Some(r.bssid) == current {
            continue;
        }
        let better = match &best {
            None => true,
            Some(b) => r.rssi > b.rssi || (r.rssi == b.rssi && r.bssid < b.bssid),
        };
        if better {
            best = Some(*r);
        }
    }
    best
}
