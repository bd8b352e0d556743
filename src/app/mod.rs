//! Application glue
//!
//! Assembles the platform into a runnable appliance: one context record
//! owns the settings, logs and action gate the page handlers see; the
//! `App` wrapper owns the peripherals, the connectivity machine, the FTP
//! exporter and the router, and wires them together in [`App::tick`].
//!
//! Appliances replace [`PowerSample`] and the page set with their own,
//! keeping the same assembly.

pub mod pages;

use crate::core::event_log::EventLog;
use crate::core::ring::MemRegion;
use crate::core::status_led::StatusLed;
use crate::core::telemetry::{TelemetryLog, TelemetrySample};
use crate::core::ticker::Ticker;
use crate::core::time_service::TimeService;
use crate::net::connectivity::{
    ConnState, ConnectivityConfig, ConnectivityHooks, ConnectivityMachine,
};
use crate::net::ftp::{FtpClient, FtpState, DEFAULT_TIMEOUT_MS};
use crate::platform::traits::{
    ClockInterface, GpioInterface, NvsInterface, PixelInterface, SystemInterface, TcpStack,
    UpdateInterface, WifiInterface,
};
use crate::platform::Result;
use crate::settings::record::LoadOutcome;
use crate::settings::WifiFtpSettings;
use crate::web::actions::ActionGate;
use crate::web::navigation::{Menu, MenuItem};
use crate::web::router::Router;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// HTTP port served by the appliances
pub const HTTP_PORT: u16 = 80;

/// Events kept in memory
pub const EVENT_LOG_SIZE: usize = 64;

/// Telemetry samples kept in memory (slab goes to external RAM)
pub const TELEMETRY_LOG_SIZE: usize = 300;

/// Demo telemetry record: power and temperature, run-compressed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSample {
    /// Epoch seconds of the sample
    pub time: u32,
    /// Instantaneous power in watts
    pub watts: i32,
    /// Temperature in tenths of a degree Celsius
    pub temp_dc: i16,
}

impl TelemetrySample for PowerSample {
    fn matches(&self, previous: &Self) -> bool {
        self.watts == previous.watts && self.temp_dc == previous.temp_dc
    }

    fn write_row(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(
            out,
            "{};{};{}.{}",
            self.time,
            self.watts,
            self.temp_dc / 10,
            (self.temp_dc % 10).abs()
        )
    }

    fn write_header(out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "time;watts;temperature")
    }
}

/// Coarse status snapshot rendered by the pages
#[derive(Default, Clone)]
pub struct StatusSnapshot {
    /// Connectivity state display name
    pub state: &'static str,
    /// Station IP address
    pub ip: [u8; 4],
    /// RSSI of the current association (dBm)
    pub rssi: i8,
    /// Uptime in seconds
    pub uptime_s: u32,
    /// Free heap in bytes
    pub free_heap: usize,
    /// Reset reason of this boot
    pub reset_reason: &'static str,
    /// Current local-time stamp
    pub stamp: String,
    /// Current epoch seconds (action tokens)
    pub epoch: u32,
}

/// Everything the page handlers may touch
pub struct AppCtx {
    /// Persistent settings (form target)
    pub settings: WifiFtpSettings,
    /// Event log
    pub events: EventLog,
    /// Telemetry log
    pub telemetry: TelemetryLog<PowerSample>,
    /// Action-token gate
    pub actions: ActionGate,
    /// Status snapshot, refreshed once per tick before serving
    pub status: StatusSnapshot,
    /// Menu bar entries (label, path)
    pub menu_bar: Vec<(String, String)>,
    /// Set by the config POST handler; the next tick stores and reboots
    pub settings_dirty: bool,
}

/// Hardware handles, one per platform trait
pub struct Peripherals<W, C, N, S, SY, U> {
    /// Wi-Fi driver
    pub wifi: W,
    /// Clock / SNTP
    pub clock: C,
    /// Settings storage
    pub nvs: N,
    /// TCP stack
    pub stack: S,
    /// System control
    pub system: SY,
    /// OTA channel
    pub update: U,
}

struct EnterRecorder {
    entered: Vec<ConnState>,
}

impl ConnectivityHooks for EnterRecorder {
    fn on_enter(&mut self, state: ConnState) {
        self.entered.push(state);
    }
}

/// The assembled appliance
pub struct App<W, C, N, S, SY, U, G, P>
where
    W: WifiInterface,
    C: ClockInterface,
    N: NvsInterface,
    S: TcpStack,
    SY: SystemInterface,
    U: UpdateInterface,
    G: GpioInterface,
    P: PixelInterface,
{
    /// Hardware handles
    pub peripherals: Peripherals<W, C, N, S, SY, U>,
    /// Handler-visible context
    pub ctx: AppCtx,
    /// Connectivity state machine
    pub machine: ConnectivityMachine,
    /// Wall-clock service
    pub time: TimeService,
    /// Status LED (borrowed by the machine's pattern each tick)
    pub led: StatusLed<G, P>,
    /// FTP exporter
    pub ftp: FtpClient<S>,
    router: Router<AppCtx>,
    ticker: Ticker<SY>,
    listening: bool,
    ftp_active: bool,
}

impl<W, C, N, S, SY, U, G, P> App<W, C, N, S, SY, U, G, P>
where
    W: WifiInterface,
    C: ClockInterface,
    N: NvsInterface,
    S: TcpStack,
    SY: SystemInterface,
    U: UpdateInterface,
    G: GpioInterface,
    P: PixelInterface,
{
    /// Assemble an appliance around its peripherals and status LED
    pub fn new(peripherals: Peripherals<W, C, N, S, SY, U>, led: StatusLed<G, P>) -> Self {
        let mut menu: Menu<AppCtx> = Menu::new();
        menu.add(MenuItem::new("/icons/home.svg", "Home", pages::home_page).at("/"));
        menu.add(MenuItem::new("/icons/events.svg", "Events", pages::events_page));
        menu.add(MenuItem::new(
            "/icons/telemetry.svg",
            "Telemetry",
            pages::telemetry_page,
        ));
        menu.add(
            MenuItem::new("/icons/config.svg", "Config", pages::config_page)
                .with_post(pages::config_post),
        );

        let mut router = Router::new(4096, MemRegion::External);
        menu.register_http_handlers(&mut router);
        router.set_not_found(pages::not_found_page);

        let menu_bar = menu
            .bar()
            .iter()
            .map(|(l, p)| (l.to_string(), p.to_string()))
            .collect();

        Self {
            peripherals,
            ctx: AppCtx {
                settings: WifiFtpSettings::new(),
                events: EventLog::new(EVENT_LOG_SIZE),
                telemetry: TelemetryLog::new(TELEMETRY_LOG_SIZE, MemRegion::External),
                actions: ActionGate::new(),
                status: StatusSnapshot::default(),
                menu_bar,
                settings_dirty: false,
            },
            machine: ConnectivityMachine::new(ConnectivityConfig::default()),
            time: TimeService::new("pool.ntp.org"),
            led,
            ftp: FtpClient::new(DEFAULT_TIMEOUT_MS),
            router,
            ticker: Ticker::new(),
            listening: false,
            ftp_active: false,
        }
    }

    /// Load settings, arm the watchdog, start the connectivity lifecycle.
    ///
    /// Call once from `main` before the tick loop.
    pub fn boot(&mut self) -> Result<()> {
        let p = &mut self.peripherals;

        let reset_reason = p.system.reset_reason();
        self.ctx.status.reset_reason = reset_reason.as_str();
        self.ctx.events.log_event("", reset_reason.as_str());

        let outcome = self.ctx.settings.begin(&mut p.nvs)?;
        if outcome == LoadOutcome::ResetToDefaults {
            self.ctx
                .events
                .log_event("", "Settings reset to defaults");
        }

        self.time = TimeService::new(self.ctx.settings.ntp_server());
        self.machine = ConnectivityMachine::new(ConnectivityConfig {
            ssid: self.ctx.settings.ssid().to_string(),
            key: self.ctx.settings.wifi_key().to_string(),
            host_name: self.ctx.settings.host_name().to_string(),
            ..ConnectivityConfig::default()
        });

        p.system.watchdog_begin(30_000);
        self.ticker
            .register("watchdog", 1_000, |system: &mut SY| system.watchdog_feed());

        self.led.begin();

        let mut hooks = EnterRecorder {
            entered: Vec::new(),
        };
        self.machine.begin(&mut p.clock, &self.time, &mut hooks);
        Ok(())
    }

    /// One main-loop iteration: machine step, HTTP, FTP, LED, ticker
    pub fn tick(&mut self) {
        let p = &mut self.peripherals;

        let mut hooks = EnterRecorder {
            entered: Vec::new(),
        };
        self.machine.tick(
            &mut p.wifi,
            &mut p.clock,
            &mut p.update,
            &mut p.system,
            &mut self.time,
            &mut self.ctx.events,
            &mut hooks,
        );

        for state in &hooks.entered {
            match state {
                // Station path serves HTTP once associated; the soft-AP
                // path serves the captive configuration form
                ConnState::Connected | ConnState::AwaitingConnection => self.start_http(),
                _ => {}
            }
        }

        self.refresh_status();

        if self.listening {
            let served = self
                .router
                .poll(&mut self.peripherals.stack, &mut self.ctx);
            if served {
                self.after_request();
            }
        }

        if self.machine.state() == ConnState::Initialized && !self.machine.is_soft_ap() {
            self.ftp_step();
        }

        let (color, blink_ms, breathe) = self.machine.led_pattern();
        self.led.set_color(color);
        self.led.set_blink_ms(blink_ms);
        self.led.set_breathe(breathe);
        self.led.set_on();
        self.led.tick(self.peripherals.clock.millis());

        let now = self.peripherals.clock.millis();
        let _ = self.ticker.service(now, &mut self.peripherals.system);
    }

    /// Record a telemetry sample; only stored when it differs from the
    /// newest entry
    pub fn add_sample(&mut self, watts: i32, temp_dc: i16) -> bool {
        let time = self.time.now(&self.peripherals.clock);
        self.ctx.telemetry.add(PowerSample {
            time,
            watts,
            temp_dc,
        })
    }

    fn start_http(&mut self) {
        if !self.listening && self.peripherals.stack.listen(HTTP_PORT).is_ok() {
            self.listening = true;
        }
        self.router.set_captive(if self.machine.is_soft_ap() {
            Some(pages::config_page)
        } else {
            None
        });
    }

    fn refresh_status(&mut self) {
        let p = &mut self.peripherals;
        self.ctx.status.state = self.machine.state().name();
        self.ctx.status.ip = self.machine.ip();
        self.ctx.status.rssi = p.wifi.current_rssi();
        self.ctx.status.uptime_s = self.time.uptime_seconds(&p.clock);
        self.ctx.status.free_heap = p.system.free_heap();
        self.ctx.status.stamp = self.time.stamp(&p.clock).as_str().to_string();
        self.ctx.status.epoch = self.time.now(&p.clock);
    }

    /// Handle side effects the page handlers requested
    fn after_request(&mut self) {
        if self.ctx.settings_dirty {
            self.ctx.settings_dirty = false;
            let stamp = self.time.stamp(&self.peripherals.clock);
            match self.ctx.settings.store(&mut self.peripherals.nvs) {
                Ok(()) => {
                    self.ctx
                        .events
                        .log_event(stamp.as_str(), "Settings saved, restarting");
                    self.machine.request_reset(&self.peripherals.clock);
                }
                Err(_) => {
                    self.ctx
                        .events
                        .log_event(stamp.as_str(), "Settings write failed");
                }
            }
        }
    }

    /// Start a sync when enough fresh telemetry piled up; pump a running
    /// transfer one step per tick
    fn ftp_step(&mut self) {
        if self.ftp_active {
            if self
                .ftp
                .run_async(&mut self.peripherals.stack, &self.peripherals.clock)
            {
                let stamp = self.time.stamp(&self.peripherals.clock);
                match self.ftp.state() {
                    FtpState::Done => {
                        self.ctx.events.log_event(stamp.as_str(), "FTP sync completed");
                    }
                    FtpState::Error => {
                        let error = self
                            .ftp
                            .last_error()
                            .unwrap_or("unknown")
                            .to_string();
                        self.ctx
                            .events
                            .log_event(stamp.as_str(), &format!("FTP sync failed: {}", error));
                    }
                    _ => {}
                }
                self.ftp.end_async();
                self.ftp_active = false;
            }
            return;
        }

        let settings = &self.ctx.settings;
        if settings.ftp_server().is_empty() {
            return;
        }
        if self.ctx.telemetry.fresh() < settings.ftp_sync_count() {
            return;
        }

        let mut csv = String::new();
        if self.ctx.telemetry.write_fresh_csv(&mut csv).is_err() {
            return;
        }
        // The rows are staged now; samples arriving mid-transfer stay fresh
        self.ctx.telemetry.mark_synced();
        let filename = format!("{}.csv", settings.host_name());
        self.ftp.begin_async(
            settings.ftp_server(),
            settings.ftp_user(),
            settings.ftp_password(),
            21,
            None,
        );
        self.ftp
            .append_async(&filename, move |conn| conn.write_all(csv.as_bytes()));
        self.ftp_active = true;
    }

    /// Serve one already-accepted connection (tests)
    pub fn serve_conn(&mut self, conn: &mut S::Conn) {
        self.router.serve(conn, &mut self.ctx);
        self.after_request();
    }
}
