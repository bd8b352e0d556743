//! End-to-end scenarios against the mock platform
//!
//! Each test boots the assembled appliance and drives it tick by tick
//! through scripted Wi-Fi, clock, storage and socket behavior.

#![cfg(feature = "mock")]

use embernet::app::{App, Peripherals};
use embernet::core::status_led::StatusLed;
use embernet::net::connectivity::ConnState;
use embernet::platform::mock::{
    MockClock, MockConnection, MockNvs, MockPixel, MockStack, MockSystem, MockUpdate, MockWifi,
};
use embernet::platform::traits::{ScanResult, WifiStatus};
use embernet::settings::schema::FieldValue;
use embernet::settings::WifiFtpSettings;

type TestApp = App<
    MockWifi,
    MockClock,
    MockNvs,
    MockStack,
    MockSystem,
    MockUpdate,
    embernet::core::status_led::NoGpio,
    MockPixel,
>;

fn fresh_app(nvs: MockNvs) -> TestApp {
    let peripherals = Peripherals {
        wifi: MockWifi::new(),
        clock: MockClock::new(),
        nvs,
        stack: MockStack::new(),
        system: MockSystem::new(),
        update: MockUpdate::new(),
    };
    let mut app = App::new(peripherals, StatusLed::rgb(MockPixel::new()));
    app.boot().expect("boot failed");
    app
}

/// Storage pre-seeded with a full online configuration
fn seeded_nvs() -> MockNvs {
    let mut nvs = MockNvs::new();
    let mut settings = WifiFtpSettings::new();
    settings.record_mut().set("ssid", FieldValue::Text("home".into()));
    settings.record_mut().set("key", FieldValue::Text("****".into()));
    settings
        .record_mut()
        .set("hostname", FieldValue::Text("heatmon".into()));
    settings
        .record_mut()
        .set("ntpserver", FieldValue::Text("pool.ntp.org".into()));
    settings
        .record_mut()
        .set("ftpserver", FieldValue::Text("ftp.local".into()));
    settings.store(&mut nvs).unwrap();
    nvs
}

fn tick_ms(app: &mut TestApp, ms: u64) {
    let steps = (ms / 50).max(1);
    for _ in 0..steps {
        app.peripherals.clock.advance(50);
        app.tick();
    }
}

fn http_get(app: &mut TestApp, target: &str) -> String {
    let conn = MockConnection::new();
    conn.push_read(format!("GET {} HTTP/1.1\r\n\r\n", target).as_bytes());
    app.peripherals.stack.push_client(conn.clone());
    tick_ms(app, 50);
    conn.written_string()
}

/// Bring a seeded appliance all the way to `Initialized`
fn bring_online(app: &mut TestApp) {
    app.peripherals.clock.script_sntp_epoch(1_700_000_000);
    tick_ms(app, 50); // Initializing -> Connecting
    app.peripherals
        .wifi
        .associate([192, 168, 1, 20], [0xaa, 0xbb, 0xcc, 0, 0, 1], -65, 6);
    for _ in 0..200 {
        tick_ms(app, 50);
        if app.machine.state() == ConnState::Initialized {
            return;
        }
    }
    panic!("never reached Initialized, state: {:?}", app.machine.state());
}

#[test]
fn soft_ap_bootstrap_with_corrupted_settings() {
    // A blank (or corrupted) settings block boots into provisioning mode
    let mut app = fresh_app(MockNvs::new());
    assert!(app.ctx.events.contains("Settings reset to defaults"));

    tick_ms(&mut app, 50);
    assert_eq!(app.machine.state(), ConnState::AwaitingConnection);
    assert!(app.machine.is_soft_ap());
    // Open AP named after the (default) host name
    assert_eq!(
        app.peripherals.wifi.mode,
        embernet::platform::mock::wifi::MockWifiMode::SoftAp {
            ssid: app.ctx.settings.host_name().into()
        }
    );
    assert_eq!(app.peripherals.stack.listening_on(), Some(80));

    // The configuration form is served regardless of the requested path,
    // with the Wi-Fi and FTP fields empty
    let page = http_get(&mut app, "/some/random/path");
    assert!(page.starts_with("HTTP/1.1 200 OK"));
    assert!(page.contains("name=\"ssid\" value=\"\""));
    assert!(page.contains("name=\"ftpserver\" value=\"\""));
    assert!(page.contains("type=\"password\""));

    // A client association fast-forwards past SNTP
    app.peripherals.wifi.set_soft_ap_stations(1);
    tick_ms(&mut app, 100);
    assert_eq!(app.machine.state(), ConnState::Initialized);
    assert!(app.time.is_synced());
    assert!(app.peripherals.clock.sntp_server().is_none());
}

#[test]
fn normal_online_boot_produces_the_event_trail() {
    let mut app = fresh_app(seeded_nvs());
    bring_online(&mut app);

    let events: Vec<&str> = app.ctx.events.iter().collect();
    assert!(events[0].contains("Power-on"));
    assert!(events[1].contains("WiFi connected. Access Point aa:bb:cc:00:00:01"));
    assert!(events[2].contains("Time synchronized using NTP server: pool.ntp.org"));
    assert!(events[3].contains("WiFi initialized"));

    assert_eq!(app.machine.state(), ConnState::Initialized);
    assert_eq!(app.machine.ip(), [192, 168, 1, 20]);
    assert_eq!(app.peripherals.wifi.hostname(), "heatmon");
    assert_eq!(
        app.peripherals.update.started_as.as_deref(),
        Some("heatmon")
    );
    assert_eq!(app.peripherals.stack.listening_on(), Some(80));
    // The watchdog is being fed from the ticker
    assert!(app.peripherals.system.feeds > 0);
}

#[test]
fn action_link_clear_is_idempotent() {
    let mut app = fresh_app(seeded_nvs());
    bring_online(&mut app);
    let baseline = app.ctx.events.count();
    assert!(baseline > 1);

    // First clear: the log collapses to the single "cleared" entry
    let page = http_get(&mut app, "/events?clear=1700000001");
    assert!(page.starts_with("HTTP/1.1 200 OK"));
    assert_eq!(app.ctx.events.count(), 1);
    assert!(app.ctx.events.contains("Event log cleared."));

    // Same token again (page refresh): nothing changes
    app.ctx.events.log_event("", "marker");
    let _ = http_get(&mut app, "/events?clear=1700000001");
    assert_eq!(app.ctx.events.count(), 2);
    assert!(app.ctx.events.contains("marker"));

    // A fresh token clears again
    let _ = http_get(&mut app, "/events?clear=1700000099");
    assert_eq!(app.ctx.events.count(), 1);
    assert!(app.ctx.events.contains("Event log cleared."));
}

#[test]
fn ftp_sync_round_trip_exports_exactly_the_sync_count() {
    let mut app = fresh_app(seeded_nvs());
    assert_eq!(app.ctx.settings.ftp_sync_count(), 50);
    bring_online(&mut app);

    // Script the FTP server before the sync triggers
    let ctrl = app.peripherals.stack.expect_connect();
    ctrl.push_read(b"220 ftp.local ready\r\n");
    ctrl.auto_reply("USER", b"331 Password required\r\n");
    ctrl.auto_reply("PASS", b"230 Logged in\r\n");
    ctrl.auto_reply("PASV", b"227 Entering Passive Mode (10,0,0,9,7,211)\r\n");
    ctrl.auto_reply("APPE", b"150 Opening data connection\r\n226 Transfer complete\r\n");
    ctrl.auto_reply("QUIT", b"221 Goodbye\r\n");
    let data = app.peripherals.stack.expect_connect();

    // 75 distinct samples, one tick after each; the 50th triggers the sync
    for i in 0..75 {
        assert!(app.add_sample(100 + i, 215));
        tick_ms(&mut app, 50);
    }
    tick_ms(&mut app, 1_000);

    assert!(app.ctx.events.contains("FTP sync"));
    let upload = data.written_string();
    let lines: Vec<&str> = upload.trim_end().lines().collect();
    assert_eq!(lines[0], "time;watts;temperature");
    assert_eq!(lines.len() - 1, 50, "expected exactly 50 CSV rows");
    assert!(data.is_closed());
    assert!(ctrl.written_string().contains("APPE heatmon.csv\r\n"));

    // The remaining 25 samples stay fresh for the next sync
    assert_eq!(app.ctx.telemetry.fresh(), 25);
}

#[test]
fn reconnect_backoff_waits_5_10_20_seconds() {
    let mut app = fresh_app(seeded_nvs());
    bring_online(&mut app);

    app.peripherals.wifi.drop_association();
    tick_ms(&mut app, 50);
    assert_eq!(app.machine.state(), ConnState::ConnectionLost);

    let mut waits = Vec::new();
    for _ in 0..3 {
        // Drive to the next association failure
        for _ in 0..1000 {
            if app.machine.state() == ConnState::ConnectFailed {
                break;
            }
            if matches!(
                app.machine.state(),
                ConnState::Connecting | ConnState::Reconnecting
            ) {
                app.peripherals.wifi.set_status(WifiStatus::ConnectFailed);
            }
            tick_ms(&mut app, 50);
        }
        assert_eq!(app.machine.state(), ConnState::ConnectFailed);

        let mut waited = 0u64;
        while app.machine.state() == ConnState::ConnectFailed {
            tick_ms(&mut app, 50);
            waited += 50;
        }
        waits.push(waited);
    }
    assert_eq!(waits, [5_000, 10_000, 20_000]);
}

#[test]
fn roaming_hands_over_to_the_stronger_ap() {
    use embernet::core::event_log::EventLog;
    use embernet::core::time_service::TimeService;
    use embernet::net::connectivity::{ConnectivityConfig, ConnectivityMachine};

    struct NoHooks;
    impl embernet::net::connectivity::ConnectivityHooks for NoHooks {}

    let mut wifi = MockWifi::new();
    let mut clock = MockClock::new();
    let mut update = MockUpdate::new();
    let mut system = MockSystem::new();
    let mut time = TimeService::new("pool.ntp.org");
    let mut events = EventLog::new(32);
    let mut hooks = NoHooks;

    let mut machine = ConnectivityMachine::new(ConnectivityConfig {
        ssid: "home".into(),
        key: "****".into(),
        host_name: "heatmon".into(),
        roaming: true,
        roam_threshold_db: 6,
        roam_scan_period_ms: 60_000,
        ..ConnectivityConfig::default()
    });
    clock.script_sntp_epoch(1_700_000_000);
    machine.begin(&mut clock, &time, &mut hooks);

    #[allow(clippy::too_many_arguments)]
    fn step(
        machine: &mut ConnectivityMachine,
        wifi: &mut MockWifi,
        clock: &mut MockClock,
        update: &mut MockUpdate,
        system: &mut MockSystem,
        time: &mut TimeService,
        events: &mut EventLog,
        ms: u64,
    ) {
        struct NoHooks;
        impl embernet::net::connectivity::ConnectivityHooks for NoHooks {}
        for _ in 0..(ms / 50).max(1) {
            clock.advance(50);
            machine.tick(wifi, clock, update, system, time, events, &mut NoHooks);
        }
    }

    step(&mut machine, &mut wifi, &mut clock, &mut update, &mut system, &mut time, &mut events, 50);
    wifi.associate([192, 168, 1, 20], [0x10, 0, 0, 0, 0, 1], -65, 6);
    step(&mut machine, &mut wifi, &mut clock, &mut update, &mut system, &mut time, &mut events, 1_000);
    assert_eq!(machine.state(), ConnState::Initialized);

    // Scan period elapses; results carry the current AP at -65 and a
    // sibling at -55 on the same SSID
    step(&mut machine, &mut wifi, &mut clock, &mut update, &mut system, &mut time, &mut events, 60_000);
    assert_eq!(wifi.scan_request(), Some(("home".into(), 6)));
    wifi.script_scan_results(&[
        ScanResult { bssid: [0x10, 0, 0, 0, 0, 1], rssi: -65, channel: 6 },
        ScanResult { bssid: [0x10, 0, 0, 0, 0, 2], rssi: -55, channel: 6 },
    ]);
    step(&mut machine, &mut wifi, &mut clock, &mut update, &mut system, &mut time, &mut events, 50);

    assert_eq!(machine.state(), ConnState::SwitchingAp);
    assert!(events.contains("Found better Access Point: 10:00:00:00:00:02"));
    assert_eq!(
        wifi.mode,
        embernet::platform::mock::wifi::MockWifiMode::Station {
            ssid: "home".into(),
            key: "****".into(),
            bssid: Some([0x10, 0, 0, 0, 0, 2]),
        }
    );
}

#[test]
fn config_post_stores_and_schedules_a_restart() {
    let mut app = fresh_app(MockNvs::new());
    tick_ms(&mut app, 50); // soft-AP + captive form

    let body = "ssid=home&key=s3cret&hostname=heatmon&ntpserver=pool.ntp.org\
                &ftpserver=ftp.local&ftpuser=logger&ftppassword=pw&ftpsynccount=50";
    let conn = MockConnection::new();
    conn.push_read(
        format!(
            "POST /config HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        )
        .as_bytes(),
    );
    app.peripherals.stack.push_client(conn.clone());
    tick_ms(&mut app, 50);

    assert!(conn.written_string().contains("restarts now"));
    assert!(app.ctx.events.contains("Settings saved"));
    assert_eq!(app.ctx.settings.ssid(), "home");
    assert!(app.peripherals.nvs.commit_count() >= 2);

    // The restart lands ~1 s after the response
    assert_eq!(app.peripherals.system.restarts, 0);
    tick_ms(&mut app, 1_100);
    assert_eq!(app.peripherals.system.restarts, 1);
}
