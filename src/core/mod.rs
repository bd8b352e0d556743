//! Core runtime services
//!
//! Bounded ring logs, the event and telemetry logs built on them, the time
//! service, the status LED, the fixed-interval ticker and the logging and
//! shared-state plumbing used across the platform.

pub mod event_log;
pub mod logging;
pub mod ring;
pub mod status_led;
pub mod sync;
pub mod telemetry;
pub mod ticker;
pub mod time_service;

pub use event_log::EventLog;
pub use ring::{BoxLog, MemRegion, TextLog, ValueLog};
pub use status_led::{StatusLed, BREATHE_STEPS};
pub use sync::{SharedState, SingleCoreState};
pub use telemetry::{TelemetryLog, TelemetrySample};
pub use ticker::Ticker;
pub use time_service::{TimeService, TZ_CET};
