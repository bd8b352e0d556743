#![cfg_attr(not(test), no_std)]

//! embernet - shared operational platform for networked embedded appliances
//!
//! Every appliance built on this crate (heat-pump monitor, EV charger
//! controller, inverter aggregator, ...) shares the same runtime platform:
//! a connectivity state machine, a time service, bounded in-memory event and
//! telemetry logs, a chunked HTML presentation layer, an asynchronous FTP
//! exporter and a non-blocking REST client.
//!
//! Hardware is reached exclusively through the traits in [`platform`], so the
//! whole platform runs unmodified under the mock implementations on a host.

extern crate alloc;

// Platform abstraction layer; all target-specific code stays behind these traits
pub mod platform;

// Ring logs, event/telemetry logs, time service, status LED, ticker, logging
pub mod core;

// Schema-driven persistent settings with HTML form I/O
pub mod settings;

// Connectivity state machine, FTP exporter, REST client
pub mod net;

// StringBuilder, chunked responses, HtmlWriter, menu/router
pub mod web;

// Application glue: context record, main tick, page handlers
pub mod app;
