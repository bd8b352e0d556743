//! Networking services
//!
//! The connectivity state machine drives the appliance from cold boot to
//! "network-ready, time-synced, serving HTTP" and keeps it there; the FTP
//! exporter and the REST client ride on top, each advancing its own state
//! machine once per tick.

pub mod connectivity;
pub mod ftp;
pub mod rest;

pub use connectivity::{ConnState, ConnectivityConfig, ConnectivityHooks, ConnectivityMachine};
pub use ftp::{FtpClient, FtpState};
pub use rest::{RestClient, RestConfig, RestSlot};
