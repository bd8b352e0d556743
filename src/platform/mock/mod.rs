//! Mock platform implementations for testing
//!
//! Available in unit tests and behind the `mock` feature. Each mock couples
//! the trait implementation with scripting handles: scripted association
//! status and scan results on the Wi-Fi side, canned/recorded byte dialogs
//! on sockets, corruptible storage, a manually advanced clock, and
//! recorders for restarts and watchdog calls.

#![cfg(any(test, feature = "mock"))]

pub mod clock;
pub mod gpio;
pub mod net;
pub mod nvs;
pub mod pixel;
pub mod system;
pub mod update;
pub mod wifi;

pub use clock::MockClock;
pub use gpio::MockGpio;
pub use net::{MockConnection, MockStack};
pub use nvs::MockNvs;
pub use pixel::MockPixel;
pub use system::MockSystem;
pub use update::MockUpdate;
pub use wifi::MockWifi;
