//! Platform abstraction traits
//!
//! These traits are the only path from the operational platform to the host
//! runtime. Target crates implement them over their Wi-Fi driver, sockets,
//! flash/NVS, clocks and LED primitives.

pub mod clock;
pub mod gpio;
pub mod net;
pub mod nvs;
pub mod pixel;
pub mod system;
pub mod update;
pub mod wifi;

pub use clock::{ClockInterface, EPOCH_VALID_AFTER};
pub use gpio::GpioInterface;
pub use net::{Connection, TcpStack};
pub use nvs::NvsInterface;
pub use pixel::PixelInterface;
pub use system::{ResetReason, SystemInterface};
pub use update::{UpdateEvent, UpdateInterface};
pub use wifi::{ScanResult, WifiInterface, WifiStatus, MAX_SCAN_RESULTS};
