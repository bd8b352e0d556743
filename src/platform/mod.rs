//! Platform abstraction layer
//!
//! The operational platform consumes the host runtime (Wi-Fi driver, TCP/IP
//! stack, non-volatile storage, clocks, watchdog, OTA channel, LED
//! primitives) through the narrow interfaces defined in [`traits`]. Target
//! crates implement these once; everything above runs unchanged on hardware
//! and under [`mock`] on a host.

pub mod error;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{PlatformError, Result};
pub use traits::{
    ClockInterface, Connection, GpioInterface, NvsInterface, PixelInterface, SystemInterface,
    TcpStack, UpdateInterface, WifiInterface,
};
