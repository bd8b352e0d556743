//! Platform error types
//!
//! All platform implementations map their HAL- or stack-specific errors to
//! these variants.

use core::fmt;

/// Result type for platform operations
pub type Result<T> = core::result::Result<T, PlatformError>;

/// Platform-level errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlatformError {
    /// Wi-Fi driver operation failed
    Wifi(WifiError),
    /// TCP/TLS socket operation failed
    Net(NetError),
    /// Non-volatile storage operation failed
    Nvs(NvsError),
    /// Clock or SNTP operation failed
    Clock(ClockError),
    /// OTA update channel failed
    Update(UpdateError),
    /// Invalid configuration provided
    InvalidConfig,
    /// Resource not available
    ResourceUnavailable,
}

/// Wi-Fi specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WifiError {
    /// Driver rejected the station/soft-AP configuration
    ConfigRejected,
    /// A scan is already running
    ScanBusy,
    /// The driver is not in a state that allows the operation
    WrongMode,
}

/// Socket-level errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetError {
    /// DNS lookup or TCP connect failed
    ConnectFailed,
    /// TLS handshake failed
    TlsHandshake,
    /// Write on a closed or broken socket
    WriteFailed,
    /// Read failed
    ReadFailed,
    /// Operation exceeded its deadline
    Timeout,
    /// Socket already closed
    Closed,
}

/// Non-volatile storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NvsError {
    /// Address or length outside the reserved block
    OutOfRange,
    /// Commit to the backing medium failed
    CommitFailed,
}

/// Clock/SNTP errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// SNTP could not be started
    SntpStartFailed,
}

/// OTA update errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateError {
    /// The update channel could not be started
    StartFailed,
    /// The transfer aborted mid-stream
    Aborted,
}

impl From<WifiError> for PlatformError {
    fn from(e: WifiError) -> Self {
        PlatformError::Wifi(e)
    }
}

impl From<NetError> for PlatformError {
    fn from(e: NetError) -> Self {
        PlatformError::Net(e)
    }
}

impl From<NvsError> for PlatformError {
    fn from(e: NvsError) -> Self {
        PlatformError::Nvs(e)
    }
}

impl From<ClockError> for PlatformError {
    fn from(e: ClockError) -> Self {
        PlatformError::Clock(e)
    }
}

impl From<UpdateError> for PlatformError {
    fn from(e: UpdateError) -> Self {
        PlatformError::Update(e)
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::Wifi(e) => write!(f, "WiFi error: {:?}", e),
            PlatformError::Net(e) => write!(f, "Socket error: {:?}", e),
            PlatformError::Nvs(e) => write!(f, "Storage error: {:?}", e),
            PlatformError::Clock(e) => write!(f, "Clock error: {:?}", e),
            PlatformError::Update(e) => write!(f, "Update error: {:?}", e),
            PlatformError::InvalidConfig => write!(f, "Invalid configuration"),
            PlatformError::ResourceUnavailable => write!(f, "Resource not available"),
        }
    }
}
