//! Common settings records
//!
//! Two base records shared by the appliances: "Wi-Fi basic" (SSID, key,
//! host name, NTP server) and "Wi-Fi with FTP" (adds FTP host, user,
//! password and sync count). Appliance-specific records extend these by
//! appending fields to the schema, which keeps the storage layout the
//! declaration order; any layout change needs a new magic marker.
//!
//! Build-time environment variables (`WIFI_SSID`, `WIFI_KEY`, `HOST_NAME`,
//! `NTP_SERVER`) seed the factory defaults.

use super::record::{LoadOutcome, Settings};
use super::schema::{FieldKind, FieldSpec};
use crate::platform::traits::NvsInterface;
use crate::platform::Result;

/// Magic marker of the Wi-Fi basic record
pub const WIFI_MAGIC: [u8; 4] = *b"EWB1";

/// Magic marker of the Wi-Fi + FTP record
pub const WIFI_FTP_MAGIC: [u8; 4] = *b"EWF1";

const SSID: FieldSpec = FieldSpec {
    id: "ssid",
    label: "WiFi SSID",
    kind: FieldKind::Text { width: 33 },
    default: env!("WIFI_SSID"),
};
const KEY: FieldSpec = FieldSpec {
    id: "key",
    label: "WiFi key",
    kind: FieldKind::Password { width: 64 },
    default: env!("WIFI_KEY"),
};
const HOSTNAME: FieldSpec = FieldSpec {
    id: "hostname",
    label: "Host name",
    kind: FieldKind::Text { width: 33 },
    default: env!("HOST_NAME"),
};
const NTP_SERVER: FieldSpec = FieldSpec {
    id: "ntpserver",
    label: "NTP server",
    kind: FieldKind::Text { width: 49 },
    default: env!("NTP_SERVER"),
};

/// Fields of the Wi-Fi basic record
pub static WIFI_FIELDS: &[FieldSpec] = &[SSID, KEY, HOSTNAME, NTP_SERVER];

/// Fields of the Wi-Fi + FTP record (base fields first)
pub static WIFI_FTP_FIELDS: &[FieldSpec] = &[
    SSID,
    KEY,
    HOSTNAME,
    NTP_SERVER,
    FieldSpec {
        id: "ftpserver",
        label: "FTP server",
        kind: FieldKind::Text { width: 49 },
        default: "",
    },
    FieldSpec {
        id: "ftpuser",
        label: "FTP user",
        kind: FieldKind::Text { width: 33 },
        default: "",
    },
    FieldSpec {
        id: "ftppassword",
        label: "FTP password",
        kind: FieldKind::Password { width: 33 },
        default: "",
    },
    FieldSpec {
        id: "ftpsynccount",
        label: "FTP sync count",
        kind: FieldKind::Int { min: 1, max: 1000 },
        default: "50",
    },
];

/// Wi-Fi basic settings record
pub struct WifiSettings {
    inner: Settings,
}

impl WifiSettings {
    /// Record at factory defaults
    pub fn new() -> Self {
        Self {
            inner: Settings::new(WIFI_MAGIC, WIFI_FIELDS),
        }
    }

    /// Load from storage (see [`Settings::begin`])
    pub fn begin(&mut self, nvs: &mut impl NvsInterface) -> Result<LoadOutcome> {
        let outcome = self.inner.begin(nvs)?;
        self.validate();
        Ok(outcome)
    }

    /// Persist (see [`Settings::store`])
    pub fn store(&mut self, nvs: &mut impl NvsInterface) -> Result<()> {
        self.inner.store(nvs)
    }

    /// Range validation plus the cross-field rule: the host name must not
    /// be empty, since it doubles as the soft-AP SSID
    pub fn validate(&mut self) {
        self.inner.validate();
        if self.inner.get_str("hostname").is_empty() {
            self.inner
                .set("hostname", super::schema::FieldValue::Text("embernet".into()));
        }
    }

    /// Configured SSID ("" = unconfigured, boot into soft-AP)
    pub fn ssid(&self) -> &str {
        self.inner.get_str("ssid")
    }

    /// Pre-shared key
    pub fn wifi_key(&self) -> &str {
        self.inner.get_str("key")
    }

    /// Host name (also the soft-AP SSID)
    pub fn host_name(&self) -> &str {
        self.inner.get_str("hostname")
    }

    /// SNTP server
    pub fn ntp_server(&self) -> &str {
        self.inner.get_str("ntpserver")
    }

    /// The underlying record, for form I/O
    pub fn record(&self) -> &Settings {
        &self.inner
    }

    /// Mutable record, for form I/O
    pub fn record_mut(&mut self) -> &mut Settings {
        &mut self.inner
    }
}

impl Default for WifiSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Wi-Fi + FTP settings record
pub struct WifiFtpSettings {
    inner: Settings,
}

impl WifiFtpSettings {
    /// Record at factory defaults
    pub fn new() -> Self {
        Self {
            inner: Settings::new(WIFI_FTP_MAGIC, WIFI_FTP_FIELDS),
        }
    }

    /// Load from storage (see [`Settings::begin`])
    pub fn begin(&mut self, nvs: &mut impl NvsInterface) -> Result<LoadOutcome> {
        let outcome = self.inner.begin(nvs)?;
        self.validate();
        Ok(outcome)
    }

    /// Persist (see [`Settings::store`])
    pub fn store(&mut self, nvs: &mut impl NvsInterface) -> Result<()> {
        self.inner.store(nvs)
    }

    /// Same cross-field rule as [`WifiSettings::validate`]
    pub fn validate(&mut self) {
        self.inner.validate();
        if self.inner.get_str("hostname").is_empty() {
            self.inner
                .set("hostname", super::schema::FieldValue::Text("embernet".into()));
        }
    }

    /// Configured SSID ("" = unconfigured, boot into soft-AP)
    pub fn ssid(&self) -> &str {
        self.inner.get_str("ssid")
    }

    /// Pre-shared key
    pub fn wifi_key(&self) -> &str {
        self.inner.get_str("key")
    }

    /// Host name (also the soft-AP SSID)
    pub fn host_name(&self) -> &str {
        self.inner.get_str("hostname")
    }

    /// SNTP server
    pub fn ntp_server(&self) -> &str {
        self.inner.get_str("ntpserver")
    }

    /// FTP server host ("" = FTP export disabled)
    pub fn ftp_server(&self) -> &str {
        self.inner.get_str("ftpserver")
    }

    /// FTP user
    pub fn ftp_user(&self) -> &str {
        self.inner.get_str("ftpuser")
    }

    /// FTP password
    pub fn ftp_password(&self) -> &str {
        self.inner.get_str("ftppassword")
    }

    /// Telemetry entries per FTP sync
    pub fn ftp_sync_count(&self) -> usize {
        self.inner.get_int("ftpsynccount").max(1) as usize
    }

    /// The underlying record, for form I/O
    pub fn record(&self) -> &Settings {
        &self.inner
    }

    /// Mutable record, for form I/O
    pub fn record_mut(&mut self) -> &mut Settings {
        &mut self.inner
    }
}

impl Default for WifiFtpSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockNvs;
    use crate::settings::schema::FieldValue;

    #[test]
    fn ftp_record_extends_the_wifi_record() {
        let base: alloc::vec::Vec<&str> = WIFI_FIELDS.iter().map(|f| f.id).collect();
        let extended: alloc::vec::Vec<&str> =
            WIFI_FTP_FIELDS.iter().take(base.len()).map(|f| f.id).collect();
        assert_eq!(base, extended);
    }

    #[test]
    fn empty_hostname_falls_back() {
        let mut settings = WifiFtpSettings::new();
        settings.record_mut().set("hostname", FieldValue::Text("".into()));
        settings.validate();
        assert_eq!(settings.host_name(), "embernet");
    }

    #[test]
    fn round_trip_through_storage() {
        let mut nvs = MockNvs::new();
        let mut settings = WifiFtpSettings::new();
        settings.begin(&mut nvs).unwrap();

        settings.record_mut().set("ssid", FieldValue::Text("home".into()));
        settings.record_mut().set("ftpserver", FieldValue::Text("ftp.local".into()));
        settings.store(&mut nvs).unwrap();

        nvs.reopen();
        let mut reloaded = WifiFtpSettings::new();
        reloaded.begin(&mut nvs).unwrap();
        assert_eq!(reloaded.ssid(), "home");
        assert_eq!(reloaded.ftp_server(), "ftp.local");
        assert_eq!(reloaded.ftp_sync_count(), 50);
    }
}
