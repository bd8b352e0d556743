//! Persistent settings
//!
//! Schema-driven typed configuration persisted to one reserved block of
//! non-volatile storage. Each field declaration carries a stable
//! identifier, display label, type with range, default and fixed-width
//! storage slot; records serialize fields in declaration order behind a
//! magic/version/CRC header. Corrupt or version-mismatched blocks are
//! replaced by defaults on load. The same schema drives the HTML
//! configuration form in both directions.

pub mod form;
pub mod record;
pub mod schema;
pub mod wifi;

pub use record::{LoadOutcome, Settings, SCHEMA_VERSION};
pub use schema::{FieldKind, FieldSpec, FieldValue};
pub use wifi::{WifiFtpSettings, WifiSettings};
