//! Settings record: load, validate, store
//!
//! Block layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Magic: [u8; 4]                               │  Offset: 0
//! ├──────────────────────────────────────────────┤
//! │ Schema version: u8                           │  Offset: 4
//! ├──────────────────────────────────────────────┤
//! │ Payload length: u16 LE                       │  Offset: 5
//! ├──────────────────────────────────────────────┤
//! │ CRC-16 over payload: u16 LE                  │  Offset: 7
//! ├──────────────────────────────────────────────┤
//! │ Payload: fields in declaration order         │  Offset: 9
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Any header mismatch (magic, version, length, checksum) is not an error:
//! the record is reseeded with defaults and written back.

use super::schema::{truncate_to, FieldKind, FieldSpec, FieldValue};
use crate::platform::error::NvsError;
use crate::platform::traits::NvsInterface;
use crate::platform::Result;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use crc::{Crc, CRC_16_IBM_SDLC};

/// Bump on any field addition, removal or reorder
pub const SCHEMA_VERSION: u8 = 1;

const HEADER_LEN: usize = 9;
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// What `begin` found in storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A valid block was deserialized
    Loaded,
    /// The block was missing, corrupt or version-mismatched; defaults were
    /// seeded and written back
    ResetToDefaults,
}

/// A schema-driven settings record
pub struct Settings {
    magic: [u8; 4],
    schema: &'static [FieldSpec],
    values: Vec<FieldValue>,
}

impl Settings {
    /// Record with all fields at their declared defaults
    pub fn new(magic: [u8; 4], schema: &'static [FieldSpec]) -> Self {
        Self {
            magic,
            schema,
            values: schema.iter().map(FieldValue::default_for).collect(),
        }
    }

    /// Field declarations, in storage order
    pub fn schema(&self) -> &'static [FieldSpec] {
        self.schema
    }

    /// Serialized payload length in bytes
    pub fn payload_len(&self) -> usize {
        self.schema.iter().map(|f| f.kind.storage_width()).sum()
    }

    /// Load the record from storage, seeding defaults on any mismatch.
    ///
    /// Called once at boot.
    pub fn begin(&mut self, nvs: &mut impl NvsInterface) -> Result<LoadOutcome> {
        let payload_len = self.payload_len();
        let mut block = vec![0u8; HEADER_LEN + payload_len];
        nvs.read(0, &mut block)?;

        let header_ok = block[0..4] == self.magic
            && block[4] == SCHEMA_VERSION
            && u16::from_le_bytes([block[5], block[6]]) as usize == payload_len;
        let crc_ok = header_ok && {
            let stored = u16::from_le_bytes([block[7], block[8]]);
            stored == CRC16.checksum(&block[HEADER_LEN..])
        };

        if !crc_ok {
            self.values = self.schema.iter().map(FieldValue::default_for).collect();
            self.store(nvs)?;
            return Ok(LoadOutcome::ResetToDefaults);
        }

        let mut offset = HEADER_LEN;
        for (spec, value) in self.schema.iter().zip(self.values.iter_mut()) {
            *value = deserialize_field(spec, &block[offset..offset + spec.kind.storage_width()]);
            offset += spec.kind.storage_width();
        }
        Ok(LoadOutcome::Loaded)
    }

    /// Serialize and commit the record.
    ///
    /// # Errors
    ///
    /// `NvsError::OutOfRange` when the block exceeds the reserved storage.
    pub fn store(&mut self, nvs: &mut impl NvsInterface) -> Result<()> {
        let payload_len = self.payload_len();
        if HEADER_LEN + payload_len > nvs.capacity() as usize {
            return Err(NvsError::OutOfRange.into());
        }

        let mut block = vec![0u8; HEADER_LEN + payload_len];
        block[0..4].copy_from_slice(&self.magic);
        block[4] = SCHEMA_VERSION;
        block[5..7].copy_from_slice(&(payload_len as u16).to_le_bytes());

        let mut offset = HEADER_LEN;
        for (spec, value) in self.schema.iter().zip(self.values.iter()) {
            serialize_field(spec, value, &mut block[offset..offset + spec.kind.storage_width()]);
            offset += spec.kind.storage_width();
        }

        let crc = CRC16.checksum(&block[HEADER_LEN..]);
        block[7..9].copy_from_slice(&crc.to_le_bytes());

        nvs.write(0, &block)?;
        nvs.commit()
    }

    /// Clamp numeric fields into range, truncate strings to their width
    pub fn validate(&mut self) {
        for (spec, value) in self.schema.iter().zip(self.values.iter_mut()) {
            match (spec.kind, value) {
                (FieldKind::Int { min, max }, FieldValue::Int(v)) => *v = (*v).clamp(min, max),
                (FieldKind::Float { min, max, .. }, FieldValue::Float(v)) => {
                    *v = (*v).clamp(min, max)
                }
                (FieldKind::TimeSpan { min, max }, FieldValue::TimeSpan(v)) => {
                    *v = (*v).clamp(min, max)
                }
                (FieldKind::Text { width }, FieldValue::Text(s))
                | (FieldKind::Password { width }, FieldValue::Text(s)) => {
                    truncate_to(s, width.saturating_sub(1))
                }
                _ => {}
            }
        }
    }

    fn index(&self, id: &str) -> Option<usize> {
        self.schema.iter().position(|f| f.id == id)
    }

    /// Current value of a field
    pub fn value(&self, id: &str) -> Option<&FieldValue> {
        self.values.get(self.index(id)?)
    }

    /// String field accessor ("" when absent or not a string)
    pub fn get_str(&self, id: &str) -> &str {
        match self.value(id) {
            Some(FieldValue::Text(s)) => s,
            _ => "",
        }
    }

    /// Integer field accessor
    pub fn get_int(&self, id: &str) -> i32 {
        match self.value(id) {
            Some(FieldValue::Int(v)) => *v,
            _ => 0,
        }
    }

    /// Boolean field accessor
    pub fn get_bool(&self, id: &str) -> bool {
        matches!(self.value(id), Some(FieldValue::Bool(true)))
    }

    /// Float field accessor
    pub fn get_float(&self, id: &str) -> f32 {
        match self.value(id) {
            Some(FieldValue::Float(v)) => *v,
            _ => 0.0,
        }
    }

    /// Time-span field accessor (seconds)
    pub fn get_span(&self, id: &str) -> u32 {
        match self.value(id) {
            Some(FieldValue::TimeSpan(v)) => *v,
            _ => 0,
        }
    }

    /// Replace a field value; ignored for unknown identifiers
    pub fn set(&mut self, id: &str, value: FieldValue) {
        if let Some(index) = self.index(id) {
            self.values[index] = value;
        }
    }
}

fn serialize_field(spec: &FieldSpec, value: &FieldValue, out: &mut [u8]) {
    match value {
        FieldValue::Int(v) => out.copy_from_slice(&v.to_le_bytes()),
        FieldValue::Bool(v) => out[0] = *v as u8,
        FieldValue::Float(v) => out.copy_from_slice(&v.to_le_bytes()),
        FieldValue::TimeSpan(v) => out.copy_from_slice(&v.to_le_bytes()),
        FieldValue::Text(s) => {
            let width = spec.kind.storage_width();
            let len = s.len().min(width - 1);
            out[..len].copy_from_slice(&s.as_bytes()[..len]);
            for b in &mut out[len..] {
                *b = 0;
            }
        }
    }
}

fn deserialize_field(spec: &FieldSpec, raw: &[u8]) -> FieldValue {
    match spec.kind {
        FieldKind::Int { .. } => {
            FieldValue::Int(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
        }
        FieldKind::Bool => FieldValue::Bool(raw[0] != 0),
        FieldKind::Float { .. } => {
            FieldValue::Float(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
        }
        FieldKind::TimeSpan { .. } => {
            FieldValue::TimeSpan(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
        }
        FieldKind::Text { .. } | FieldKind::Password { .. } => {
            let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            FieldValue::Text(String::from_utf8_lossy(&raw[..len]).into_owned())
        }
    }
}
