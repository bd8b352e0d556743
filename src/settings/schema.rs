//! Field declarations
//!
//! A settings record is described by a static slice of [`FieldSpec`];
//! extended records append fields to their base record's slice, so the
//! serialized layout is the declaration order.

use alloc::string::{String, ToString};

/// Field type with its permitted range and storage width
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Signed integer within `[min, max]`
    Int {
        /// Lower bound (inclusive)
        min: i32,
        /// Upper bound (inclusive)
        max: i32,
    },
    /// Boolean
    Bool,
    /// 32-bit float within `[min, max]`, shown with `decimals` digits
    Float {
        /// Lower bound (inclusive)
        min: f32,
        /// Upper bound (inclusive)
        max: f32,
        /// Display precision
        decimals: u8,
    },
    /// UTF-8 string in a `width`-byte slot (terminator included)
    Text {
        /// Storage slot width in bytes
        width: usize,
    },
    /// Like `Text`, but rendered masked and never echoed in forms
    Password {
        /// Storage slot width in bytes
        width: usize,
    },
    /// Seconds within `[min, max]`, edited as H:M:S
    TimeSpan {
        /// Lower bound (inclusive)
        min: u32,
        /// Upper bound (inclusive)
        max: u32,
    },
}

impl FieldKind {
    /// Bytes this field occupies in the serialized payload
    pub fn storage_width(&self) -> usize {
        match self {
            FieldKind::Int { .. } => 4,
            FieldKind::Bool => 1,
            FieldKind::Float { .. } => 4,
            FieldKind::Text { width } | FieldKind::Password { width } => *width,
            FieldKind::TimeSpan { .. } => 4,
        }
    }
}

/// One field declaration
///
/// `id` is the stable identifier used in storage order, form names and
/// form lookup; it must never change across firmware versions.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Stable identifier
    pub id: &'static str,
    /// Display label for the configuration form
    pub label: &'static str,
    /// Type, range and storage width
    pub kind: FieldKind,
    /// Default, parsed according to `kind`
    pub default: &'static str,
}

/// A field's current value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Integer value
    Int(i32),
    /// Boolean value
    Bool(bool),
    /// Float value
    Float(f32),
    /// Text or password value
    Text(String),
    /// Time span in seconds
    TimeSpan(u32),
}

impl FieldValue {
    /// Default value for a declaration
    pub fn default_for(spec: &FieldSpec) -> Self {
        match spec.kind {
            FieldKind::Int { min, max } => {
                FieldValue::Int(spec.default.parse().unwrap_or(0).clamp(min, max))
            }
            FieldKind::Bool => FieldValue::Bool(matches!(spec.default, "1" | "true")),
            FieldKind::Float { min, max, .. } => {
                FieldValue::Float(spec.default.parse().unwrap_or(0.0f32).clamp(min, max))
            }
            FieldKind::Text { width } | FieldKind::Password { width } => {
                let mut s = spec.default.to_string();
                truncate_to(&mut s, width.saturating_sub(1));
                FieldValue::Text(s)
            }
            FieldKind::TimeSpan { min, max } => {
                FieldValue::TimeSpan(spec.default.parse().unwrap_or(min).clamp(min, max))
            }
        }
    }
}

/// Truncate a string to `max` bytes on a character boundary
pub(crate) fn truncate_to(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_kind_and_range() {
        let spec = FieldSpec {
            id: "syncinterval",
            label: "Sync interval",
            kind: FieldKind::TimeSpan { min: 60, max: 86400 },
            default: "10",
        };
        assert_eq!(FieldValue::default_for(&spec), FieldValue::TimeSpan(60));

        let spec = FieldSpec {
            id: "name",
            label: "Name",
            kind: FieldKind::Text { width: 4 },
            default: "abcdef",
        };
        assert_eq!(
            FieldValue::default_for(&spec),
            FieldValue::Text("abc".into())
        );
    }
}
