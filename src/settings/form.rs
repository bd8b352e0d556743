//! HTML form I/O for settings records
//!
//! The schema drives both directions: `write_html_form` emits one typed
//! input per field; `parse_form_data` pulls submitted values back through
//! a caller-supplied lookup. Absent or unknown identifiers keep their
//! current value; an empty password submission keeps the stored secret.

use super::record::Settings;
use super::schema::{FieldKind, FieldValue};
use crate::web::html::HtmlWriter;
use core::fmt;

impl Settings {
    /// Emit one labelled input per field, in declaration order
    pub fn write_html_form(&self, w: &mut HtmlWriter<'_>) -> fmt::Result {
        for spec in self.schema() {
            match spec.kind {
                FieldKind::Int { min, max } => {
                    w.input_number(spec.id, spec.label, self.get_int(spec.id), min, max)?;
                }
                FieldKind::Bool => {
                    w.input_checkbox(spec.id, spec.label, self.get_bool(spec.id))?;
                }
                FieldKind::Float { min, max, decimals } => {
                    w.input_float(spec.id, spec.label, self.get_float(spec.id), min, max, decimals)?;
                }
                FieldKind::Text { width } => {
                    w.input_text(spec.id, spec.label, self.get_str(spec.id), width - 1)?;
                }
                FieldKind::Password { width } => {
                    w.input_password(spec.id, spec.label, width - 1)?;
                }
                FieldKind::TimeSpan { .. } => {
                    w.input_timespan(spec.id, spec.label, self.get_span(spec.id))?;
                }
            }
        }
        Ok(())
    }

    /// Store submitted values obtained through `lookup`, then validate.
    ///
    /// `lookup` maps a field identifier to the submitted string, `None`
    /// when the identifier was not submitted.
    pub fn parse_form_data<'a, F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        for spec in self.schema() {
            let value = match spec.kind {
                FieldKind::Int { .. } => lookup(spec.id)
                    .and_then(|s| s.parse().ok())
                    .map(FieldValue::Int),
                FieldKind::Bool => {
                    lookup(spec.id).map(|s| FieldValue::Bool(matches!(s, "1" | "on" | "true")))
                }
                FieldKind::Float { .. } => lookup(spec.id)
                    .and_then(|s| s.parse().ok())
                    .map(FieldValue::Float),
                FieldKind::Text { .. } => lookup(spec.id).map(|s| FieldValue::Text(s.into())),
                FieldKind::Password { .. } => match lookup(spec.id) {
                    Some(s) if !s.is_empty() => Some(FieldValue::Text(s.into())),
                    _ => None,
                },
                FieldKind::TimeSpan { .. } => {
                    let mut id = heapless::String::<48>::new();
                    let part = |suffix: &str, id: &mut heapless::String<48>| {
                        id.clear();
                        let _ = id.push_str(spec.id);
                        let _ = id.push_str(suffix);
                        lookup(id.as_str()).and_then(|s| s.parse::<u32>().ok())
                    };
                    let h = part("_h", &mut id);
                    let m = part("_m", &mut id);
                    let s = part("_s", &mut id);
                    if h.is_none() && m.is_none() && s.is_none() {
                        None
                    } else {
                        Some(FieldValue::TimeSpan(
                            h.unwrap_or(0) * 3600 + m.unwrap_or(0) * 60 + s.unwrap_or(0),
                        ))
                    }
                }
            };
            if let Some(value) = value {
                self.set(spec.id, value);
            }
        }
        self.validate();
    }
}

#[cfg(test)]
mod tests {
    use super::super::record::Settings;
    use super::super::schema::{FieldKind, FieldSpec};
    use crate::web::html::HtmlWriter;
    use alloc::string::String;

    static SCHEMA: &[FieldSpec] = &[
        FieldSpec {
            id: "ssid",
            label: "WiFi SSID",
            kind: FieldKind::Text { width: 33 },
            default: "",
        },
        FieldSpec {
            id: "key",
            label: "WiFi key",
            kind: FieldKind::Password { width: 64 },
            default: "",
        },
        FieldSpec {
            id: "budget",
            label: "Daily budget",
            kind: FieldKind::Int { min: 0, max: 100 },
            default: "10",
        },
        FieldSpec {
            id: "interval",
            label: "Interval",
            kind: FieldKind::TimeSpan { min: 0, max: 86400 },
            default: "90",
        },
    ];

    #[test]
    fn form_renders_typed_inputs() {
        let settings = Settings::new(*b"TST2", SCHEMA);
        let mut out = String::new();
        let mut w = HtmlWriter::new(&mut out);
        settings.write_html_form(&mut w).unwrap();

        assert!(out.contains("name=\"ssid\""));
        assert!(out.contains("type=\"password\""));
        // Stored password is never echoed
        assert!(!out.contains("value=\"secret\""));
        assert!(out.contains("min=\"0\" max=\"100\""));
        assert!(out.contains("name=\"interval_m\" value=\"1\""));
    }

    #[test]
    fn submitted_values_are_parsed_and_clamped() {
        let mut settings = Settings::new(*b"TST2", SCHEMA);
        settings.parse_form_data(|id| match id {
            "ssid" => Some("home"),
            "budget" => Some("250"),
            "interval_h" => Some("1"),
            "interval_m" => Some("30"),
            "interval_s" => Some("0"),
            _ => None,
        });

        assert_eq!(settings.get_str("ssid"), "home");
        assert_eq!(settings.get_int("budget"), 100); // clamped
        assert_eq!(settings.get_span("interval"), 5400);
    }

    #[test]
    fn absent_fields_and_empty_passwords_keep_current_values() {
        let mut settings = Settings::new(*b"TST2", SCHEMA);
        settings.parse_form_data(|id| match id {
            "key" => Some("hunter2"),
            _ => None,
        });
        assert_eq!(settings.get_str("key"), "hunter2");

        settings.parse_form_data(|id| match id {
            "key" => Some(""),
            "budget" => Some("5"),
            _ => None,
        });
        assert_eq!(settings.get_str("key"), "hunter2");
        assert_eq!(settings.get_int("budget"), 5);
    }
}
