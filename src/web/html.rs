//! Structured HTML emitter
//!
//! Thin writer over any `fmt::Write` sink producing the page fragments the
//! appliances share: header with menu bar and optional refresh, sections,
//! tables, forms and typed input widgets, bar indicators, a pager and
//! timestamped action links. Styling stays in the appliance's stylesheet;
//! the writer only emits structure and CSS classes.

use core::fmt;
use core::fmt::Write;

/// Structured page-fragment emitter
pub struct HtmlWriter<'w> {
    out: &'w mut dyn Write,
}

impl<'w> HtmlWriter<'w> {
    /// Wrap a sink
    pub fn new(out: &'w mut dyn Write) -> Self {
        Self { out }
    }

    /// Document head and menu bar.
    ///
    /// `refresh_secs > 0` adds a meta refresh; `menu` is rendered as the
    /// top bar with `active` highlighted.
    pub fn header(
        &mut self,
        title: &str,
        refresh_secs: u16,
        menu: &[(&str, &str)],
        active: &str,
    ) -> fmt::Result {
        write!(
            self.out,
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"
        )?;
        if refresh_secs > 0 {
            write!(self.out, "<meta http-equiv=\"refresh\" content=\"{}\">", refresh_secs)?;
        }
        write!(
            self.out,
            "<title>{}</title><link rel=\"stylesheet\" href=\"/style.css\"></head><body>",
            title
        )?;
        write!(self.out, "<nav class=\"menu\">")?;
        for (label, path) in menu {
            let class = if *path == active { " class=\"active\"" } else { "" };
            write!(self.out, "<a href=\"{}\"{}>{}</a>", path, class, label)?;
        }
        write!(self.out, "</nav><main>")
    }

    /// Close the document
    pub fn footer(&mut self) -> fmt::Result {
        write!(self.out, "</main></body></html>")
    }

    /// Open a titled section
    pub fn section_start(&mut self, title: &str) -> fmt::Result {
        write!(self.out, "<section><h2>{}</h2>", title)
    }

    /// Close the current section
    pub fn section_end(&mut self) -> fmt::Result {
        write!(self.out, "</section>")
    }

    /// Open a table with a header row
    pub fn table_start(&mut self, headers: &[&str]) -> fmt::Result {
        write!(self.out, "<table><tr>")?;
        for h in headers {
            write!(self.out, "<th>{}</th>", h)?;
        }
        write!(self.out, "</tr>")
    }

    /// Open a table row
    pub fn row_start(&mut self) -> fmt::Result {
        write!(self.out, "<tr>")
    }

    /// One cell
    pub fn cell(&mut self, content: fmt::Arguments<'_>) -> fmt::Result {
        write!(self.out, "<td>{}</td>", content)
    }

    /// Close the current row
    pub fn row_end(&mut self) -> fmt::Result {
        write!(self.out, "</tr>")
    }

    /// Close the table
    pub fn table_end(&mut self) -> fmt::Result {
        write!(self.out, "</table>")
    }

    /// Open a POST form
    pub fn form_start(&mut self, action: &str) -> fmt::Result {
        write!(self.out, "<form method=\"post\" action=\"{}\">", action)
    }

    /// Submit button and form close
    pub fn form_end(&mut self, submit_label: &str) -> fmt::Result {
        write!(
            self.out,
            "<button type=\"submit\">{}</button></form>",
            submit_label
        )
    }

    /// Free-text input
    pub fn input_text(&mut self, id: &str, label: &str, value: &str, maxlen: usize) -> fmt::Result {
        write!(
            self.out,
            "<label for=\"{id}\">{label}</label>\
             <input type=\"text\" id=\"{id}\" name=\"{id}\" value=\"{value}\" maxlength=\"{maxlen}\">",
        )
    }

    /// Masked password input; the current value is never echoed
    pub fn input_password(&mut self, id: &str, label: &str, maxlen: usize) -> fmt::Result {
        write!(
            self.out,
            "<label for=\"{id}\">{label}</label>\
             <input type=\"password\" id=\"{id}\" name=\"{id}\" value=\"\" maxlength=\"{maxlen}\">",
        )
    }

    /// Integer input with range
    pub fn input_number(
        &mut self,
        id: &str,
        label: &str,
        value: i32,
        min: i32,
        max: i32,
    ) -> fmt::Result {
        write!(
            self.out,
            "<label for=\"{id}\">{label}</label>\
             <input type=\"number\" id=\"{id}\" name=\"{id}\" value=\"{value}\" \
             min=\"{min}\" max=\"{max}\" step=\"1\">",
        )
    }

    /// Float input with range and decimal step
    pub fn input_float(
        &mut self,
        id: &str,
        label: &str,
        value: f32,
        min: f32,
        max: f32,
        decimals: u8,
    ) -> fmt::Result {
        let mut step: f32 = 1.0;
        for _ in 0..decimals {
            step /= 10.0;
        }
        let d = decimals as usize;
        write!(
            self.out,
            "<label for=\"{id}\">{label}</label>\
             <input type=\"number\" id=\"{id}\" name=\"{id}\" value=\"{value:.d$}\" \
             min=\"{min:.d$}\" max=\"{max:.d$}\" step=\"{step:.d$}\">",
        )
    }

    /// Checkbox
    pub fn input_checkbox(&mut self, id: &str, label: &str, checked: bool) -> fmt::Result {
        write!(
            self.out,
            "<label for=\"{id}\">{label}</label>\
             <input type=\"checkbox\" id=\"{id}\" name=\"{id}\" value=\"1\"{}>",
            if checked { " checked" } else { "" },
        )
    }

    /// Slider input
    pub fn input_slider(
        &mut self,
        id: &str,
        label: &str,
        value: i32,
        min: i32,
        max: i32,
    ) -> fmt::Result {
        write!(
            self.out,
            "<label for=\"{id}\">{label}</label>\
             <input type=\"range\" id=\"{id}\" name=\"{id}\" value=\"{value}\" \
             min=\"{min}\" max=\"{max}\">",
        )
    }

    /// Dropdown; `options` are (value, label), `selected` matches a value
    pub fn dropdown(
        &mut self,
        id: &str,
        label: &str,
        options: &[(&str, &str)],
        selected: &str,
    ) -> fmt::Result {
        write!(self.out, "<label for=\"{id}\">{label}</label><select id=\"{id}\" name=\"{id}\">")?;
        for (value, text) in options {
            write!(
                self.out,
                "<option value=\"{}\"{}>{}</option>",
                value,
                if *value == selected { " selected" } else { "" },
                text
            )?;
        }
        write!(self.out, "</select>")
    }

    /// Radio group; `options` are (value, label)
    pub fn radio_group(
        &mut self,
        id: &str,
        label: &str,
        options: &[(&str, &str)],
        selected: &str,
    ) -> fmt::Result {
        write!(self.out, "<fieldset><legend>{}</legend>", label)?;
        for (value, text) in options {
            write!(
                self.out,
                "<label><input type=\"radio\" name=\"{}\" value=\"{}\"{}>{}</label>",
                id,
                value,
                if *value == selected { " checked" } else { "" },
                text
            )?;
        }
        write!(self.out, "</fieldset>")
    }

    /// Time-span input split into hours/minutes/seconds.
    ///
    /// Submitted as `<id>_h`, `<id>_m`, `<id>_s`.
    pub fn input_timespan(&mut self, id: &str, label: &str, seconds: u32) -> fmt::Result {
        write!(
            self.out,
            "<label>{label}</label><span class=\"timespan\">\
             <input type=\"number\" name=\"{id}_h\" value=\"{}\" min=\"0\" max=\"240\">:\
             <input type=\"number\" name=\"{id}_m\" value=\"{}\" min=\"0\" max=\"59\">:\
             <input type=\"number\" name=\"{id}_s\" value=\"{}\" min=\"0\" max=\"59\"></span>",
            seconds / 3600,
            (seconds / 60) % 60,
            seconds % 60,
        )
    }

    /// Horizontal bar indicator; `fraction` is clamped to 0..=1
    pub fn bar(&mut self, fraction: f32, css_class: &str) -> fmt::Result {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0) as u32;
        write!(
            self.out,
            "<div class=\"bar {}\"><div class=\"fill\" style=\"width:{}%\"></div></div>",
            css_class, percent
        )
    }

    /// Stacked bar of (fraction, class) segments
    pub fn stacked_bar(&mut self, segments: &[(f32, &str)]) -> fmt::Result {
        write!(self.out, "<div class=\"bar stacked\">")?;
        for (fraction, class) in segments {
            let percent = (fraction.clamp(0.0, 1.0) * 100.0) as u32;
            write!(
                self.out,
                "<div class=\"{}\" style=\"width:{}%\"></div>",
                class, percent
            )?;
        }
        write!(self.out, "</div>")
    }

    /// Previous/next pager for `base_path?page=N`
    pub fn pager(&mut self, base_path: &str, page: usize, page_count: usize) -> fmt::Result {
        write!(self.out, "<div class=\"pager\">")?;
        if page > 0 {
            write!(self.out, "<a href=\"{}?page={}\">&laquo;</a>", base_path, page - 1)?;
        }
        write!(self.out, "<span>{}/{}</span>", page + 1, page_count.max(1))?;
        if page + 1 < page_count {
            write!(self.out, "<a href=\"{}?page={}\">&raquo;</a>", base_path, page + 1)?;
        }
        write!(self.out, "</div>")
    }

    /// State-changing GET link carrying an action token.
    ///
    /// The handler must check the token through `ActionGate` so refreshes
    /// do not repeat the action.
    pub fn action_link(
        &mut self,
        path: &str,
        action: &str,
        token: u32,
        label: &str,
    ) -> fmt::Result {
        write!(
            self.out,
            "<a class=\"action\" href=\"{}?{}={}\">{}</a>",
            path, action, token, label
        )
    }

    /// Raw passthrough for page-specific markup
    pub fn raw(&mut self, html: &str) -> fmt::Result {
        self.out.write_str(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    #[test]
    fn header_carries_refresh_and_active_menu() {
        let mut out = String::new();
        let mut w = HtmlWriter::new(&mut out);
        w.header("Events", 30, &[("Home", "/"), ("Events", "/events")], "/events")
            .unwrap();
        w.footer().unwrap();

        assert!(out.contains("http-equiv=\"refresh\" content=\"30\""));
        assert!(out.contains("<a href=\"/events\" class=\"active\">Events</a>"));
        assert!(out.ends_with("</main></body></html>"));
    }

    #[test]
    fn timespan_splits_into_h_m_s() {
        let mut out = String::new();
        HtmlWriter::new(&mut out)
            .input_timespan("interval", "Sync interval", 3725)
            .unwrap();
        assert!(out.contains("name=\"interval_h\" value=\"1\""));
        assert!(out.contains("name=\"interval_m\" value=\"2\""));
        assert!(out.contains("name=\"interval_s\" value=\"5\""));
    }

    #[test]
    fn action_link_embeds_token() {
        let mut out = String::new();
        HtmlWriter::new(&mut out)
            .action_link("/events", "clear", 1_700_000_001, "Clear log")
            .unwrap();
        assert_eq!(
            out,
            "<a class=\"action\" href=\"/events?clear=1700000001\">Clear log</a>"
        );
    }

    #[test]
    fn bar_clamps_fraction() {
        let mut out = String::new();
        HtmlWriter::new(&mut out).bar(1.7, "rssi").unwrap();
        assert!(out.contains("width:100%"));
    }
}
