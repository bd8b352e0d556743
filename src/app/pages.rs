//! Page handlers
//!
//! Every page streams through the shared response buffer; state-changing
//! links carry action tokens checked against the gate, so a refresh never
//! repeats an action.

use super::AppCtx;
use crate::core::time_service::format_local;
use crate::web::html::HtmlWriter;
use crate::web::router::HttpRequest;
use crate::web::string_builder::StringBuilder;
use alloc::vec::Vec;
use core::fmt::Write;

/// Telemetry rows per page
const TELEMETRY_PAGE_ROWS: usize = 20;

fn menu_of(ctx: &AppCtx) -> Vec<(&str, &str)> {
    ctx.menu_bar
        .iter()
        .map(|(label, path)| (label.as_str(), path.as_str()))
        .collect()
}

/// `/` - status overview
pub fn home_page(ctx: &mut AppCtx, _req: &HttpRequest, out: &mut StringBuilder<'_>) {
    let menu = menu_of(ctx);
    let mut w = HtmlWriter::new(out);
    let s = &ctx.status;
    let _ = w.header("Home", 30, &menu, "/");
    let _ = w.section_start("Status");
    let _ = w.table_start(&[]);
    let rows: [(&str, &dyn core::fmt::Display); 4] = [
        ("State", &s.state),
        ("Uptime", &s.uptime_s),
        ("Free heap", &s.free_heap),
        ("Last reset", &s.reset_reason),
    ];
    for (label, value) in rows {
        let _ = w.row_start();
        let _ = w.cell(format_args!("{}", label));
        let _ = w.cell(format_args!("{}", value));
        let _ = w.row_end();
    }
    let _ = w.row_start();
    let _ = w.cell(format_args!("IP address"));
    let _ = w.cell(format_args!(
        "{}.{}.{}.{}",
        s.ip[0], s.ip[1], s.ip[2], s.ip[3]
    ));
    let _ = w.row_end();
    let _ = w.row_start();
    let _ = w.cell(format_args!("RSSI"));
    let _ = w.cell(format_args!("{} dBm", s.rssi));
    let _ = w.row_end();
    let _ = w.table_end();
    // -90 dBm (unusable) .. -30 dBm (excellent)
    let _ = w.bar((s.rssi as f32 + 90.0) / 60.0, "rssi");
    let _ = w.section_end();
    let _ = w.footer();
}

/// `/events` - event log with an idempotent clear link
pub fn events_page(ctx: &mut AppCtx, req: &HttpRequest, out: &mut StringBuilder<'_>) {
    if let Some(token) = req.param_u32("clear") {
        if ctx.actions.should_perform("clear", token) {
            ctx.events.clear();
            let stamp = ctx.status.stamp.clone();
            ctx.events.log_event(&stamp, "Event log cleared.");
        }
    }

    let menu = menu_of(ctx);
    let mut w = HtmlWriter::new(out);
    let _ = w.header("Events", 0, &menu, "/events");
    let _ = w.section_start("Event log");
    let _ = w.table_start(&["Event"]);
    for event in ctx.events.iter() {
        let _ = w.row_start();
        let _ = w.cell(format_args!("{}", event));
        let _ = w.row_end();
    }
    let _ = w.table_end();
    let _ = w.action_link("/events", "clear", ctx.status.epoch, "Clear event log");
    let _ = w.section_end();
    let _ = w.footer();
}

/// `/telemetry` - paged telemetry table
pub fn telemetry_page(ctx: &mut AppCtx, req: &HttpRequest, out: &mut StringBuilder<'_>) {
    let menu = menu_of(ctx);
    let mut w = HtmlWriter::new(out);
    let _ = w.header("Telemetry", 60, &menu, "/telemetry");
    let _ = w.section_start("Telemetry");

    let count = ctx.telemetry.entries().count();
    let page_count = count.div_ceil(TELEMETRY_PAGE_ROWS);
    let page = req
        .param_u32("page")
        .map(|p| p as usize)
        .unwrap_or(0)
        .min(page_count.saturating_sub(1));

    let _ = w.table_start(&["Time", "Watts", "Temperature"]);
    let start = page * TELEMETRY_PAGE_ROWS;
    for index in start..(start + TELEMETRY_PAGE_ROWS).min(count) {
        if let Some(sample) = ctx.telemetry.entries().at(index as isize) {
            let _ = w.row_start();
            let mut stamp = heapless::String::<20>::new();
            let _ = format_local(sample.time, &mut stamp);
            let _ = w.cell(format_args!("{}", stamp));
            let _ = w.cell(format_args!("{}", sample.watts));
            let _ = w.cell(format_args!(
                "{}.{}",
                sample.temp_dc / 10,
                (sample.temp_dc % 10).abs()
            ));
            let _ = w.row_end();
        }
    }
    let _ = w.table_end();
    let _ = w.pager("/telemetry", page, page_count);
    let _ = w.section_end();
    let _ = w.footer();
}

/// `/config` - configuration form; also the captive soft-AP page
pub fn config_page(ctx: &mut AppCtx, _req: &HttpRequest, out: &mut StringBuilder<'_>) {
    let menu = menu_of(ctx);
    let mut w = HtmlWriter::new(out);
    let _ = w.header("Config", 0, &menu, "/config");
    let _ = w.section_start("Configuration");
    let _ = w.form_start("/config");
    let _ = ctx.settings.record().write_html_form(&mut w);
    let _ = w.form_end("Save");
    let _ = w.section_end();
    let _ = w.footer();
}

/// `POST /config` - validate, then let the next tick store and reboot
pub fn config_post(ctx: &mut AppCtx, req: &HttpRequest, out: &mut StringBuilder<'_>) {
    ctx.settings.record_mut().parse_form_data(|id| req.param(id));
    ctx.settings.validate();
    ctx.settings_dirty = true;

    let menu = menu_of(ctx);
    let mut w = HtmlWriter::new(out);
    let _ = w.header("Config", 0, &menu, "/config");
    let _ = w.raw("<p>Settings saved. The appliance restarts now.</p>");
    let _ = w.footer();
}

/// Fallback for unknown paths
pub fn not_found_page(_ctx: &mut AppCtx, req: &HttpRequest, out: &mut StringBuilder<'_>) {
    let _ = write!(out, "<!DOCTYPE html><html><body><h1>Not found</h1><p>{}</p></body></html>", req.path);
}
