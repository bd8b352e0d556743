//! Navigation menu
//!
//! The menu owns the page list: each item carries an icon path, a label,
//! a URL path (defaulting to the label slug) and its GET/POST handlers.
//! `register_http_handlers` walks the list once and installs every
//! handler on the router; `bar` feeds the `HtmlWriter` menu bar.

use super::router::{Handler, Method, Router};
use alloc::string::String;
use alloc::vec::Vec;

/// One menu entry
pub struct MenuItem<Ctx> {
    /// Icon path served from the appliance's static assets
    pub icon: &'static str,
    /// Menu label
    pub label: &'static str,
    /// URL path
    pub path: String,
    /// GET handler
    pub get: Handler<Ctx>,
    /// Optional POST handler (forms)
    pub post: Option<Handler<Ctx>>,
}

impl<Ctx> MenuItem<Ctx> {
    /// Item at the label's slug (`"Event Log"` -> `/event-log`)
    pub fn new(icon: &'static str, label: &'static str, get: Handler<Ctx>) -> Self {
        Self {
            icon,
            label,
            path: slug(label),
            get,
            post: None,
        }
    }

    /// Override the URL path
    pub fn at(mut self, path: &str) -> Self {
        self.path = path.into();
        self
    }

    /// Attach a POST handler
    pub fn with_post(mut self, post: Handler<Ctx>) -> Self {
        self.post = Some(post);
        self
    }
}

fn slug(label: &str) -> String {
    let mut path = String::with_capacity(label.len() + 1);
    path.push('/');
    for c in label.chars() {
        match c {
            'A'..='Z' => path.push(c.to_ascii_lowercase()),
            'a'..='z' | '0'..='9' => path.push(c),
            ' ' | '_' => path.push('-'),
            _ => {}
        }
    }
    path
}

/// The appliance's menu
pub struct Menu<Ctx> {
    items: Vec<MenuItem<Ctx>>,
}

impl<Ctx> Menu<Ctx> {
    /// Empty menu
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append an item
    pub fn add(&mut self, item: MenuItem<Ctx>) {
        self.items.push(item);
    }

    /// Install one GET (and optional POST) route per item
    pub fn register_http_handlers(&self, router: &mut Router<Ctx>) {
        for item in &self.items {
            router.on(&item.path, Method::Get, item.get);
            if let Some(post) = item.post {
                router.on(&item.path, Method::Post, post);
            }
        }
    }

    /// (label, path) pairs for the menu bar
    pub fn bar(&self) -> Vec<(&str, &str)> {
        self.items
            .iter()
            .map(|i| (i.label, i.path.as_str()))
            .collect()
    }

    /// Registered items
    pub fn items(&self) -> &[MenuItem<Ctx>] {
        &self.items
    }
}

impl<Ctx> Default for Menu<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ring::MemRegion;
    use crate::platform::mock::MockConnection;
    use crate::web::router::HttpRequest;
    use crate::web::string_builder::StringBuilder;
    use core::fmt::Write;

    fn page(_: &mut u32, _: &HttpRequest, out: &mut StringBuilder<'_>) {
        let _ = write!(out, "page");
    }

    #[test]
    fn label_slugs() {
        assert_eq!(slug("Event Log"), "/event-log");
        assert_eq!(slug("Config"), "/config");
    }

    #[test]
    fn menu_registers_routes() {
        let mut menu: Menu<u32> = Menu::new();
        menu.add(MenuItem::new("/home.svg", "Home", page).at("/"));
        menu.add(MenuItem::new("/log.svg", "Event Log", page).with_post(page));

        let mut router = Router::new(512, MemRegion::Internal);
        menu.register_http_handlers(&mut router);

        let mut ctx = 0u32;
        let conn = MockConnection::new();
        conn.push_read(b"POST /event-log HTTP/1.1\r\nContent-Length: 0\r\n\r\n");
        router.serve(&mut conn.clone(), &mut ctx);
        assert!(conn.written_string().starts_with("HTTP/1.1 200 OK"));

        assert_eq!(menu.bar(), [("Home", "/"), ("Event Log", "/event-log")]);
    }
}
