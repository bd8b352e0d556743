//! HTTP request parsing and dispatch
//!
//! A deliberately small server: one client per tick, GET/POST, query and
//! urlencoded form parameters merged into one lookup, responses streamed
//! as chunks through the [`StringBuilder`] low-space callback. In soft-AP
//! provisioning mode a captive handler overrides every route.

use super::chunked::{send_chunk, send_final_chunk};
use super::string_builder::StringBuilder;
use crate::core::ring::MemRegion;
use crate::platform::traits::{Connection, TcpStack};
use alloc::string::String;
use alloc::vec::Vec;

/// Request method; anything else is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Method {
    /// HTTP GET
    Get,
    /// HTTP POST
    Post,
}

/// Parsed request: method, path, merged query/form parameters
pub struct HttpRequest {
    /// Request method
    pub method: Method,
    /// Path without the query string
    pub path: String,
    params: Vec<(String, String)>,
}

impl HttpRequest {
    /// Value of a query or form parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parameter parsed as u32 (action tokens)
    pub fn param_u32(&self, name: &str) -> Option<u32> {
        self.param(name)?.parse().ok()
    }

    fn parse(head: &str, body: &str) -> Option<Self> {
        let request_line = head.lines().next()?;
        let mut parts = request_line.split(' ');
        let method = match parts.next()? {
            "GET" => Method::Get,
            "POST" => Method::Post,
            _ => return None,
        };
        let target = parts.next()?;
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p, q),
            None => (target, ""),
        };

        let mut params = Vec::new();
        parse_urlencoded(query, &mut params);
        parse_urlencoded(body, &mut params);

        Some(Self {
            method,
            path: url_decode(path),
            params,
        })
    }
}

fn parse_urlencoded(data: &str, params: &mut Vec<(String, String)>) {
    for pair in data.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.push((url_decode(key), url_decode(value)));
    }
}

fn url_decode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut decoded: Vec<u8> = Vec::with_capacity(s.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => decoded.push(b' '),
            b'%' => {
                let hex = |b: u8| match b {
                    b'0'..=b'9' => Some(b - b'0'),
                    b'a'..=b'f' => Some(b - b'a' + 10),
                    b'A'..=b'F' => Some(b - b'A' + 10),
                    _ => None,
                };
                if i + 2 < bytes.len() {
                    if let (Some(h), Some(l)) = (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                        decoded.push(h << 4 | l);
                        i += 3;
                        continue;
                    }
                }
                decoded.push(b'%');
            }
            b => decoded.push(b),
        }
        i += 1;
    }
    out.push_str(&String::from_utf8_lossy(&decoded));
    out
}

/// Route handler: context, parsed request, response body sink
pub type Handler<Ctx> = fn(&mut Ctx, &HttpRequest, &mut StringBuilder<'_>);

struct Route<Ctx> {
    path: String,
    method: Method,
    handler: Handler<Ctx>,
}

/// Request dispatcher
pub struct Router<Ctx> {
    routes: Vec<Route<Ctx>>,
    not_found: Option<Handler<Ctx>>,
    captive: Option<Handler<Ctx>>,
    buffer_size: usize,
    region: MemRegion,
}

/// Upper bound on a request head + body we are willing to buffer
const MAX_REQUEST: usize = 4096;

/// Read attempts before giving up on a slow client
const READ_ATTEMPTS: usize = 512;

impl<Ctx> Router<Ctx> {
    /// Router with a response buffer of `buffer_size` placed per `region`
    pub fn new(buffer_size: usize, region: MemRegion) -> Self {
        Self {
            routes: Vec::new(),
            not_found: None,
            captive: None,
            buffer_size,
            region,
        }
    }

    /// Install a handler for `path`
    pub fn on(&mut self, path: &str, method: Method, handler: Handler<Ctx>) {
        self.routes.push(Route {
            path: path.into(),
            method,
            handler,
        });
    }

    /// Handler for unknown paths
    pub fn set_not_found(&mut self, handler: Handler<Ctx>) {
        self.not_found = Some(handler);
    }

    /// In soft-AP mode every request is answered by this handler
    /// regardless of path; `None` restores normal routing
    pub fn set_captive(&mut self, handler: Option<Handler<Ctx>>) {
        self.captive = handler;
    }

    /// Accept and serve at most one pending client.
    ///
    /// Returns whether a request was handled.
    pub fn poll<S: TcpStack>(&self, stack: &mut S, ctx: &mut Ctx) -> bool {
        match stack.accept() {
            Some(mut conn) => {
                self.serve(&mut conn, ctx);
                true
            }
            None => false,
        }
    }

    /// Serve one connection to completion
    pub fn serve<C: Connection>(&self, conn: &mut C, ctx: &mut Ctx) {
        let Some((head, body)) = read_request(conn) else {
            conn.close();
            return;
        };
        let Some(request) = HttpRequest::parse(&head, &body) else {
            let _ = conn.write_all(b"HTTP/1.1 400 Bad Request\r\nConnection: close\r\n\r\n");
            conn.close();
            return;
        };

        let (status, handler) = self.resolve(&request);
        let Some(handler) = handler else {
            let _ = conn.write_all(
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
            conn.close();
            return;
        };

        let head = match status {
            200 => "HTTP/1.1 200 OK",
            _ => "HTTP/1.1 404 Not Found",
        };
        let _ = conn.write_all(head.as_bytes());
        let _ = conn.write_all(
            b"\r\nContent-Type: text/html; charset=utf-8\r\n\
              Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
        );

        {
            let mut sink = StringBuilder::new(self.buffer_size, self.region);
            sink.on_low_space(|s| {
                let _ = send_chunk(conn, s);
            });
            handler(ctx, &request, &mut sink);
            sink.flush();
        }
        let _ = send_final_chunk(conn);
        conn.close();
    }

    fn resolve(&self, request: &HttpRequest) -> (u16, Option<Handler<Ctx>>) {
        // Captive mode answers every GET with the configuration form but
        // still routes POSTs, so the form can be submitted
        if request.method == Method::Get {
            if let Some(captive) = self.captive {
                return (200, Some(captive));
            }
        }
        for route in &self.routes {
            if route.method == request.method && route.path == request.path {
                return (200, Some(route.handler));
            }
        }
        (404, self.not_found)
    }
}

fn read_request<C: Connection>(conn: &mut C) -> Option<(String, String)> {
    let mut raw: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 256];
    let mut head_end = None;

    for _ in 0..READ_ATTEMPTS {
        match conn.read(&mut chunk) {
            Ok(0) => {
                if head_end.is_some() {
                    break;
                }
            }
            Ok(n) => {
                raw.extend_from_slice(&chunk[..n]);
                if raw.len() > MAX_REQUEST {
                    return None;
                }
            }
            Err(_) => break,
        }
        if head_end.is_none() {
            head_end = find_head_end(&raw);
        }
        if let Some(end) = head_end {
            let head = core::str::from_utf8(&raw[..end]).ok()?;
            let content_length = content_length(head);
            if raw.len() >= end + 4 + content_length {
                break;
            }
        }
    }

    let end = head_end?;
    let head = String::from_utf8_lossy(&raw[..end]).into_owned();
    let content_length = content_length(&head);
    let body_start = end + 4;
    let body_end = (body_start + content_length).min(raw.len());
    let body = String::from_utf8_lossy(&raw[body_start..body_end]).into_owned();
    Some((head, body))
}

fn find_head_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n")
}

fn content_length(head: &str) -> usize {
    for line in head.lines() {
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                return value.trim().parse().unwrap_or(0);
            }
        }
    }
    0
}
