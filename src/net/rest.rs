//! Non-blocking REST client
//!
//! One background worker per client drives the blocking HTTP(S) exchange;
//! the main tick polls [`RestClient::request_data`], which arms the shared
//! request slot, reports "pending" while the worker runs, and finally
//! decodes the buffered response body into a JSON document (under an
//! optional filter) for the application's parse hook.
//!
//! The worker body is [`service_slot`]; embedded targets run it in a loop
//! on their executor or second core, host tests call it directly.

use crate::core::sync::SharedState;
use crate::platform::traits::{ClockInterface, Connection, TcpStack};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use serde_json::Value;

/// A request is armed or in flight
pub const HTTP_REQUEST_PENDING: i16 = -1;
/// DNS/TCP/TLS connect failed
pub const HTTP_CONNECTION_FAILED: i16 = -2;
/// Sending the request failed
pub const HTTP_SEND_FAILED: i16 = -3;
/// The response did not arrive within the timeout
pub const HTTP_READ_TIMEOUT: i16 = -4;
/// 2xx with an empty body
pub const HTTP_EMPTY_RESPONSE: i16 = -5;
/// The body was not valid JSON
pub const HTTP_JSON_PARSE_FAILED: i16 = -6;

/// Client configuration
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// URL prefix; `request_data` appends its suffix
    pub base_url: String,
    /// Optional bearer token sent as `Authorization: Bearer ...`
    pub bearer_token: Option<String>,
    /// CA certificate for TLS; `None` skips server verification
    pub ca_cert: Option<String>,
    /// Exchange timeout
    pub timeout_ms: u32,
    /// Extra request headers (`X-Api-Version` and friends)
    pub extra_headers: Vec<(String, String)>,
}

impl RestConfig {
    /// Config with a 5 s timeout and no auth
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            bearer_token: None,
            ca_cert: None,
            timeout_ms: 5_000,
            extra_headers: Vec::new(),
        }
    }
}

/// Request slot phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SlotPhase {
    /// No request
    #[default]
    Idle,
    /// Armed by the main tick, not yet claimed by the worker
    Armed,
    /// Worker is executing the exchange
    Busy,
    /// Outcome and body are ready for decoding on the main tick
    Complete,
}

/// Shared request slot between main tick and worker
#[derive(Default)]
pub struct RestSlot {
    phase: SlotPhase,
    url: String,
    outcome: i16,
    body: Option<String>,
    error: Option<String>,
    remaining_quota: Option<i32>,
    response_time_ms: u32,
}

/// The REST client (main-tick side)
pub struct RestClient<'s, SS: SharedState<RestSlot>> {
    slot: &'s SS,
    config: RestConfig,
    filter: Option<Value>,
    request_millis: u64,
    response_time_ms: u32,
    http_result: i16,
    last_error: String,
    remaining_quota: Option<i32>,
}

impl<'s, SS: SharedState<RestSlot>> RestClient<'s, SS> {
    /// Client over a shared slot
    pub fn new(slot: &'s SS, config: RestConfig) -> Self {
        Self {
            slot,
            config,
            filter: None,
            request_millis: 0,
            response_time_ms: 0,
            http_result: 0,
            last_error: String::new(),
            remaining_quota: None,
        }
    }

    /// Restrict decoded documents to the fields present in `filter`.
    ///
    /// This bounds the decoded memory footprint for large third-party
    /// APIs: a key maps to `true` to keep the field, to a nested object
    /// to recurse, and an array's first element applies to every element
    /// of the corresponding response array.
    pub fn set_filter(&mut self, filter: Value) {
        self.filter = Some(filter);
    }

    /// Worker-side view of the configuration
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// `millis()` at which the in-flight request was armed, 0 when idle
    pub fn request_millis(&self) -> u64 {
        self.request_millis
    }

    /// Duration of the last completed exchange
    pub fn response_time_ms(&self) -> u32 {
        self.response_time_ms
    }

    /// Status or sentinel of the last completed request
    pub fn http_result(&self) -> i16 {
        self.http_result
    }

    /// Error description of the last failed request
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    /// Remaining daily quota, from `X-RateLimit-Remaining` when present
    pub fn remaining_quota(&self) -> Option<i32> {
        self.remaining_quota
    }

    /// Issue or progress a request for `base_url + suffix`.
    ///
    /// Returns [`HTTP_REQUEST_PENDING`] until the worker has completed;
    /// then decodes the body, invokes `parse_response` on success and
    /// returns the HTTP status (or a negative sentinel).
    pub fn request_data(
        &mut self,
        suffix: &str,
        clock: &impl ClockInterface,
        parse_response: &mut dyn FnMut(&Value),
    ) -> i16 {
        enum Step {
            Pending,
            Finished {
                outcome: i16,
                body: Option<String>,
                error: Option<String>,
                quota: Option<i32>,
                response_time_ms: u32,
            },
        }

        let step = self.slot.with_mut(|slot| match slot.phase {
            SlotPhase::Idle => {
                slot.url = format!("{}{}", self.config.base_url, suffix);
                slot.outcome = HTTP_REQUEST_PENDING;
                slot.body = None;
                slot.error = None;
                slot.phase = SlotPhase::Armed;
                Step::Pending
            }
            SlotPhase::Armed | SlotPhase::Busy => Step::Pending,
            SlotPhase::Complete => {
                slot.phase = SlotPhase::Idle;
                Step::Finished {
                    outcome: slot.outcome,
                    body: slot.body.take(),
                    error: slot.error.take(),
                    quota: slot.remaining_quota,
                    response_time_ms: slot.response_time_ms,
                }
            }
        });

        match step {
            Step::Pending => {
                if self.request_millis == 0 {
                    self.request_millis = clock.millis();
                }
                HTTP_REQUEST_PENDING
            }
            Step::Finished {
                outcome,
                body,
                error,
                quota,
                response_time_ms,
            } => {
                self.request_millis = 0;
                self.response_time_ms = response_time_ms;
                self.remaining_quota = quota;
                self.http_result = self.decode(outcome, body, error, parse_response);
                self.http_result
            }
        }
    }

    fn decode(
        &mut self,
        outcome: i16,
        body: Option<String>,
        error: Option<String>,
        parse_response: &mut dyn FnMut(&Value),
    ) -> i16 {
        if outcome < 0 {
            self.last_error = error.unwrap_or_else(|| "transport error".to_string());
            return outcome;
        }
        if !(200..300).contains(&outcome) {
            self.last_error = format!("HTTP {}", outcome);
            return outcome;
        }
        let Some(body) = body.filter(|b| !b.is_empty()) else {
            self.last_error = "empty response body".to_string();
            return HTTP_EMPTY_RESPONSE;
        };
        match serde_json::from_str::<Value>(&body) {
            Ok(doc) => {
                let doc = match &self.filter {
                    Some(filter) => apply_filter(&doc, filter),
                    None => doc,
                };
                self.last_error.clear();
                parse_response(&doc);
                outcome
            }
            Err(_) => {
                self.last_error = "JSON parse failed".to_string();
                HTTP_JSON_PARSE_FAILED
            }
        }
    }
}

/// Keep only the parts of `doc` admitted by `filter`
pub fn apply_filter(doc: &Value, filter: &Value) -> Value {
    match filter {
        Value::Bool(true) => doc.clone(),
        Value::Object(keys) => match doc {
            Value::Object(map) => {
                let mut out = serde_json::Map::new();
                for (key, key_filter) in keys {
                    if let Some(value) = map.get(key) {
                        let kept = apply_filter(value, key_filter);
                        if !kept.is_null() || value.is_null() {
                            drop(out.insert(key.clone(), kept));
                        }
                    }
                }
                Value::Object(out)
            }
            _ => Value::Null,
        },
        Value::Array(inner) => match (doc, inner.first()) {
            (Value::Array(items), Some(item_filter)) => Value::Array(
                items
                    .iter()
                    .map(|item| apply_filter(item, item_filter))
                    .collect(),
            ),
            _ => Value::Null,
        },
        _ => Value::Null,
    }
}

/// Worker body: claim an armed request, perform the blocking exchange,
/// publish the outcome. Run in a loop on the worker; returns whether a
/// request was serviced.
pub fn service_slot<SS, T, C>(slot: &SS, stack: &mut T, clock: &C, config: &RestConfig) -> bool
where
    SS: SharedState<RestSlot>,
    T: TcpStack,
    C: ClockInterface,
{
    let url = match slot.with_mut(|slot| {
        if slot.phase == SlotPhase::Armed {
            slot.phase = SlotPhase::Busy;
            Some(slot.url.clone())
        } else {
            None
        }
    }) {
        Some(url) => url,
        None => return false,
    };

    let started = clock.millis();
    let outcome = http_exchange(stack, clock, config, "GET", &url, None);
    let elapsed = (clock.millis().saturating_sub(started)) as u32;

    slot.with_mut(|slot| {
        match outcome {
            Ok(response) => {
                slot.outcome = response.status as i16;
                slot.body = Some(response.body);
                slot.error = None;
                slot.remaining_quota = response.remaining_quota;
            }
            Err((code, error)) => {
                slot.outcome = code;
                slot.body = None;
                slot.error = Some(error);
            }
        }
        slot.response_time_ms = elapsed;
        slot.phase = SlotPhase::Complete;
    });
    true
}

/// Decoded transport-level response
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
    /// `X-RateLimit-Remaining` header, when present
    pub remaining_quota: Option<i32>,
}

/// One blocking HTTP exchange over the platform stack.
///
/// TLS is chosen by the URL scheme; without a configured CA certificate
/// the TLS connection is opened in insecure mode.
pub fn http_exchange<T, C>(
    stack: &mut T,
    clock: &C,
    config: &RestConfig,
    method: &str,
    url: &str,
    body: Option<&str>,
) -> Result<HttpResponse, (i16, String)>
where
    T: TcpStack,
    C: ClockInterface,
{
    let Some(target) = parse_url(url) else {
        return Err((HTTP_CONNECTION_FAILED, format!("bad URL: {}", url)));
    };

    let mut conn = if target.tls {
        stack.connect_tls(
            &target.host,
            target.port,
            config.timeout_ms,
            config.ca_cert.as_deref(),
        )
    } else {
        stack.connect(&target.host, target.port, config.timeout_ms)
    }
    .map_err(|e| (HTTP_CONNECTION_FAILED, format!("connect failed: {}", e)))?;

    let mut request = format!(
        "{} {} HTTP/1.1\r\nHost: {}\r\nAccept: application/json\r\n",
        method, target.path, target.host
    );
    if let Some(token) = &config.bearer_token {
        request.push_str(&format!("Authorization: Bearer {}\r\n", token));
    }
    for (name, value) in &config.extra_headers {
        request.push_str(&format!("{}: {}\r\n", name, value));
    }
    if let Some(body) = body {
        request.push_str(&format!(
            "Content-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n",
            body.len()
        ));
    }
    request.push_str("Connection: close\r\n\r\n");
    if let Some(body) = body {
        request.push_str(body);
    }

    conn.write_all(request.as_bytes())
        .map_err(|e| (HTTP_SEND_FAILED, format!("send failed: {}", e)))?;

    let raw = read_response(&mut conn, clock, config.timeout_ms)
        .ok_or_else(|| (HTTP_READ_TIMEOUT, "response timeout".to_string()))?;
    conn.close();

    parse_response(&raw).ok_or_else(|| (HTTP_READ_TIMEOUT, "malformed response".to_string()))
}

struct Target {
    tls: bool,
    host: String,
    port: u16,
    path: String,
}

fn parse_url(url: &str) -> Option<Target> {
    let (tls, rest) = if let Some(rest) = url.strip_prefix("https://") {
        (true, rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        (false, rest)
    } else {
        return None;
    };
    let (authority, path) = match rest.find('/') {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, "/"),
    };
    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host, port.parse().ok()?),
        None => (authority, if tls { 443 } else { 80 }),
    };
    if host.is_empty() {
        return None;
    }
    Some(Target {
        tls,
        host: host.to_string(),
        port,
        path: path.to_string(),
    })
}

/// Upper bound on read iterations, in case the clock stands still
const MAX_READ_ITERS: u32 = 100_000;

fn read_response<C: Connection>(conn: &mut C, clock: &impl ClockInterface, timeout_ms: u32) -> Option<Vec<u8>> {
    let deadline = clock.millis() + timeout_ms as u64;
    let mut raw: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 512];

    for _ in 0..MAX_READ_ITERS {
        match conn.read(&mut chunk) {
            Ok(0) => {
                if clock.millis() >= deadline {
                    return None;
                }
            }
            Ok(n) => raw.extend_from_slice(&chunk[..n]),
            Err(_) => break, // peer closed; whatever arrived is the response
        }
        if let Some(end) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            if let Some(len) = header_value(&raw[..end], "content-length")
                .and_then(|v| v.parse::<usize>().ok())
            {
                if raw.len() >= end + 4 + len {
                    break;
                }
            }
        }
    }

    if raw.is_empty() {
        None
    } else {
        Some(raw)
    }
}

fn header_value(head: &[u8], name: &str) -> Option<String> {
    let text = String::from_utf8_lossy(head);
    for line in text.lines().skip(1) {
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case(name) {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

fn parse_response(raw: &[u8]) -> Option<HttpResponse> {
    let end = raw.windows(4).position(|w| w == b"\r\n\r\n")?;
    let head = &raw[..end];
    let status: u16 = {
        let text = String::from_utf8_lossy(head);
        let status_line = text.lines().next()?.to_string();
        status_line.split(' ').nth(1)?.parse().ok()?
    };
    let remaining_quota =
        header_value(head, "x-ratelimit-remaining").and_then(|v| v.parse().ok());
    let body = String::from_utf8_lossy(&raw[end + 4..]).into_owned();
    Some(HttpResponse {
        status,
        body,
        remaining_quota,
    })
}

/// OAuth-style refresh-token exchange.
///
/// Runs before a business request once the access token is known to have
/// expired. On success the caller-supplied callback receives the new
/// refresh token so it can be persisted.
pub fn refresh_access_token<T, C>(
    stack: &mut T,
    clock: &C,
    config: &RestConfig,
    token_url: &str,
    refresh_token: &str,
    on_new_refresh_token: &mut dyn FnMut(&str),
) -> Result<(String, u32), (i16, String)>
where
    T: TcpStack,
    C: ClockInterface,
{
    let body = format!(
        "grant_type=refresh_token&refresh_token={}",
        refresh_token
    );
    let response = http_exchange(stack, clock, config, "POST", token_url, Some(&body))?;
    if !(200..300).contains(&response.status) {
        return Err((response.status as i16, format!("HTTP {}", response.status)));
    }
    let doc: Value = serde_json::from_str(&response.body)
        .map_err(|_| (HTTP_JSON_PARSE_FAILED, "JSON parse failed".to_string()))?;

    let access = doc
        .get("access_token")
        .and_then(Value::as_str)
        .ok_or_else(|| (HTTP_JSON_PARSE_FAILED, "missing access_token".to_string()))?
        .to_string();
    let expires_in = doc.get("expires_in").and_then(Value::as_u64).unwrap_or(3600) as u32;
    if let Some(new_refresh) = doc.get("refresh_token").and_then(Value::as_str) {
        on_new_refresh_token(new_refresh);
    }
    Ok((access, expires_in))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sync::SingleCoreState;
    use crate::platform::mock::{MockClock, MockStack};
    use serde_json::json;

    fn http_200(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[test]
    fn successful_request_decodes_filtered_document() {
        let slot = SingleCoreState::new(RestSlot::default());
        let mut stack = MockStack::new();
        let clock = MockClock::new();

        let mut client = RestClient::new(&slot, RestConfig::new("http://api.local/v1"));
        client.set_filter(json!({ "power": true, "meta": { "serial": true } }));

        let mut seen = None;
        let mut parse = |doc: &Value| seen = Some(doc.clone());

        // Arm
        assert_eq!(
            client.request_data("/status", &clock, &mut parse),
            HTTP_REQUEST_PENDING
        );
        assert!(client.request_millis() == clock.millis());

        // Worker turn
        let conn = stack.expect_connect();
        conn.push_read(
            http_200(r#"{"power": 2350, "meta": {"serial": "A1", "noise": 1}, "junk": []}"#)
                .as_bytes(),
        );
        conn.server_close();
        let config = client.config().clone();
        assert!(service_slot(&slot, &mut stack, &clock, &config));

        // Decode turn
        assert_eq!(client.request_data("/status", &clock, &mut parse), 200);
        assert_eq!(client.request_millis(), 0);
        let doc = seen.expect("parse_response was not called");
        assert_eq!(doc, json!({ "power": 2350, "meta": { "serial": "A1" } }));

        // The worker sent a well-formed request
        assert!(conn.written_string().starts_with("GET /v1/status HTTP/1.1\r\n"));
        assert!(conn.written_string().contains("Host: api.local\r\n"));
    }

    #[test]
    fn server_error_skips_the_parse_hook() {
        let slot = SingleCoreState::new(RestSlot::default());
        let mut stack = MockStack::new();
        let clock = MockClock::new();
        let mut client = RestClient::new(&slot, RestConfig::new("http://api.local"));

        let mut called = false;
        let mut parse = |_: &Value| called = true;

        assert_eq!(
            client.request_data("/x", &clock, &mut parse),
            HTTP_REQUEST_PENDING
        );
        let conn = stack.expect_connect();
        conn.push_read(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\n\r\n");
        conn.server_close();
        let config = client.config().clone();
        service_slot(&slot, &mut stack, &clock, &config);

        assert_eq!(client.request_data("/x", &clock, &mut parse), 500);
        assert!(!called);
        assert!(client.last_error().starts_with("HTTP 500"));
    }

    #[test]
    fn second_request_while_pending_stays_pending() {
        let slot = SingleCoreState::new(RestSlot::default());
        let clock = MockClock::new();
        let mut client = RestClient::new(&slot, RestConfig::new("http://api.local"));
        let mut parse = |_: &Value| {};

        assert_eq!(
            client.request_data("/a", &clock, &mut parse),
            HTTP_REQUEST_PENDING
        );
        let armed_url = slot.with(|s| s.url.clone());

        clock.advance(50);
        assert_eq!(
            client.request_data("/b", &clock, &mut parse),
            HTTP_REQUEST_PENDING
        );
        // The in-flight request was not disturbed
        assert_eq!(slot.with(|s| s.url.clone()), armed_url);
        assert_eq!(armed_url, "http://api.local/a");
    }

    #[test]
    fn connect_failure_surfaces_a_sentinel() {
        let slot = SingleCoreState::new(RestSlot::default());
        let mut stack = MockStack::new();
        let clock = MockClock::new();
        let mut client = RestClient::new(&slot, RestConfig::new("http://api.local"));
        let mut parse = |_: &Value| {};

        client.request_data("/x", &clock, &mut parse);
        stack.refuse_connections(true);
        let config = client.config().clone();
        service_slot(&slot, &mut stack, &clock, &config);

        assert_eq!(
            client.request_data("/x", &clock, &mut parse),
            HTTP_CONNECTION_FAILED
        );
        assert!(client.last_error().contains("connect failed"));
    }

    #[test]
    fn invalid_json_surfaces_parse_sentinel() {
        let slot = SingleCoreState::new(RestSlot::default());
        let mut stack = MockStack::new();
        let clock = MockClock::new();
        let mut client = RestClient::new(&slot, RestConfig::new("http://api.local"));
        let mut called = false;
        let mut parse = |_: &Value| called = true;

        client.request_data("/x", &clock, &mut parse);
        let conn = stack.expect_connect();
        conn.push_read(http_200("not json at all").as_bytes());
        conn.server_close();
        let config = client.config().clone();
        service_slot(&slot, &mut stack, &clock, &config);

        assert_eq!(
            client.request_data("/x", &clock, &mut parse),
            HTTP_JSON_PARSE_FAILED
        );
        assert!(!called);
    }

    #[test]
    fn https_without_ca_uses_insecure_tls() {
        let slot = SingleCoreState::new(RestSlot::default());
        let mut stack = MockStack::new();
        let clock = MockClock::new();
        let mut client = RestClient::new(&slot, RestConfig::new("https://secure.local/api"));
        let mut parse = |_: &Value| {};

        client.request_data("/x", &clock, &mut parse);
        let conn = stack.expect_connect();
        conn.push_read(http_200("{}").as_bytes());
        conn.server_close();
        let config = client.config().clone();
        service_slot(&slot, &mut stack, &clock, &config);

        let log = stack.connect_log();
        assert!(log[0].tls);
        assert_eq!(log[0].ca_cert, None);
        assert_eq!(log[0].port, 443);
    }

    #[test]
    fn rate_limit_header_is_exposed() {
        let slot = SingleCoreState::new(RestSlot::default());
        let mut stack = MockStack::new();
        let clock = MockClock::new();
        let mut client = RestClient::new(&slot, RestConfig::new("http://api.local"));
        let mut parse = |_: &Value| {};

        client.request_data("/x", &clock, &mut parse);
        let conn = stack.expect_connect();
        conn.push_read(
            b"HTTP/1.1 200 OK\r\nX-RateLimit-Remaining: 42\r\nContent-Length: 2\r\n\r\n{}",
        );
        conn.server_close();
        let config = client.config().clone();
        service_slot(&slot, &mut stack, &clock, &config);

        assert_eq!(client.request_data("/x", &clock, &mut parse), 200);
        assert_eq!(client.remaining_quota(), Some(42));
    }

    #[test]
    fn filter_semantics() {
        let doc = json!({
            "a": 1,
            "b": {"x": 1, "y": 2},
            "list": [{"k": 1, "drop": 2}, {"k": 3}]
        });
        let filter = json!({
            "a": true,
            "b": {"y": true},
            "list": [{"k": true}]
        });
        assert_eq!(
            apply_filter(&doc, &filter),
            json!({ "a": 1, "b": {"y": 2}, "list": [{"k": 1}, {"k": 3}] })
        );
    }

    #[test]
    fn url_parsing() {
        let t = parse_url("https://host.example:8443/a/b?q=1").unwrap();
        assert!(t.tls);
        assert_eq!(t.host, "host.example");
        assert_eq!(t.port, 8443);
        assert_eq!(t.path, "/a/b?q=1");

        let t = parse_url("http://plain.local").unwrap();
        assert!(!t.tls);
        assert_eq!(t.port, 80);
        assert_eq!(t.path, "/");

        assert!(parse_url("ftp://x").is_none());
    }

    #[test]
    fn refresh_token_exchange_hands_back_the_new_token() {
        let mut stack = MockStack::new();
        let clock = MockClock::new();
        let config = RestConfig::new("http://auth.local");

        let conn = stack.expect_connect();
        conn.push_read(
            http_200(r#"{"access_token":"at-2","refresh_token":"rt-2","expires_in":900}"#)
                .as_bytes(),
        );
        conn.server_close();

        let mut persisted = None;
        let (access, expires_in) = refresh_access_token(
            &mut stack,
            &clock,
            &config,
            "http://auth.local/token",
            "rt-1",
            &mut |t| persisted = Some(t.to_string()),
        )
        .unwrap();

        assert_eq!(access, "at-2");
        assert_eq!(expires_in, 900);
        assert_eq!(persisted.as_deref(), Some("rt-2"));
        let sent = conn.written_string();
        assert!(sent.starts_with("POST /token HTTP/1.1\r\n"));
        assert!(sent.ends_with("grant_type=refresh_token&refresh_token=rt-1"));
    }
}
