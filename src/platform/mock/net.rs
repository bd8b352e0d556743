//! Scripted TCP stack for tests
//!
//! A [`MockConnection`] is a shared handle onto one byte-stream endpoint:
//! the test plays the server by pushing reply bytes (or installing
//! line-triggered auto-replies) and inspecting what the client wrote.
//! [`MockStack`] queues prepared connections for outbound `connect` calls
//! and inbound `accept` calls.

use crate::platform::error::NetError;
use crate::platform::traits::{Connection, TcpStack};
use crate::platform::Result;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

struct ConnInner {
    /// Bytes waiting to be read by the client
    inbound: VecDeque<u8>,
    /// Everything the client wrote
    written: Vec<u8>,
    /// Auto-reply rules: when a written line starts with the prefix,
    /// the reply is queued for reading
    replies: Vec<(String, Vec<u8>)>,
    open: bool,
    /// Whether the client has closed its own side; a server-side close
    /// (`server_close`) stops reads but does not fail the client's writes
    client_closed: bool,
    /// Pending write bytes not yet matched against reply rules
    line: Vec<u8>,
}

/// One endpoint of a scripted connection; cloning shares the endpoint
#[derive(Clone)]
pub struct MockConnection {
    inner: Rc<RefCell<ConnInner>>,
}

impl MockConnection {
    /// Fresh open connection with nothing scripted
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ConnInner {
                inbound: VecDeque::new(),
                written: Vec::new(),
                replies: Vec::new(),
                open: true,
                client_closed: false,
                line: Vec::new(),
            })),
        }
    }

    /// Queue bytes for the client to read
    pub fn push_read(&self, bytes: &[u8]) {
        self.inner.borrow_mut().inbound.extend(bytes.iter().copied());
    }

    /// When the client writes a line starting with `prefix`, queue `reply`
    pub fn auto_reply(&self, prefix: &str, reply: &[u8]) {
        self.inner
            .borrow_mut()
            .replies
            .push((prefix.to_string(), reply.to_vec()));
    }

    /// Everything written so far
    pub fn written(&self) -> Vec<u8> {
        self.inner.borrow().written.clone()
    }

    /// Written bytes interpreted as UTF-8 (lossy)
    pub fn written_string(&self) -> String {
        String::from_utf8_lossy(&self.inner.borrow().written).to_string()
    }

    /// Close from the server side
    pub fn server_close(&self) {
        self.inner.borrow_mut().open = false;
    }

    /// Whether the client has closed the connection
    pub fn is_closed(&self) -> bool {
        !self.inner.borrow().open
    }
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for MockConnection {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.borrow_mut();
        if inner.inbound.is_empty() {
            if !inner.open {
                return Err(NetError::Closed.into());
            }
            return Ok(0);
        }
        let mut n = 0;
        while n < buf.len() {
            match inner.inbound.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.client_closed {
            return Err(NetError::WriteFailed.into());
        }
        inner.written.extend_from_slice(buf);
        // Feed the auto-responder line by line
        for &b in buf {
            inner.line.push(b);
            if b == b'\n' {
                let line = String::from_utf8_lossy(&inner.line).to_string();
                let mut queued: Vec<u8> = Vec::new();
                for (prefix, reply) in &inner.replies {
                    if line.starts_with(prefix.as_str()) {
                        queued.extend_from_slice(reply);
                        break;
                    }
                }
                inner.inbound.extend(queued);
                inner.line.clear();
            }
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.inner.borrow().open
    }

    fn close(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.open = false;
        inner.client_closed = true;
    }
}

/// Record of one outbound connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRecord {
    /// Destination host
    pub host: String,
    /// Destination port
    pub port: u16,
    /// Whether TLS was requested
    pub tls: bool,
    /// CA certificate handed to `connect_tls`
    pub ca_cert: Option<String>,
}

/// Scripted TCP stack
pub struct MockStack {
    outbound: VecDeque<MockConnection>,
    refuse: bool,
    connects: Vec<ConnectRecord>,
    listen_port: Option<u16>,
    accepts: VecDeque<MockConnection>,
}

impl MockStack {
    /// Stack with nothing scripted
    pub fn new() -> Self {
        Self {
            outbound: VecDeque::new(),
            refuse: false,
            connects: Vec::new(),
            listen_port: None,
            accepts: VecDeque::new(),
        }
    }

    /// Prepare the connection the next `connect` will return; the returned
    /// handle stays with the test for scripting
    pub fn expect_connect(&mut self) -> MockConnection {
        let conn = MockConnection::new();
        self.outbound.push_back(conn.clone());
        conn
    }

    /// Make every subsequent connect fail
    pub fn refuse_connections(&mut self, refuse: bool) {
        self.refuse = refuse;
    }

    /// All connects seen so far
    pub fn connect_log(&self) -> &[ConnectRecord] {
        &self.connects
    }

    /// Port passed to `listen`, if any
    pub fn listening_on(&self) -> Option<u16> {
        self.listen_port
    }

    /// Queue an inbound client connection for `accept`
    pub fn push_client(&mut self, conn: MockConnection) {
        self.accepts.push_back(conn);
    }
}

impl Default for MockStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpStack for MockStack {
    type Conn = MockConnection;

    fn connect(&mut self, host: &str, port: u16, _timeout_ms: u32) -> Result<Self::Conn> {
        self.connects.push(ConnectRecord {
            host: host.to_string(),
            port,
            tls: false,
            ca_cert: None,
        });
        if self.refuse {
            return Err(NetError::ConnectFailed.into());
        }
        Ok(self.outbound.pop_front().unwrap_or_default())
    }

    fn connect_tls(
        &mut self,
        host: &str,
        port: u16,
        _timeout_ms: u32,
        ca_cert: Option<&str>,
    ) -> Result<Self::Conn> {
        self.connects.push(ConnectRecord {
            host: host.to_string(),
            port,
            tls: true,
            ca_cert: ca_cert.map(|c| c.to_string()),
        });
        if self.refuse {
            return Err(NetError::ConnectFailed.into());
        }
        Ok(self.outbound.pop_front().unwrap_or_default())
    }

    fn listen(&mut self, port: u16) -> Result<()> {
        self.listen_port = Some(port);
        Ok(())
    }

    fn accept(&mut self) -> Option<Self::Conn> {
        self.accepts.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_reply_triggers_on_line() {
        let mut conn = MockConnection::new();
        conn.auto_reply("USER", b"331 Password required\r\n");
        conn.write_all(b"USER anonymous\r\n").unwrap();

        let mut buf = [0u8; 64];
        let n = conn.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"331 Password required\r\n");
    }

    #[test]
    fn read_after_server_close_errors_once_drained() {
        let mut conn = MockConnection::new();
        conn.push_read(b"hi");
        conn.server_close();

        let mut buf = [0u8; 8];
        assert_eq!(conn.read(&mut buf).unwrap(), 2);
        assert!(conn.read(&mut buf).is_err());
    }

    #[test]
    fn stack_hands_out_prepared_connections_in_order() {
        let mut stack = MockStack::new();
        let a = stack.expect_connect();
        a.push_read(b"first");
        let b = stack.expect_connect();
        b.push_read(b"second");

        let mut c1 = stack.connect("a.local", 21, 1000).unwrap();
        let mut buf = [0u8; 16];
        let n = c1.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"first");

        let mut c2 = stack.connect("b.local", 21, 1000).unwrap();
        let n = c2.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"second");
    }
}
