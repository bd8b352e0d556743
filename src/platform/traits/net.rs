//! TCP socket interface
//!
//! The FTP exporter, the REST client and the web router all speak plain
//! byte streams through [`Connection`]; [`TcpStack`] opens outbound
//! (optionally TLS) connections and accepts inbound ones.

use crate::platform::Result;

/// One open byte-stream connection
pub trait Connection {
    /// Read available bytes without blocking.
    ///
    /// Returns `Ok(0)` when no data is available right now and
    /// `Err(NetError::Closed)` once the peer has closed and the receive
    /// buffer is drained.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write the whole buffer.
    fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Whether the connection is still open.
    fn is_open(&self) -> bool;

    /// Close the connection. Idempotent.
    fn close(&mut self);
}

/// Socket factory over the host TCP/IP stack
pub trait TcpStack {
    /// Connection type produced by this stack
    type Conn: Connection;

    /// Open a plain TCP connection.
    fn connect(&mut self, host: &str, port: u16, timeout_ms: u32) -> Result<Self::Conn>;

    /// Open a TLS connection.
    ///
    /// With `ca_cert == None` the server certificate is not verified
    /// (insecure mode).
    fn connect_tls(
        &mut self,
        host: &str,
        port: u16,
        timeout_ms: u32,
        ca_cert: Option<&str>,
    ) -> Result<Self::Conn>;

    /// Start listening on a local port.
    fn listen(&mut self, port: u16) -> Result<()>;

    /// Accept one pending inbound connection, if any.
    fn accept(&mut self) -> Option<Self::Conn>;
}
