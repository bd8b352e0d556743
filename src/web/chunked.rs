//! Chunked HTTP response adapter
//!
//! Writes a response body as length-prefixed chunks over a [`Connection`],
//! terminated by the empty chunk.

use crate::platform::traits::Connection;
use core::fmt::Write;

/// Chunk writer over a connection
pub struct ChunkedWriter<'a, C: Connection> {
    conn: &'a mut C,
    failed: bool,
}

impl<'a, C: Connection> ChunkedWriter<'a, C> {
    /// Wrap a connection; the response headers (with
    /// `Transfer-Encoding: chunked`) must already be on the wire
    pub fn new(conn: &'a mut C) -> Self {
        Self {
            conn,
            failed: false,
        }
    }

    /// Send one chunk; empty payloads are skipped (an empty chunk would
    /// terminate the response)
    pub fn write_chunk(&mut self, payload: &str) {
        if self.failed || payload.is_empty() {
            return;
        }
        let mut head: heapless::String<16> = heapless::String::new();
        let _ = write!(head, "{:X}\r\n", payload.len());
        if self.conn.write_all(head.as_bytes()).is_err()
            || self.conn.write_all(payload.as_bytes()).is_err()
            || self.conn.write_all(b"\r\n").is_err()
        {
            self.failed = true;
        }
    }

    /// Send the terminating empty chunk
    pub fn finish(&mut self) {
        if self.failed {
            return;
        }
        if self.conn.write_all(b"0\r\n\r\n").is_err() {
            self.failed = true;
        }
    }

    /// Whether any send failed
    pub fn failed(&self) -> bool {
        self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockConnection;

    #[test]
    fn chunks_are_length_prefixed_and_terminated() {
        let mut conn = MockConnection::new();
        {
            let mut w = ChunkedWriter::new(&mut conn);
            w.write_chunk("hello");
            w.write_chunk("");
            w.write_chunk("world!");
            w.finish();
            assert!(!w.failed());
        }
        assert_eq!(conn.written_string(), "5\r\nhello\r\n6\r\nworld!\r\n0\r\n\r\n");
    }
}

/// Send one chunk over `conn` (free-function form for flush callbacks)
pub fn send_chunk<C: Connection>(conn: &mut C, payload: &str) -> crate::platform::Result<()> {
    if payload.is_empty() {
        return Ok(());
    }
    let mut head: heapless::String<16> = heapless::String::new();
    let _ = write!(head, "{:X}\r\n", payload.len());
    conn.write_all(head.as_bytes())?;
    conn.write_all(payload.as_bytes())?;
    conn.write_all(b"\r\n")
}

/// Send the terminating empty chunk
pub fn send_final_chunk<C: Connection>(conn: &mut C) -> crate::platform::Result<()> {
    conn.write_all(b"0\r\n\r\n")
}
