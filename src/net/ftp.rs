//! Asynchronous FTP client
//!
//! Uploads application-produced byte streams to a remote server without
//! blocking the main tick. The control dialog (USER/PASS/PASV/APPE/QUIT)
//! is an explicit state machine advanced by `run_async`; each append job
//! opens one short-lived passive-mode data connection and hands it to the
//! job's writer as a byte sink.
//!
//! No job is retried here: on any unexpected response the machine parks in
//! `Error` with the offending command and response recorded, and the
//! application decides whether to enqueue again.

use crate::platform::error::NetError;
use crate::platform::traits::{ClockInterface, Connection, TcpStack};
use crate::platform::Result;
use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Default control-connection read timeout
pub const DEFAULT_TIMEOUT_MS: u32 = 2_000;

/// Control dialog states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FtpState {
    /// Nothing pending
    Idle,
    /// Opening the control connection
    Connect,
    /// Awaiting the 220 greeting
    Welcome,
    /// USER sent, awaiting 331 (or 2xx when no password is required)
    User,
    /// PASS sent, awaiting 230
    Password,
    /// PASV sent, awaiting 227
    Passive,
    /// APPE sent, awaiting 150, then streaming the job's data
    ExecCommand,
    /// Data sent, awaiting 226
    FinishCommand,
    /// QUIT sent, awaiting 221
    End,
    /// All jobs transferred, connection closed
    Done,
    /// Protocol or transport error; see `last_error`
    Error,
}

/// Byte-sink writer supplied with each append job
pub type JobWriter = Box<dyn FnMut(&mut dyn Connection) -> Result<()>>;

struct Job {
    filename: String,
    writer: JobWriter,
}

/// Asynchronous FTP append client
pub struct FtpClient<S: TcpStack> {
    state: FtpState,
    host: String,
    user: String,
    pass: String,
    port: u16,
    timeout_ms: u32,
    jobs: VecDeque<Job>,
    ctrl: Option<S::Conn>,
    data: Option<S::Conn>,
    line: Vec<u8>,
    last_command: String,
    last_response: String,
    last_error: Option<String>,
    state_since_ms: u64,
    echo: Option<Box<dyn FnMut(&str)>>,
}

impl<S: TcpStack> FtpClient<S> {
    /// Client with the given control read timeout
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            state: FtpState::Idle,
            host: String::new(),
            user: String::new(),
            pass: String::new(),
            port: 21,
            timeout_ms,
            jobs: VecDeque::new(),
            ctrl: None,
            data: None,
            line: Vec::new(),
            last_command: String::new(),
            last_response: String::new(),
            last_error: None,
            state_since_ms: 0,
            echo: None,
        }
    }

    /// Arm the client: credentials, port, optional dialog echo sink.
    ///
    /// Clears the job queue and any previous outcome.
    pub fn begin_async(
        &mut self,
        host: &str,
        user: &str,
        pass: &str,
        port: u16,
        echo: Option<Box<dyn FnMut(&str)>>,
    ) {
        self.host = host.to_string();
        self.user = user.to_string();
        self.pass = pass.to_string();
        self.port = port;
        self.echo = echo;
        self.jobs.clear();
        self.ctrl = None;
        self.data = None;
        self.line.clear();
        self.last_command.clear();
        self.last_response.clear();
        self.last_error = None;
        self.state = FtpState::Idle;
    }

    /// Enqueue one append job; starts the dialog when idle
    pub fn append_async(
        &mut self,
        filename: &str,
        writer: impl FnMut(&mut dyn Connection) -> Result<()> + 'static,
    ) {
        self.jobs.push_back(Job {
            filename: filename.to_string(),
            writer: Box::new(writer),
        });
        if self.state == FtpState::Idle {
            self.state = FtpState::Connect;
        }
    }

    /// Current state
    pub fn state(&self) -> FtpState {
        self.state
    }

    /// Error description; set iff the state is `Error`
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Jobs not yet transferred
    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Reset to `Idle` after the caller has observed the outcome
    pub fn end_async(&mut self) {
        self.close_all();
        self.jobs.clear();
        self.state = FtpState::Idle;
    }

    /// Advance one step; returns true once `Done` or `Error` is reached.
    ///
    /// Must be called on every tick while a transfer is pending.
    pub fn run_async(&mut self, stack: &mut S, clock: &impl ClockInterface) -> bool {
        let now = clock.millis();
        match self.state {
            FtpState::Idle | FtpState::Done | FtpState::Error => return true,

            FtpState::Connect => {
                match stack.connect(&self.host, self.port, self.timeout_ms) {
                    Ok(conn) => {
                        self.ctrl = Some(conn);
                        self.line.clear();
                        self.enter(FtpState::Welcome, now);
                    }
                    Err(_) => self.fail("control connect failed"),
                }
            }

            FtpState::Welcome => {
                if let Some(code) = self.poll_response(now) {
                    if code == 220 {
                        self.send(format!("USER {}", self.user));
                        self.enter(FtpState::User, now);
                    } else {
                        self.fail_response();
                    }
                }
            }

            FtpState::User => {
                if let Some(code) = self.poll_response(now) {
                    if code == 331 {
                        self.send(format!("PASS {}", self.pass));
                        self.enter(FtpState::Password, now);
                    } else if (200..300).contains(&code) {
                        self.next_transfer(now);
                    } else {
                        self.fail_response();
                    }
                }
            }

            FtpState::Password => {
                if let Some(code) = self.poll_response(now) {
                    if (200..300).contains(&code) {
                        self.next_transfer(now);
                    } else {
                        self.fail_response();
                    }
                }
            }

            FtpState::Passive => {
                if let Some(code) = self.poll_response(now) {
                    if code == 227 {
                        match parse_passive(&self.last_response) {
                            Some((ip, port)) => {
                                let host = format!("{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]);
                                match stack.connect(&host, port, self.timeout_ms) {
                                    Ok(conn) => {
                                        self.data = Some(conn);
                                        let filename =
                                            self.jobs.front().map(|j| j.filename.clone());
                                        if let Some(filename) = filename {
                                            self.send(format!("APPE {}", filename));
                                            self.enter(FtpState::ExecCommand, now);
                                        } else {
                                            self.fail("no job for data connection");
                                        }
                                    }
                                    Err(_) => self.fail("data connect failed"),
                                }
                            }
                            None => self.fail_response(),
                        }
                    } else {
                        self.fail_response();
                    }
                }
            }

            FtpState::ExecCommand => {
                if let Some(code) = self.poll_response(now) {
                    if code == 150 || (200..300).contains(&code) {
                        let outcome = match (self.jobs.front_mut(), self.data.as_mut()) {
                            (Some(job), Some(data)) => {
                                let result = (job.writer)(&mut *data);
                                data.close();
                                result
                            }
                            _ => Err(NetError::Closed.into()),
                        };
                        self.data = None;
                        match outcome {
                            Ok(()) => self.enter(FtpState::FinishCommand, now),
                            Err(_) => self.fail("data write failed"),
                        }
                    } else {
                        self.fail_response();
                    }
                }
            }

            FtpState::FinishCommand => {
                if let Some(code) = self.poll_response(now) {
                    if code == 226 || (200..300).contains(&code) {
                        drop(self.jobs.pop_front());
                        self.next_transfer(now);
                    } else {
                        self.fail_response();
                    }
                }
            }

            FtpState::End => {
                if let Some(code) = self.poll_response(now) {
                    if (200..300).contains(&code) {
                        self.close_all();
                        self.state = FtpState::Done;
                    } else {
                        self.fail_response();
                    }
                }
            }
        }

        matches!(self.state, FtpState::Done | FtpState::Error)
    }

    /// Synchronous wrapper: step with a short sleep until done
    pub fn run(&mut self, stack: &mut S, clock: &mut impl ClockInterface) -> bool {
        loop {
            if self.run_async(stack, clock) {
                return self.state == FtpState::Done;
            }
            clock.delay_ms(10);
        }
    }

    /// Send PASV for the next job, or QUIT when the queue is empty
    fn next_transfer(&mut self, now: u64) {
        if self.jobs.is_empty() {
            self.send("QUIT".to_string());
            self.enter(FtpState::End, now);
        } else {
            self.send("PASV".to_string());
            self.enter(FtpState::Passive, now);
        }
    }

    fn enter(&mut self, state: FtpState, now: u64) {
        self.state = state;
        self.state_since_ms = now;
    }

    fn send(&mut self, command: String) {
        if let Some(echo) = self.echo.as_mut() {
            echo(&command);
        }
        self.last_command = command;
        if let Some(ctrl) = self.ctrl.as_mut() {
            let mut wire = self.last_command.clone();
            wire.push_str("\r\n");
            if ctrl.write_all(wire.as_bytes()).is_err() {
                self.fail("control write failed");
            }
        }
    }

    /// Poll for one complete, code-bearing response line.
    ///
    /// Multi-line replies ("220-") are skipped until their final line.
    /// Returns the numeric code once available; trips the timeout into
    /// `Error` otherwise.
    fn poll_response(&mut self, now: u64) -> Option<u16> {
        let Some(ctrl) = self.ctrl.as_mut() else {
            self.fail("control connection lost");
            return None;
        };

        let mut buf = [0u8; 128];
        match ctrl.read(&mut buf) {
            Ok(n) => self.line.extend_from_slice(&buf[..n]),
            Err(_) => {
                self.fail("control read failed");
                return None;
            }
        }

        while let Some(pos) = self.line.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.line.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw);
            let text = text.trim_end();
            if let Some(echo) = self.echo.as_mut() {
                echo(text);
            }
            if let Some(code) = parse_code(text) {
                self.last_response = text.to_string();
                return Some(code);
            }
        }

        if now.saturating_sub(self.state_since_ms) >= self.timeout_ms as u64 {
            self.fail("control read timeout");
        }
        None
    }

    fn fail(&mut self, reason: &str) {
        self.last_error = Some(format!(
            "{} (command: {}, response: {})",
            reason, self.last_command, self.last_response
        ));
        self.close_all();
        self.state = FtpState::Error;
    }

    fn fail_response(&mut self) {
        let error = format!(
            "unexpected response (command: {}, response: {})",
            self.last_command, self.last_response
        );
        self.last_error = Some(error);
        self.close_all();
        self.state = FtpState::Error;
    }

    fn close_all(&mut self) {
        if let Some(mut conn) = self.data.take() {
            conn.close();
        }
        if let Some(mut conn) = self.ctrl.take() {
            conn.close();
        }
    }
}

/// Final response lines carry a three-digit code followed by a space (or
/// end of line); continuation lines use a hyphen
fn parse_code(line: &str) -> Option<u16> {
    let bytes = line.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if bytes.len() > 3 && bytes[3] == b'-' {
        return None;
    }
    line[..3].parse().ok()
}

/// Parse "227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)"
fn parse_passive(line: &str) -> Option<([u8; 4], u16)> {
    let start = line.find('(')?;
    let end = line[start..].find(')')? + start;
    let mut parts = line[start + 1..end].split(',');
    let mut take = || parts.next()?.trim().parse::<u8>().ok();
    let ip = [take()?, take()?, take()?, take()?];
    let p1 = take()? as u16;
    let p2 = take()? as u16;
    Some((ip, p1 * 256 + p2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{MockClock, MockConnection, MockStack};
    use alloc::rc::Rc;
    use core::cell::RefCell;

    fn script_login(ctrl: &MockConnection) {
        ctrl.push_read(b"220 embernet test server\r\n");
        ctrl.auto_reply("USER", b"331 Password required\r\n");
        ctrl.auto_reply("PASS", b"230 Logged in\r\n");
        ctrl.auto_reply("PASV", b"227 Entering Passive Mode (127,0,0,1,195,149)\r\n");
        ctrl.auto_reply("APPE", b"150 Opening data connection\r\n226 Transfer complete\r\n");
        ctrl.auto_reply("QUIT", b"221 Goodbye\r\n");
    }

    fn drive(
        client: &mut FtpClient<MockStack>,
        stack: &mut MockStack,
        clock: &MockClock,
        max_steps: u32,
    ) -> bool {
        for _ in 0..max_steps {
            clock.advance(10);
            if client.run_async(stack, clock) {
                return true;
            }
        }
        false
    }

    #[test]
    fn appends_jobs_in_enqueue_order() {
        let mut stack = MockStack::new();
        let clock = MockClock::new();
        let ctrl = stack.expect_connect();
        script_login(&ctrl);
        let data1 = stack.expect_connect();
        let data2 = stack.expect_connect();

        let order: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));

        let mut client: FtpClient<MockStack> = FtpClient::new(DEFAULT_TIMEOUT_MS);
        client.begin_async("ftp.local", "logger", "secret", 21, None);

        let o = order.clone();
        client.append_async("heatmon.csv", move |conn| {
            o.borrow_mut().push(1);
            conn.write_all(b"t;watts\n1;100\n")
        });
        let o = order.clone();
        client.append_async("heatmon-2.csv", move |conn| {
            o.borrow_mut().push(2);
            conn.write_all(b"t;watts\n2;200\n")
        });

        assert!(drive(&mut client, &mut stack, &clock, 100));
        assert_eq!(client.state(), FtpState::Done);
        assert_eq!(client.last_error(), None);
        assert_eq!(*order.borrow(), [1, 2]);

        assert_eq!(data1.written(), b"t;watts\n1;100\n");
        assert_eq!(data2.written(), b"t;watts\n2;200\n");
        assert!(data1.is_closed());
        assert!(data2.is_closed());

        let dialog = ctrl.written_string();
        assert!(dialog.contains("USER logger\r\n"));
        assert!(dialog.contains("PASS secret\r\n"));
        assert!(dialog.contains("APPE heatmon.csv\r\n"));
        assert!(dialog.contains("APPE heatmon-2.csv\r\n"));
        assert!(dialog.ends_with("QUIT\r\n"));
        // One fresh PASV per job
        assert_eq!(dialog.matches("PASV\r\n").count(), 2);

        // Data connections went to the address announced in 227
        let log = stack.connect_log();
        assert_eq!(log[1].host, "127.0.0.1");
        assert_eq!(log[1].port, 195 * 256 + 149);
    }

    #[test]
    fn rejected_login_parks_in_error_without_touching_writers() {
        let mut stack = MockStack::new();
        let clock = MockClock::new();
        let ctrl = stack.expect_connect();
        ctrl.push_read(b"220 server\r\n");
        ctrl.auto_reply("USER", b"530 Not welcome\r\n");

        let invoked = Rc::new(RefCell::new(false));
        let mut client: FtpClient<MockStack> = FtpClient::new(DEFAULT_TIMEOUT_MS);
        client.begin_async("ftp.local", "logger", "secret", 21, None);
        let flag = invoked.clone();
        client.append_async("heatmon.csv", move |_conn| {
            *flag.borrow_mut() = true;
            Ok(())
        });

        assert!(drive(&mut client, &mut stack, &clock, 100));
        assert_eq!(client.state(), FtpState::Error);
        let error = client.last_error().unwrap();
        assert!(error.contains("USER logger"));
        assert!(error.contains("530"));
        assert!(!*invoked.borrow());
    }

    #[test]
    fn pasv_read_timeout_releases_the_sockets() {
        let mut stack = MockStack::new();
        let clock = MockClock::new();
        let ctrl = stack.expect_connect();
        ctrl.push_read(b"220 server\r\n");
        ctrl.auto_reply("USER", b"331 Password required\r\n");
        ctrl.auto_reply("PASS", b"230 Logged in\r\n");
        // No reply to PASV

        let mut client: FtpClient<MockStack> = FtpClient::new(DEFAULT_TIMEOUT_MS);
        client.begin_async("ftp.local", "logger", "secret", 21, None);
        client.append_async("heatmon.csv", |_conn| Ok(()));

        assert!(drive(&mut client, &mut stack, &clock, 1000));
        assert_eq!(client.state(), FtpState::Error);
        assert!(client.last_error().unwrap().contains("timeout"));
        assert!(ctrl.is_closed());
    }

    #[test]
    fn multiline_greeting_is_skipped_to_the_final_line() {
        let mut stack = MockStack::new();
        let clock = MockClock::new();
        let ctrl = stack.expect_connect();
        ctrl.push_read(b"220-Welcome to\r\n220-the test server\r\n220 Ready\r\n");
        ctrl.auto_reply("USER", b"230 Anonymous ok\r\n");
        ctrl.auto_reply("PASV", b"227 Entering Passive Mode (10,0,0,1,4,1)\r\n");
        ctrl.auto_reply("APPE", b"150 Go\r\n226 Done\r\n");
        ctrl.auto_reply("QUIT", b"221 Bye\r\n");
        let _data = stack.expect_connect();

        let mut client: FtpClient<MockStack> = FtpClient::new(DEFAULT_TIMEOUT_MS);
        client.begin_async("ftp.local", "anonymous", "", 21, None);
        client.append_async("log.csv", |conn| conn.write_all(b"x\n"));

        assert!(drive(&mut client, &mut stack, &clock, 100));
        assert_eq!(client.state(), FtpState::Done);
        // No PASS was needed
        assert!(!ctrl.written_string().contains("PASS"));
    }

    #[test]
    fn synchronous_run_completes_in_one_call() {
        let mut stack = MockStack::new();
        let mut clock = MockClock::new();
        let ctrl = stack.expect_connect();
        script_login(&ctrl);
        let _data = stack.expect_connect();

        let echoed: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = echoed.clone();

        let mut client: FtpClient<MockStack> = FtpClient::new(DEFAULT_TIMEOUT_MS);
        client.begin_async(
            "ftp.local",
            "logger",
            "secret",
            21,
            Some(Box::new(move |line| sink.borrow_mut().push(line.into()))),
        );
        client.append_async("log.csv", |conn| conn.write_all(b"row\n"));

        assert!(client.run(&mut stack, &mut clock));
        assert_eq!(client.state(), FtpState::Done);
        assert!(echoed.borrow().iter().any(|l| l.starts_with("220")));
        assert!(echoed.borrow().iter().any(|l| l == "QUIT"));

        client.end_async();
        assert_eq!(client.state(), FtpState::Idle);
    }
}
