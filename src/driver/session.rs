//! Network session driver.
//!
//! Drives one hardware socket through an application-level exchange on
//! top of the socket state machine. [`EchoServer`] implements the TCP
//! loopback service: accept a connection, echo every received byte back
//! on the same connection, recycle the socket when the peer leaves.
//!
//! The driver is a pure poll loop. Each [`EchoServer::service`] call does
//! one bounded unit of work and returns a [`ServiceEvent`]; the caller
//! owns the cadence. Retry and backoff live here and nowhere below:
//! lower layers report "not ready" and never wait.
//!
//! Partial transfers are handled by buffering: bytes received but not yet
//! fully echoed stay staged in the server until the chip accepts them,
//! across as many `service` calls as that takes. A link-down report
//! suspends traffic without touching the socket; the session resumes
//! where it left off once the link returns.

use super::config::SocketProtocol;
use super::error::{Error, Result, SocketError};
use crate::bus::SocketIndex;
use crate::driver::chip::W5100s;
use crate::driver::socket::ConnectionEvent;
use crate::hal::transport::Transport;

/// TCP port the loopback service traditionally listens on.
pub const ECHO_PORT: u16 = 5000;

// =============================================================================
// Service Events
// =============================================================================

/// What one [`EchoServer::service`] call accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceEvent {
    /// Nothing to do; poll again later
    Idle,
    /// A client connected
    Accepted,
    /// Echoed this many bytes back to the client
    Echoed(usize),
    /// The connection ended; the socket is listening again
    Recycled,
    /// Link went down; traffic is suspended, the socket stays up
    Suspended,
    /// Link came back; traffic resumes
    Resumed,
}

// =============================================================================
// Echo Server
// =============================================================================

/// TCP loopback echo service over one hardware socket.
///
/// `N` sizes the staging buffer for bytes received but not yet echoed;
/// it bounds how much one `service` call moves, not how much a client
/// may send.
///
/// # Example
///
/// ```ignore
/// let mut server: EchoServer<512> = EchoServer::new(SocketIndex::Socket0, ECHO_PORT);
/// server.start(&mut chip)?;
/// loop {
///     match server.service(&mut chip)? {
///         ServiceEvent::Idle => delay.delay_ms(1),
///         event => info!("echo: {:?}", event),
///     }
/// }
/// ```
pub struct EchoServer<const N: usize> {
    socket: SocketIndex,
    port: u16,
    buf: [u8; N],
    /// Bytes staged in `buf`.
    len: usize,
    /// Bytes of `buf[..len]` already echoed back.
    echoed: usize,
    started: bool,
    suspended: bool,
}

impl<const N: usize> EchoServer<N> {
    /// Bind the service to a socket slot and TCP port. No chip traffic
    /// until [`start`](EchoServer::start).
    pub const fn new(socket: SocketIndex, port: u16) -> Self {
        Self {
            socket,
            port,
            buf: [0; N],
            len: 0,
            echoed: 0,
            started: false,
            suspended: false,
        }
    }

    /// Open the socket and start listening.
    pub fn start<T: Transport>(&mut self, chip: &mut W5100s<T>) -> Result<()> {
        chip.open(self.socket, SocketProtocol::Tcp, self.port)?;
        chip.listen(self.socket)?;
        self.started = true;
        Ok(())
    }

    /// Whether traffic is currently suspended on a link-down report.
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Bytes received from the client but not yet echoed back.
    pub fn pending(&self) -> usize {
        self.len - self.echoed
    }

    /// Run one bounded unit of service work.
    ///
    /// Chip-reported socket errors recycle the socket and keep the
    /// service alive; bus and configuration errors propagate to the
    /// caller, who owns recovery of the chip itself.
    pub fn service<T: Transport>(&mut self, chip: &mut W5100s<T>) -> Result<ServiceEvent> {
        if !self.started {
            self.start(chip)?;
            return Ok(ServiceEvent::Idle);
        }

        if !chip.is_link_up()? {
            if self.suspended {
                return Ok(ServiceEvent::Idle);
            }
            self.suspended = true;
            return Ok(ServiceEvent::Suspended);
        }
        if self.suspended {
            self.suspended = false;
            return Ok(ServiceEvent::Resumed);
        }

        match chip.poll_event(self.socket) {
            Ok(ConnectionEvent::Connected) => {
                self.len = 0;
                self.echoed = 0;
                return Ok(ServiceEvent::Accepted);
            }
            Ok(ConnectionEvent::Closed) => return self.recycle(chip),
            Ok(ConnectionEvent::NoEvent) => {}
            Err(Error::Socket(_)) => return self.recycle(chip),
            Err(e) => return Err(e),
        }

        if !chip.socket(self.socket).state().can_transfer() {
            return Ok(ServiceEvent::Idle);
        }
        self.pump(chip)
    }

    /// Move bytes: finish echoing staged data first, then pull more.
    fn pump<T: Transport>(&mut self, chip: &mut W5100s<T>) -> Result<ServiceEvent> {
        if self.pending() == 0 {
            self.len = match self.transfer(chip, |server, chip| {
                chip.recv(server.socket, &mut server.buf)
            })? {
                Some(n) => n,
                None => return Ok(ServiceEvent::Suspended),
            };
            self.echoed = 0;
            if self.len == 0 {
                return Ok(ServiceEvent::Idle);
            }
        }

        let sent = match self.transfer(chip, |server, chip| {
            chip.send(server.socket, &server.buf[server.echoed..server.len])
        })? {
            Some(n) => n,
            None => return Ok(ServiceEvent::Suspended),
        };
        self.echoed += sent;
        if self.echoed == self.len {
            self.len = 0;
            self.echoed = 0;
        }
        Ok(ServiceEvent::Echoed(sent))
    }

    /// Run a transfer, folding a mid-call link drop into suspension
    /// rather than an error. `None` means "suspended".
    fn transfer<T, F>(&mut self, chip: &mut W5100s<T>, op: F) -> Result<Option<usize>>
    where
        T: Transport,
        F: FnOnce(&mut Self, &mut W5100s<T>) -> Result<usize>,
    {
        match op(self, chip) {
            Ok(n) => Ok(Some(n)),
            Err(Error::Socket(SocketError::LinkDown)) => {
                self.suspended = true;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Close the socket and return it to listening. Staged data from the
    /// dead connection is dropped.
    fn recycle<T: Transport>(&mut self, chip: &mut W5100s<T>) -> Result<ServiceEvent> {
        self.len = 0;
        self.echoed = 0;
        chip.close(self.socket)?;
        chip.open(self.socket, SocketProtocol::Tcp, self.port)?;
        chip.listen(self.socket)?;
        Ok(ServiceEvent::Recycled)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
