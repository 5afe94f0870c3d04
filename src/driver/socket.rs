//! Socket state machine.
//!
//! Models one hardware socket's lifecycle and translates it into register
//! commands: `open`, `listen`, `connect`, `disconnect`, `close` issue
//! Sn_CR commands, [`W5100s::poll_event`] reads the status register the
//! chip's offload engine maintains. Nothing here blocks; poll cadence and
//! retry policy belong to the session layer.
//!
//! `send` and `recv` move bytes through the chip's per-socket ring
//! buffers. Partial transfers are the normal case, not an error: `send`
//! writes at most the free TX space and reports the count, `recv` drains
//! at most what has arrived and zero means "no data yet".

use super::config::SocketProtocol;
use super::error::{ConfigError, Result, SocketError};
use crate::bus::{RegisterBlock, SocketIndex};
use crate::driver::chip::W5100s;
use crate::hal::transport::Transport;
use crate::internal::map::{sock, sock_cmd, sock_status};

/// Reads of the free-size/received-size counters repeat until two
/// consecutive values agree; the chip updates them asynchronously.
const STABLE_READ_ATTEMPTS: usize = 4;

// =============================================================================
// Socket State
// =============================================================================

/// Driver-side view of a hardware socket's lifecycle.
///
/// Derived from the Sn_SR status register; the transient TCP states the
/// chip walks through on its own (SYN exchange, FIN teardown) are folded
/// into `Connecting` and `Closing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketState {
    /// Free for `open`
    #[default]
    Closed,
    /// Opened in TCP mode, not yet listening or connecting
    Init,
    /// Waiting for an incoming connection
    Listening,
    /// Outgoing handshake in progress
    Connecting,
    /// Connection established, data may flow
    Established,
    /// Peer sent FIN; buffered data can still be drained
    CloseWait,
    /// Teardown in progress, waiting for the chip to reach closed
    Closing,
    /// Opened in UDP mode
    Udp,
}

impl SocketState {
    /// Map a raw Sn_SR value onto the driver-side state.
    pub(crate) fn from_status(raw: u8) -> core::result::Result<Self, SocketError> {
        match raw {
            sock_status::CLOSED => Ok(SocketState::Closed),
            sock_status::INIT => Ok(SocketState::Init),
            sock_status::LISTEN => Ok(SocketState::Listening),
            sock_status::SYNSENT | sock_status::SYNRECV => Ok(SocketState::Connecting),
            sock_status::ESTABLISHED => Ok(SocketState::Established),
            sock_status::CLOSE_WAIT => Ok(SocketState::CloseWait),
            sock_status::FIN_WAIT
            | sock_status::CLOSING
            | sock_status::TIME_WAIT
            | sock_status::LAST_ACK => Ok(SocketState::Closing),
            sock_status::UDP => Ok(SocketState::Udp),
            other => Err(SocketError::UnknownStatus(other)),
        }
    }

    /// Whether data transfer commands are accepted in this state.
    ///
    /// `CloseWait` still carries data: the peer has sent its FIN but our
    /// half of the connection, and anything buffered on the chip, remains
    /// live until we close.
    pub const fn can_transfer(self) -> bool {
        matches!(
            self,
            SocketState::Established | SocketState::CloseWait | SocketState::Udp
        )
    }
}

// =============================================================================
// Connection Events
// =============================================================================

/// Outcome of one non-blocking [`W5100s::poll_event`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionEvent {
    /// Nothing changed; poll again later
    NoEvent,
    /// A connection was established since the last poll
    Connected,
    /// The connection is gone and all buffered data has been drained
    Closed,
}

// =============================================================================
// Socket Descriptor
// =============================================================================

/// Driver-side bookkeeping for one hardware socket.
///
/// One instance per socket slot, created at driver init and recycled on
/// close, never destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketDescriptor {
    state: SocketState,
    protocol: Option<SocketProtocol>,
    port: u16,
    buffer_size: u16,
}

impl SocketDescriptor {
    /// A closed descriptor with no buffer memory assigned.
    pub(crate) const IDLE: Self = Self::idle_with_buffers(0);

    pub(crate) const fn idle_with_buffers(buffer_size: u16) -> Self {
        Self {
            state: SocketState::Closed,
            protocol: None,
            port: 0,
            buffer_size,
        }
    }

    /// Last observed lifecycle state.
    pub fn state(&self) -> SocketState {
        self.state
    }

    /// Protocol the socket was opened in, if any.
    pub fn protocol(&self) -> Option<SocketProtocol> {
        self.protocol
    }

    /// Bound local port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// TX (and, separately, RX) buffer bytes assigned to this socket.
    /// Zero means the buffer layout leaves this slot unusable.
    pub fn buffer_size(&self) -> u16 {
        self.buffer_size
    }
}

// =============================================================================
// Socket Operations
// =============================================================================

impl<T: Transport> W5100s<T> {
    /// Open a socket in the given protocol mode, bound to `port`.
    ///
    /// Fails with [`SocketError::Busy`] unless the socket is closed, and
    /// with `ConfigError::InvalidConfig` for a slot the active buffer
    /// layout leaves without memory.
    pub fn open(
        &mut self,
        socket: SocketIndex,
        protocol: SocketProtocol,
        port: u16,
    ) -> Result<()> {
        self.expect_ready()?;
        if self.sockets[socket.index()].buffer_size == 0 {
            return Err(ConfigError::InvalidConfig.into());
        }
        if self.refresh_state(socket)? != SocketState::Closed {
            return Err(SocketError::Busy.into());
        }

        let bank = RegisterBlock::Socket(socket);
        self.bus.write_u8(bank, sock::MR, protocol.mode_bits())?;
        self.bus.write_u16(bank, sock::PORT, port)?;
        self.command(socket, sock_cmd::OPEN)?;

        let expected = match protocol {
            SocketProtocol::Tcp => SocketState::Init,
            SocketProtocol::Udp => SocketState::Udp,
        };
        if self.refresh_state(socket)? != expected {
            return Err(SocketError::InvalidTransition.into());
        }

        let descriptor = &mut self.sockets[socket.index()];
        descriptor.protocol = Some(protocol);
        descriptor.port = port;
        Ok(())
    }

    /// Start listening for an incoming TCP connection.
    ///
    /// Valid only from `Init`; any other state is an `InvalidTransition`
    /// and leaves the socket untouched.
    pub fn listen(&mut self, socket: SocketIndex) -> Result<()> {
        self.expect_ready()?;
        if self.refresh_state(socket)? != SocketState::Init {
            return Err(SocketError::InvalidTransition.into());
        }
        self.command(socket, sock_cmd::LISTEN)?;
        self.refresh_state(socket)?;
        Ok(())
    }

    /// Initiate an outgoing TCP connection.
    ///
    /// Non-blocking: the handshake completes (or fails) on the chip;
    /// observe the result through [`poll_event`](W5100s::poll_event).
    pub fn connect(&mut self, socket: SocketIndex, ip: [u8; 4], port: u16) -> Result<()> {
        self.expect_ready()?;
        if self.refresh_state(socket)? != SocketState::Init {
            return Err(SocketError::InvalidTransition.into());
        }
        let bank = RegisterBlock::Socket(socket);
        self.bus.write_buf(bank, sock::DIPR, &ip)?;
        self.bus.write_u16(bank, sock::DPORT, port)?;
        self.command(socket, sock_cmd::CONNECT)?;
        self.refresh_state(socket)?;
        Ok(())
    }

    /// Non-blocking connection status poll.
    ///
    /// A peer FIN is reported as `Closed` only once the RX buffer is
    /// empty, so buffered bytes are never lost to an early close.
    pub fn poll_event(&mut self, socket: SocketIndex) -> Result<ConnectionEvent> {
        self.expect_ready()?;
        let previous = self.sockets[socket.index()].state;
        let current = self.refresh_state(socket)?;

        let event = match current {
            SocketState::Established if previous != SocketState::Established => {
                ConnectionEvent::Connected
            }
            SocketState::CloseWait => {
                if previous != SocketState::Established && previous != SocketState::CloseWait {
                    // Connection and FIN both arrived between polls;
                    // surface the connection so pending data drains first.
                    ConnectionEvent::Connected
                } else if self.stable_u16(socket, sock::RX_RSR)? == 0 {
                    ConnectionEvent::Closed
                } else {
                    ConnectionEvent::NoEvent
                }
            }
            SocketState::Closed if previous != SocketState::Closed => ConnectionEvent::Closed,
            _ => ConnectionEvent::NoEvent,
        };
        Ok(event)
    }

    /// Write up to `data.len()` bytes into the TX ring and trigger a send.
    ///
    /// Returns the number of bytes accepted, bounded by the chip's free
    /// TX space. Zero means the ring is full; retry after the chip has
    /// drained it.
    pub fn send(&mut self, socket: SocketIndex, data: &[u8]) -> Result<usize> {
        self.expect_ready()?;
        self.expect_transferable(socket)?;
        if !self.is_link_up()? {
            return Err(SocketError::LinkDown.into());
        }

        let free = self.stable_u16(socket, sock::TX_FSR)?;
        let count = data.len().min(free as usize);
        if count == 0 {
            return Ok(0);
        }

        let bank = RegisterBlock::Socket(socket);
        let wr = self.bus.read_u16(bank, sock::TX_WR)?;
        self.ring_write(socket, wr, &data[..count])?;
        self.bus
            .write_u16(bank, sock::TX_WR, wr.wrapping_add(count as u16))?;
        self.command(socket, sock_cmd::SEND)?;
        Ok(count)
    }

    /// Drain up to `buf.len()` received bytes from the RX ring.
    ///
    /// Returns the number of bytes read; zero means no data has arrived
    /// yet, which is not a closed-connection signal.
    pub fn recv(&mut self, socket: SocketIndex, buf: &mut [u8]) -> Result<usize> {
        self.expect_ready()?;
        self.expect_transferable(socket)?;
        if !self.is_link_up()? {
            return Err(SocketError::LinkDown.into());
        }

        let pending = self.stable_u16(socket, sock::RX_RSR)?;
        let count = buf.len().min(pending as usize);
        if count == 0 {
            return Ok(0);
        }

        let bank = RegisterBlock::Socket(socket);
        let rd = self.bus.read_u16(bank, sock::RX_RD)?;
        self.ring_read(socket, rd, &mut buf[..count])?;
        self.bus
            .write_u16(bank, sock::RX_RD, rd.wrapping_add(count as u16))?;
        self.command(socket, sock_cmd::RECV)?;
        Ok(count)
    }

    /// Graceful disconnect: send a FIN and let the chip walk the TCP
    /// teardown. Only meaningful on a live TCP connection; use
    /// [`close`](W5100s::close) everywhere else.
    pub fn disconnect(&mut self, socket: SocketIndex) -> Result<()> {
        self.expect_ready()?;
        match self.refresh_state(socket)? {
            SocketState::Established | SocketState::CloseWait => {
                self.command(socket, sock_cmd::DISCON)?;
                self.refresh_state(socket)?;
                Ok(())
            }
            _ => Err(SocketError::InvalidTransition.into()),
        }
    }

    /// Close a socket and reclaim it for reuse.
    ///
    /// Idempotent: closing a closed socket succeeds and leaves it closed.
    pub fn close(&mut self, socket: SocketIndex) -> Result<()> {
        self.expect_ready()?;
        self.command(socket, sock_cmd::CLOSE)?;
        let buffer_size = self.sockets[socket.index()].buffer_size;
        self.sockets[socket.index()] = SocketDescriptor::idle_with_buffers(buffer_size);
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Read Sn_SR and fold it into the descriptor.
    fn refresh_state(&mut self, socket: SocketIndex) -> Result<SocketState> {
        let raw = self
            .bus
            .read_u8(RegisterBlock::Socket(socket), sock::SR)?;
        let state = SocketState::from_status(raw)?;
        self.sockets[socket.index()].state = state;
        Ok(state)
    }

    fn expect_transferable(&mut self, socket: SocketIndex) -> Result<()> {
        if self.refresh_state(socket)?.can_transfer() {
            Ok(())
        } else {
            Err(SocketError::InvalidTransition.into())
        }
    }

    /// Issue an Sn_CR command and wait for the register to self-clear.
    fn command(&mut self, socket: SocketIndex, command: u8) -> Result<()> {
        let bank = RegisterBlock::Socket(socket);
        self.bus.write_u8(bank, sock::CR, command)?;
        // The command register clears within a few register-read times;
        // the SPI round-trips below dominate, no delay needed.
        for _ in 0..STABLE_READ_ATTEMPTS {
            if self.bus.read_u8(bank, sock::CR)? == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Read a 16-bit counter the chip updates asynchronously: repeat
    /// until two consecutive reads agree.
    fn stable_u16(&mut self, socket: SocketIndex, offset: u16) -> Result<u16> {
        let bank = RegisterBlock::Socket(socket);
        let mut last = self.bus.read_u16(bank, offset)?;
        for _ in 0..STABLE_READ_ATTEMPTS {
            let next = self.bus.read_u16(bank, offset)?;
            if next == last {
                break;
            }
            last = next;
        }
        Ok(last)
    }

    /// Copy into the socket's TX ring window, splitting at the wrap.
    fn ring_write(&mut self, socket: SocketIndex, ptr: u16, data: &[u8]) -> Result<()> {
        let size = self.sockets[socket.index()].buffer_size;
        let mask = size - 1;
        let window = socket.index() as u16 * size;
        let offset = ptr & mask;

        let first = data.len().min((size - offset) as usize);
        self.bus
            .write_buf(RegisterBlock::TxBuffer, window + offset, &data[..first])?;
        if first < data.len() {
            self.bus
                .write_buf(RegisterBlock::TxBuffer, window, &data[first..])?;
        }
        Ok(())
    }

    /// Copy out of the socket's RX ring window, splitting at the wrap.
    fn ring_read(&mut self, socket: SocketIndex, ptr: u16, buf: &mut [u8]) -> Result<()> {
        let size = self.sockets[socket.index()].buffer_size;
        let mask = size - 1;
        let window = socket.index() as u16 * size;
        let offset = ptr & mask;

        let first = buf.len().min((size - offset) as usize);
        self.bus
            .read_buf(RegisterBlock::RxBuffer, window + offset, &mut buf[..first])?;
        let remaining = buf.len() - first;
        if remaining > 0 {
            self.bus
                .read_buf(RegisterBlock::RxBuffer, window, &mut buf[first..])?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
