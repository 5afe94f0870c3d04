//! Testing utilities and mock implementations
//!
//! This module provides a simulated W5100S for testing the driver on the
//! host without hardware access. [`SimChip`] sits behind the [`Transport`]
//! trait, decodes the SPI opcode/address framing into a register memory
//! image, and executes socket commands the way the chip's offload engine
//! would, enough of it for the driver's state machine and session loop to
//! run end-to-end.
//!
//! Only available when running `cargo test`.

#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use crate::bus::SocketIndex;
use crate::driver::error::{BusError, BusResult};
use crate::hal::transport::Transport;
use crate::internal::map::{self, common, physr, sock, sock_cmd, sock_mode, sock_status};

// =============================================================================
// Sim Chip Handle
// =============================================================================

/// Simulated W5100S.
///
/// Cloning yields another handle to the same chip, so a test can hand one
/// handle to the driver and keep another to inject peer activity:
///
/// ```ignore
/// let chip = SimChip::new();
/// let peer = chip.clone();
/// let mut w5100s = W5100s::new(chip);
/// // ... later:
/// peer.connect_peer(SocketIndex::Socket0);
/// peer.push_rx(SocketIndex::Socket0, b"hello");
/// ```
#[derive(Clone)]
pub struct SimChip {
    inner: Rc<RefCell<Inner>>,
}

struct Inner {
    /// Full 32 KiB address space image (registers + buffer memory).
    mem: Vec<u8>,
    version: u8,
    link_up: bool,
    burst: bool,
    buf_size: u16,

    // Transport-level state
    selected: bool,
    frames: usize,
    /// Remaining byte transfers before an injected failure, if any.
    budget: Option<usize>,
    phase: Phase,

    // Observability
    tx_log: [Vec<u8>; map::SOCKET_COUNT],
    phy_resets: usize,
}

/// Where the frame decoder is within the current chip-select window.
enum Phase {
    /// Collecting opcode + 2 address bytes.
    Header { bytes: [u8; 3], len: usize },
    /// Header complete; data bytes auto-increment from `addr`.
    Data { opcode: u8, addr: u16 },
}

impl SimChip {
    pub fn new() -> Self {
        let mut inner = Inner {
            mem: std::vec![0; 0x8000],
            version: map::CHIP_VERSION,
            link_up: true,
            burst: false,
            buf_size: 2048,
            selected: false,
            frames: 0,
            budget: None,
            phase: Phase::Header {
                bytes: [0; 3],
                len: 0,
            },
            tx_log: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
            phy_resets: 0,
        };
        inner.power_on_reset();
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// Report burst capability to the register layer.
    pub fn with_burst(self) -> Self {
        self.inner.borrow_mut().burst = true;
        self
    }

    // =========================================================================
    // Test Hooks
    // =========================================================================

    /// Override the value the version register reports.
    pub fn set_version(&self, version: u8) {
        let mut inner = self.inner.borrow_mut();
        inner.version = version;
        let addr = common::VERSIONR as usize;
        inner.mem[addr] = version;
    }

    /// Fail the byte transfer after `transfers` successful ones. The
    /// fault is one-shot: traffic succeeds again afterwards, as with a
    /// transient glitch on the physical link.
    pub fn fail_after(&self, transfers: usize) {
        self.inner.borrow_mut().budget = Some(transfers);
    }

    /// Toggle the PHY link state.
    pub fn set_link(&self, up: bool) {
        let mut inner = self.inner.borrow_mut();
        inner.link_up = up;
        inner.update_physr();
    }

    /// A peer completes the TCP handshake with a listening (or connecting)
    /// socket.
    pub fn connect_peer(&self, socket: SocketIndex) {
        let mut inner = self.inner.borrow_mut();
        let sr = inner.sreg(socket, sock::SR);
        match inner.mem[sr] {
            sock_status::LISTEN | sock_status::SYNSENT | sock_status::SYNRECV => {
                inner.mem[sr] = sock_status::ESTABLISHED;
            }
            other => panic!("connect_peer on socket in status 0x{other:02x}"),
        }
    }

    /// The peer sends a FIN on an established connection.
    pub fn peer_close(&self, socket: SocketIndex) {
        let mut inner = self.inner.borrow_mut();
        let sr = inner.sreg(socket, sock::SR);
        assert_eq!(inner.mem[sr], sock_status::ESTABLISHED);
        inner.mem[sr] = sock_status::CLOSE_WAIT;
    }

    /// Deliver bytes from the peer into a socket's RX ring.
    pub fn push_rx(&self, socket: SocketIndex, data: &[u8]) {
        let mut inner = self.inner.borrow_mut();
        let size = inner.buf_size;
        let mask = size - 1;
        let base = map::RX_BUF_BASE as usize + socket.index() * size as usize;

        let mut wr = inner.read_reg16(socket, sock::RX_WR);
        for &byte in data {
            inner.mem[base + (wr & mask) as usize] = byte;
            wr = wr.wrapping_add(1);
        }
        inner.write_reg16(socket, sock::RX_WR, wr);
        let rd = inner.read_reg16(socket, sock::RX_RD);
        inner.write_reg16(socket, sock::RX_RSR, wr.wrapping_sub(rd));
    }

    /// Take everything the socket has transmitted so far.
    pub fn take_tx(&self, socket: SocketIndex) -> Vec<u8> {
        core::mem::take(&mut self.inner.borrow_mut().tx_log[socket.index()])
    }

    /// Raw socket status register value.
    pub fn socket_status(&self, socket: SocketIndex) -> u8 {
        let inner = self.inner.borrow();
        inner.mem[inner.sreg(socket, sock::SR)]
    }

    /// Force a raw socket status value (for unknown-status tests).
    pub fn force_socket_status(&self, socket: SocketIndex, status: u8) {
        let mut inner = self.inner.borrow_mut();
        let sr = inner.sreg(socket, sock::SR);
        inner.mem[sr] = status;
    }

    /// Raw memory peek, bypassing the frame decoder.
    pub fn peek(&self, addr: u16) -> u8 {
        self.inner.borrow().mem[addr as usize]
    }

    /// Number of chip-select windows opened so far.
    pub fn frames_started(&self) -> usize {
        self.inner.borrow().frames
    }

    /// Whether chip-select is currently asserted.
    pub fn is_selected(&self) -> bool {
        self.inner.borrow().selected
    }

    /// Number of PHY resets issued via PHYCR1.
    pub fn phy_resets(&self) -> usize {
        self.inner.borrow().phy_resets
    }
}

impl Default for SimChip {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Transport Implementation
// =============================================================================

impl Transport for SimChip {
    fn select(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.selected = true;
        inner.frames += 1;
        inner.phase = Phase::Header {
            bytes: [0; 3],
            len: 0,
        };
    }

    fn deselect(&mut self) {
        self.inner.borrow_mut().selected = false;
    }

    fn read_byte(&mut self) -> BusResult<u8> {
        let mut inner = self.inner.borrow_mut();
        inner.spend()?;
        assert!(inner.selected, "read outside chip-select window");
        match inner.phase {
            Phase::Data {
                opcode: map::op::READ,
                addr,
            } => {
                let value = inner.mem[addr as usize];
                inner.phase = Phase::Data {
                    opcode: map::op::READ,
                    addr: addr.wrapping_add(1),
                };
                Ok(value)
            }
            _ => panic!("read before a complete read header"),
        }
    }

    fn write_byte(&mut self, byte: u8) -> BusResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.spend()?;
        assert!(inner.selected, "write outside chip-select window");
        match inner.phase {
            Phase::Header { mut bytes, len } => {
                bytes[len] = byte;
                let len = len + 1;
                inner.phase = if len == 3 {
                    Phase::Data {
                        opcode: bytes[0],
                        addr: u16::from_be_bytes([bytes[1], bytes[2]]),
                    }
                } else {
                    Phase::Header { bytes, len }
                };
                Ok(())
            }
            Phase::Data {
                opcode: map::op::WRITE,
                addr,
            } => {
                inner.commit(addr, byte);
                inner.phase = Phase::Data {
                    opcode: map::op::WRITE,
                    addr: addr.wrapping_add(1),
                };
                Ok(())
            }
            Phase::Data { .. } => panic!("data write inside a read frame"),
        }
    }

    fn supports_burst(&self) -> bool {
        self.inner.borrow().burst
    }
}

// =============================================================================
// Chip Behavior
// =============================================================================

impl Inner {
    fn spend(&mut self) -> BusResult<()> {
        match self.budget {
            Some(0) => {
                self.budget = None;
                Err(BusError::Timeout)
            }
            Some(remaining) => {
                self.budget = Some(remaining - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn sreg(&self, socket: SocketIndex, offset: u16) -> usize {
        (map::SOCKET_REG_BASE + socket.as_u16() * map::SOCKET_REG_SIZE + offset) as usize
    }

    fn read_reg16(&self, socket: SocketIndex, offset: u16) -> u16 {
        let at = self.sreg(socket, offset);
        u16::from_be_bytes([self.mem[at], self.mem[at + 1]])
    }

    fn write_reg16(&mut self, socket: SocketIndex, offset: u16, value: u16) {
        let at = self.sreg(socket, offset);
        let bytes = value.to_be_bytes();
        self.mem[at] = bytes[0];
        self.mem[at + 1] = bytes[1];
    }

    fn update_physr(&mut self) {
        let at = common::PHYSR0 as usize;
        if self.link_up {
            self.mem[at] |= physr::LNK;
            self.mem[at] &= !physr::CABOFF;
        } else {
            self.mem[at] &= !physr::LNK;
            self.mem[at] |= physr::CABOFF;
        }
    }

    fn power_on_reset(&mut self) {
        self.mem.fill(0);
        self.mem[common::VERSIONR as usize] = self.version;
        // Datasheet reset defaults
        self.mem[common::RTR as usize] = 0x07;
        self.mem[common::RTR as usize + 1] = 0xD0;
        self.mem[common::RCR as usize] = 0x08;
        self.mem[common::RMSR as usize] = 0x55;
        self.mem[common::TMSR as usize] = 0x55;
        self.buf_size = 2048;
        for socket in SocketIndex::ALL {
            self.write_reg16(socket, sock::TX_FSR, self.buf_size);
        }
        self.update_physr();
    }

    /// Register write side effects.
    fn commit(&mut self, addr: u16, value: u8) {
        self.mem[addr as usize] = value;

        if addr == common::MR && value & map::mode::RST != 0 {
            self.power_on_reset();
            return;
        }

        if addr == common::TMSR || addr == common::RMSR {
            self.buf_size = match value {
                0x55 => 2048,
                0x0A => 4096,
                0x03 => 8192,
                _ => self.buf_size,
            };
            for socket in SocketIndex::ALL {
                if socket.index() < (8192 / self.buf_size as usize) {
                    self.write_reg16(socket, sock::TX_FSR, self.buf_size);
                }
            }
            return;
        }

        if addr == common::PHYCR1 && value & map::phycr1::RST != 0 {
            self.phy_resets += 1;
            self.mem[addr as usize] = 0;
            return;
        }

        // Socket command register?
        if addr >= map::SOCKET_REG_BASE {
            let bank = (addr - map::SOCKET_REG_BASE) / map::SOCKET_REG_SIZE;
            let offset = (addr - map::SOCKET_REG_BASE) % map::SOCKET_REG_SIZE;
            if offset == sock::CR && (bank as usize) < map::SOCKET_COUNT {
                let socket = SocketIndex::from_index(bank as usize).unwrap();
                self.mem[addr as usize] = 0; // command register self-clears
                self.exec_command(socket, value);
            }
        }
    }

    fn exec_command(&mut self, socket: SocketIndex, command: u8) {
        let sr = self.sreg(socket, sock::SR);
        match command {
            sock_cmd::OPEN => {
                let mode = self.mem[self.sreg(socket, sock::MR)] & 0x0F;
                self.mem[sr] = match mode {
                    sock_mode::TCP => sock_status::INIT,
                    sock_mode::UDP => sock_status::UDP,
                    _ => sock_status::CLOSED,
                };
                let size = self.buf_size;
                self.write_reg16(socket, sock::TX_FSR, size);
                let rd = self.read_reg16(socket, sock::RX_RD);
                let wr = self.read_reg16(socket, sock::RX_WR);
                self.write_reg16(socket, sock::RX_RSR, wr.wrapping_sub(rd));
            }
            sock_cmd::LISTEN => {
                if self.mem[sr] == sock_status::INIT {
                    self.mem[sr] = sock_status::LISTEN;
                }
            }
            sock_cmd::CONNECT => {
                if self.mem[sr] == sock_status::INIT {
                    self.mem[sr] = sock_status::SYNSENT;
                }
            }
            sock_cmd::DISCON | sock_cmd::CLOSE => {
                self.mem[sr] = sock_status::CLOSED;
            }
            sock_cmd::SEND => {
                let size = self.buf_size;
                let mask = size - 1;
                let base = map::TX_BUF_BASE as usize + socket.index() * size as usize;
                let rd = self.read_reg16(socket, sock::TX_RD);
                let wr = self.read_reg16(socket, sock::TX_WR);
                let mut at = rd;
                while at != wr {
                    let byte = self.mem[base + (at & mask) as usize];
                    self.tx_log[socket.index()].push(byte);
                    at = at.wrapping_add(1);
                }
                self.write_reg16(socket, sock::TX_RD, wr);
                self.write_reg16(socket, sock::TX_FSR, size);
            }
            sock_cmd::RECV => {
                let rd = self.read_reg16(socket, sock::RX_RD);
                let wr = self.read_reg16(socket, sock::RX_WR);
                self.write_reg16(socket, sock::RX_RSR, wr.wrapping_sub(rd));
            }
            other => panic!("unimplemented socket command 0x{other:02x}"),
        }
    }
}

// =============================================================================
// Self Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_defaults() {
        let chip = SimChip::new();
        assert_eq!(chip.peek(common::VERSIONR), map::CHIP_VERSION);
        assert_eq!(chip.peek(common::PHYSR0) & physr::LNK, physr::LNK);
        assert_eq!(chip.peek(common::TMSR), 0x55);
    }

    #[test]
    fn link_toggle_updates_physr() {
        let chip = SimChip::new();
        chip.set_link(false);
        assert_eq!(chip.peek(common::PHYSR0) & physr::LNK, 0);
        assert_ne!(chip.peek(common::PHYSR0) & physr::CABOFF, 0);
        chip.set_link(true);
        assert_ne!(chip.peek(common::PHYSR0) & physr::LNK, 0);
    }

    #[test]
    fn cloned_handles_share_state() {
        let chip = SimChip::new();
        let peer = chip.clone();
        peer.set_version(0x99);
        assert_eq!(chip.peek(common::VERSIONR), 0x99);
    }

    #[test]
    fn push_rx_wraps_the_ring() {
        let chip = SimChip::new();
        // Open socket 0 in TCP mode so the ring registers are live.
        let mut t = chip.clone();
        // MR = TCP, then OPEN, via raw frames.
        for (addr, value) in [
            (0x0400u16, sock_mode::TCP),
            (0x0401, sock_cmd::OPEN),
        ] {
            t.select();
            t.write_byte(map::op::WRITE).unwrap();
            t.write_byte((addr >> 8) as u8).unwrap();
            t.write_byte(addr as u8).unwrap();
            t.write_byte(value).unwrap();
            t.deselect();
        }
        chip.push_rx(SocketIndex::Socket0, &[0xAB; 3000]);
        // 3000 > 2048: write pointer wrapped but the count is preserved.
        let inner = chip.inner.borrow();
        assert_eq!(inner.read_reg16(SocketIndex::Socket0, sock::RX_RSR), 3000);
    }
}
