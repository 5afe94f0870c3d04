//! Register Access Layer
//!
//! Addresses the chip's register banks and buffer memory through a
//! [`Transport`], encoding the W5100S SPI framing: a 1-byte opcode
//! (`0xF0` write, `0x0F` read), a 2-byte big-endian address, then data.
//! In byte mode every data byte travels in its own chip-select window; in
//! burst mode one header is followed by an auto-incremented run of data
//! bytes. Both paths leave identical register/buffer contents.
//!
//! Every transaction is bracketed by a scoped guard that asserts
//! chip-select on entry and releases it on drop, so the line is never left
//! asserted mid-transaction, error paths included.
//!
//! This layer is not reentrant; `&mut self` serializes all accesses. It
//! never retries: a transport failure is surfaced as
//! [`BusError::Timeout`] and additionally *poisons* the bus, because an
//! aborted frame leaves chip-side register state undefined. A poisoned bus
//! rejects all traffic until [`RegisterBus::verify_identity`] succeeds
//! again.

use crate::driver::error::{BusError, BusResult};
use crate::hal::transport::Transport;
use crate::internal::map;

// =============================================================================
// Socket Index
// =============================================================================

/// One of the four hardware socket slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SocketIndex {
    /// Socket 0
    Socket0 = 0,
    /// Socket 1
    Socket1 = 1,
    /// Socket 2
    Socket2 = 2,
    /// Socket 3
    Socket3 = 3,
}

impl SocketIndex {
    /// All hardware sockets, in index order.
    pub const ALL: [SocketIndex; map::SOCKET_COUNT] = [
        SocketIndex::Socket0,
        SocketIndex::Socket1,
        SocketIndex::Socket2,
        SocketIndex::Socket3,
    ];

    /// Look up a socket by numeric index.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SocketIndex::Socket0),
            1 => Some(SocketIndex::Socket1),
            2 => Some(SocketIndex::Socket2),
            3 => Some(SocketIndex::Socket3),
            _ => None,
        }
    }

    /// Numeric index (0..4).
    pub const fn index(self) -> usize {
        self as usize
    }

    pub(crate) const fn as_u16(self) -> u16 {
        self as u16
    }
}

// =============================================================================
// Register Blocks
// =============================================================================

/// Selects which register bank or buffer region an offset addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterBlock {
    /// Common register bank
    Common,
    /// Per-socket register bank
    Socket(SocketIndex),
    /// TX buffer memory (offset into the whole 8 KiB region)
    TxBuffer,
    /// RX buffer memory (offset into the whole 8 KiB region)
    RxBuffer,
}

impl RegisterBlock {
    /// Base address and size of the block in the chip's address space.
    const fn span(self) -> (u16, u16) {
        match self {
            RegisterBlock::Common => (0x0000, map::common::END),
            RegisterBlock::Socket(idx) => (
                map::SOCKET_REG_BASE + idx.as_u16() * map::SOCKET_REG_SIZE,
                map::sock::END,
            ),
            RegisterBlock::TxBuffer => (map::TX_BUF_BASE, map::BUF_TOTAL),
            RegisterBlock::RxBuffer => (map::RX_BUF_BASE, map::BUF_TOTAL),
        }
    }
}

// =============================================================================
// Transaction Guard
// =============================================================================

/// Scoped chip-select: asserts on construction, releases on drop.
struct Txn<'a, T: Transport> {
    transport: &'a mut T,
}

impl<'a, T: Transport> Txn<'a, T> {
    fn begin(transport: &'a mut T) -> Self {
        transport.select();
        Self { transport }
    }

    /// Send the opcode/address header.
    fn header(&mut self, opcode: u8, addr: u16) -> BusResult<()> {
        self.transport.write_byte(opcode)?;
        self.transport.write_byte((addr >> 8) as u8)?;
        self.transport.write_byte(addr as u8)
    }

    fn write_byte(&mut self, byte: u8) -> BusResult<()> {
        self.transport.write_byte(byte)
    }

    fn read_byte(&mut self) -> BusResult<u8> {
        self.transport.read_byte()
    }

    fn write_burst(&mut self, buf: &[u8]) -> BusResult<()> {
        self.transport.write_burst(buf)
    }

    fn read_burst(&mut self, buf: &mut [u8]) -> BusResult<()> {
        self.transport.read_burst(buf)
    }
}

impl<T: Transport> Drop for Txn<'_, T> {
    fn drop(&mut self) {
        self.transport.deselect();
    }
}

// =============================================================================
// Register Bus
// =============================================================================

/// Framed register and buffer access over a [`Transport`].
///
/// # Example
///
/// ```ignore
/// let mut bus = RegisterBus::new(transport);
/// if !bus.verify_identity()? {
///     return Err(ConfigError::IdentityMismatch.into());
/// }
/// let status = bus.read_u8(RegisterBlock::Socket(SocketIndex::Socket0), sock::SR)?;
/// ```
pub struct RegisterBus<T: Transport> {
    transport: T,
    poisoned: bool,
}

impl<T: Transport> RegisterBus<T> {
    /// Wrap a transport. No bus traffic is generated.
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            poisoned: false,
        }
    }

    /// Release the underlying transport.
    pub fn free(self) -> T {
        self.transport
    }

    /// Whether a failed transfer has left register state undefined.
    ///
    /// While poisoned, all accesses fail until [`verify_identity`]
    /// (which re-reads the version register) succeeds.
    ///
    /// [`verify_identity`]: RegisterBus::verify_identity
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    // =========================================================================
    // Register Access
    // =========================================================================

    /// Read one byte at `offset` within `block`.
    pub fn read_u8(&mut self, block: RegisterBlock, offset: u16) -> BusResult<u8> {
        let mut buf = [0u8; 1];
        self.read_buf(block, offset, &mut buf)?;
        Ok(buf[0])
    }

    /// Read a big-endian 16-bit word at `offset` within `block`.
    pub fn read_u16(&mut self, block: RegisterBlock, offset: u16) -> BusResult<u16> {
        let mut buf = [0u8; 2];
        self.read_buf(block, offset, &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Read `out.len()` bytes starting at `offset` within `block`.
    pub fn read_buf(
        &mut self,
        block: RegisterBlock,
        offset: u16,
        out: &mut [u8],
    ) -> BusResult<()> {
        self.check_usable()?;
        let addr = resolve(block, offset, out.len())?;
        if out.is_empty() {
            return Ok(());
        }
        let result = self.read_raw(addr, out);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }

    /// Write one byte at `offset` within `block`.
    pub fn write_u8(&mut self, block: RegisterBlock, offset: u16, value: u8) -> BusResult<()> {
        self.write_buf(block, offset, &[value])
    }

    /// Write a big-endian 16-bit word at `offset` within `block`.
    pub fn write_u16(&mut self, block: RegisterBlock, offset: u16, value: u16) -> BusResult<()> {
        self.write_buf(block, offset, &value.to_be_bytes())
    }

    /// Write `data` starting at `offset` within `block`.
    pub fn write_buf(&mut self, block: RegisterBlock, offset: u16, data: &[u8]) -> BusResult<()> {
        self.check_usable()?;
        let addr = resolve(block, offset, data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        let result = self.write_raw(addr, data);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Read the version register and compare against the W5100S constant.
    ///
    /// This is the sole preflight check before any socket operation: a
    /// `false` return means an unrecognized or absent chip, and the caller
    /// must refuse to proceed. A successful, matching read also clears the
    /// poisoned flag.
    pub fn verify_identity(&mut self) -> BusResult<bool> {
        let mut buf = [0u8; 1];
        match self.read_raw(map::common::VERSIONR, &mut buf) {
            Ok(()) => {
                let matches = buf[0] == map::CHIP_VERSION;
                if matches {
                    self.poisoned = false;
                }
                Ok(matches)
            }
            Err(e) => {
                self.poisoned = true;
                Err(e)
            }
        }
    }

    // =========================================================================
    // Framing
    // =========================================================================

    fn check_usable(&self) -> BusResult<()> {
        if self.poisoned {
            Err(BusError::Timeout)
        } else {
            Ok(())
        }
    }

    fn read_raw(&mut self, addr: u16, out: &mut [u8]) -> BusResult<()> {
        if self.transport.supports_burst() {
            let mut txn = Txn::begin(&mut self.transport);
            txn.header(map::op::READ, addr)?;
            txn.read_burst(out)
        } else {
            for (i, byte) in out.iter_mut().enumerate() {
                let mut txn = Txn::begin(&mut self.transport);
                txn.header(map::op::READ, addr.wrapping_add(i as u16))?;
                *byte = txn.read_byte()?;
            }
            Ok(())
        }
    }

    fn write_raw(&mut self, addr: u16, data: &[u8]) -> BusResult<()> {
        if self.transport.supports_burst() {
            let mut txn = Txn::begin(&mut self.transport);
            txn.header(map::op::WRITE, addr)?;
            txn.write_burst(data)
        } else {
            for (i, &byte) in data.iter().enumerate() {
                let mut txn = Txn::begin(&mut self.transport);
                txn.header(map::op::WRITE, addr.wrapping_add(i as u16))?;
                txn.write_byte(byte)?;
            }
            Ok(())
        }
    }
}

/// Validate a block-relative access and return the absolute address.
fn resolve(block: RegisterBlock, offset: u16, len: usize) -> BusResult<u16> {
    let (base, size) = block.span();
    if offset >= size || len > (size - offset) as usize {
        return Err(BusError::InvalidAddress);
    }
    Ok(base + offset)
}

// =============================================================================
// Unit Tests
// =============================================================================
