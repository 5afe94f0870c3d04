//! W5100S register map.
//!
//! Addresses, status codes, commands and mode bits from the W5100S
//! datasheet (version register value 0x51). The chip exposes one common
//! register bank, four per-socket register banks at `0x0400 + n * 0x100`,
//! and 8 KiB each of TX and RX buffer memory shared by the four sockets.

// =============================================================================
// Common Registers
// =============================================================================

/// Common register bank addresses.
pub mod common {
    /// Mode register
    pub const MR: u16 = 0x0000;
    /// Gateway IPv4 address (4 bytes)
    pub const GAR: u16 = 0x0001;
    /// Subnet mask (4 bytes)
    pub const SUBR: u16 = 0x0005;
    /// Source hardware (MAC) address (6 bytes)
    pub const SHAR: u16 = 0x0009;
    /// Source IPv4 address (4 bytes)
    pub const SIPR: u16 = 0x000F;
    /// Interrupt register
    pub const IR: u16 = 0x0015;
    /// Interrupt mask register
    pub const IMR: u16 = 0x0016;
    /// Retransmission timeout (2 bytes, 100us units)
    pub const RTR: u16 = 0x0017;
    /// Retransmission count
    pub const RCR: u16 = 0x0019;
    /// RX memory size mask
    pub const RMSR: u16 = 0x001A;
    /// TX memory size mask
    pub const TMSR: u16 = 0x001B;
    /// PHY status register 0
    pub const PHYSR0: u16 = 0x003C;
    /// PHY status register 1
    pub const PHYSR1: u16 = 0x003D;
    /// PHY control register 0 (operation mode)
    pub const PHYCR0: u16 = 0x0046;
    /// PHY control register 1 (reset, power down)
    pub const PHYCR1: u16 = 0x0047;
    /// Chip version register
    pub const VERSIONR: u16 = 0x0080;

    /// One past the highest documented common register address.
    pub const END: u16 = 0x0088;
}

/// Mode register (MR) bits.
pub mod mode {
    /// Software reset; self-clearing
    pub const RST: u8 = 0x80;
    /// Block responses to ping
    pub const PB: u8 = 0x10;
}

/// PHY status register 0 (PHYSR0) bits.
pub mod physr {
    /// Cable disconnected
    pub const CABOFF: u8 = 0x80;
    /// Auto-negotiation in progress
    pub const AUTONEG: u8 = 0x20;
    /// Current speed (1 = 10 Mbps)
    pub const SPD10: u8 = 0x10;
    /// Current duplex (1 = half)
    pub const DPX_HALF: u8 = 0x08;
    /// Link up
    pub const LNK: u8 = 0x01;
}

/// PHY control register 1 (PHYCR1) bits.
pub mod phycr1 {
    /// Reset the PHY; must follow every PHYCR0 change
    pub const RST: u8 = 0x01;
}

/// Expected VERSIONR value for the W5100S.
pub const CHIP_VERSION: u8 = 0x51;

// =============================================================================
// Socket Registers
// =============================================================================

/// Number of hardware sockets on the W5100S.
pub const SOCKET_COUNT: usize = 4;

/// Base address of the socket register banks.
pub const SOCKET_REG_BASE: u16 = 0x0400;

/// Size of one socket register bank.
pub const SOCKET_REG_SIZE: u16 = 0x0100;

/// Socket register offsets within a socket's bank.
pub mod sock {
    /// Socket mode register
    pub const MR: u16 = 0x00;
    /// Socket command register
    pub const CR: u16 = 0x01;
    /// Socket interrupt register
    pub const IR: u16 = 0x02;
    /// Socket status register
    pub const SR: u16 = 0x03;
    /// Source port (2 bytes)
    pub const PORT: u16 = 0x04;
    /// Destination IPv4 address (4 bytes)
    pub const DIPR: u16 = 0x0C;
    /// Destination port (2 bytes)
    pub const DPORT: u16 = 0x10;
    /// TX free size (2 bytes)
    pub const TX_FSR: u16 = 0x20;
    /// TX read pointer (2 bytes)
    pub const TX_RD: u16 = 0x22;
    /// TX write pointer (2 bytes)
    pub const TX_WR: u16 = 0x24;
    /// RX received size (2 bytes)
    pub const RX_RSR: u16 = 0x26;
    /// RX read pointer (2 bytes)
    pub const RX_RD: u16 = 0x28;
    /// RX write pointer (2 bytes)
    pub const RX_WR: u16 = 0x2A;

    /// One past the highest socket register offset we address.
    pub const END: u16 = 0x2C;
}

/// Socket mode register (Sn_MR) protocol values.
pub mod sock_mode {
    /// Closed
    pub const CLOSED: u8 = 0x00;
    /// TCP
    pub const TCP: u8 = 0x01;
    /// UDP
    pub const UDP: u8 = 0x02;
    /// No delayed ACK (TCP)
    pub const ND: u8 = 0x20;
}

/// Socket command register (Sn_CR) values.
pub mod sock_cmd {
    /// Open the socket in the configured protocol mode
    pub const OPEN: u8 = 0x01;
    /// Start listening (TCP server)
    pub const LISTEN: u8 = 0x02;
    /// Initiate a connection (TCP client)
    pub const CONNECT: u8 = 0x04;
    /// Graceful disconnect (FIN)
    pub const DISCON: u8 = 0x08;
    /// Immediate close
    pub const CLOSE: u8 = 0x10;
    /// Transmit data staged in the TX buffer
    pub const SEND: u8 = 0x20;
    /// Acknowledge consumption of RX buffer data
    pub const RECV: u8 = 0x40;
}

/// Socket status register (Sn_SR) values.
pub mod sock_status {
    /// Closed
    pub const CLOSED: u8 = 0x00;
    /// Opened in TCP mode, not yet listening/connecting
    pub const INIT: u8 = 0x13;
    /// Listening for an incoming connection
    pub const LISTEN: u8 = 0x14;
    /// SYN sent, waiting for SYN-ACK
    pub const SYNSENT: u8 = 0x15;
    /// SYN received (transient, during accept)
    pub const SYNRECV: u8 = 0x16;
    /// Connection established
    pub const ESTABLISHED: u8 = 0x17;
    /// FIN sent, waiting for peer
    pub const FIN_WAIT: u8 = 0x18;
    /// Simultaneous close in progress
    pub const CLOSING: u8 = 0x1A;
    /// Waiting out the 2MSL timer
    pub const TIME_WAIT: u8 = 0x1B;
    /// Peer sent FIN; data may still be pending
    pub const CLOSE_WAIT: u8 = 0x1C;
    /// Our FIN acknowledged, waiting for last ACK
    pub const LAST_ACK: u8 = 0x1D;
    /// Opened in UDP mode
    pub const UDP: u8 = 0x22;
}

// =============================================================================
// Buffer Memory
// =============================================================================

/// Base address of socket TX buffer memory.
pub const TX_BUF_BASE: u16 = 0x4000;

/// Base address of socket RX buffer memory.
pub const RX_BUF_BASE: u16 = 0x6000;

/// Total TX (and, separately, RX) buffer memory in bytes.
pub const BUF_TOTAL: u16 = 0x2000;

// =============================================================================
// SPI Framing
// =============================================================================

/// SPI stream opcodes. Each access is a 1-byte opcode, a 2-byte
/// big-endian address, then data (one byte per frame in byte mode, or a
/// run of auto-incremented bytes in burst mode).
pub mod op {
    /// Write opcode
    pub const WRITE: u8 = 0xF0;
    /// Read opcode
    pub const READ: u8 = 0x0F;
}
