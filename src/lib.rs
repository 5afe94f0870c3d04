//! W5100S SPI Driver Core
//!
//! A `no_std`, `no_alloc` Rust driver core for the WIZnet W5100S TCP/IP
//! offload chip over SPI.
//!
//! The W5100S implements the TCP/IP protocol stack in hardware and
//! exposes four "hardware sockets" through a register-level command
//! interface. This crate provides the register driver and socket-state
//! abstraction for that interface; the chip's internal protocol engine
//! is treated as a black-box peripheral.
//!
//! # Architecture
//!
//! The driver is organized into four layers, leaves first:
//!
//! 1. **Transport** ([`hal::transport`]): chip-select-gated byte and
//!    burst transfers over the physical SPI link
//! 2. **Register Access** ([`bus`]): opcode/address framing, register
//!    bank addressing, identity verification
//! 3. **Socket State Machine** ([`driver::socket`]): one hardware
//!    socket's lifecycle, commands and ring-buffer data transfer
//! 4. **Session Driver** ([`driver::session`]): poll-driven
//!    application protocols, e.g. the TCP loopback echo service
//!
//! Data flows upward and control flows downward; the register layer is
//! not reentrant, and `&mut` access serializes every transaction.
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for driver types
//! - `critical-section`: Enable the ISR-safe [`sync::SharedW5100`] wrapper
//!
//! # Example
//!
//! ```ignore
//! use embedded_hal::delay::DelayNs;
//! use ph_w5100s_spi::hal::{ResetController, SpiTransport};
//! use ph_w5100s_spi::{BufferLayout, EchoServer, NetConfig, PhyConfig, W5100s};
//! use ph_w5100s_spi::bus::SocketIndex;
//! use ph_w5100s_spi::driver::session::ECHO_PORT;
//!
//! // Hardware reset pulse on the dedicated RST line.
//! let mut reset = ResetController::new(rst_pin);
//! reset.pulse(&mut delay);
//!
//! // Bring the chip up.
//! let transport = SpiTransport::new(spi, cs_pin).with_burst();
//! let mut chip = W5100s::new(transport);
//! chip.init(
//!     NetConfig::new().with_ip([192, 168, 1, 15]),
//!     BufferLayout::default(),
//!     &mut delay,
//! )?;
//! chip.apply_phy_config(PhyConfig::auto())?;
//! chip.wait_link_up(&mut delay, ph_w5100s_spi::driver::chip::LINK_WAIT_ATTEMPTS)?;
//!
//! // Serve the loopback echo.
//! let mut server: EchoServer<512> = EchoServer::new(SocketIndex::Socket0, ECHO_PORT);
//! server.start(&mut chip)?;
//! loop {
//!     server.service(&mut chip)?;
//!     delay.delay_ms(1);
//! }
//! ```

#![no_std]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod bus;
pub mod driver;
pub mod hal;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use bus::{RegisterBlock, RegisterBus, SocketIndex};
pub use driver::chip::{NetInfo, W5100s};
pub use driver::config::{
    AddressMode, BufferLayout, Duplex, Negotiation, NetConfig, PhyConfig, SocketProtocol, Speed,
    State,
};
pub use driver::error::{
    BusError, BusResult, ConfigError, ConfigResult, Error, Result, SocketError, SocketResult,
};
pub use driver::session::{EchoServer, ServiceEvent};
pub use driver::socket::{ConnectionEvent, SocketDescriptor, SocketState};
pub use hal::{ResetController, SpiTransport, Transport};

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::SharedW5100;

/// Low-level register map for advanced use.
///
/// These constants are intentionally separated from the primary facade.
/// Most users should prefer the safe driver APIs instead of addressing
/// registers directly: raw access through [`RegisterBus`] bypasses the
/// driver's state tracking, and incorrect sequencing can wedge the
/// chip's offload engine.
pub mod unsafe_registers {
    pub use crate::internal::map::{
        BUF_TOTAL, CHIP_VERSION, RX_BUF_BASE, SOCKET_COUNT, SOCKET_REG_BASE, SOCKET_REG_SIZE,
        TX_BUF_BASE, common, mode, op, phycr1, physr, sock, sock_cmd, sock_mode, sock_status,
    };
}
