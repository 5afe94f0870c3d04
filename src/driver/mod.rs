//! Core driver components for the W5100S offload chip.
//!
//! This module contains the building blocks for bringing up the chip and
//! driving its hardware sockets:
//!
//! - [`config`] - Configuration types and builder patterns
//! - [`error`] - Error types and result aliases
//! - [`chip`] - The main driver context ([`W5100s`])
//! - [`socket`] - Socket state machine and data transfer
//! - [`session`] - Poll-driven application sessions ([`EchoServer`])
//!
//! # Example
//!
//! ```ignore
//! use ph_w5100s_spi::driver::{NetConfig, W5100s};
//!
//! let net = NetConfig::new()
//!     .with_mac([0x00, 0x08, 0xDC, 0x12, 0x34, 0x56])
//!     .with_ip([192, 168, 1, 15]);
//! let mut chip = W5100s::new(transport);
//! chip.init(net, BufferLayout::default(), &mut delay)?;
//! ```

// Submodules
pub mod chip;
pub mod config;
pub mod error;
pub mod session;
pub mod socket;

// Re-exports for convenience
pub use chip::{LINK_WAIT_ATTEMPTS, NetInfo, W5100s};
pub use config::{
    AddressMode, BufferLayout, Duplex, Negotiation, NetConfig, PhyConfig, SocketProtocol, Speed,
    State,
};
pub use error::{
    BusError, BusResult, ConfigError, ConfigResult, Error, Result, SocketError, SocketResult,
};
pub use session::{ECHO_PORT, EchoServer, ServiceEvent};
pub use socket::{ConnectionEvent, SocketDescriptor, SocketState};
