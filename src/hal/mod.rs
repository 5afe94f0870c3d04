//! Hardware Abstraction Layer
//!
//! Abstractions over the physical link to the chip:
//!
//! - [`transport`]: byte/burst transfer primitives and the SPI implementation
//! - [`reset`]: active-low hardware reset pulse
//!
//! # Delay Integration
//!
//! All types that require delays use `embedded_hal::delay::DelayNs` directly.
//! Pass any delay implementation from your HAL (e.g., `rp2040_hal::Timer`).

pub mod reset;
pub mod transport;

pub use reset::ResetController;
pub use transport::{SpiTransport, Transport};
