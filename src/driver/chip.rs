//! Core W5100S driver.
//!
//! [`W5100s`] owns the register bus and is the explicit context object
//! every operation goes through; there are no process-wide singletons.
//! This module covers chip bring-up and common-register concerns:
//!
//! - Software reset and identity verification
//! - Socket buffer layout programming
//! - Network configuration write and read-back
//! - PHY configuration and link status
//! - Human-readable status dump
//!
//! Socket operations live in the [`socket`](super::socket) module, the
//! echo session loop in [`session`](super::session).
//!
//! # Bring-up sequence
//!
//! ```ignore
//! let mut reset = ResetController::new(rst_pin);
//! reset.pulse(&mut delay);
//!
//! let mut chip = W5100s::new(SpiTransport::new(spi, cs).with_burst());
//! chip.init(NetConfig::new(), BufferLayout::default(), &mut delay)?;
//! chip.apply_phy_config(PhyConfig::manual(Speed::Mbps10, Duplex::Full))?;
//! chip.wait_link_up(&mut delay, LINK_WAIT_ATTEMPTS)?;
//! ```

use embedded_hal::delay::DelayNs;

use super::config::{AddressMode, BufferLayout, NetConfig, PhyConfig, State};
use super::error::{ConfigError, Result};
use super::socket::SocketDescriptor;
use crate::bus::{RegisterBlock, RegisterBus, SocketIndex};
use crate::hal::transport::Transport;
use crate::internal::map::{self, common, mode, physr, phycr1};

// =============================================================================
// Timing Constants
// =============================================================================

/// Poll attempts for the self-clearing software reset bit.
pub const SOFT_RESET_ATTEMPTS: u32 = 20;

/// Delay between software reset polls, in milliseconds.
pub const SOFT_RESET_POLL_MS: u32 = 1;

/// Delay between link status polls, in milliseconds.
pub const LINK_POLL_MS: u32 = 10;

/// Default attempts for the initial link-up wait (~3 s at 10 ms each,
/// generous enough for auto-negotiation to settle).
pub const LINK_WAIT_ATTEMPTS: u32 = 300;

// =============================================================================
// Driver
// =============================================================================

/// W5100S driver context.
///
/// Generic over the [`Transport`] so the same driver runs against a DMA
/// burst-capable SPI link, a plain byte-at-a-time one, or a simulated
/// chip in tests.
pub struct W5100s<T: Transport> {
    pub(crate) bus: RegisterBus<T>,
    state: State,
    layout: BufferLayout,
    net: NetConfig,
    pub(crate) sockets: [SocketDescriptor; map::SOCKET_COUNT],
}

impl<T: Transport> W5100s<T> {
    /// Wrap a transport. No bus traffic is generated until
    /// [`init`](W5100s::init).
    pub const fn new(transport: T) -> Self {
        Self {
            bus: RegisterBus::new(transport),
            state: State::Uninitialized,
            layout: BufferLayout::FourSockets2KiB,
            net: NetConfig::new(),
            sockets: [SocketDescriptor::IDLE; map::SOCKET_COUNT],
        }
    }

    // =========================================================================
    // State Accessors
    // =========================================================================

    /// Current driver state.
    #[inline(always)]
    pub fn state(&self) -> State {
        self.state
    }

    /// Configured socket buffer layout.
    #[inline(always)]
    pub fn buffer_layout(&self) -> BufferLayout {
        self.layout
    }

    /// Descriptor of one hardware socket.
    pub fn socket(&self, index: SocketIndex) -> &SocketDescriptor {
        &self.sockets[index.index()]
    }

    /// Release the underlying transport.
    pub fn free(self) -> T {
        self.bus.free()
    }

    // =========================================================================
    // Bring-up
    // =========================================================================

    /// Bring the chip up: soft reset, identity check, buffer layout and
    /// network configuration.
    ///
    /// The identity check is the sole preflight gate: if the version
    /// register does not read back as a W5100S, bring-up halts with
    /// `IdentityMismatch` and no socket operation will ever be issued.
    ///
    /// A hardware reset pulse (see [`crate::hal::reset::ResetController`])
    /// should precede this when the board wires up the RST line.
    pub fn init<D: DelayNs>(
        &mut self,
        net: NetConfig,
        layout: BufferLayout,
        delay: &mut D,
    ) -> Result<()> {
        if self.state != State::Uninitialized {
            return Err(ConfigError::AlreadyInitialized.into());
        }

        self.soft_reset(delay)?;

        if !self.bus.verify_identity()? {
            return Err(ConfigError::IdentityMismatch.into());
        }

        self.configure_buffers(layout)?;
        self.write_net_config(&net)?;

        self.net = net;
        self.state = State::Ready;
        Ok(())
    }

    /// Issue the software reset and wait for the RST bit to self-clear.
    fn soft_reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<()> {
        self.bus
            .write_u8(RegisterBlock::Common, common::MR, mode::RST)?;

        for _ in 0..SOFT_RESET_ATTEMPTS {
            if self.bus.read_u8(RegisterBlock::Common, common::MR)? & mode::RST == 0 {
                return Ok(());
            }
            delay.delay_ms(SOFT_RESET_POLL_MS);
        }

        Err(ConfigError::ResetFailed.into())
    }

    /// Program RMSR/TMSR and seed the socket descriptors.
    fn configure_buffers(&mut self, layout: BufferLayout) -> Result<()> {
        let mask = layout.memory_mask();
        self.bus
            .write_u8(RegisterBlock::Common, common::RMSR, mask)?;
        self.bus
            .write_u8(RegisterBlock::Common, common::TMSR, mask)?;

        self.layout = layout;
        for (i, descriptor) in self.sockets.iter_mut().enumerate() {
            let size = if i < layout.socket_limit() {
                layout.buffer_size()
            } else {
                0
            };
            *descriptor = SocketDescriptor::idle_with_buffers(size);
        }
        Ok(())
    }

    /// Write the network configuration to the common registers.
    ///
    /// In DHCP mode the addresses are written as-is too; an external DHCP
    /// client is expected to rewrite them once a lease is obtained.
    fn write_net_config(&mut self, net: &NetConfig) -> Result<()> {
        self.bus
            .write_buf(RegisterBlock::Common, common::SHAR, &net.mac)?;
        self.bus
            .write_buf(RegisterBlock::Common, common::GAR, &net.gateway)?;
        self.bus
            .write_buf(RegisterBlock::Common, common::SUBR, &net.subnet)?;
        self.bus
            .write_buf(RegisterBlock::Common, common::SIPR, &net.ip)?;
        Ok(())
    }

    pub(crate) fn expect_ready(&self) -> Result<()> {
        if self.state == State::Ready {
            Ok(())
        } else {
            Err(ConfigError::NotInitialized.into())
        }
    }

    // =========================================================================
    // Identity and Recovery
    // =========================================================================

    /// Re-run the version register check.
    pub fn verify_identity(&mut self) -> Result<bool> {
        Ok(self.bus.verify_identity()?)
    }

    /// Recover the bus after a failed transfer.
    ///
    /// A transport failure mid-transaction leaves chip register state
    /// undefined and poisons the bus. This re-reads the version register;
    /// on a match the bus is usable again, otherwise the chip is treated
    /// as absent.
    pub fn recover(&mut self) -> Result<()> {
        if self.bus.verify_identity()? {
            Ok(())
        } else {
            Err(ConfigError::IdentityMismatch.into())
        }
    }

    // =========================================================================
    // PHY
    // =========================================================================

    /// Apply a PHY configuration.
    ///
    /// Writes the operation mode and always follows with the mandatory
    /// PHY reset; the new mode takes effect only after that reset, so the
    /// two are never split.
    pub fn apply_phy_config(&mut self, config: PhyConfig) -> Result<()> {
        self.expect_ready()?;
        self.bus
            .write_u8(RegisterBlock::Common, common::PHYCR0, config.opmd())?;
        self.reset_phy()
    }

    /// Pulse the PHY reset bit.
    pub fn reset_phy(&mut self) -> Result<()> {
        self.expect_ready()?;
        self.bus
            .write_u8(RegisterBlock::Common, common::PHYCR1, phycr1::RST)?;
        Ok(())
    }

    /// Whether the PHY reports an established link.
    pub fn is_link_up(&mut self) -> Result<bool> {
        let status = self.bus.read_u8(RegisterBlock::Common, common::PHYSR0)?;
        Ok(status & physr::LNK != 0)
    }

    /// Block until the link comes up, polling every [`LINK_POLL_MS`].
    ///
    /// This is the only blocking wait in the driver, intended for initial
    /// bring-up; steady-state link supervision belongs to the session
    /// driver's poll loop.
    pub fn wait_link_up<D: DelayNs>(&mut self, delay: &mut D, attempts: u32) -> Result<()> {
        for _ in 0..attempts {
            if self.is_link_up()? {
                return Ok(());
            }
            delay.delay_ms(LINK_POLL_MS);
        }
        Err(ConfigError::LinkTimeout.into())
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Read the network configuration back from the chip for display.
    pub fn net_info(&mut self) -> Result<NetInfo> {
        self.expect_ready()?;

        let mut mac = [0u8; 6];
        let mut ip = [0u8; 4];
        let mut subnet = [0u8; 4];
        let mut gateway = [0u8; 4];
        self.bus
            .read_buf(RegisterBlock::Common, common::SHAR, &mut mac)?;
        self.bus
            .read_buf(RegisterBlock::Common, common::SIPR, &mut ip)?;
        self.bus
            .read_buf(RegisterBlock::Common, common::SUBR, &mut subnet)?;
        self.bus
            .read_buf(RegisterBlock::Common, common::GAR, &mut gateway)?;

        Ok(NetInfo {
            mac,
            ip,
            subnet,
            gateway,
            dns: self.net.dns,
            mode: self.net.mode,
        })
    }
}

// =============================================================================
// Net Info
// =============================================================================

/// Network configuration as read back from the chip.
///
/// The `Display` output is a human-readable bring-up banner; the format
/// is illustrative, not a stability contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetInfo {
    /// MAC address
    pub mac: [u8; 6],
    /// IPv4 address
    pub ip: [u8; 4],
    /// Subnet mask
    pub subnet: [u8; 4],
    /// Gateway address
    pub gateway: [u8; 4],
    /// DNS server address
    pub dns: [u8; 4],
    /// Addressing mode
    pub mode: AddressMode,
}

impl NetInfo {
    /// Chip identity string.
    pub const CHIP_ID: &'static str = "W5100S";
}

impl core::fmt::Display for NetInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mode = match self.mode {
            AddressMode::Static => "static",
            AddressMode::Dhcp => "DHCP",
        };
        writeln!(f, " {} network configuration : {mode}", Self::CHIP_ID)?;
        writeln!(
            f,
            " MAC         : {:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.mac[0], self.mac[1], self.mac[2], self.mac[3], self.mac[4], self.mac[5]
        )?;
        writeln!(
            f,
            " IP          : {}.{}.{}.{}",
            self.ip[0], self.ip[1], self.ip[2], self.ip[3]
        )?;
        writeln!(
            f,
            " Subnet Mask : {}.{}.{}.{}",
            self.subnet[0], self.subnet[1], self.subnet[2], self.subnet[3]
        )?;
        writeln!(
            f,
            " Gateway     : {}.{}.{}.{}",
            self.gateway[0], self.gateway[1], self.gateway[2], self.gateway[3]
        )?;
        writeln!(
            f,
            " DNS         : {}.{}.{}.{}",
            self.dns[0], self.dns[1], self.dns[2], self.dns[3]
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
