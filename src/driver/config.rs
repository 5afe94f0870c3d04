//! Configuration types for the W5100S driver

use crate::internal::map;

// =============================================================================
// Link Parameters
// =============================================================================

/// Ethernet link speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    /// 10 Mbps
    Mbps10,
    /// 100 Mbps
    #[default]
    Mbps100,
}

/// Ethernet duplex mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Duplex {
    /// Half duplex
    Half,
    /// Full duplex
    #[default]
    Full,
}

/// How the PHY decides speed and duplex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Negotiation {
    /// Negotiate with the link partner; the speed/duplex fields are ignored
    #[default]
    Auto,
    /// Force the configured speed/duplex
    Manual,
}

/// PHY configuration
///
/// Applied via the PHY operation-mode register. Once applied, a PHY reset
/// must follow before the link is usable; [`crate::W5100s::apply_phy_config`]
/// performs both steps and never writes the mode alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhyConfig {
    /// Negotiation source
    pub negotiation: Negotiation,
    /// Forced speed (manual mode only)
    pub speed: Speed,
    /// Forced duplex (manual mode only)
    pub duplex: Duplex,
}

impl PhyConfig {
    /// Auto-negotiation, all capabilities advertised
    pub const fn auto() -> Self {
        Self {
            negotiation: Negotiation::Auto,
            speed: Speed::Mbps100,
            duplex: Duplex::Full,
        }
    }

    /// Forced speed/duplex without negotiation
    pub const fn manual(speed: Speed, duplex: Duplex) -> Self {
        Self {
            negotiation: Negotiation::Manual,
            speed,
            duplex,
        }
    }

    /// Operation-mode code for the PHYCR0 register
    pub const fn opmd(&self) -> u8 {
        match (self.negotiation, self.speed, self.duplex) {
            (Negotiation::Auto, _, _) => 0b111,
            (Negotiation::Manual, Speed::Mbps100, Duplex::Full) => 0b011,
            (Negotiation::Manual, Speed::Mbps100, Duplex::Half) => 0b010,
            (Negotiation::Manual, Speed::Mbps10, Duplex::Full) => 0b001,
            (Negotiation::Manual, Speed::Mbps10, Duplex::Half) => 0b000,
        }
    }
}

// =============================================================================
// Network Configuration
// =============================================================================

/// IPv4 addressing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressMode {
    /// Addresses below are written to the chip as-is
    #[default]
    Static,
    /// Addresses are expected to be assigned by an external DHCP client
    Dhcp,
}

/// Network configuration written to the chip's common registers.
///
/// Immutable value: written once during bring-up, read back for display.
///
/// # Example
///
/// ```ignore
/// let net = NetConfig::new()
///     .with_mac([0x00, 0x08, 0xDC, 0x12, 0x34, 0x56])
///     .with_ip([192, 168, 1, 15])
///     .with_gateway([192, 168, 1, 1]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetConfig {
    /// MAC address ("source hardware address")
    pub mac: [u8; 6],
    /// IPv4 address
    pub ip: [u8; 4],
    /// Subnet mask
    pub subnet: [u8; 4],
    /// Gateway IPv4 address
    pub gateway: [u8; 4],
    /// DNS server (not written to the chip; carried for display and for
    /// an external DHCP/DNS client)
    pub dns: [u8; 4],
    /// Addressing mode
    pub mode: AddressMode,
}

impl NetConfig {
    /// Create a configuration with locally administered defaults.
    pub const fn new() -> Self {
        Self {
            mac: [0x00, 0x08, 0xDC, 0x12, 0x34, 0x56],
            ip: [192, 168, 1, 15],
            subnet: [255, 255, 255, 0],
            gateway: [192, 168, 1, 1],
            dns: [8, 8, 8, 8],
            mode: AddressMode::Static,
        }
    }

    /// Set the MAC address
    pub const fn with_mac(mut self, mac: [u8; 6]) -> Self {
        self.mac = mac;
        self
    }

    /// Set the IPv4 address
    pub const fn with_ip(mut self, ip: [u8; 4]) -> Self {
        self.ip = ip;
        self
    }

    /// Set the subnet mask
    pub const fn with_subnet(mut self, subnet: [u8; 4]) -> Self {
        self.subnet = subnet;
        self
    }

    /// Set the gateway address
    pub const fn with_gateway(mut self, gateway: [u8; 4]) -> Self {
        self.gateway = gateway;
        self
    }

    /// Set the DNS server address
    pub const fn with_dns(mut self, dns: [u8; 4]) -> Self {
        self.dns = dns;
        self
    }

    /// Set the addressing mode
    pub const fn with_mode(mut self, mode: AddressMode) -> Self {
        self.mode = mode;
        self
    }
}

impl Default for NetConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Socket Buffer Layout
// =============================================================================

/// How the 8 KiB TX and 8 KiB RX buffer memory is split across sockets.
///
/// Asymmetric TX/RX splits are supported by the hardware but not by this
/// driver; every usable socket gets equal TX and RX space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferLayout {
    /// Four sockets, 2 KiB TX/RX each
    #[default]
    FourSockets2KiB,
    /// Two sockets, 4 KiB TX/RX each
    TwoSockets4KiB,
    /// One socket, 8 KiB TX/RX
    OneSocket8KiB,
}

impl BufferLayout {
    /// Per-socket buffer size in bytes
    pub const fn buffer_size(self) -> u16 {
        match self {
            BufferLayout::FourSockets2KiB => 2048,
            BufferLayout::TwoSockets4KiB => 4096,
            BufferLayout::OneSocket8KiB => 8192,
        }
    }

    /// Number of usable sockets under this layout
    pub const fn socket_limit(self) -> usize {
        match self {
            BufferLayout::FourSockets2KiB => 4,
            BufferLayout::TwoSockets4KiB => 2,
            BufferLayout::OneSocket8KiB => 1,
        }
    }

    /// Mask value for the RMSR/TMSR registers
    pub const fn memory_mask(self) -> u8 {
        match self {
            BufferLayout::FourSockets2KiB => 0x55,
            BufferLayout::TwoSockets4KiB => 0x0A,
            BufferLayout::OneSocket8KiB => 0x03,
        }
    }
}

// =============================================================================
// Socket Protocol
// =============================================================================

/// Protocol a hardware socket is opened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketProtocol {
    /// TCP (stream, offloaded state machine)
    #[default]
    Tcp,
    /// UDP (datagram)
    Udp,
}

impl SocketProtocol {
    /// Value for the Sn_MR protocol field
    pub const fn mode_bits(self) -> u8 {
        match self {
            SocketProtocol::Tcp => map::sock_mode::TCP,
            SocketProtocol::Udp => map::sock_mode::UDP,
        }
    }
}

// =============================================================================
// Driver State
// =============================================================================

/// Driver lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Constructed, chip not brought up
    #[default]
    Uninitialized,
    /// Identity verified, configuration written; sockets usable
    Ready,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_config_builder() {
        let net = NetConfig::new()
            .with_mac([2, 0, 0, 0, 0, 1])
            .with_ip([10, 0, 0, 2])
            .with_subnet([255, 0, 0, 0])
            .with_gateway([10, 0, 0, 1])
            .with_dns([1, 1, 1, 1])
            .with_mode(AddressMode::Dhcp);

        assert_eq!(net.mac, [2, 0, 0, 0, 0, 1]);
        assert_eq!(net.ip, [10, 0, 0, 2]);
        assert_eq!(net.subnet, [255, 0, 0, 0]);
        assert_eq!(net.gateway, [10, 0, 0, 1]);
        assert_eq!(net.dns, [1, 1, 1, 1]);
        assert_eq!(net.mode, AddressMode::Dhcp);
    }

    #[test]
    fn default_net_config_is_static() {
        assert_eq!(NetConfig::default().mode, AddressMode::Static);
    }

    #[test]
    fn phy_opmd_codes() {
        assert_eq!(PhyConfig::auto().opmd(), 0b111);
        assert_eq!(PhyConfig::manual(Speed::Mbps100, Duplex::Full).opmd(), 0b011);
        assert_eq!(PhyConfig::manual(Speed::Mbps100, Duplex::Half).opmd(), 0b010);
        assert_eq!(PhyConfig::manual(Speed::Mbps10, Duplex::Full).opmd(), 0b001);
        assert_eq!(PhyConfig::manual(Speed::Mbps10, Duplex::Half).opmd(), 0b000);
    }

    #[test]
    fn buffer_layout_partitions_whole_memory() {
        for layout in [
            BufferLayout::FourSockets2KiB,
            BufferLayout::TwoSockets4KiB,
            BufferLayout::OneSocket8KiB,
        ] {
            let total = layout.buffer_size() as usize * layout.socket_limit();
            assert_eq!(total, 8192);
        }
    }

    #[test]
    fn socket_protocol_mode_bits() {
        assert_eq!(SocketProtocol::Tcp.mode_bits(), 0x01);
        assert_eq!(SocketProtocol::Udp.mode_bits(), 0x02);
    }
}
