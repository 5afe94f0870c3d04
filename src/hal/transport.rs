//! Byte-level transport between the host and the W5100S.
//!
//! The chip sits on a half-duplex, chip-select-gated SPI link. This module
//! defines the [`Transport`] trait the register layer drives, plus
//! [`SpiTransport`], an implementation over `embedded_hal::spi::SpiBus`
//! with a manually driven chip-select pin (the W5100S frame boundaries do
//! not match `SpiDevice` transaction semantics, so CS is explicit here).
//!
//! Burst transfers are semantically equivalent to the same number of
//! single-byte transfers; the default trait methods fall back to the byte
//! path, and `SpiTransport` only takes the bulk path when constructed with
//! burst support (e.g. a DMA-backed `SpiBus`). Bulk transfers are
//! synchronous: the call returns only after the hardware completes.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::driver::error::{BusError, BusResult};

// =============================================================================
// Transport Trait
// =============================================================================

/// Byte-level access to the chip over the serial link.
///
/// Implementations are not reentrant: the register layer holds `&mut` access
/// and serializes all transactions. `select`/`deselect` bracket every
/// transaction; the register layer guarantees `deselect` runs on all paths,
/// including errors, via a scoped guard.
///
/// A failed transfer is fatal to the current transaction only. It must be
/// reported to the caller and never silently retried at this layer.
pub trait Transport {
    /// Assert the chip-select line.
    fn select(&mut self);

    /// Deassert the chip-select line.
    fn deselect(&mut self);

    /// Clock one byte out of the chip.
    fn read_byte(&mut self) -> BusResult<u8>;

    /// Clock one byte into the chip.
    fn write_byte(&mut self, byte: u8) -> BusResult<()>;

    /// Read `buf.len()` bytes in one run.
    ///
    /// Must leave the chip in the same state as `buf.len()` sequential
    /// [`read_byte`](Transport::read_byte) calls.
    fn read_burst(&mut self, buf: &mut [u8]) -> BusResult<()> {
        for byte in buf {
            *byte = self.read_byte()?;
        }
        Ok(())
    }

    /// Write `buf.len()` bytes in one run.
    ///
    /// Must leave the chip in the same state as `buf.len()` sequential
    /// [`write_byte`](Transport::write_byte) calls.
    fn write_burst(&mut self, buf: &[u8]) -> BusResult<()> {
        for &byte in buf {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Whether bulk transfers take a faster path than byte-at-a-time.
    ///
    /// The register layer uses this to pick between per-byte SPI frames and
    /// a single auto-increment frame for buffer transfers.
    fn supports_burst(&self) -> bool {
        false
    }
}

// =============================================================================
// SPI Transport
// =============================================================================

/// SPI transport with an explicit active-low chip-select pin.
///
/// # Example
///
/// ```ignore
/// let spi = /* SpiBus from your HAL, mode 0, <= 33 MHz */;
/// let cs = /* push-pull output, initialized high */;
/// let transport = SpiTransport::new(spi, cs).with_burst();
/// ```
pub struct SpiTransport<SPI, CS> {
    spi: SPI,
    cs: CS,
    burst: bool,
}

impl<SPI, CS> SpiTransport<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// Byte used to clock data out while reading.
    const FILL: u8 = 0xFF;

    /// Create a new transport. The chip-select pin is driven high.
    pub fn new(spi: SPI, mut cs: CS) -> Self {
        let _ = cs.set_high();
        Self {
            spi,
            cs,
            burst: false,
        }
    }

    /// Enable the bulk transfer path.
    ///
    /// Only worthwhile when the underlying `SpiBus` accelerates slice
    /// transfers (DMA); the wire contents are identical either way.
    pub fn with_burst(mut self) -> Self {
        self.burst = true;
        self
    }

    /// Release the SPI bus and chip-select pin.
    pub fn free(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS> Transport for SpiTransport<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    fn select(&mut self) {
        let _ = self.cs.set_low();
    }

    fn deselect(&mut self) {
        let _ = self.cs.set_high();
    }

    fn read_byte(&mut self) -> BusResult<u8> {
        let mut rx = [0u8; 1];
        self.spi
            .transfer(&mut rx, &[Self::FILL])
            .map_err(|_| BusError::Timeout)?;
        Ok(rx[0])
    }

    fn write_byte(&mut self, byte: u8) -> BusResult<()> {
        self.spi.write(&[byte]).map_err(|_| BusError::Timeout)
    }

    fn read_burst(&mut self, buf: &mut [u8]) -> BusResult<()> {
        self.spi.read(buf).map_err(|_| BusError::Timeout)
    }

    fn write_burst(&mut self, buf: &[u8]) -> BusResult<()> {
        self.spi.write(buf).map_err(|_| BusError::Timeout)
    }

    fn supports_burst(&self) -> bool {
        self.burst
    }
}

// Forward through mutable references so a transport can be borrowed by the
// register layer without giving up ownership.
impl<T: Transport + ?Sized> Transport for &mut T {
    fn select(&mut self) {
        (**self).select();
    }

    fn deselect(&mut self) {
        (**self).deselect();
    }

    fn read_byte(&mut self) -> BusResult<u8> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> BusResult<()> {
        (**self).write_byte(byte)
    }

    fn read_burst(&mut self, buf: &mut [u8]) -> BusResult<()> {
        (**self).read_burst(buf)
    }

    fn write_burst(&mut self, buf: &[u8]) -> BusResult<()> {
        (**self).write_burst(buf)
    }

    fn supports_burst(&self) -> bool {
        (**self).supports_burst()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;

    /// Minimal transport that records the byte stream and CS edges.
    #[derive(Default)]
    struct LogTransport {
        written: Vec<u8>,
        selected: bool,
        select_edges: usize,
    }

    impl Transport for LogTransport {
        fn select(&mut self) {
            self.selected = true;
            self.select_edges += 1;
        }

        fn deselect(&mut self) {
            self.selected = false;
        }

        fn read_byte(&mut self) -> BusResult<u8> {
            Ok(0xA5)
        }

        fn write_byte(&mut self, byte: u8) -> BusResult<()> {
            self.written.push(byte);
            Ok(())
        }
    }

    #[test]
    fn default_write_burst_is_sequential_bytes() {
        let mut t = LogTransport::default();
        t.write_burst(&[1, 2, 3]).unwrap();
        assert_eq!(t.written, [1, 2, 3]);
    }

    #[test]
    fn default_read_burst_is_sequential_bytes() {
        let mut t = LogTransport::default();
        let mut buf = [0u8; 4];
        t.read_burst(&mut buf).unwrap();
        assert_eq!(buf, [0xA5; 4]);
    }

    #[test]
    fn default_transport_reports_no_burst() {
        let t = LogTransport::default();
        assert!(!t.supports_burst());
    }

    #[test]
    fn mut_ref_forwarding() {
        let mut t = LogTransport::default();
        let mut r: &mut LogTransport = &mut t;
        r.select();
        r.write_byte(0x42).unwrap();
        r.deselect();
        assert_eq!(t.select_edges, 1);
        assert_eq!(t.written, [0x42]);
        assert!(!t.selected);
    }
}
