//! Hardware reset controller.
//!
//! The W5100S has a dedicated active-low reset line. The reset sequence is
//! a fixed low-then-high pulse with datasheet-mandated settle delays on
//! both edges; the chip is not addressable until the post-reset delay has
//! elapsed.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

// =============================================================================
// Timing Constants
// =============================================================================

/// How long the reset line is held low, in milliseconds.
pub const RESET_ASSERT_MS: u32 = 100;

/// Settle time after releasing reset, in milliseconds.
pub const RESET_SETTLE_MS: u32 = 100;

// =============================================================================
// Reset Controller
// =============================================================================

/// Drives the chip's active-low reset pin.
///
/// # Example
///
/// ```ignore
/// let mut reset = ResetController::new(rst_pin);
/// reset.pulse(&mut delay);
/// ```
#[derive(Debug)]
pub struct ResetController<RST> {
    pin: RST,
}

impl<RST: OutputPin> ResetController<RST> {
    /// Create a new reset controller. The pin is driven high (inactive).
    pub fn new(mut pin: RST) -> Self {
        let _ = pin.set_high();
        Self { pin }
    }

    /// Perform the full hardware reset pulse.
    ///
    /// Blocks for `RESET_ASSERT_MS + RESET_SETTLE_MS`. After this returns,
    /// all chip registers hold their reset defaults and the chip is ready
    /// for SPI access.
    pub fn pulse<D: DelayNs>(&mut self, delay: &mut D) {
        let _ = self.pin.set_low();
        delay.delay_ms(RESET_ASSERT_MS);
        let _ = self.pin.set_high();
        delay.delay_ms(RESET_SETTLE_MS);
    }

    /// Release the reset pin.
    pub fn free(self) -> RST {
        self.pin
    }
}
