//! ISR-Safe Synchronization Wrappers
//!
//! Interrupt-safe access to the driver using the `critical-section`
//! crate. The physical SPI link is inherently serial, so one exclusive
//! lock around the driver context is both necessary and sufficient when
//! it is shared between main-loop code and interrupt handlers.
//!
//! For single-context use (nothing touches the chip from an interrupt),
//! plain ownership of [`W5100s`] is simpler and has no overhead.
//!
//! # Example
//!
//! ```ignore
//! use ph_w5100s_spi::sync::SharedW5100;
//!
//! static CHIP: SharedW5100<MyTransport> = SharedW5100::new(W5100s::new(transport));
//!
//! fn main_loop() {
//!     CHIP.with(|chip| {
//!         server.service(chip).ok();
//!     });
//! }
//!
//! #[interrupt]
//! fn ETH_IRQ() {
//!     CHIP.with(|chip| {
//!         // short, bounded work only
//!         let _ = chip.is_link_up();
//!     });
//! }
//! ```
//!
//! # Implementation Note
//!
//! The critical section implementation is provided by the HAL crate
//! (e.g., `rp2040-hal` with its `critical-section-impl` feature). On
//! single-core targets this typically disables interrupts; on dual-core
//! parts it also takes a hardware spinlock.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::driver::chip::W5100s;
use crate::hal::transport::Transport;

// =============================================================================
// CriticalSectionCell
// =============================================================================

/// A cell providing interior mutability with critical section protection.
///
/// Combines `critical_section::Mutex` with `RefCell` for safe mutable
/// access from both normal code and interrupt handlers.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a new cell with the given value.
    ///
    /// This is a const function suitable for static initialization.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Execute a closure with exclusive access to the wrapped value.
    ///
    /// Interrupts are disabled for the duration of the closure; keep it
    /// short to bound interrupt latency.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut value = self.inner.borrow_ref_mut(cs);
            f(&mut value)
        })
    }

    /// Try to execute a closure, returning `None` if the value is already
    /// borrowed.
    ///
    /// With correct critical-section usage the value can never be
    /// borrowed when this runs; this is the non-panicking alternative to
    /// [`with`](CriticalSectionCell::with).
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut value = self.inner.borrow(cs).try_borrow_mut().ok()?;
            Some(f(&mut value))
        })
    }
}

// =============================================================================
// SharedW5100
// =============================================================================

/// ISR-safe driver wrapper using critical sections.
///
/// All access goes through `critical_section::with()`, so the register
/// layer's single-transaction invariant holds even when interrupt
/// handlers drive the chip.
pub struct SharedW5100<T: Transport> {
    inner: CriticalSectionCell<W5100s<T>>,
}

impl<T: Transport> SharedW5100<T> {
    /// Wrap a driver context for shared access.
    ///
    /// This is a const function suitable for static initialization.
    pub const fn new(chip: W5100s<T>) -> Self {
        Self {
            inner: CriticalSectionCell::new(chip),
        }
    }

    /// Execute a closure with exclusive access to the driver.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut W5100s<T>) -> R,
    {
        self.inner.with(f)
    }

    /// Non-panicking variant of [`with`](SharedW5100::with); returns
    /// `None` if the driver is already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut W5100s<T>) -> R,
    {
        self.inner.try_with(f)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
