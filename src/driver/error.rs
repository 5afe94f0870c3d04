//! Error types for the W5100S driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`BusError`]: transport and register access failures
//! - [`ConfigError`]: bring-up and configuration failures
//! - [`SocketError`]: socket state machine and session failures
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most driver methods.
//!
//! Partial transfers are not errors: `send`/`recv` report byte counts, and
//! zero bytes from `recv` means "no data yet", not failure.

// =============================================================================
// Bus Errors
// =============================================================================

/// Transport and register access errors
///
/// These errors occur while moving bytes over the SPI link or addressing
/// the chip's register banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Transfer failed or timed out; fatal to the current transaction only
    Timeout,
    /// Address outside the register map for the target block
    InvalidAddress,
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BusError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BusError::Timeout => "transport timeout",
            BusError::InvalidAddress => "address outside register map",
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Bring-up and configuration errors
///
/// These errors occur during chip reset, identity verification, or
/// network/PHY configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Driver already initialized
    AlreadyInitialized,
    /// Software reset did not complete
    ResetFailed,
    /// Version register did not match the expected W5100S value
    IdentityMismatch,
    /// Invalid configuration parameter
    InvalidConfig,
    /// Operation requires a brought-up chip
    NotInitialized,
    /// Link did not come up within the bring-up wait
    LinkTimeout,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::AlreadyInitialized => "already initialized",
            ConfigError::ResetFailed => "software reset failed",
            ConfigError::IdentityMismatch => "chip identity mismatch",
            ConfigError::InvalidConfig => "invalid configuration",
            ConfigError::NotInitialized => "driver not initialized",
            ConfigError::LinkTimeout => "link did not come up",
        }
    }
}

// =============================================================================
// Socket Errors
// =============================================================================

/// Socket state machine errors
///
/// These errors are caller logic errors or chip-reported conditions,
/// surfaced as result codes; the affected socket can always be reclaimed
/// with `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketError {
    /// Socket is not in `Closed` state, cannot open
    Busy,
    /// Command not valid from the socket's current state
    InvalidTransition,
    /// Status register reported a value outside the documented set
    UnknownStatus(u8),
    /// PHY reports link down; recoverable, traffic resumes on link-up
    LinkDown,
}

impl core::fmt::Display for SocketError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SocketError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SocketError::Busy => "socket busy",
            SocketError::InvalidTransition => "invalid socket state transition",
            SocketError::UnknownStatus(_) => "unknown socket status",
            SocketError::LinkDown => "link down",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Bus(BusError::Timeout)) => { /* ... */ }
///     Err(Error::Config(ConfigError::IdentityMismatch)) => { /* ... */ }
///     Err(Error::Socket(SocketError::Busy)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Bus error
    Bus(BusError),
    /// Configuration error
    Config(ConfigError),
    /// Socket error
    Socket(SocketError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "bus: {}", e.as_str()),
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Socket(SocketError::UnknownStatus(raw)) => {
                write!(f, "socket: unknown socket status 0x{raw:02x}")
            }
            Error::Socket(e) => write!(f, "socket: {}", e.as_str()),
        }
    }
}

// From impls for automatic conversion
impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Error::Bus(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<SocketError> for Error {
    fn from(e: SocketError) -> Self {
        Error::Socket(e)
    }
}

/// Result type alias for driver operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for bus operations
pub type BusResult<T> = core::result::Result<T, BusError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for socket operations
pub type SocketResult<T> = core::result::Result<T, SocketError>;

// =============================================================================
// Unit Tests
// =============================================================================
