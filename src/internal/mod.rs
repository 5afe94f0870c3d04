//! Internal implementation details.
//!
//! Nothing in here is part of the public API surface; the register map is
//! re-exported through [`crate::unsafe_registers`] for advanced use only.

pub(crate) mod map;
