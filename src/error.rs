//! Error types for the ambient (non-allocation-policy) parts of the crate.
//!
//! The allocation/free operations themselves never return `Result` —
//! a failed request surfaces as a null pointer — but the break source
//! distinguishes *why* growth failed so the log line has something
//! informative to render.

use core::fmt;

/// Why a `BreakSource::grow` call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakError {
    /// The simulated or real address space has no more room to grow into.
    ExhaustedAddressSpace,
}

impl fmt::Display for BreakError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExhaustedAddressSpace => write!(f, "program break cannot grow further"),
        }
    }
}

impl std::error::Error for BreakError {}
