//! Minimal leveled diagnostic logging for the allocator.
//!
//! Mirrors the shape of a small backend-dispatch logger: one atomic
//! level, a handful of `log_*!` macros, a single dispatch function.
//! Unlike a kernel build there is always a process `stderr` available,
//! so there is no early-boot fallback backend to register — the
//! dispatcher just writes there directly.

use core::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Off as u8);

/// Set the process-wide log level (default `Off`).
pub fn set_level(level: LogLevel) {
    CURRENT_LEVEL.store(level as u8, Ordering::Relaxed);
}

fn is_enabled(level: LogLevel) -> bool {
    level as u8 <= CURRENT_LEVEL.load(Ordering::Relaxed)
}

/// Dispatch a single pre-formatted log line. Not meant to be called
/// directly — use the `log_*!` macros below.
pub fn log_args(level: LogLevel, args: fmt::Arguments<'_>) {
    if level == LogLevel::Off || !is_enabled(level) {
        return;
    }
    eprintln!("[segheap] {args}");
}

macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::log::log_args($crate::log::LogLevel::Error, ::core::format_args!($($arg)*))
    };
}

macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::log::log_args($crate::log::LogLevel::Debug, ::core::format_args!($($arg)*))
    };
}

pub(crate) use log_debug;
pub(crate) use log_error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_is_the_default_level() {
        assert!(!is_enabled(LogLevel::Error));
    }

    #[test]
    fn raising_the_level_enables_lower_severities() {
        set_level(LogLevel::Info);
        assert!(is_enabled(LogLevel::Error));
        assert!(is_enabled(LogLevel::Info));
        assert!(!is_enabled(LogLevel::Debug));
        set_level(LogLevel::Off);
    }
}
