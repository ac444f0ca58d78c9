//! The heap-break interface: grows and shrinks a single contiguous
//! region, standing in for the OS program-break primitive.
//!
//! `grow(0)` is a pure query returning the current break with no side
//! effect, the same `increment == 0`-is-a-query convention POSIX
//! `sbrk` implementations use.

use crate::error::BreakError;

pub trait BreakSource {
    /// Advance the break by `delta` bytes and return the break address
    /// *before* the advance (the base of the newly available region).
    /// `delta == 0` just returns the current break.
    fn grow(&mut self, delta: usize) -> Result<*mut u8, BreakError>;

    /// Move the break down to `addr`. `addr` must be less than or
    /// equal to the current break.
    fn shrink_to(&mut self, addr: *mut u8);
}

/// The real process program break, via the `libc` crate's `sbrk`.
///
/// Unix only: `sbrk` is not a portable primitive, and the real break
/// is always an external collaborator this crate does not own or
/// emulate on other targets.
#[cfg(unix)]
pub struct SystemBreak;

#[cfg(unix)]
impl SystemBreak {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl Default for SystemBreak {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl BreakSource for SystemBreak {
    fn grow(&mut self, delta: usize) -> Result<*mut u8, BreakError> {
        // SAFETY: `sbrk` is the POSIX program-break primitive; a
        // negative `intptr_t` result indicates failure per its
        // contract. `delta` fits in `isize` for any allocation this
        // crate will ever be asked to serve.
        let result = unsafe { libc::sbrk(delta as libc::intptr_t) };
        if result == -1_isize as *mut libc::c_void {
            Err(BreakError::ExhaustedAddressSpace)
        } else {
            Ok(result as *mut u8)
        }
    }

    fn shrink_to(&mut self, addr: *mut u8) {
        // SAFETY: `brk` accepts any address; moving it down to a
        // previously-valid break address is always sound.
        unsafe {
            libc::brk(addr as *mut libc::c_void);
        }
    }
}

/// An in-process simulated break over an owned buffer, for tests and
/// for embedding this crate somewhere the real process break is
/// unavailable or undesirable to touch. Multiple instances can exist
/// independently over disjoint (simulated) address ranges.
pub struct ArenaBreak {
    arena: Vec<u8>,
    used: usize,
}

impl ArenaBreak {
    /// Create a simulated address range of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            arena: vec![0u8; capacity],
            used: 0,
        }
    }

    fn base(&self) -> *mut u8 {
        self.arena.as_ptr() as *mut u8
    }

    fn current(&self) -> *mut u8 {
        // SAFETY: `used` is always within `[0, arena.len()]`.
        unsafe { self.base().add(self.used) }
    }
}

impl BreakSource for ArenaBreak {
    fn grow(&mut self, delta: usize) -> Result<*mut u8, BreakError> {
        let old_break = self.current();
        if delta == 0 {
            return Ok(old_break);
        }
        let new_used = self
            .used
            .checked_add(delta)
            .filter(|&n| n <= self.arena.len())
            .ok_or(BreakError::ExhaustedAddressSpace)?;
        self.used = new_used;
        Ok(old_break)
    }

    fn shrink_to(&mut self, addr: *mut u8) {
        // SAFETY: both pointers are derived from the same `arena`
        // allocation, so the offset computation is in-bounds.
        let offset = unsafe { addr.offset_from(self.base()) };
        debug_assert!(offset >= 0);
        self.used = offset as usize;
    }
}
