//! A bin-segregated, program-break-backed user-space allocator.
//!
//! The engine maintains two overlapping intrusive structures through
//! every block header: a physical, address-ordered doubly linked list
//! covering every block (used or free), and a fixed array of 64
//! size-segregated free lists ("bins"). Allocation tries an exact-fit
//! bin, then splitting a larger bin, then first-fit in the overflow
//! bin, then finally grows the heap; release coalesces with physical
//! neighbors and either reinserts the result into a bin or contracts
//! the heap when the freed block is the new tail.
//!
//! ```
//! use segheap::{Allocator, ArenaBreak};
//!
//! let mut heap = Allocator::new(ArenaBreak::new(1 << 16));
//! let p = heap.allocate(64);
//! assert!(!p.is_null());
//! heap.release(p);
//! ```

pub mod bins;
pub mod brk;
pub mod coalesce;
pub mod engine;
pub mod error;
pub mod header;
pub mod log;
pub mod physical;
pub mod split;

pub use brk::{ArenaBreak, BreakSource};
#[cfg(unix)]
pub use brk::SystemBreak;
pub use engine::Allocator;
pub use error::BreakError;
pub use log::{LogLevel, set_level};
