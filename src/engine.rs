//! The allocation engine: consumes a byte request and either serves it
//! from a bin (exact-fit or split), serves it via first-fit in the
//! overflow bin, or grows the heap; and the symmetric free path that
//! coalesces with physical neighbors, reinserts into a bin, or
//! contracts the heap when the freed block is the tail.

use core::ptr;

use crate::bins::{BinArray, size_to_bin};
use crate::brk::BreakSource;
use crate::coalesce::coalesce;
use crate::header::{
    BlockHeader, MIN_BLOCK_SIZE, OVERFLOW_BIN, block_to_data, block_bytes, data_to_block, round_up,
};
use crate::log::{log_debug, log_error};
use crate::physical::{append_tail, pop_tail};
use crate::split::{should_split, split};

/// A single allocator instance: its own bin array, physical-list tail,
/// and break source. Owning all state in a value (rather than process
/// globals) lets independent allocators run over disjoint address
/// ranges, which is how the test suite exercises it.
pub struct Allocator<B: BreakSource> {
    break_source: B,
    bins: BinArray,
    heap_tail: *mut BlockHeader,
}

impl<B: BreakSource> Allocator<B> {
    pub fn new(break_source: B) -> Self {
        Self {
            break_source,
            bins: BinArray::new(),
            heap_tail: ptr::null_mut(),
        }
    }

    /// Query the current program break without growing it. Exposed
    /// mainly for tests that need to observe `grow(0)` directly.
    pub fn probe_break(&mut self) -> *mut u8 {
        self.break_source
            .grow(0)
            .expect("grow(0) is a pure query and must not fail")
    }

    /// Allocate at least `size` bytes. Returns null if `size == 0` or
    /// if the heap could not be grown to satisfy the request.
    pub fn allocate(&mut self, size: u32) -> *mut u8 {
        if size == 0 {
            return ptr::null_mut();
        }

        let s = round_up(size as usize);
        let bin = size_to_bin(s);

        if bin < OVERFLOW_BIN {
            let head = self.bins.head(bin);
            if !head.is_null() {
                debug_assert_eq!(
                    size_to_bin(unsafe { (*head).size } as usize),
                    bin,
                    "bin membership must match the block's own size"
                );
                unsafe {
                    self.bins.remove(head);
                    (*head).in_use = true;
                    return block_to_data(head);
                }
            }

            if let Some(used) = self.split_from_larger_small_bin(s) {
                return used;
            }
        }

        if let Some(used) = self.first_fit_overflow(s) {
            return used;
        }

        self.grow_heap(s)
    }

    /// Release a previously allocated payload pointer. Null is a no-op.
    pub fn release(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }

        unsafe {
            let block = data_to_block(ptr);
            (*block).in_use = false;

            let merged = coalesce(&mut self.bins, &mut self.heap_tail, block);

            if (*merged).next_phys.is_null() {
                let base = merged as *mut u8;
                pop_tail(&mut self.heap_tail);
                self.break_source.shrink_to(base);
                log_debug!("contracted heap to {base:p}");
            } else {
                self.bins.insert(merged);
            }
        }
    }

    /// Step 4 of the allocation path: scan small bins from the first
    /// one whose head could be split, upward, taking the first
    /// non-empty bin whose head actually has room to split.
    fn split_from_larger_small_bin(&mut self, s: usize) -> Option<*mut u8> {
        let start = size_to_bin(s + MIN_BLOCK_SIZE);
        for bin in start..OVERFLOW_BIN {
            let head = self.bins.head(bin);
            if head.is_null() {
                continue;
            }
            let payload = unsafe { (*head).size } as usize;
            if !should_split(payload, s) {
                continue;
            }
            unsafe {
                self.bins.remove(head);
                let used = split(&mut self.bins, &mut self.heap_tail, head, s);
                return Some(block_to_data(used));
            }
        }
        None
    }

    /// Step 5: first-fit walk of the overflow bin.
    fn first_fit_overflow(&mut self, s: usize) -> Option<*mut u8> {
        let mut current = self.bins.head(OVERFLOW_BIN);
        while !current.is_null() {
            let payload = unsafe { (*current).size } as usize;
            let next = unsafe { (*current).next_free };
            if payload >= s {
                unsafe {
                    self.bins.remove(current);
                    if should_split(payload, s) {
                        let used = split(&mut self.bins, &mut self.heap_tail, current, s);
                        return Some(block_to_data(used));
                    }
                    (*current).in_use = true;
                    return Some(block_to_data(current));
                }
            }
            current = next;
        }
        None
    }

    /// Step 6: advance the break and append a freshly used block.
    fn grow_heap(&mut self, s: usize) -> *mut u8 {
        match self.break_source.grow(block_bytes(s)) {
            Ok(base) => unsafe {
                let block = base as *mut BlockHeader;
                BlockHeader::init(block, s as u32, true);
                append_tail(&mut self.heap_tail, block);
                log_debug!("grew heap by {} bytes at {base:p}", block_bytes(s));
                block_to_data(block)
            },
            Err(err) => {
                log_error!("failed to grow heap by {} bytes: {err}", block_bytes(s));
                ptr::null_mut()
            }
        }
    }
}

#[cfg(debug_assertions)]
impl<B: BreakSource> Allocator<B> {
    /// Walk the physical list and every bin and check the structural
    /// invariants that must hold between any two public calls: no two
    /// physically adjacent blocks are both free, and every free block
    /// lives in exactly the bin its own size predicts. Meant to be
    /// called from tests after each `allocate`/`release`; panics on
    /// the first violation found.
    pub fn assert_invariants(&self) {
        use std::collections::HashSet;

        let mut by_address = Vec::new();
        let mut cursor = self.heap_tail;
        while !cursor.is_null() {
            by_address.push(cursor);
            cursor = unsafe { (*cursor).prev_phys };
        }
        by_address.reverse();

        for pair in by_address.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            unsafe {
                assert_eq!((*left).next_phys, right, "physical list must be contiguous");
                assert_eq!((*right).prev_phys, left, "physical list must be contiguous");
                assert!(
                    (*left).in_use || (*right).in_use,
                    "two physically adjacent blocks are both free"
                );
            }
        }

        let free_blocks: HashSet<*mut BlockHeader> = by_address
            .iter()
            .copied()
            .filter(|&block| !unsafe { (*block).in_use })
            .collect();

        let mut seen_in_bins: HashSet<*mut BlockHeader> = HashSet::new();
        for bin in 0..crate::header::BIN_COUNT {
            let mut node = self.bins.head(bin);
            while !node.is_null() {
                unsafe {
                    assert!(!(*node).in_use, "bin holds a used block");
                    assert_eq!(
                        size_to_bin((*node).size as usize),
                        bin,
                        "block sits in a bin its size does not predict"
                    );
                    assert!(seen_in_bins.insert(node), "block listed in more than one bin");
                    node = (*node).next_free;
                }
            }
        }

        assert_eq!(
            free_blocks, seen_in_bins,
            "free blocks and bin membership must match exactly"
        );
    }
}
