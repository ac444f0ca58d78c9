//! Splitting a free block into a used front and a free residual.

use crate::bins::BinArray;
use crate::header::{BlockHeader, HEADER_SIZE, MIN_BLOCK_SIZE};

/// Would splitting a free block of `payload_size` bytes to serve
/// `want` bytes leave a residual of at least the minimum block size?
pub fn should_split(payload_size: usize, want: usize) -> bool {
    payload_size >= want + MIN_BLOCK_SIZE
}

/// Carve `want` payload bytes off the front of `block`, which must
/// already satisfy `should_split(block.size, want)` and must already
/// be removed from its bin. Returns the used front; the free residual
/// is inserted into `bins` before returning.
///
/// # Safety
/// `block` must be a valid free block with payload `>= want +
/// MIN_BLOCK_SIZE`, already spliced out of any bin, with intact
/// physical-list pointers.
pub unsafe fn split(
    bins: &mut BinArray,
    heap_tail: &mut *mut BlockHeader,
    block: *mut BlockHeader,
    want: usize,
) -> *mut BlockHeader {
    unsafe {
        let old_size = (*block).size as usize;
        let old_next = (*block).next_phys;

        let residual = (block as *mut u8).add(HEADER_SIZE + want) as *mut BlockHeader;
        let residual_size = old_size - want - HEADER_SIZE;
        BlockHeader::init(residual, residual_size as u32, false);

        (*block).size = want as u32;
        (*block).in_use = true;
        (*block).next_phys = residual;

        (*residual).prev_phys = block;
        (*residual).next_phys = old_next;
        if old_next.is_null() {
            *heap_tail = residual;
        } else {
            (*old_next).prev_phys = residual;
        }

        bins.insert(residual);
        block
    }
}
