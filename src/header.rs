//! Block header layout and address arithmetic.
//!
//! A block is a header followed by a payload. The header has two
//! regions: `size`/`in_use`/`prev_phys`/`next_phys` are valid for the
//! lifetime of the block, while `prev_free`/`next_free` overlap the
//! start of the payload and are only meaningful while the block is
//! free. `HEADER_SIZE` — the "public" header size used for every
//! pointer conversion — is the offset of `prev_free`, not the size of
//! the whole struct, so a used block only pays for the first region.

use core::ptr;

/// Minimum payload size, in bytes.
pub const MIN_PAYLOAD: usize = 16;
/// Size-class quantum, in bytes.
pub const QUANTUM: usize = 8;
/// Largest payload size that gets its own bin; anything bigger lives
/// in the overflow bin.
pub const MAX_BINNED_PAYLOAD: usize = 512;
/// Number of bins: one per quantum step between `MIN_PAYLOAD` and
/// `MAX_BINNED_PAYLOAD`, plus the overflow bin.
pub const BIN_COUNT: usize = 2 + (MAX_BINNED_PAYLOAD - MIN_PAYLOAD) / QUANTUM;
/// Index of the overflow bin.
pub const OVERFLOW_BIN: usize = BIN_COUNT - 1;

#[repr(C)]
pub struct BlockHeader {
    pub size: u32,
    pub in_use: bool,
    pub prev_phys: *mut BlockHeader,
    pub next_phys: *mut BlockHeader,
    // Free-only region: overlaps the payload, valid only while `in_use == false`.
    pub prev_free: *mut BlockHeader,
    pub next_free: *mut BlockHeader,
}

/// Offset of `prev_free` within `BlockHeader` — the public header size
/// used for every header/payload pointer conversion below.
pub const HEADER_SIZE: usize = core::mem::offset_of!(BlockHeader, prev_free);

/// Minimum total block size (header + minimum payload).
pub const MIN_BLOCK_SIZE: usize = HEADER_SIZE + MIN_PAYLOAD;

impl BlockHeader {
    /// Initialize a freshly carved-out header.
    ///
    /// # Safety
    /// `block` must point to writable memory of at least `HEADER_SIZE`
    /// bytes, suitably aligned for `BlockHeader`.
    pub unsafe fn init(block: *mut BlockHeader, size: u32, in_use: bool) {
        unsafe {
            (*block).size = size;
            (*block).in_use = in_use;
            (*block).prev_phys = ptr::null_mut();
            (*block).next_phys = ptr::null_mut();
            (*block).prev_free = ptr::null_mut();
            (*block).next_free = ptr::null_mut();
        }
    }
}

/// Round a requested payload size up to a valid bin size.
///
/// `0 < s <= MIN_PAYLOAD` rounds to `MIN_PAYLOAD`; otherwise rounds up
/// to the next multiple of `QUANTUM`.
pub fn round_up(s: usize) -> usize {
    if s <= MIN_PAYLOAD {
        MIN_PAYLOAD
    } else {
        s.div_ceil(QUANTUM) * QUANTUM
    }
}

/// Address of the payload immediately following a header.
///
/// # Safety
/// `block` must be a valid, non-null block pointer.
pub unsafe fn block_to_data(block: *mut BlockHeader) -> *mut u8 {
    unsafe { (block as *mut u8).add(HEADER_SIZE) }
}

/// Recover the header pointer from a payload pointer previously
/// returned by `block_to_data`.
///
/// # Safety
/// `data` must have been produced by `block_to_data` on a still-live
/// block.
pub unsafe fn data_to_block(data: *mut u8) -> *mut BlockHeader {
    unsafe { data.sub(HEADER_SIZE) as *mut BlockHeader }
}

/// Total byte footprint (header + payload) of a block carrying
/// `payload_size` bytes of payload.
pub const fn block_bytes(payload_size: usize) -> usize {
    HEADER_SIZE + payload_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size_is_prefix_of_full_struct() {
        assert!(HEADER_SIZE < core::mem::size_of::<BlockHeader>());
        assert!(HEADER_SIZE % 8 == 0);
    }

    #[test]
    fn round_up_clamps_small_sizes_to_minimum() {
        assert_eq!(round_up(1), MIN_PAYLOAD);
        assert_eq!(round_up(16), MIN_PAYLOAD);
    }

    #[test]
    fn round_up_rounds_to_quantum_above_minimum() {
        assert_eq!(round_up(17), 24);
        assert_eq!(round_up(24), 24);
        assert_eq!(round_up(25), 32);
        assert_eq!(round_up(2000), 2000);
        assert_eq!(round_up(2001), 2008);
    }

    #[test]
    fn data_pointer_round_trips() {
        let mut storage = [0u8; 64];
        let block = storage.as_mut_ptr() as *mut BlockHeader;
        unsafe {
            let data = block_to_data(block);
            assert_eq!(data_to_block(data), block);
        }
    }

    #[test]
    fn bin_count_matches_spec() {
        assert_eq!(BIN_COUNT, 64);
        assert_eq!(OVERFLOW_BIN, 63);
    }
}
