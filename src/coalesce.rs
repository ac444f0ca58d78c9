//! Coalescing: merge a freed block with free physical neighbors.
//!
//! Called only from the free path with a block that has already been
//! marked free but is not yet a member of any bin, and whose physical
//! neighbors are untouched. Returns the (possibly merged) free block;
//! callers are responsible for inserting the result into a bin (or
//! recognizing it as the new tail and contracting instead).

use crate::bins::BinArray;
use crate::header::{BlockHeader, HEADER_SIZE};

/// # Safety
/// `block` must be free, unlisted in any bin, with intact physical
/// neighbor pointers.
pub unsafe fn coalesce(
    bins: &mut BinArray,
    heap_tail: &mut *mut BlockHeader,
    block: *mut BlockHeader,
) -> *mut BlockHeader {
    unsafe {
        let prev = (*block).prev_phys;
        let next = (*block).next_phys;
        let prev_is_free = !prev.is_null() && !(*prev).in_use;
        let next_is_free = !next.is_null() && !(*next).in_use;

        match (prev_is_free, next_is_free) {
            (false, false) => block,
            (true, true) => {
                bins.remove(prev);
                bins.remove(next);
                let merged = (*prev).size as usize
                    + HEADER_SIZE
                    + (*block).size as usize
                    + HEADER_SIZE
                    + (*next).size as usize;
                (*prev).size = merged as u32;
                let successor = (*next).next_phys;
                (*prev).next_phys = successor;
                if successor.is_null() {
                    *heap_tail = prev;
                } else {
                    (*successor).prev_phys = prev;
                }
                prev
            }
            (true, false) => {
                bins.remove(prev);
                let merged = (*prev).size as usize + HEADER_SIZE + (*block).size as usize;
                (*prev).size = merged as u32;
                (*prev).next_phys = next;
                if next.is_null() {
                    *heap_tail = prev;
                } else {
                    (*next).prev_phys = prev;
                }
                prev
            }
            (false, true) => {
                bins.remove(next);
                let merged = (*block).size as usize + HEADER_SIZE + (*next).size as usize;
                (*block).size = merged as u32;
                let successor = (*next).next_phys;
                (*block).next_phys = successor;
                if successor.is_null() {
                    *heap_tail = block;
                } else {
                    (*successor).prev_phys = block;
                }
                block
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physical::append_tail;
    use std::boxed::Box;

    fn leaked(size: u32, in_use: bool) -> *mut BlockHeader {
        let mut h = Box::new(unsafe { core::mem::zeroed::<BlockHeader>() });
        unsafe { BlockHeader::init(&mut *h as *mut _, size, in_use) };
        Box::into_raw(h)
    }

    unsafe fn free(ptr: *mut BlockHeader) {
        unsafe {
            drop(Box::from_raw(ptr));
        }
    }

    #[test]
    fn no_merge_when_both_neighbors_used() {
        let mut tail: *mut BlockHeader = core::ptr::null_mut();
        let mut bins = BinArray::new();
        unsafe {
            let a = leaked(24, true);
            let b = leaked(24, false);
            let c = leaked(24, true);
            append_tail(&mut tail, a);
            append_tail(&mut tail, b);
            append_tail(&mut tail, c);

            let merged = coalesce(&mut bins, &mut tail, b);
            assert_eq!(merged, b);
            assert_eq!((*merged).size, 24);

            free(a);
            free(b);
            free(c);
        }
    }

    #[test]
    fn merges_with_free_predecessor_only() {
        let mut tail: *mut BlockHeader = core::ptr::null_mut();
        let mut bins = BinArray::new();
        unsafe {
            let a = leaked(24, false);
            let b = leaked(24, true); // being freed now
            let c = leaked(24, true);
            append_tail(&mut tail, a);
            append_tail(&mut tail, b);
            append_tail(&mut tail, c);
            bins.insert(a);
            (*b).in_use = false;

            let merged = coalesce(&mut bins, &mut tail, b);
            assert_eq!(merged, a);
            assert_eq!((*merged).size as usize, 24 + HEADER_SIZE + 24);
            assert_eq!((*merged).next_phys, c);
            assert_eq!((*c).prev_phys, merged);
            assert!(bins.head(crate::bins::size_to_bin(24)).is_null());

            free(a);
            free(b);
            free(c);
        }
    }

    #[test]
    fn merges_with_free_successor_only_and_updates_tail() {
        let mut tail: *mut BlockHeader = core::ptr::null_mut();
        let mut bins = BinArray::new();
        unsafe {
            let a = leaked(24, true);
            let b = leaked(24, true);
            let c = leaked(24, false);
            append_tail(&mut tail, a);
            append_tail(&mut tail, b);
            append_tail(&mut tail, c);
            bins.insert(c);
            (*b).in_use = false;

            let merged = coalesce(&mut bins, &mut tail, b);
            assert_eq!(merged, b);
            assert_eq!((*merged).size as usize, 24 + HEADER_SIZE + 24);
            assert_eq!(tail, merged);
            assert!((*merged).next_phys.is_null());

            free(a);
            free(b);
            free(c);
        }
    }

    #[test]
    fn merges_both_neighbors_into_one_block() {
        let mut tail: *mut BlockHeader = core::ptr::null_mut();
        let mut bins = BinArray::new();
        unsafe {
            let a = leaked(24, false);
            let b = leaked(24, true);
            let c = leaked(24, false);
            append_tail(&mut tail, a);
            append_tail(&mut tail, b);
            append_tail(&mut tail, c);
            bins.insert(a);
            bins.insert(c);
            (*b).in_use = false;

            let merged = coalesce(&mut bins, &mut tail, b);
            assert_eq!(merged, a);
            assert_eq!((*merged).size as usize, 24 * 3 + HEADER_SIZE * 2);
            assert_eq!(tail, merged);
            assert!((*merged).next_phys.is_null());
            assert!(bins.head(crate::bins::size_to_bin(24)).is_null());

            free(a);
            free(b);
            free(c);
        }
    }
}
