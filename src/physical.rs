//! Physical (ascending-address) list maintenance.
//!
//! Every block, used or free, is threaded onto this list through
//! `prev_phys`/`next_phys`. `heap_tail` names the highest-address
//! block; it is the only block whose release can shrink the heap.

use core::ptr;

use crate::header::BlockHeader;

/// Attach `block` as the new tail. Used only by the grow path: the new
/// block lives at the address the break just advanced past.
///
/// # Safety
/// `block` must be a freshly initialized header not already on the list.
pub unsafe fn append_tail(heap_tail: &mut *mut BlockHeader, block: *mut BlockHeader) {
    unsafe {
        let old_tail = *heap_tail;
        (*block).next_phys = ptr::null_mut();
        if old_tail.is_null() {
            (*block).prev_phys = ptr::null_mut();
        } else {
            (*block).prev_phys = old_tail;
            (*old_tail).next_phys = block;
        }
        *heap_tail = block;
    }
}

/// Drop the current tail from the physical list. Used only by the
/// contraction path.
///
/// # Safety
/// `*heap_tail` must be non-null.
pub unsafe fn pop_tail(heap_tail: &mut *mut BlockHeader) {
    unsafe {
        let tail = *heap_tail;
        let prev = (*tail).prev_phys;
        if prev.is_null() {
            *heap_tail = ptr::null_mut();
        } else {
            (*prev).next_phys = ptr::null_mut();
            *heap_tail = prev;
        }
    }
}
