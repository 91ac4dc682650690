//! errchain-ffi: C-ABI exports for errchain.
//!
//! Chains created here draw from the process-wide system allocator. Every
//! entry point catches panics and records a message retrievable with
//! [`errchain_last_error`] on the calling thread.

mod args;
mod chain;
mod error;
mod types;

use std::panic::AssertUnwindSafe;

pub use chain::{
    errchain_clear, errchain_construct, errchain_destruct, errchain_discard_first,
    errchain_discard_last, errchain_is_empty, errchain_peek_first, errchain_peek_last,
    errchain_push_first, errchain_push_last, errchain_size,
};
pub use types::{
    ErrChainFrame, ErrChainHandle, ErrChainResult, ERRCHAIN_ERR_ALLOCATION_LIMIT,
    ERRCHAIN_ERR_BUDGET_EXHAUSTED, ERRCHAIN_ERR_INJECTED_FAILURE, ERRCHAIN_ERR_INTERNAL,
    ERRCHAIN_ERR_INVALID_ARGUMENT, ERRCHAIN_ERR_OUT_OF_MEMORY, ERRCHAIN_OK,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

/// Message describing the last failure on this thread, or an empty string.
///
/// The pointer stays valid until the next errchain call on this thread.
#[no_mangle]
pub extern "C" fn errchain_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}
