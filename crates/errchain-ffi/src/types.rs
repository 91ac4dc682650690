use std::ffi::c_void;
use std::os::raw::c_char;
use std::ptr;

use errchain::alloc::{
    STATUS_ALLOCATION_LIMIT, STATUS_BUDGET_EXHAUSTED, STATUS_INJECTED_FAILURE, STATUS_OK,
    STATUS_OUT_OF_MEMORY,
};
use errchain::{ErrorChain, Frame};

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrChainResult {
    Ok = STATUS_OK,
    OutOfMemory = STATUS_OUT_OF_MEMORY,
    BudgetExhausted = STATUS_BUDGET_EXHAUSTED,
    AllocationLimit = STATUS_ALLOCATION_LIMIT,
    InjectedFailure = STATUS_INJECTED_FAILURE,
    InvalidArgument = 10,
    Internal = 99,
}

#[allow(dead_code)]
pub const ERRCHAIN_OK: ErrChainResult = ErrChainResult::Ok;
#[allow(dead_code)]
pub const ERRCHAIN_ERR_OUT_OF_MEMORY: ErrChainResult = ErrChainResult::OutOfMemory;
#[allow(dead_code)]
pub const ERRCHAIN_ERR_BUDGET_EXHAUSTED: ErrChainResult = ErrChainResult::BudgetExhausted;
#[allow(dead_code)]
pub const ERRCHAIN_ERR_ALLOCATION_LIMIT: ErrChainResult = ErrChainResult::AllocationLimit;
#[allow(dead_code)]
pub const ERRCHAIN_ERR_INJECTED_FAILURE: ErrChainResult = ErrChainResult::InjectedFailure;
#[allow(dead_code)]
pub const ERRCHAIN_ERR_INVALID_ARGUMENT: ErrChainResult = ErrChainResult::InvalidArgument;
#[allow(dead_code)]
pub const ERRCHAIN_ERR_INTERNAL: ErrChainResult = ErrChainResult::Internal;

/// A frame view handed to C callers.
///
/// Every pointer borrows the chain's storage and stays valid until the frame
/// is discarded or the chain is cleared or destructed. `opaque` is null when
/// `opaque_size` is zero.
#[repr(C)]
#[derive(Debug)]
pub struct ErrChainFrame {
    pub code: i64,
    pub file: *const c_char,
    pub line: u64,
    pub function: *const c_char,
    pub opaque: *const u8,
    pub opaque_size: usize,
}

impl Default for ErrChainFrame {
    fn default() -> Self {
        Self {
            code: 0,
            file: ptr::null(),
            line: 0,
            function: ptr::null(),
            opaque: ptr::null(),
            opaque_size: 0,
        }
    }
}

impl From<Frame<'_>> for ErrChainFrame {
    fn from(frame: Frame<'_>) -> Self {
        let opaque = frame.opaque();
        Self {
            code: frame.code(),
            file: frame.file_cstr().as_ptr(),
            line: frame.line(),
            function: frame.function_cstr().as_ptr(),
            opaque: if opaque.is_empty() {
                ptr::null()
            } else {
                opaque.as_ptr()
            },
            opaque_size: opaque.len(),
        }
    }
}

pub type ErrChainHandle = *mut c_void;

pub(crate) struct ChainHandle {
    pub(crate) chain: ErrorChain<'static>,
}
