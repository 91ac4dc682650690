use std::os::raw::c_char;
use std::ptr;

use errchain::{ErrorChain, Frame, SystemAllocator};

use crate::args;
use crate::error;
use crate::types::{ChainHandle, ErrChainFrame, ErrChainHandle, ErrChainResult};

/// Allocator behind every chain created through the C ABI.
static ALLOCATOR: SystemAllocator = SystemAllocator::new();

fn with_chain<T>(handle: ErrChainHandle, on_error: T, f: impl FnOnce(&ChainHandle) -> T) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("chain handle cannot be null");
        return on_error;
    }

    let chain_handle = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &*(handle as *const ChainHandle) }
    };

    f(chain_handle)
}

fn with_chain_mut<T>(
    handle: ErrChainHandle,
    on_error: T,
    f: impl FnOnce(&mut ChainHandle) -> T,
) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("chain handle cannot be null");
        return on_error;
    }

    let chain_handle = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &mut *(handle as *mut ChainHandle) }
    };

    f(chain_handle)
}

fn write_frame_out(out_frame: *mut ErrChainFrame, frame: Option<Frame<'_>>) -> bool {
    if out_frame.is_null() {
        let _ = error::set_invalid_argument("out_frame cannot be null");
        return false;
    }

    let frame_ref = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &mut *out_frame }
    };

    match frame {
        Some(frame) => {
            *frame_ref = ErrChainFrame::from(frame);
            true
        }
        None => {
            *frame_ref = ErrChainFrame::default();
            false
        }
    }
}

#[derive(Clone, Copy)]
enum End {
    First,
    Last,
}

/// Shared body of the two push entry points.
///
/// # Safety
/// See [`errchain_push_first`].
#[allow(clippy::too_many_arguments)]
unsafe fn push(
    end: End,
    chain: ErrChainHandle,
    code: i64,
    file: *const c_char,
    line: u64,
    function: *const c_char,
    opaque: *const u8,
    opaque_size: usize,
) -> ErrChainResult {
    error::clear_error_state();

    // SAFETY: We validate null and UTF-8 in helper.
    let Some(file) = (unsafe { args::required_str_arg(file, "file") }) else {
        return ErrChainResult::InvalidArgument;
    };
    // SAFETY: We validate null and UTF-8 in helper.
    let Some(function) = (unsafe { args::required_str_arg(function, "function") }) else {
        return ErrChainResult::InvalidArgument;
    };
    // SAFETY: We validate the null/size pairing in helper.
    let Some(opaque) = (unsafe { args::bytes_arg(opaque, opaque_size, "opaque") }) else {
        return ErrChainResult::InvalidArgument;
    };

    with_chain_mut(chain, ErrChainResult::InvalidArgument, |handle| {
        let result = match end {
            End::First => handle.chain.push_first(code, file, line, function, opaque),
            End::Last => handle.chain.push_last(code, file, line, function, opaque),
        };
        match result {
            Ok(()) => ErrChainResult::Ok,
            Err(err) => error::map_alloc_error(&err),
        }
    })
}

/// Create an empty chain and store its handle in `out_chain`.
///
/// # Safety
/// `out_chain` must be a valid, writable pointer.
#[no_mangle]
pub unsafe extern "C" fn errchain_construct(out_chain: *mut ErrChainHandle) -> ErrChainResult {
    crate::ffi_boundary(ErrChainResult::Internal, || {
        error::clear_error_state();

        if out_chain.is_null() {
            return error::set_invalid_argument("out_chain cannot be null");
        }

        match ErrorChain::construct(&ALLOCATOR) {
            Ok(chain) => {
                let handle = Box::into_raw(Box::new(ChainHandle { chain })) as ErrChainHandle;
                // SAFETY: `out_chain` was checked for null; validity is guaranteed by the caller.
                unsafe { *out_chain = handle };
                ErrChainResult::Ok
            }
            Err(err) => {
                // SAFETY: `out_chain` was checked for null; validity is guaranteed by the caller.
                unsafe { *out_chain = ptr::null_mut() };
                error::map_alloc_error(&err)
            }
        }
    })
}

/// Release every frame and the chain itself, then null `*chain`.
///
/// # Safety
/// `chain` must be null, or point to null or to a handle returned by
/// `errchain_construct` that has not been destructed.
#[no_mangle]
pub unsafe extern "C" fn errchain_destruct(chain: *mut ErrChainHandle) {
    crate::ffi_boundary((), || {
        if chain.is_null() {
            return;
        }

        let handle = {
            // SAFETY: Pointer validity is guaranteed by the caller.
            unsafe { &mut *chain }
        };
        if handle.is_null() {
            return;
        }

        // SAFETY: Handle was created by `errchain_construct` via Box::into_raw.
        let owned = unsafe { Box::from_raw(*handle as *mut ChainHandle) };
        owned.chain.destruct();
        *handle = ptr::null_mut();
    });
}

/// Release every frame, keeping the chain usable.
///
/// # Safety
/// `chain` must be a valid handle returned by `errchain_construct`.
#[no_mangle]
pub unsafe extern "C" fn errchain_clear(chain: ErrChainHandle) {
    crate::ffi_boundary((), || {
        with_chain_mut(chain, (), |handle| handle.chain.clear());
    });
}

/// Push a frame in front of the first one.
///
/// `file` and `function` are copied; they need not outlive the call.
///
/// # Safety
/// `chain` must be a valid handle returned by `errchain_construct`.
/// `file` and `function` must be non-null, NUL-terminated UTF-8 strings.
/// If `opaque_size > 0`, `opaque` must be readable for that many bytes.
#[no_mangle]
pub unsafe extern "C" fn errchain_push_first(
    chain: ErrChainHandle,
    code: i64,
    file: *const c_char,
    line: u64,
    function: *const c_char,
    opaque: *const u8,
    opaque_size: usize,
) -> ErrChainResult {
    crate::ffi_boundary(ErrChainResult::Internal, || {
        // SAFETY: Forwarded caller guarantees.
        unsafe {
            push(
                End::First,
                chain,
                code,
                file,
                line,
                function,
                opaque,
                opaque_size,
            )
        }
    })
}

/// Push a frame after the last one.
///
/// # Safety
/// Same requirements as `errchain_push_first`.
#[no_mangle]
pub unsafe extern "C" fn errchain_push_last(
    chain: ErrChainHandle,
    code: i64,
    file: *const c_char,
    line: u64,
    function: *const c_char,
    opaque: *const u8,
    opaque_size: usize,
) -> ErrChainResult {
    crate::ffi_boundary(ErrChainResult::Internal, || {
        // SAFETY: Forwarded caller guarantees.
        unsafe {
            push(
                End::Last,
                chain,
                code,
                file,
                line,
                function,
                opaque,
                opaque_size,
            )
        }
    })
}

/// Remove the first frame. No-op if the chain is empty.
///
/// # Safety
/// `chain` must be a valid handle returned by `errchain_construct`.
#[no_mangle]
pub unsafe extern "C" fn errchain_discard_first(chain: ErrChainHandle) {
    crate::ffi_boundary((), || {
        with_chain_mut(chain, (), |handle| handle.chain.discard_first());
    });
}

/// Remove the last frame. No-op if the chain is empty.
///
/// # Safety
/// `chain` must be a valid handle returned by `errchain_construct`.
#[no_mangle]
pub unsafe extern "C" fn errchain_discard_last(chain: ErrChainHandle) {
    crate::ffi_boundary((), || {
        with_chain_mut(chain, (), |handle| handle.chain.discard_last());
    });
}

/// Fill `out_frame` with a view of the first frame.
///
/// Returns `false` (and zeroes `out_frame`) when the chain is empty.
///
/// # Safety
/// `chain` must be a valid handle returned by `errchain_construct`.
/// `out_frame` must be a valid, writable pointer.
#[no_mangle]
pub unsafe extern "C" fn errchain_peek_first(
    chain: ErrChainHandle,
    out_frame: *mut ErrChainFrame,
) -> bool {
    crate::ffi_boundary(false, || {
        with_chain(chain, false, |handle| {
            write_frame_out(out_frame, handle.chain.peek_first())
        })
    })
}

/// Fill `out_frame` with a view of the last frame.
///
/// # Safety
/// Same requirements as `errchain_peek_first`.
#[no_mangle]
pub unsafe extern "C" fn errchain_peek_last(
    chain: ErrChainHandle,
    out_frame: *mut ErrChainFrame,
) -> bool {
    crate::ffi_boundary(false, || {
        with_chain(chain, false, |handle| {
            write_frame_out(out_frame, handle.chain.peek_last())
        })
    })
}

/// Number of frames in the chain. Zero for a null handle.
///
/// # Safety
/// `chain` must be null or a valid handle returned by `errchain_construct`.
#[no_mangle]
pub unsafe extern "C" fn errchain_size(chain: ErrChainHandle) -> usize {
    crate::ffi_boundary(0, || with_chain(chain, 0, |handle| handle.chain.size()))
}

/// # Safety
/// `chain` must be null or a valid handle returned by `errchain_construct`.
#[no_mangle]
pub unsafe extern "C" fn errchain_is_empty(chain: ErrChainHandle) -> bool {
    crate::ffi_boundary(true, || {
        with_chain(chain, true, |handle| handle.chain.is_empty())
    })
}
