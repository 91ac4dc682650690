use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

use errchain::AllocError;

use crate::types::ErrChainResult;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::default();
    });
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let message = message.into();
    let sanitized = message.replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized).unwrap_or_else(|_| c"internal error".to_owned());
    });
}

pub(crate) fn set_invalid_argument(message: impl Into<String>) -> ErrChainResult {
    set_error_message(message);
    ErrChainResult::InvalidArgument
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

pub(crate) fn map_alloc_error(err: &AllocError) -> ErrChainResult {
    set_error_message(err.to_string());
    match err {
        AllocError::OutOfMemory { .. } => ErrChainResult::OutOfMemory,
        AllocError::BudgetExhausted { .. } => ErrChainResult::BudgetExhausted,
        AllocError::AllocationLimit { .. } => ErrChainResult::AllocationLimit,
        AllocError::Injected { .. } => ErrChainResult::InjectedFailure,
    }
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_errors_keep_their_status() {
        let cases = [
            AllocError::OutOfMemory { requested: 8 },
            AllocError::BudgetExhausted {
                requested: 8,
                in_use: 0,
                limit: 4,
            },
            AllocError::AllocationLimit { limit: 1 },
            AllocError::Injected { call: 3 },
        ];
        for err in cases {
            assert_eq!(map_alloc_error(&err) as i32, err.status());
        }
    }

    #[test]
    fn interior_nul_is_sanitized() {
        set_error_message("bad\0message");
        // SAFETY: last_error_ptr points at the thread-local CString.
        let text = unsafe { std::ffi::CStr::from_ptr(last_error_ptr()) };
        assert_eq!(text.to_str().unwrap(), "bad?message");
        clear_error_state();
    }
}
