use std::ffi::CStr;
use std::os::raw::c_char;

use crate::error;

/// Convert a C string argument into `&str`.
///
/// # Safety
/// If non-null, `value` must point to a NUL-terminated C string that outlives `'a`.
pub(crate) unsafe fn required_str_arg<'a>(value: *const c_char, name: &str) -> Option<&'a str> {
    if value.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null"));
        return None;
    }

    let as_cstr = {
        // SAFETY: The caller guarantees `value` points to a valid NUL-terminated C string.
        unsafe { CStr::from_ptr(value) }
    };

    match as_cstr.to_str() {
        Ok(v) => Some(v),
        Err(_) => {
            let _ = error::set_invalid_argument(format!("{name} must be valid UTF-8"));
            None
        }
    }
}

/// Convert an optional byte pointer + length into a slice.
///
/// # Safety
/// If `len > 0`, `data` must be non-null and readable for `len` bytes.
pub(crate) unsafe fn bytes_arg<'a>(data: *const u8, len: usize, name: &str) -> Option<&'a [u8]> {
    if len == 0 {
        return Some(&[]);
    }

    if data.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null when its size is non-zero"));
        return None;
    }

    // SAFETY: The caller guarantees `data` is readable for `len` bytes.
    Some(unsafe { std::slice::from_raw_parts(data, len) })
}
