use std::ffi::CStr;
use std::os::raw::c_char;
use std::time::Duration;

use crate::error;

/// Convert a required C string argument into UTF-8 `&str`.
///
/// # Safety
/// `value` must be null or point to a valid NUL-terminated C string.
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
        let _ = error::set_invalid_argument(format!("{name} cannot be null when len > 0"));
        return None;
    }

    // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
    Some(unsafe { std::slice::from_raw_parts(data, len) })
}

/// Milliseconds from C; negative means wait forever.
pub(crate) fn timeout_arg(timeout_ms: i32) -> Option<Duration> {
    u64::try_from(timeout_ms).ok().map(Duration::from_millis)
}
