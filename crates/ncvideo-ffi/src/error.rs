use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

use ncvideo_sdk::{ImageError, SdkError};

use crate::types::NcvResult;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::default();
    });
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let sanitized = message.into().replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized).unwrap_or_default();
    });
}

pub(crate) fn set_invalid_argument(message: impl Into<String>) -> NcvResult {
    set_error_message(message);
    NcvResult::InvalidArgument
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

pub(crate) fn map_sdk_error(err: &SdkError) -> NcvResult {
    set_error_message(err.to_string());
    match err {
        SdkError::QueueOpen { .. }
        | SdkError::RegionOpen { .. }
        | SdkError::RegionTooSmall { .. }
        | SdkError::FrameTooLarge { .. }
        | SdkError::Queue(_) => NcvResult::Shm,
        SdkError::Arguments(_) | SdkError::ArgumentsInterrupted { .. } => NcvResult::Arguments,
        SdkError::Timeout(_) => NcvResult::Timeout,
        SdkError::HostQuit => NcvResult::HostQuit,
        SdkError::Terminated => NcvResult::Terminated,
        SdkError::UnexpectedMessage { .. } => NcvResult::UnknownMsg,
        SdkError::ResultTooLarge { .. } => NcvResult::ResultTooLarge,
        SdkError::Image(inner) => image_code(inner),
    }
}

pub(crate) fn map_image_error(err: &ImageError) -> NcvResult {
    set_error_message(err.to_string());
    image_code(err)
}

fn image_code(err: &ImageError) -> NcvResult {
    match err {
        ImageError::Alloc { .. } => NcvResult::Alloc,
        ImageError::NotWritable => NcvResult::NotWritable,
        ImageError::OutOfBounds { .. } | ImageError::TooLargeForTga { .. } => {
            NcvResult::OutOfBounds
        }
        ImageError::EmptySource | ImageError::SizeMismatch { .. } => NcvResult::InvalidArgument,
        ImageError::FileOpen { .. } | ImageError::FileWrite { .. } => NcvResult::Io,
    }
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}
