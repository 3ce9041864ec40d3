use std::os::raw::c_char;

use ncvideo_sdk::{FrameBuffer, Rect};

use crate::error;
use crate::transport;
use crate::types::{scale_mode, FrameHandle, NcvFrameHandle, NcvFrameView, NcvResult};

fn frame_ref<'a>(handle: NcvFrameHandle, name: &str) -> Option<&'a mut FrameHandle> {
    if handle.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null"));
        return None;
    }
    // SAFETY: Pointer validity is guaranteed by the caller.
    Some(unsafe { &mut *(handle as *mut FrameHandle) })
}

/// Allocate a zeroed, writable RGB24 frame. Returns null on failure.
#[no_mangle]
pub extern "C" fn ncv_frame_create(width: u32, height: u32) -> NcvFrameHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();

        match FrameBuffer::create(width, height) {
            Ok(frame) => Box::into_raw(Box::new(FrameHandle { frame })) as NcvFrameHandle,
            Err(err) => {
                let _ = error::map_image_error(&err);
                std::ptr::null_mut()
            }
        }
    })
}

/// Free a frame created by `ncv_frame_create`.
///
/// # Safety
/// `frame` must be null or a handle returned by `ncv_frame_create`.
#[no_mangle]
pub unsafe extern "C" fn ncv_frame_destroy(frame: NcvFrameHandle) {
    crate::ffi_boundary((), || {
        if frame.is_null() {
            return;
        }

        // SAFETY: Caller guarantees this handle was allocated by ncv_frame_create.
        unsafe {
            drop(Box::from_raw(frame as *mut FrameHandle));
        }
    });
}

/// Describe an owned frame. `data` stays valid until the frame is destroyed.
///
/// # Safety
/// `frame` must be a valid frame handle and `out_view` must be writable.
#[no_mangle]
pub unsafe extern "C" fn ncv_frame_view(
    frame: NcvFrameHandle,
    out_view: *mut NcvFrameView,
) -> NcvResult {
    crate::ffi_boundary(NcvResult::Internal, || {
        error::clear_error_state();

        if out_view.is_null() {
            return error::set_invalid_argument("out_view cannot be null");
        }
        let Some(handle) = frame_ref(frame, "frame") else {
            return NcvResult::InvalidArgument;
        };

        // SAFETY: Checked non-null above; the caller guarantees it is writable.
        unsafe {
            *out_view = NcvFrameView::from_frame(&handle.frame);
        }
        NcvResult::Success
    })
}

/// Scale one owned frame into a rectangle of another.
///
/// # Safety
/// `src` and `dst` must be distinct handles returned by `ncv_frame_create`.
#[no_mangle]
pub unsafe extern "C" fn ncv_frame_scale(
    src: NcvFrameHandle,
    dst: NcvFrameHandle,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    mode: i32,
) -> NcvResult {
    crate::ffi_boundary(NcvResult::Internal, || {
        error::clear_error_state();

        let Some(mode) = scale_mode(mode) else {
            return error::set_invalid_argument(format!("unknown scale mode {mode}"));
        };
        if src == dst {
            return error::set_invalid_argument("src and dst must be different frames");
        }
        let Some(src) = frame_ref(src, "src") else {
            return NcvResult::InvalidArgument;
        };
        let Some(dst) = frame_ref(dst, "dst") else {
            return NcvResult::InvalidArgument;
        };

        match ncvideo_sdk::scale(&src.frame, &mut dst.frame, Rect::new(x, y, width, height), mode)
        {
            Ok(()) => NcvResult::Success,
            Err(err) => error::map_image_error(&err),
        }
    })
}

/// Write a frame to `path` as an uncompressed 24-bit TGA file.
///
/// # Safety
/// `frame` must be a valid frame handle and `path` a valid UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn ncv_frame_write_tga(
    frame: NcvFrameHandle,
    path: *const c_char,
) -> NcvResult {
    crate::ffi_boundary(NcvResult::Internal, || {
        error::clear_error_state();

        let path = {
            // SAFETY: We validate null and UTF-8 in helper.
            match unsafe { transport::required_str_arg(path, "path") } {
                Some(v) => v,
                None => return NcvResult::InvalidArgument,
            }
        };
        let Some(handle) = frame_ref(frame, "frame") else {
            return NcvResult::InvalidArgument;
        };

        match ncvideo_sdk::write_tga(&handle.frame, path) {
            Ok(()) => NcvResult::Success,
            Err(err) => error::map_image_error(&err),
        }
    })
}
