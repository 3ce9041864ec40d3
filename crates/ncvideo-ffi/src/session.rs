use std::ffi::CString;
use std::os::raw::c_char;

use ncvideo_sdk::{Rect, Session};

use crate::error;
use crate::transport;
use crate::types::{
    scale_mode, ContextHandle, FrameHandle, NcvContextHandle, NcvFrameHandle, NcvFrameView,
    NcvResult,
};

fn with_context_mut<T>(
    handle: NcvContextHandle,
    on_error: T,
    f: impl FnOnce(&mut ContextHandle) -> T,
) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("context handle cannot be null");
        return on_error;
    }

    let context = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &mut *(handle as *mut ContextHandle) }
    };

    f(context)
}

fn c_text(value: &str) -> CString {
    CString::new(value.replace('\0', "?")).unwrap_or_default()
}

fn cache_args(session: &Session) -> Vec<(CString, CString)> {
    session
        .args()
        .iter()
        .map(|arg| (c_text(&arg.key), c_text(&arg.value)))
        .collect()
}

/// Connect to a host and receive the launch arguments.
///
/// On success `*out_context` receives a handle to release with
/// `ncv_disconnect`.
///
/// # Safety
/// `queue_name` and `region_name` must be valid UTF-8 C strings and
/// `out_context` must be writable.
#[no_mangle]
pub unsafe extern "C" fn ncv_connect(
    queue_name: *const c_char,
    region_name: *const c_char,
    out_context: *mut NcvContextHandle,
) -> NcvResult {
    crate::ffi_boundary(NcvResult::Internal, || {
        error::clear_error_state();

        if out_context.is_null() {
            return error::set_invalid_argument("out_context cannot be null");
        }

        let queue_name = {
            // SAFETY: We validate null and UTF-8 in helper.
            match unsafe { transport::required_str_arg(queue_name, "queue_name") } {
                Some(v) => v,
                None => return NcvResult::InvalidArgument,
            }
        };
        let region_name = {
            // SAFETY: We validate null and UTF-8 in helper.
            match unsafe { transport::required_str_arg(region_name, "region_name") } {
                Some(v) => v,
                None => return NcvResult::InvalidArgument,
            }
        };

        match ncvideo_sdk::connect(queue_name, region_name) {
            Ok(session) => {
                let args = cache_args(&session);
                let handle = Box::new(ContextHandle { session, args });
                // SAFETY: Checked non-null above; the caller guarantees it is writable.
                unsafe {
                    *out_context = Box::into_raw(handle) as NcvContextHandle;
                }
                NcvResult::Success
            }
            Err(err) => error::map_sdk_error(&err),
        }
    })
}

/// Close the queues, unmap the frame region and free the context.
///
/// `*context` is set to null afterwards.
///
/// # Safety
/// `context` must be null or point to a handle returned by `ncv_connect`.
#[no_mangle]
pub unsafe extern "C" fn ncv_disconnect(context: *mut NcvContextHandle) {
    crate::ffi_boundary((), || {
        if context.is_null() {
            return;
        }

        // SAFETY: Caller guarantees `context` is readable and writable.
        let handle = unsafe { std::mem::replace(&mut *context, std::ptr::null_mut()) };
        if handle.is_null() {
            return;
        }

        // SAFETY: Caller guarantees this handle was allocated by ncv_connect.
        let boxed = unsafe { Box::from_raw(handle as *mut ContextHandle) };
        boxed.session.disconnect();
    });
}

/// Request the next frame and wait up to `timeout_ms` for it (negative
/// waits forever).
///
/// # Safety
/// `context` must be a valid handle and `out_view` must be writable.
#[no_mangle]
pub unsafe extern "C" fn ncv_wait_for_frame(
    context: NcvContextHandle,
    timeout_ms: i32,
    out_view: *mut NcvFrameView,
) -> NcvResult {
    crate::ffi_boundary(NcvResult::Internal, || {
        error::clear_error_state();

        if out_view.is_null() {
            return error::set_invalid_argument("out_view cannot be null");
        }

        with_context_mut(context, NcvResult::InvalidArgument, |ctx| {
            let view = match ctx.session.wait_for_frame(transport::timeout_arg(timeout_ms)) {
                Ok(frame) => NcvFrameView::from_frame(&frame),
                Err(err) => return error::map_sdk_error(&err),
            };
            // SAFETY: Checked non-null above; the caller guarantees it is writable.
            unsafe {
                *out_view = view;
            }
            NcvResult::Success
        })
    })
}

/// Total number of frames the host will deliver, 0 on error.
///
/// # Safety
/// `context` must be a valid handle returned by `ncv_connect`.
#[no_mangle]
pub unsafe extern "C" fn ncv_get_num_frames(context: NcvContextHandle) -> u32 {
    crate::ffi_boundary(0, || {
        with_context_mut(context, 0, |ctx| ctx.session.num_frames())
    })
}

/// Frame rate of the source, and whether the host estimated it.
///
/// # Safety
/// `context` must be a valid handle. `out_fps` must be writable;
/// `out_guessed` may be null.
#[no_mangle]
pub unsafe extern "C" fn ncv_get_frame_rate(
    context: NcvContextHandle,
    out_fps: *mut f64,
    out_guessed: *mut i32,
) -> NcvResult {
    crate::ffi_boundary(NcvResult::Internal, || {
        error::clear_error_state();

        if out_fps.is_null() {
            return error::set_invalid_argument("out_fps cannot be null");
        }

        with_context_mut(context, NcvResult::InvalidArgument, |ctx| {
            let meta = ctx.session.metadata();
            // SAFETY: Checked non-null above; the caller guarantees writability.
            unsafe {
                *out_fps = meta.fps;
                if !out_guessed.is_null() {
                    *out_guessed = i32::from(meta.fps_guessed);
                }
            }
            NcvResult::Success
        })
    })
}

/// Number of launch arguments.
///
/// # Safety
/// `context` must be a valid handle returned by `ncv_connect`.
#[no_mangle]
pub unsafe extern "C" fn ncv_get_arg_count(context: NcvContextHandle) -> usize {
    crate::ffi_boundary(0, || with_context_mut(context, 0, |ctx| ctx.args.len()))
}

/// Key and value of argument `index`.
///
/// The returned strings belong to the context and stay valid until
/// `ncv_disconnect`.
///
/// # Safety
/// `context` must be a valid handle; `out_key` and `out_value` must be writable.
#[no_mangle]
pub unsafe extern "C" fn ncv_get_arg(
    context: NcvContextHandle,
    index: usize,
    out_key: *mut *const c_char,
    out_value: *mut *const c_char,
) -> NcvResult {
    crate::ffi_boundary(NcvResult::Internal, || {
        error::clear_error_state();

        if out_key.is_null() || out_value.is_null() {
            return error::set_invalid_argument("out_key and out_value cannot be null");
        }

        with_context_mut(context, NcvResult::InvalidArgument, |ctx| {
            let Some((key, value)) = ctx.args.get(index) else {
                return error::set_invalid_argument(format!(
                    "argument index {index} out of range ({} arguments)",
                    ctx.args.len()
                ));
            };
            // SAFETY: Checked non-null above; the caller guarantees writability.
            unsafe {
                *out_key = key.as_ptr();
                *out_value = value.as_ptr();
            }
            NcvResult::Success
        })
    })
}

/// Report a failure to the host.
///
/// # Safety
/// `context` must be a valid handle; `text` must be a valid UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn ncv_report_error(
    context: NcvContextHandle,
    code: i32,
    text: *const c_char,
) -> NcvResult {
    crate::ffi_boundary(NcvResult::Internal, || {
        error::clear_error_state();

        let text = {
            // SAFETY: We validate null and UTF-8 in helper.
            match unsafe { transport::required_str_arg(text, "text") } {
                Some(v) => v,
                None => return NcvResult::InvalidArgument,
            }
        };

        with_context_mut(context, NcvResult::InvalidArgument, |ctx| {
            match ctx.session.report_error(code, text) {
                Ok(()) => NcvResult::Success,
                Err(err) => error::map_sdk_error(&err),
            }
        })
    })
}

/// Send a result payload to the host.
///
/// # Safety
/// `context` must be a valid handle. If `len > 0`, `data` must be readable
/// for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn ncv_report_result(
    context: NcvContextHandle,
    timeout_ms: i32,
    data: *const u8,
    len: usize,
) -> NcvResult {
    crate::ffi_boundary(NcvResult::Internal, || {
        error::clear_error_state();

        let data = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { transport::bytes_arg(data, len, "data") } {
                Some(v) => v,
                None => return NcvResult::InvalidArgument,
            }
        };

        with_context_mut(context, NcvResult::InvalidArgument, |ctx| {
            match ctx
                .session
                .report_result(transport::timeout_arg(timeout_ms), data)
            {
                Ok(()) => NcvResult::Success,
                Err(err) => error::map_sdk_error(&err),
            }
        })
    })
}

/// Scale the current frame into a rectangle of an owned frame.
///
/// # Safety
/// `context` must be a valid handle and `target` a handle from
/// `ncv_frame_create`.
#[no_mangle]
pub unsafe extern "C" fn ncv_scale_current(
    context: NcvContextHandle,
    target: NcvFrameHandle,
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
        if target.is_null() {
            return error::set_invalid_argument("target cannot be null");
        }
        let target = {
            // SAFETY: Pointer validity is guaranteed by the caller.
            unsafe { &mut *(target as *mut FrameHandle) }
        };

        with_context_mut(context, NcvResult::InvalidArgument, |ctx| {
            let Some(current) = ctx.session.current_frame() else {
                return error::set_invalid_argument("no current frame");
            };
            match ncvideo_sdk::scale(
                &current,
                &mut target.frame,
                Rect::new(x, y, width, height),
                mode,
            ) {
                Ok(()) => {
                    target.frame.set_info(current.info());
                    NcvResult::Success
                }
                Err(err) => error::map_image_error(&err),
            }
        })
    })
}
