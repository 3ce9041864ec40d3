//! ncvideo-ffi: C-ABI exports for the ncvideo worker SDK.

mod error;
mod frame;
mod session;
mod transport;
mod types;

use std::panic::AssertUnwindSafe;

pub use frame::{
    ncv_frame_create, ncv_frame_destroy, ncv_frame_scale, ncv_frame_view, ncv_frame_write_tga,
};
pub use session::{
    ncv_connect, ncv_disconnect, ncv_get_arg, ncv_get_arg_count, ncv_get_frame_rate,
    ncv_get_num_frames, ncv_report_error, ncv_report_result, ncv_scale_current,
    ncv_wait_for_frame,
};
pub use types::{
    NcvContextHandle, NcvFrameHandle, NcvFrameView, NcvResult, NCV_ERR_ALLOC, NCV_ERR_ARGUMENTS,
    NCV_ERR_HOST_QUIT, NCV_ERR_INTERNAL, NCV_ERR_INVALID_ARGUMENT, NCV_ERR_IO,
    NCV_ERR_NOT_WRITABLE, NCV_ERR_OUT_OF_BOUNDS, NCV_ERR_RESULT_TOO_LARGE, NCV_ERR_SHM,
    NCV_ERR_SUCCESS, NCV_ERR_TERMINATED, NCV_ERR_TIMEOUT, NCV_ERR_UNKNOWN, NCV_ERR_UNKNOWN_MSG,
    NCV_SCALE_BEST, NCV_SCALE_BICUBIC, NCV_SCALE_NEAREST,
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

/// Text of the last error on this thread; empty when the last call succeeded.
#[no_mangle]
pub extern "C" fn ncv_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}

#[cfg(test)]
mod tests {
    use std::ffi::{CStr, CString};
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::path::PathBuf;

    use ncvideo_queue::{QueueReader, QueueWriter};
    use ncvideo_sdk::{FrameMetadata, PIXEL_OFFSET};
    use ncvideo_transport::UnixDomainSocket;

    use super::*;

    fn last_error() -> String {
        let ptr = ncv_last_error();
        assert!(!ptr.is_null());
        // SAFETY: ncv_last_error returns a pointer to a thread-local CString.
        unsafe { CStr::from_ptr(ptr).to_string_lossy().into_owned() }
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "ncv-ffi-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[test]
    fn panic_is_contained() {
        let result = ffi_boundary(NcvResult::Internal, || -> NcvResult { panic!("boom") });
        assert_eq!(result, NcvResult::Internal);
        assert_eq!(last_error(), "panic across FFI boundary");
    }

    #[test]
    fn connect_rejects_null_arguments() {
        let mut ctx: NcvContextHandle = std::ptr::null_mut();
        let region = CString::new("frames").unwrap();
        // SAFETY: Null queue name is the case under test.
        let rc = unsafe { ncv_connect(std::ptr::null(), region.as_ptr(), &mut ctx) };
        assert_eq!(rc, NCV_ERR_INVALID_ARGUMENT);
        assert!(ctx.is_null());
        assert!(last_error().contains("queue_name"));
    }

    #[test]
    fn connect_failure_sets_last_error() {
        let dir = scratch_dir("missing");
        let queue = CString::new(dir.join("absent").to_str().unwrap()).unwrap();
        let region = CString::new(dir.join("frames").to_str().unwrap()).unwrap();
        let mut ctx: NcvContextHandle = std::ptr::null_mut();

        // SAFETY: All pointers are valid for the call.
        let rc = unsafe { ncv_connect(queue.as_ptr(), region.as_ptr(), &mut ctx) };
        assert_eq!(rc, NCV_ERR_SHM);
        assert!(ctx.is_null());
        assert!(last_error().contains("absent"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn null_context_is_rejected() {
        let mut view = NcvFrameView::default();
        // SAFETY: Null context is the case under test.
        let rc = unsafe { ncv_wait_for_frame(std::ptr::null_mut(), 0, &mut view) };
        assert_eq!(rc, NCV_ERR_INVALID_ARGUMENT);
        // SAFETY: Null context is the case under test.
        assert_eq!(unsafe { ncv_get_arg_count(std::ptr::null_mut()) }, 0);
    }

    #[test]
    fn owned_frames_scale_and_export() {
        let src = ncv_frame_create(2, 2);
        let dst = ncv_frame_create(4, 4);
        assert!(!src.is_null() && !dst.is_null());

        let mut view = NcvFrameView::default();
        // SAFETY: Handles come from ncv_frame_create and view is writable.
        unsafe {
            assert_eq!(ncv_frame_view(dst, &mut view), NCV_ERR_SUCCESS);
        }
        assert_eq!((view.width, view.height, view.len), (4, 4, 48));

        // SAFETY: Handles come from ncv_frame_create.
        unsafe {
            assert_eq!(
                ncv_frame_scale(src, dst, 0, 0, 4, 4, NCV_SCALE_BEST),
                NCV_ERR_SUCCESS
            );
            assert_eq!(
                ncv_frame_scale(src, dst, 3, 3, 2, 2, NCV_SCALE_NEAREST),
                NCV_ERR_OUT_OF_BOUNDS
            );
            assert_eq!(
                ncv_frame_scale(src, dst, 0, 0, 1, 1, 42),
                NCV_ERR_INVALID_ARGUMENT
            );
            assert_eq!(
                ncv_frame_scale(src, src, 0, 0, 1, 1, NCV_SCALE_NEAREST),
                NCV_ERR_INVALID_ARGUMENT
            );
        }

        let dir = scratch_dir("tga");
        let path = CString::new(dir.join("out.tga").to_str().unwrap()).unwrap();
        // SAFETY: Handle and path are valid.
        unsafe {
            assert_eq!(ncv_frame_write_tga(dst, path.as_ptr()), NCV_ERR_SUCCESS);
        }
        assert_eq!(std::fs::metadata(dir.join("out.tga")).unwrap().len(), 18 + 48);

        // SAFETY: Handles come from ncv_frame_create and are freed once.
        unsafe {
            ncv_frame_destroy(src);
            ncv_frame_destroy(dst);
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn session_round_trip_through_c_api() {
        let dir = scratch_dir("session");
        let region_path = dir.join("frames");
        let mut region = vec![0u8; PIXEL_OFFSET + 12];
        FrameMetadata {
            num_frames: 1,
            width: 2,
            height: 2,
            fps: 25.0,
            fps_guessed: true,
            pts: 40,
            ..FrameMetadata::default()
        }
        .encode_into(&mut region)
        .unwrap();
        region[PIXEL_OFFSET..].fill(77);
        OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&region_path)
            .and_then(|mut f| f.write_all(&region))
            .unwrap();

        let from_worker = UnixDomainSocket::bind(dir.join("job")).unwrap();
        let to_worker = UnixDomainSocket::bind(dir.join("job_host_writer")).unwrap();
        let host = std::thread::spawn(move || {
            let mut incoming = QueueReader::new(from_worker.accept().unwrap());
            let mut outgoing = QueueWriter::new(to_worker.accept().unwrap());
            outgoing.send("arguments", b"1").unwrap();
            outgoing.send("mode", b"thumb").unwrap();

            assert_eq!(incoming.read_message().unwrap().text(), Some("ready"));
            outgoing.send("cmd", b"newframe").unwrap();

            let result = incoming.read_message().unwrap();
            assert_eq!(result.msg_type, "results");
            assert_eq!(result.body.as_ref(), b"ok");

            let report = incoming.read_message().unwrap();
            assert_eq!(report.msg_type, "error 5");
            assert_eq!(report.text(), Some("disk full"));

            assert_eq!(incoming.read_message().unwrap().text(), Some("ready"));
            outgoing.send("cmd", b"quit").unwrap();
        });

        let queue = CString::new(dir.join("job").to_str().unwrap()).unwrap();
        let region_name = CString::new(region_path.to_str().unwrap()).unwrap();
        let mut ctx: NcvContextHandle = std::ptr::null_mut();

        // SAFETY: All pointers below are valid for the duration of each call and
        // the context is released exactly once.
        unsafe {
            assert_eq!(
                ncv_connect(queue.as_ptr(), region_name.as_ptr(), &mut ctx),
                NCV_ERR_SUCCESS
            );
            assert_eq!(ncv_get_arg_count(ctx), 1);

            let mut key = std::ptr::null();
            let mut value = std::ptr::null();
            assert_eq!(ncv_get_arg(ctx, 0, &mut key, &mut value), NCV_ERR_SUCCESS);
            assert_eq!(CStr::from_ptr(key).to_str().unwrap(), "mode");
            assert_eq!(CStr::from_ptr(value).to_str().unwrap(), "thumb");
            assert_eq!(
                ncv_get_arg(ctx, 1, &mut key, &mut value),
                NCV_ERR_INVALID_ARGUMENT
            );

            assert_eq!(ncv_get_num_frames(ctx), 1);
            let mut fps = 0.0;
            let mut guessed = 0;
            assert_eq!(
                ncv_get_frame_rate(ctx, &mut fps, &mut guessed),
                NCV_ERR_SUCCESS
            );
            assert_eq!((fps, guessed), (25.0, 1));

            let mut view = NcvFrameView::default();
            assert_eq!(ncv_wait_for_frame(ctx, 5000, &mut view), NCV_ERR_SUCCESS);
            assert_eq!((view.width, view.height, view.pts), (2, 2, 40));
            let pixels = std::slice::from_raw_parts(view.data, view.len);
            assert!(pixels.iter().all(|b| *b == 77));

            let thumb = ncv_frame_create(1, 1);
            assert_eq!(
                ncv_scale_current(ctx, thumb, 0, 0, 1, 1, NCV_SCALE_BICUBIC),
                NCV_ERR_SUCCESS
            );
            let mut thumb_view = NcvFrameView::default();
            ncv_frame_view(thumb, &mut thumb_view);
            assert_eq!(std::slice::from_raw_parts(thumb_view.data, 3), &[77, 77, 77]);
            assert_eq!(thumb_view.pts, 40);
            ncv_frame_destroy(thumb);

            assert_eq!(
                ncv_report_result(ctx, 5000, b"ok".as_ptr(), 2),
                NCV_ERR_SUCCESS
            );
            let text = CString::new("disk full").unwrap();
            assert_eq!(ncv_report_error(ctx, 5, text.as_ptr()), NCV_ERR_SUCCESS);

            assert_eq!(ncv_wait_for_frame(ctx, -1, &mut view), NCV_ERR_HOST_QUIT);
            assert_eq!(ncv_wait_for_frame(ctx, -1, &mut view), NCV_ERR_TERMINATED);

            ncv_disconnect(&mut ctx);
            assert!(ctx.is_null());
            ncv_disconnect(&mut ctx);
        }

        host.join().unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }
}
