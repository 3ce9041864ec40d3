use std::ffi::{c_void, CString};

use ncvideo_sdk::{FrameBuffer, ScaleMode, Session};

/// Result codes returned by every fallible `ncv_*` function.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NcvResult {
    Success = 0,
    Unknown = 1,
    Alloc = 2,
    Shm = 3,
    Timeout = 4,
    UnknownMsg = 5,
    HostQuit = 6,
    InvalidArgument = 7,
    Arguments = 8,
    ResultTooLarge = 9,
    NotWritable = 10,
    OutOfBounds = 11,
    Io = 12,
    Terminated = 13,
    Internal = 99,
}

#[allow(dead_code)]
pub const NCV_ERR_SUCCESS: NcvResult = NcvResult::Success;
#[allow(dead_code)]
pub const NCV_ERR_UNKNOWN: NcvResult = NcvResult::Unknown;
#[allow(dead_code)]
pub const NCV_ERR_ALLOC: NcvResult = NcvResult::Alloc;
#[allow(dead_code)]
pub const NCV_ERR_SHM: NcvResult = NcvResult::Shm;
#[allow(dead_code)]
pub const NCV_ERR_TIMEOUT: NcvResult = NcvResult::Timeout;
#[allow(dead_code)]
pub const NCV_ERR_UNKNOWN_MSG: NcvResult = NcvResult::UnknownMsg;
#[allow(dead_code)]
pub const NCV_ERR_HOST_QUIT: NcvResult = NcvResult::HostQuit;
#[allow(dead_code)]
pub const NCV_ERR_INVALID_ARGUMENT: NcvResult = NcvResult::InvalidArgument;
#[allow(dead_code)]
pub const NCV_ERR_ARGUMENTS: NcvResult = NcvResult::Arguments;
#[allow(dead_code)]
pub const NCV_ERR_RESULT_TOO_LARGE: NcvResult = NcvResult::ResultTooLarge;
#[allow(dead_code)]
pub const NCV_ERR_NOT_WRITABLE: NcvResult = NcvResult::NotWritable;
#[allow(dead_code)]
pub const NCV_ERR_OUT_OF_BOUNDS: NcvResult = NcvResult::OutOfBounds;
#[allow(dead_code)]
pub const NCV_ERR_IO: NcvResult = NcvResult::Io;
#[allow(dead_code)]
pub const NCV_ERR_TERMINATED: NcvResult = NcvResult::Terminated;
#[allow(dead_code)]
pub const NCV_ERR_INTERNAL: NcvResult = NcvResult::Internal;

pub const NCV_SCALE_NEAREST: i32 = 0;
pub const NCV_SCALE_BICUBIC: i32 = 1;
pub const NCV_SCALE_BEST: i32 = 2;

pub(crate) fn scale_mode(mode: i32) -> Option<ScaleMode> {
    match mode {
        NCV_SCALE_NEAREST => Some(ScaleMode::Nearest),
        NCV_SCALE_BICUBIC => Some(ScaleMode::Bicubic),
        NCV_SCALE_BEST => Some(ScaleMode::Best),
        _ => None,
    }
}

/// A frame as seen from C.
///
/// For frames from `ncv_wait_for_frame`, `data` points into the shared
/// region and stays valid until the next wait or disconnect. For owned
/// frames it stays valid until `ncv_frame_destroy`.
#[repr(C)]
#[derive(Debug)]
pub struct NcvFrameView {
    pub width: u32,
    pub height: u32,
    pub flags: u32,
    pub byte_pos: i64,
    pub dts: i64,
    pub pts: i64,
    pub data: *const u8,
    pub len: usize,
}

impl Default for NcvFrameView {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            flags: 0,
            byte_pos: 0,
            dts: 0,
            pts: 0,
            data: std::ptr::null(),
            len: 0,
        }
    }
}

impl NcvFrameView {
    pub(crate) fn from_frame(frame: &FrameBuffer<'_>) -> Self {
        let info = frame.info();
        let data = frame.data();
        Self {
            width: frame.width(),
            height: frame.height(),
            flags: info.flags,
            byte_pos: info.byte_pos,
            dts: info.dts,
            pts: info.pts,
            data: if data.is_empty() {
                std::ptr::null()
            } else {
                data.as_ptr()
            },
            len: data.len(),
        }
    }
}

pub type NcvContextHandle = *mut c_void;
pub type NcvFrameHandle = *mut c_void;

pub(crate) struct ContextHandle {
    pub(crate) session: Session,
    pub(crate) args: Vec<(CString, CString)>,
}

pub(crate) struct FrameHandle {
    pub(crate) frame: FrameBuffer<'static>,
}
