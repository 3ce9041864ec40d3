use std::path::PathBuf;
use std::time::Duration;

use ncvideo_queue::QueueError;
use ncvideo_transport::TransportError;

/// Errors from image buffers, scaling, and TGA export.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// A pixel buffer or scratch table could not be allocated.
    #[error("allocation of {bytes} bytes failed")]
    Alloc { bytes: usize },

    /// The target buffer is a borrowed view of the shared region.
    #[error("frame buffer is a read-only view and cannot be written")]
    NotWritable,

    /// The destination rectangle does not fit the target buffer.
    #[error("rectangle {x},{y} {width}x{height} is outside the {target_width}x{target_height} target")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        target_width: u32,
        target_height: u32,
    },

    /// The source buffer has no pixels.
    #[error("source frame is empty")]
    EmptySource,

    /// Supplied pixel bytes do not match `width * height * 3`.
    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    /// TGA stores dimensions in 16 bits.
    #[error("{width}x{height} exceeds the TGA limit of 65535x65535")]
    TooLargeForTga { width: u32, height: u32 },

    /// The output file could not be created.
    #[error("failed to open {path}: {source}")]
    FileOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing the output file failed or was short.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors returned by session operations.
///
/// Callers branch on the kind: [`Timeout`](SdkError::Timeout) is retryable,
/// [`HostQuit`](SdkError::HostQuit) ends the session cleanly, everything
/// else is a hard failure.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// One of the two queues could not be opened.
    #[error("failed to open queue '{name}': {source}")]
    QueueOpen {
        name: String,
        source: TransportError,
    },

    /// The shared frame region could not be opened or mapped.
    #[error("failed to open frame region '{name}': {source}")]
    RegionOpen {
        name: String,
        source: TransportError,
    },

    /// The shared region is too small for the data it claims to hold.
    #[error("frame region holds {len} bytes, {needed} needed")]
    RegionTooSmall { needed: usize, len: usize },

    /// Frame dimensions overflow the address space.
    #[error("frame dimensions {width}x{height} are too large")]
    FrameTooLarge { width: u32, height: u32 },

    /// The argument handshake was malformed.
    #[error("argument handshake failed: {0}")]
    Arguments(String),

    /// The queue failed part-way through the argument handshake.
    #[error("argument handshake interrupted after {received} of {expected}: {source}")]
    ArgumentsInterrupted {
        received: usize,
        expected: usize,
        source: QueueError,
    },

    /// A queue send or receive failed.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// A queue operation did not complete in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The host asked the worker to stop.
    #[error("host is shutting down")]
    HostQuit,

    /// The session already received a quit command.
    #[error("session has terminated")]
    Terminated,

    /// The host sent a message outside the protocol.
    #[error("unexpected message '{msg_type}': {body}")]
    UnexpectedMessage { msg_type: String, body: String },

    /// A result payload exceeds the queue's maximum message length.
    #[error("result too large ({size} bytes, max {max})")]
    ResultTooLarge { size: usize, max: usize },

    /// An image operation failed.
    #[error("image error: {0}")]
    Image(#[from] ImageError),
}

impl SdkError {
    /// Whether the operation may simply be retried.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SdkError::Timeout(_))
    }

    /// Whether the session can make no further progress.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SdkError::HostQuit | SdkError::Terminated)
    }

    pub(crate) fn from_queue(err: QueueError, timeout: Option<Duration>) -> Self {
        match err {
            QueueError::Timeout => SdkError::Timeout(timeout.unwrap_or_default()),
            other => SdkError::Queue(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SdkError>;
