/// Errors that can occur while moving messages through a queue.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The message header contains an invalid magic number.
    #[error("invalid message magic (expected 0x4e51 \"NQ\")")]
    InvalidMagic,

    /// The body exceeds the queue's maximum message length.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The type tag is empty, too long, or not UTF-8.
    #[error("invalid message type: {0}")]
    InvalidType(String),

    /// The operation did not complete before the caller's timeout.
    #[error("queue operation timed out")]
    Timeout,

    /// An I/O error occurred while reading or writing messages.
    #[error("queue I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuring the underlying transport failed.
    #[error("queue transport error: {0}")]
    Transport(#[from] ncvideo_transport::TransportError),

    /// The host closed the queue before a complete message was received.
    #[error("queue closed (incomplete message)")]
    ConnectionClosed,
}

impl QueueError {
    /// Whether this error is a timeout rather than a hard failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, QueueError::Timeout)
    }

    /// Whether a reader that returned this error can never yield another
    /// message: the peer is gone or the byte stream lost message framing.
    pub fn ends_stream(&self) -> bool {
        matches!(
            self,
            QueueError::ConnectionClosed
                | QueueError::InvalidMagic
                | QueueError::InvalidType(_)
                | QueueError::MessageTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, QueueError>;
