use std::io::{ErrorKind, Read};
use std::time::Duration;

use bytes::BytesMut;
use ncvideo_transport::IpcStream;
use tracing::trace;

use crate::codec::{decode_message, Message, QueueConfig};
use crate::error::{QueueError, Result};
use crate::traits::QueueReceiver;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete messages from any `Read` stream.
///
/// Handles partial reads internally. Bytes of a message that was still
/// arriving when a timeout fired stay buffered for the next call.
pub struct QueueReader<T> {
    inner: T,
    buf: BytesMut,
    config: QueueConfig,
}

impl<T: Read> QueueReader<T> {
    /// Create a new queue reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, QueueConfig::default())
    }

    /// Create a new queue reader with explicit configuration.
    pub fn with_config(inner: T, config: QueueConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete message (blocking).
    ///
    /// Returns `Err(QueueError::ConnectionClosed)` when EOF is reached and
    /// `Err(QueueError::Timeout)` when the stream's read timeout expires.
    ///
    /// A framing error (bad magic, bad type tag, oversize body) is terminal:
    /// the offending bytes stay buffered and every later call fails the same
    /// way. See [`QueueError::ends_stream`].
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            if let Some(msg) = decode_message(&mut self.buf, self.config.max_message_len)? {
                trace!(msg_type = %msg.msg_type, len = msg.body.len(), "queue message received");
                return Ok(msg);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut => {
                    return Err(QueueError::Timeout)
                }
                Err(err) => return Err(QueueError::Io(err)),
            };

            if read == 0 {
                return Err(QueueError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current queue reader configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }
}

impl QueueReceiver for QueueReader<IpcStream> {
    fn recv_message(&mut self, timeout: Option<Duration>) -> Result<Message> {
        self.inner.set_read_timeout(timeout)?;
        self.read_message()
    }
}
