use std::io::{ErrorKind, Write};
use std::time::Duration;

use bytes::BytesMut;
use ncvideo_transport::IpcStream;
use tracing::trace;

use crate::codec::{encode_message, QueueConfig};
use crate::error::{QueueError, Result};
use crate::traits::{QueueSender, SendBuffer};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete messages to any `Write` stream.
///
/// A message whose write timed out after some of its bytes went out stays
/// queued: its remaining bytes are written ahead of the next message, so the
/// stream never carries a truncated message.
pub struct QueueWriter<T> {
    inner: T,
    buf: BytesMut,
    sent: usize,
    config: QueueConfig,
}

impl<T: Write> QueueWriter<T> {
    /// Create a new queue writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, QueueConfig::default())
    }

    /// Create a new queue writer with explicit configuration.
    pub fn with_config(inner: T, config: QueueConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            sent: 0,
            config,
        }
    }

    /// Encode and send one message (blocking).
    ///
    /// An expired write timeout is reported as `QueueError::Timeout`. If no
    /// byte of the message was written it is dropped; otherwise the rest of
    /// it is finished by the next call, before that call's message.
    pub fn send(&mut self, msg_type: &str, body: &[u8]) -> Result<()> {
        if body.len() > self.config.max_message_len {
            return Err(QueueError::MessageTooLarge {
                size: body.len(),
                max: self.config.max_message_len,
            });
        }

        if self.pending_len() > 0 {
            self.write_pending()?;
            trace!("finished partially written message");
        }

        self.buf.clear();
        self.sent = 0;
        encode_message(msg_type, body, &mut self.buf)?;

        match self.write_pending() {
            Ok(()) => {}
            Err(QueueError::Timeout) if self.sent == 0 => {
                self.buf.clear();
                return Err(QueueError::Timeout);
            }
            Err(QueueError::Timeout) => {
                trace!(msg_type, remaining = self.pending_len(), "queue send timed out mid-message");
                return Err(QueueError::Timeout);
            }
            Err(err) => return Err(err),
        }

        trace!(msg_type, len = body.len(), "queue message sent");
        self.flush()
    }

    /// Bytes of a timed-out message still waiting to be written.
    pub fn pending_len(&self) -> usize {
        self.buf.len() - self.sent
    }

    fn write_pending(&mut self) -> Result<()> {
        while self.sent < self.buf.len() {
            match self.inner.write(&self.buf[self.sent..]) {
                Ok(0) => return Err(QueueError::ConnectionClosed),
                Ok(n) => self.sent += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(&err) => return Err(QueueError::Timeout),
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    return Err(QueueError::ConnectionClosed)
                }
                Err(err) => return Err(QueueError::Io(err)),
            }
        }
        self.buf.clear();
        self.sent = 0;
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(&err) => return Err(QueueError::Timeout),
                Err(err) => return Err(QueueError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current queue writer configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut
}

impl QueueSender for QueueWriter<IpcStream> {
    fn max_message_len(&self) -> usize {
        self.config.max_message_len
    }

    fn send_message(
        &mut self,
        msg_type: &str,
        body: &[u8],
        timeout: Option<Duration>,
    ) -> Result<()> {
        self.inner.set_write_timeout(timeout)?;
        self.send(msg_type, body)
    }

    fn acquire_buffer(&mut self, timeout: Option<Duration>) -> Result<SendBuffer> {
        Ok(SendBuffer::new(self.config.max_message_len, timeout))
    }

    fn commit_buffer(&mut self, buffer: SendBuffer, msg_type: &str) -> Result<()> {
        self.inner.set_write_timeout(buffer.timeout())?;
        self.send(msg_type, buffer.as_slice())
    }
}
