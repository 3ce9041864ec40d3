use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::codec::Message;
use crate::error::Result;

/// The receiving end of a named queue.
///
/// `timeout` of `None` blocks until a message arrives. An expired timeout
/// is reported as [`QueueError::Timeout`](crate::QueueError::Timeout).
pub trait QueueReceiver {
    /// Receive exactly one message.
    fn recv_message(&mut self, timeout: Option<Duration>) -> Result<Message>;
}

/// The sending end of a named queue.
pub trait QueueSender {
    /// Largest body this queue carries in one message.
    fn max_message_len(&self) -> usize;

    /// Send one message.
    fn send_message(&mut self, msg_type: &str, body: &[u8], timeout: Option<Duration>)
        -> Result<()>;

    /// Reserve a write buffer of the queue's native size.
    ///
    /// The caller copies its payload in and hands the buffer back through
    /// [`commit_buffer`](Self::commit_buffer).
    fn acquire_buffer(&mut self, timeout: Option<Duration>) -> Result<SendBuffer>;

    /// Send the contents of an acquired buffer under `msg_type`.
    fn commit_buffer(&mut self, buffer: SendBuffer, msg_type: &str) -> Result<()>;
}

/// A write buffer handed out by [`QueueSender::acquire_buffer`].
#[derive(Debug)]
pub struct SendBuffer {
    buf: BytesMut,
    capacity: usize,
    timeout: Option<Duration>,
}

impl SendBuffer {
    /// Create an empty buffer that accepts up to `capacity` bytes.
    pub fn new(capacity: usize, timeout: Option<Duration>) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
            timeout,
        }
    }

    /// Copy in as much of `data` as fits; returns the number of bytes taken.
    pub fn copy_from(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.remaining());
        self.buf.extend_from_slice(&data[..n]);
        n
    }

    /// Bytes copied in so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    /// Timeout captured at acquire time, applied when committing.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Consume the buffer and return its contents.
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    /// Consume the buffer into a [`Message`] tagged `msg_type`.
    pub fn into_message(self, msg_type: &str) -> Message {
        Message::new(msg_type, self.into_bytes())
    }
}
