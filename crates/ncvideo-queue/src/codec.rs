use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{QueueError, Result};

/// Fixed header: magic (2) + body length (4) + type length (1) = 7 bytes.
pub const HEADER_SIZE: usize = 7;

/// Magic bytes: "NQ" (0x4e 0x51).
pub const MAGIC: [u8; 2] = [0x4e, 0x51];

/// Longest type tag a message may carry.
pub const MAX_TYPE_LEN: usize = 32;

/// Default maximum body size: 4 MiB.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 4 * 1024 * 1024;

/// One queue message: a type tag and an opaque body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// What the message is (`cmd`, `arguments`, an argument key, ...).
    pub msg_type: String,
    /// The message body.
    pub body: Bytes,
}

impl Message {
    /// Create a new message.
    pub fn new(msg_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            msg_type: msg_type.into(),
            body: body.into(),
        }
    }

    /// The body as text, with C-style trailing NUL bytes removed.
    ///
    /// Returns `None` if the body is not UTF-8.
    pub fn text(&self) -> Option<&str> {
        let end = self
            .body
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |pos| pos + 1);
        std::str::from_utf8(&self.body[..end]).ok()
    }

    /// Whether the type tag equals `msg_type`.
    pub fn is_type(&self, msg_type: &str) -> bool {
        self.msg_type == msg_type
    }

    /// The total wire size of this message.
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.msg_type.len() + self.body.len()
    }
}

/// Encode a message into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬────────────┬──────────┬─────────────┬──────────────┐
/// │ Magic (2B) │ Body len   │ Type len │ Type        │ Body         │
/// │ "NQ"       │ (4B LE)    │ (1B)     │ (≤ 32B)     │ (len bytes)  │
/// └────────────┴────────────┴──────────┴─────────────┴──────────────┘
/// ```
pub fn encode_message(msg_type: &str, body: &[u8], dst: &mut BytesMut) -> Result<()> {
    validate_type(msg_type)?;
    if body.len() > u32::MAX as usize {
        return Err(QueueError::MessageTooLarge {
            size: body.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + msg_type.len() + body.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(body.len() as u32);
    dst.put_u8(msg_type.len() as u8);
    dst.put_slice(msg_type.as_bytes());
    dst.put_slice(body);
    Ok(())
}

/// Decode a message from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete message yet.
/// On success, consumes the message bytes from the buffer.
pub fn decode_message(src: &mut BytesMut, max_body: usize) -> Result<Option<Message>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != MAGIC {
        return Err(QueueError::InvalidMagic);
    }

    let body_len = u32::from_le_bytes([src[2], src[3], src[4], src[5]]) as usize;
    let type_len = src[6] as usize;

    if body_len > max_body {
        return Err(QueueError::MessageTooLarge {
            size: body_len,
            max: max_body,
        });
    }
    if type_len == 0 || type_len > MAX_TYPE_LEN {
        return Err(QueueError::InvalidType(format!(
            "type length {type_len} (max {MAX_TYPE_LEN})"
        )));
    }

    let total = HEADER_SIZE + type_len + body_len;
    if src.len() < total {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let type_bytes = src.split_to(type_len);
    let msg_type = std::str::from_utf8(&type_bytes)
        .map_err(|_| QueueError::InvalidType("type tag is not UTF-8".to_string()))?
        .to_string();
    let body = src.split_to(body_len).freeze();

    Ok(Some(Message { msg_type, body }))
}

fn validate_type(msg_type: &str) -> Result<()> {
    if msg_type.is_empty() || msg_type.len() > MAX_TYPE_LEN {
        return Err(QueueError::InvalidType(format!(
            "type length {} (max {MAX_TYPE_LEN})",
            msg_type.len()
        )));
    }
    Ok(())
}

/// Configuration for one queue direction.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Largest body accepted or sent. Default: 4 MiB.
    pub max_message_len: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        encode_message("cmd", b"newframe", &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + 3 + 8);

        let msg = decode_message(&mut buf, DEFAULT_MAX_MESSAGE_LEN)
            .unwrap()
            .unwrap();
        assert_eq!(msg.msg_type, "cmd");
        assert_eq!(msg.body.as_ref(), b"newframe");
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x4e, 0x51, 0x00][..]);
        assert!(decode_message(&mut buf, DEFAULT_MAX_MESSAGE_LEN)
            .unwrap()
            .is_none());
    }

    #[test]
    fn decode_incomplete_body() {
        let mut buf = BytesMut::new();
        encode_message("status", b"ready", &mut buf).unwrap();
        buf.truncate(buf.len() - 2);

        assert!(decode_message(&mut buf, DEFAULT_MAX_MESSAGE_LEN)
            .unwrap()
            .is_none());
    }

    #[test]
    fn decode_invalid_magic() {
        let mut buf = BytesMut::from(&[0xFF, 0xFF, 0, 0, 0, 0, 1, b'x'][..]);
        let result = decode_message(&mut buf, DEFAULT_MAX_MESSAGE_LEN);
        assert!(matches!(result, Err(QueueError::InvalidMagic)));
    }

    #[test]
    fn decode_rejects_oversized_body_before_buffering() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u32_le(64 * 1024 * 1024);
        buf.put_u8(3);

        let result = decode_message(&mut buf, DEFAULT_MAX_MESSAGE_LEN);
        assert!(matches!(result, Err(QueueError::MessageTooLarge { .. })));
    }

    #[test]
    fn decode_rejects_zero_length_type() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u32_le(0);
        buf.put_u8(0);

        let result = decode_message(&mut buf, DEFAULT_MAX_MESSAGE_LEN);
        assert!(matches!(result, Err(QueueError::InvalidType(_))));
    }

    #[test]
    fn encode_rejects_long_type() {
        let mut buf = BytesMut::new();
        let long_type = "t".repeat(MAX_TYPE_LEN + 1);
        let result = encode_message(&long_type, b"", &mut buf);
        assert!(matches!(result, Err(QueueError::InvalidType(_))));
        assert!(buf.is_empty());
    }

    #[test]
    fn multiple_messages_in_one_buffer() {
        let mut buf = BytesMut::new();
        encode_message("arguments", b"1", &mut buf).unwrap();
        encode_message("input", b"/videos/a.mkv", &mut buf).unwrap();

        let first = decode_message(&mut buf, DEFAULT_MAX_MESSAGE_LEN)
            .unwrap()
            .unwrap();
        let second = decode_message(&mut buf, DEFAULT_MAX_MESSAGE_LEN)
            .unwrap()
            .unwrap();
        assert_eq!(first, Message::new("arguments", &b"1"[..]));
        assert_eq!(second, Message::new("input", &b"/videos/a.mkv"[..]));
        assert!(buf.is_empty());
    }

    #[test]
    fn text_strips_trailing_nuls() {
        let msg = Message::new("cmd", &b"quit\0\0"[..]);
        assert_eq!(msg.text(), Some("quit"));

        let empty = Message::new("cmd", &b"\0"[..]);
        assert_eq!(empty.text(), Some(""));

        let binary = Message::new("results", vec![0xff, 0xfe]);
        assert_eq!(binary.text(), None);
    }

    #[test]
    fn wire_size_counts_type_and_body() {
        let msg = Message::new("cmd", &b"quit"[..]);
        assert_eq!(msg.wire_size(), HEADER_SIZE + 3 + 4);
    }
}
