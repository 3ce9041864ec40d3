//! Typed message queues between a worker and its host.
//!
//! Every message carries a short text type tag and an opaque body:
//! - a 2-byte magic number ("NQ") for stream synchronization
//! - a 4-byte little-endian body length
//! - a 1-byte type-tag length followed by the tag itself
//!
//! [`QueueReceiver`] and [`QueueSender`] are the seams the SDK consumes;
//! [`QueueReader`] and [`QueueWriter`] implement them over an [`IpcStream`].
//!
//! [`IpcStream`]: ncvideo_transport::IpcStream

pub mod codec;
pub mod error;
pub mod reader;
pub mod traits;
pub mod vocab;
pub mod writer;

pub use codec::{
    decode_message, encode_message, Message, QueueConfig, DEFAULT_MAX_MESSAGE_LEN, HEADER_SIZE,
    MAX_TYPE_LEN,
};
pub use error::{QueueError, Result};
pub use reader::QueueReader;
pub use traits::{QueueReceiver, QueueSender, SendBuffer};
pub use writer::QueueWriter;
