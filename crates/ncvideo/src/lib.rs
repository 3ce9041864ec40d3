//! Worker-side client for the ncvideo frameserver.
//!
//! A host process decodes video and publishes one frame at a time into a
//! shared-memory region; workers built on this crate pull those frames,
//! read their launch arguments, and report results back over a pair of
//! message queues.
//!
//! # Crate Structure
//!
//! - [`transport`]: Unix domain socket queues and the read-only frame region
//! - [`queue`]: Message codec, blocking reader/writer, queue traits
//! - [`sdk`]: Sessions, frame metadata, frame buffers, scaling and TGA export

/// Re-export transport types.
pub mod transport {
    pub use ncvideo_transport::*;
}

/// Re-export queue types.
pub mod queue {
    pub use ncvideo_queue::*;
}

/// Re-export worker SDK types.
pub mod sdk {
    pub use ncvideo_sdk::*;
}

pub use ncvideo_sdk::{connect, connect_with_config, Session, SessionConfig};
