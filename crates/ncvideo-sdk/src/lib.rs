//! Worker-side SDK for the ncvideo frameserver.
//!
//! A worker process connects to a host with [`connect`], receives its launch
//! arguments, and then pulls decoded frames one at a time with
//! [`Session::wait_for_frame`]. Frames arrive as read-only views over a shared
//! memory region; [`scale`] and [`write_tga`] turn them into owned images.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! let mut session = ncvideo_sdk::connect("job42", "job42_frames")?;
//! loop {
//!     match session.wait_for_frame(Some(Duration::from_secs(5))) {
//!         Ok(frame) => println!("{}x{} pts={}", frame.width(), frame.height(), frame.info().pts),
//!         Err(err) if err.is_terminal() => break,
//!         Err(err) => return Err(err),
//!     }
//! }
//! session.disconnect();
//! # Ok::<(), ncvideo_sdk::SdkError>(())
//! ```

pub mod arguments;
pub mod connector;
pub mod error;
pub mod frame;
pub mod metadata;
pub mod scale;
pub mod session;
pub mod tga;

pub use arguments::{receive_arguments, Argument, MAX_ARGUMENTS};
pub use connector::{connect, connect_with_config, SessionConfig, HOST_WRITER_SUFFIX};
pub use error::{ImageError, Result, SdkError};
pub use frame::{FrameBuffer, Pixels};
pub use metadata::{FrameInfo, FrameMetadata, HEADER_PAGE_SIZE, PIXEL_OFFSET};
pub use scale::{scale, scale_to, Rect, ScaleMode};
pub use session::{Session, SessionState};
pub use tga::{encode_tga, write_tga, TgaHeader, TGA_HEADER_LEN};
