//! Local transports used by the ncvideo worker SDK.
//!
//! Two primitives live here:
//! - [`IpcStream`], a connected Unix domain socket stream that carries one
//!   direction of a named message queue;
//! - [`SharedRegion`], a read-only memory mapping of the host's named
//!   shared-memory object holding frame metadata and pixels.
//!
//! Everything else in ncvideo builds on these two types.

pub mod error;
pub mod shm;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use shm::{resolve_region_path, SharedRegion, DEFAULT_SHM_DIR};
pub use traits::IpcStream;

#[cfg(unix)]
pub use uds::{resolve_queue_path, UnixDomainSocket};
