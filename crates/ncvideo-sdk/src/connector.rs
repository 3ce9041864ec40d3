use std::path::PathBuf;

use ncvideo_queue::{QueueConfig, QueueReader, QueueWriter, DEFAULT_MAX_MESSAGE_LEN};
use ncvideo_transport::{
    resolve_queue_path, resolve_region_path, SharedRegion, UnixDomainSocket, DEFAULT_SHM_DIR,
};
use tracing::debug;

use crate::error::{Result, SdkError};
use crate::session::Session;

/// Suffix of the queue the host writes to.
pub const HOST_WRITER_SUFFIX: &str = "_host_writer";

/// Environment variable overriding the directory queue sockets live in.
pub const RUNTIME_DIR_ENV: &str = "NCVIDEO_RUNTIME_DIR";

/// Where to find the host's queues and frame region.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory holding `<name>.sock` files for bare queue names.
    pub runtime_dir: PathBuf,
    /// Directory holding shared-memory objects for bare region names.
    pub shm_dir: PathBuf,
    /// Largest message either queue carries.
    pub max_message_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let runtime_dir = std::env::var_os(RUNTIME_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        Self {
            runtime_dir,
            shm_dir: PathBuf::from(DEFAULT_SHM_DIR),
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

/// Connect to a host with default configuration.
///
/// Opens the outbound queue `queue_name`, the inbound queue
/// `queue_name` + `_host_writer`, and the frame region `region_name`, then
/// receives the launch arguments.
pub fn connect(queue_name: &str, region_name: &str) -> Result<Session> {
    connect_with_config(queue_name, region_name, &SessionConfig::default())
}

/// Connect with explicit configuration.
pub fn connect_with_config(
    queue_name: &str,
    region_name: &str,
    config: &SessionConfig,
) -> Result<Session> {
    let queue_config = QueueConfig {
        max_message_len: config.max_message_len,
    };

    let outbound_path = resolve_queue_path(queue_name, &config.runtime_dir);
    let outbound = UnixDomainSocket::connect(&outbound_path).map_err(|source| {
        SdkError::QueueOpen {
            name: queue_name.to_string(),
            source,
        }
    })?;

    let inbound_name = format!("{queue_name}{HOST_WRITER_SUFFIX}");
    let inbound_path = resolve_queue_path(&inbound_name, &config.runtime_dir);
    let inbound = UnixDomainSocket::connect(&inbound_path).map_err(|source| {
        SdkError::QueueOpen {
            name: inbound_name.clone(),
            source,
        }
    })?;

    if let Some((pid, uid, _gid)) = inbound.peer_credentials() {
        debug!(pid, uid, queue = %inbound_name, "host peer credentials");
    }

    let region_path = resolve_region_path(region_name, &config.shm_dir);
    let region = SharedRegion::open(&region_path).map_err(|source| SdkError::RegionOpen {
        name: region_name.to_string(),
        source,
    })?;

    debug!(
        outbound = %outbound_path.display(),
        inbound = %inbound_path.display(),
        region = %region_path.display(),
        region_len = region.len(),
        "queues and frame region opened"
    );

    Session::from_parts(
        QueueReader::with_config(inbound, queue_config.clone()),
        QueueWriter::with_config(outbound, queue_config),
        region,
    )
}
