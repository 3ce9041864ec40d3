//! Read-only mapping of the host's named shared-memory object.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;

use crate::error::{Result, TransportError};

/// Where POSIX shared-memory objects appear on Linux.
pub const DEFAULT_SHM_DIR: &str = "/dev/shm";

/// Resolve a region name to the file backing it.
///
/// Names containing a `/` are taken as paths. Bare names resolve to
/// `<shm_dir>/<name>`, matching what `shm_open(name)` creates on Linux.
pub fn resolve_region_path(name: &str, shm_dir: &Path) -> PathBuf {
    if name.contains('/') {
        PathBuf::from(name)
    } else {
        shm_dir.join(name.trim_start_matches('/'))
    }
}

/// A read-only view of a shared-memory object written by the host.
///
/// The bytes may change underneath this mapping at any time; callers decode
/// what they need at read time and never hold typed references into it.
pub struct SharedRegion {
    map: Mmap,
    path: PathBuf,
}

impl SharedRegion {
    /// Map the object at `path` read-only for the lifetime of the value.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| TransportError::RegionOpen {
            path: path.clone(),
            source: e,
        })?;

        // SAFETY: the mapping is read-only and only ever exposed as `&[u8]`.
        // The host may rewrite the bytes concurrently; readers copy scalar
        // fields out and treat pixel bytes as plain data.
        let map = unsafe { Mmap::map(&file) }.map_err(|e| TransportError::RegionMap {
            path: path.clone(),
            source: e,
        })?;

        debug!(?path, len = map.len(), "mapped shared region");
        Ok(Self { map, path })
    }

    /// Size of the mapping in bytes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The file backing this mapping.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AsRef<[u8]> for SharedRegion {
    fn as_ref(&self) -> &[u8] {
        &self.map
    }
}

impl std::fmt::Debug for SharedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRegion")
            .field("path", &self.path)
            .field("len", &self.map.len())
            .finish()
    }
}
