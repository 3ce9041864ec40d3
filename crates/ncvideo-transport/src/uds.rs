use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::IpcStream;

/// Resolve a queue name to the socket path it lives at.
///
/// Names containing a `/` are taken as paths. Bare names resolve to
/// `<runtime_dir>/<name>.sock`.
pub fn resolve_queue_path(name: &str, runtime_dir: &Path) -> PathBuf {
    if name.contains('/') {
        PathBuf::from(name)
    } else {
        runtime_dir.join(format!("{name}.sock"))
    }
}

/// Unix domain socket endpoint for one named queue.
///
/// Workers only ever `connect`; the host side binds and accepts. The bind
/// side is kept here so hosts and test harnesses share the same path and
/// cleanup rules as the worker.
pub struct UnixDomainSocket {
    listener: UnixListener,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
}

impl UnixDomainSocket {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// Unix `sockaddr_un.sun_path` is 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind a queue socket at `path`, replacing a stale socket file.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        Self::check_path_len(&path)?;

        // Remove stale socket if it exists, but never remove non-socket files.
        if path.exists() {
            let bind_err = |source| TransportError::Bind {
                path: path.clone(),
                source,
            };
            let metadata = std::fs::symlink_metadata(&path).map_err(bind_err)?;
            if !metadata.file_type().is_socket() {
                return Err(bind_err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "existing path is not a unix socket",
                )));
            }
            debug!(?path, "removing stale queue socket");
            std::fs::remove_file(&path).map_err(bind_err)?;
        }

        let listener = UnixListener::bind(&path).map_err(|e| TransportError::Bind {
            path: path.clone(),
            source: e,
        })?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(Self::DEFAULT_SOCKET_MODE))
            .map_err(|e| TransportError::Bind {
                path: path.clone(),
                source: e,
            })?;
        let created_inode = std::fs::symlink_metadata(&path)
            .ok()
            .map(|meta| (meta.dev(), meta.ino()));

        info!(?path, "queue socket listening");

        Ok(Self {
            listener,
            path,
            created_inode,
        })
    }

    /// Accept the peer end of the queue (blocking).
    pub fn accept(&self) -> Result<IpcStream> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(path = ?self.path, "queue peer accepted");
        Ok(IpcStream::from_unix(stream))
    }

    /// Connect to a queue socket at `path` (blocking).
    pub fn connect(path: impl AsRef<Path>) -> Result<IpcStream> {
        let path = path.as_ref();
        Self::check_path_len(path)?;
        let stream =
            std::os::unix::net::UnixStream::connect(path).map_err(|e| TransportError::Connect {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!(?path, "connected to queue socket");
        Ok(IpcStream::from_unix(stream))
    }

    /// The path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_path_len(path: &Path) -> Result<()> {
        let len = path.as_os_str().len();
        if len >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path: path.to_path_buf(),
                len,
                max: Self::MAX_PATH_LEN,
            });
        }
        Ok(())
    }
}

impl Drop for UnixDomainSocket {
    fn drop(&mut self) {
        let Some((expected_dev, expected_ino)) = self.created_inode else {
            return;
        };
        if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
            if metadata.file_type().is_socket()
                && metadata.dev() == expected_dev
                && metadata.ino() == expected_ino
            {
                debug!(path = ?self.path, "removing queue socket");
                let _ = std::fs::remove_file(&self.path);
            } else {
                debug!(path = ?self.path, "socket path identity changed; skipping cleanup");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ncv-uds-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn resolve_bare_name_into_runtime_dir() {
        let path = resolve_queue_path("worker0", Path::new("/run/ncv"));
        assert_eq!(path, PathBuf::from("/run/ncv/worker0.sock"));
    }

    #[test]
    fn resolve_path_name_verbatim() {
        let path = resolve_queue_path("/tmp/q/worker0_host_writer", Path::new("/run/ncv"));
        assert_eq!(path, PathBuf::from("/tmp/q/worker0_host_writer"));
    }

    #[test]
    fn bind_accept_connect() {
        let dir = temp_dir("roundtrip");
        let sock_path = dir.join("queue.sock");

        let listener = UnixDomainSocket::bind(&sock_path).unwrap();
        assert!(sock_path.exists());

        let path_clone = sock_path.clone();
        let handle = std::thread::spawn(move || {
            let mut client = UnixDomainSocket::connect(&path_clone).unwrap();
            client.write_all(b"ready").unwrap();
        });

        let mut host = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        host.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ready");

        handle.join().unwrap();

        drop(listener);
        assert!(!sock_path.exists(), "socket file should be removed on drop");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn connect_to_missing_socket_fails() {
        let dir = temp_dir("missing");
        let result = UnixDomainSocket::connect(dir.join("absent.sock"));
        assert!(matches!(result, Err(TransportError::Connect { .. })));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn path_too_long() {
        let long_path = "/tmp/".to_string() + &"a".repeat(200) + ".sock";
        assert!(matches!(
            UnixDomainSocket::bind(&long_path),
            Err(TransportError::PathTooLong { .. })
        ));
        assert!(matches!(
            UnixDomainSocket::connect(&long_path),
            Err(TransportError::PathTooLong { .. })
        ));
    }

    #[test]
    fn bind_sets_owner_only_permissions() {
        let dir = temp_dir("perms");
        let sock_path = dir.join("perm.sock");

        let listener = UnixDomainSocket::bind(&sock_path).unwrap();
        let mode = std::fs::metadata(&sock_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);

        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn bind_rejects_existing_regular_file() {
        let dir = temp_dir("regular");
        let sock_path = dir.join("not-a-socket.sock");
        std::fs::write(&sock_path, b"regular-file").unwrap();

        let result = UnixDomainSocket::bind(&sock_path);
        assert!(matches!(result, Err(TransportError::Bind { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
