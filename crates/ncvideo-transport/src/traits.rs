use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// Smallest timeout handed to the OS. Sockets reject a zero timeout, and a
/// caller asking for "no wait" gets the shortest real wait instead.
const MIN_SOCKET_TIMEOUT: Duration = Duration::from_millis(1);

/// One direction of a named queue, connected to the host.
///
/// On Unix this wraps a Unix domain socket stream. The queue layer reads
/// or writes framed messages through the `Read`/`Write` impls and sets a
/// per-call timeout before each blocking operation.
pub struct IpcStream {
    inner: IpcStreamInner,
}

enum IpcStreamInner {
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for IpcStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for IpcStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl IpcStream {
    /// Wrap an already-connected Unix domain socket stream.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: IpcStreamInner::Unix(stream),
        }
    }

    /// Set the read timeout; `None` blocks indefinitely.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.map(normalize_timeout);
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set the write timeout; `None` blocks indefinitely.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.map(normalize_timeout);
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self::from_unix(cloned))
            }
        }
    }

    /// Close both directions of the stream.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => match stream.shutdown(std::net::Shutdown::Both) {
                Ok(()) => Ok(()),
                // Peer already gone.
                Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
                Err(err) => Err(err.into()),
            },
        }
    }

    /// Credentials of the host process on the other end (Linux only).
    ///
    /// Returns `(uid, gid, pid)` via `SO_PEERCRED`, or `None` if unavailable.
    #[cfg(target_os = "linux")]
    pub fn peer_credentials(&self) -> Option<(u32, u32, u32)> {
        use std::os::fd::AsRawFd;

        let fd = match &self.inner {
            IpcStreamInner::Unix(stream) => stream.as_raw_fd(),
        };

        let mut cred = libc::ucred {
            pid: 0,
            uid: 0,
            gid: 0,
        };
        let mut len = std::mem::size_of::<libc::ucred>() as libc::socklen_t;

        // SAFETY: `cred` and `len` are valid writable pointers for the provided sizes,
        // and `fd` is an open Unix socket descriptor owned by this process.
        let rc = unsafe {
            libc::getsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_PEERCRED,
                (&mut cred as *mut libc::ucred).cast::<libc::c_void>(),
                &mut len,
            )
        };

        if rc == 0 && len as usize == std::mem::size_of::<libc::ucred>() {
            Some((cred.uid, cred.gid, cred.pid as u32))
        } else {
            None
        }
    }

    /// Credentials of the host process on the other end.
    ///
    /// Returns `None` on platforms that do not expose peer credentials.
    #[cfg(not(target_os = "linux"))]
    pub fn peer_credentials(&self) -> Option<(u32, u32, u32)> {
        None
    }
}

fn normalize_timeout(timeout: Duration) -> Duration {
    timeout.max(MIN_SOCKET_TIMEOUT)
}

impl std::fmt::Debug for IpcStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(_) => f.debug_struct("IpcStream").field("type", &"unix").finish(),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::ErrorKind;
    use std::os::unix::net::UnixStream;

    use super::*;

    #[test]
    fn zero_timeout_is_accepted() {
        let (left, _right) = UnixStream::pair().unwrap();
        let stream = IpcStream::from_unix(left);
        stream.set_read_timeout(Some(Duration::ZERO)).unwrap();
        stream.set_write_timeout(Some(Duration::ZERO)).unwrap();
    }

    #[test]
    fn read_timeout_expires() {
        let (left, _right) = UnixStream::pair().unwrap();
        let mut stream = IpcStream::from_unix(left);
        stream
            .set_read_timeout(Some(Duration::from_millis(10)))
            .unwrap();

        let mut buf = [0u8; 4];
        let err = stream.read(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::WouldBlock | ErrorKind::TimedOut
        ));
    }

    #[test]
    fn shutdown_signals_eof_to_peer() {
        let (left, mut right) = UnixStream::pair().unwrap();
        let stream = IpcStream::from_unix(left);
        stream.shutdown().unwrap();

        let mut buf = [0u8; 1];
        assert_eq!(right.read(&mut buf).unwrap(), 0);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn peer_credentials_report_own_pid_for_pair() {
        let (left, _right) = UnixStream::pair().unwrap();
        let stream = IpcStream::from_unix(left);
        let (_, _, pid) = stream.peer_credentials().unwrap();
        assert_eq!(pid, std::process::id());
    }
}
