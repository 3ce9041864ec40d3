use std::fmt;
use std::io;

use ncvideo_queue::QueueError;
use ncvideo_sdk::{ImageError, SdkError};
use ncvideo_transport::TransportError;

// Process exit codes. 124 matches timeout(1).
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) | TransportError::Accept(source) => io_error(context, source),
        TransportError::Connect { ref source, .. }
        | TransportError::Bind { ref source, .. }
        | TransportError::RegionOpen { ref source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn queue_error(context: &str, err: QueueError) -> CliError {
    match err {
        QueueError::Io(source) => io_error(context, source),
        QueueError::Transport(err) => transport_error(context, err),
        QueueError::Timeout => CliError::new(TIMEOUT, format!("{context}: {err}")),
        QueueError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn image_error(context: &str, err: ImageError) -> CliError {
    match err {
        ImageError::FileOpen { source, .. } | ImageError::FileWrite { source, .. } => {
            io_error(context, source)
        }
        ImageError::Alloc { .. } | ImageError::NotWritable => {
            CliError::new(INTERNAL, format!("{context}: {err}"))
        }
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn sdk_error(context: &str, err: SdkError) -> CliError {
    match err {
        SdkError::QueueOpen { name, source } => {
            transport_error(&format!("{context}: queue '{name}'"), source)
        }
        SdkError::RegionOpen { name, source } => {
            transport_error(&format!("{context}: region '{name}'"), source)
        }
        SdkError::Queue(err) => queue_error(context, err),
        SdkError::Image(err) => image_error(context, err),
        SdkError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        SdkError::HostQuit | SdkError::Terminated => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;

    #[test]
    fn missing_queue_is_transport_error() {
        let err = SdkError::QueueOpen {
            name: "job".to_string(),
            source: TransportError::Connect {
                path: PathBuf::from("/tmp/job.sock"),
                source: io::Error::from(io::ErrorKind::NotFound),
            },
        };
        let cli = sdk_error("connect failed", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.contains("queue 'job'"));
    }

    #[test]
    fn timeouts_map_to_124() {
        assert_eq!(
            sdk_error("wait", SdkError::Timeout(Duration::from_secs(1))).code,
            TIMEOUT
        );
        assert_eq!(
            sdk_error("wait", SdkError::Queue(QueueError::Timeout)).code,
            TIMEOUT
        );
    }

    #[test]
    fn protocol_violations_are_data_invalid() {
        let err = SdkError::UnexpectedMessage {
            msg_type: "status".to_string(),
            body: "??".to_string(),
        };
        assert_eq!(sdk_error("wait", err).code, DATA_INVALID);
        assert_eq!(
            sdk_error("connect", SdkError::Arguments("bad count".to_string())).code,
            DATA_INVALID
        );
    }

    #[test]
    fn tga_permission_error_keeps_io_code() {
        let err = ImageError::FileOpen {
            path: PathBuf::from("/root/x.tga"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(image_error("write", err).code, PERMISSION_DENIED);
    }
}
