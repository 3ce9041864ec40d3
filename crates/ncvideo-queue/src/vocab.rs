//! Message vocabulary of the worker/host conversation.
//!
//! Type tags name what a message is; bodies carry the value. Argument
//! entries reuse the type tag as the argument key.

/// Host → worker, once: body is the decimal count of argument messages.
pub const ARGUMENTS: &str = "arguments";

/// Worker → host, once per requested frame, body [`READY`].
pub const STATUS: &str = "status";

/// Host → worker reply to a status message, body [`NEWFRAME`] or [`QUIT`].
pub const CMD: &str = "cmd";

/// Worker → host: opaque result payload.
pub const RESULTS: &str = "results";

/// Prefix of the worker → host error type tag, followed by the numeric code.
pub const ERROR_PREFIX: &str = "error";

/// Status body: the worker can take another frame.
pub const READY: &str = "ready";

/// Command body: a new frame is in the shared region.
pub const NEWFRAME: &str = "newframe";

/// Command body: the host is shutting down.
pub const QUIT: &str = "quit";

/// Build the type tag for an error report, e.g. `error 42`.
pub fn error_type(code: i32) -> String {
    format!("{ERROR_PREFIX} {code}")
}

/// Parse the numeric code out of an error type tag.
pub fn parse_error_type(msg_type: &str) -> Option<i32> {
    msg_type
        .strip_prefix(ERROR_PREFIX)?
        .strip_prefix(' ')?
        .parse()
        .ok()
}
