use std::fmt;

use ncvideo_queue::vocab::ARGUMENTS;
use ncvideo_queue::{Message, QueueReceiver};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SdkError};

/// Upper bound on the declared argument count.
pub const MAX_ARGUMENTS: usize = 4096;

/// One launch argument handed to the worker by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Argument {
    pub key: String,
    pub value: String,
}

impl Argument {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Run the argument handshake on the host's queue.
///
/// Expects `arguments`/`N`, then `N` messages whose type tag is the key and
/// whose body is the value. Every receive blocks without a timeout. The
/// list is only returned once all `N` entries have arrived.
pub fn receive_arguments<R: QueueReceiver>(reader: &mut R) -> Result<Vec<Argument>> {
    let header = reader
        .recv_message(None)
        .map_err(|source| SdkError::ArgumentsInterrupted {
            received: 0,
            expected: 0,
            source,
        })?;
    let expected = parse_count(&header)?;

    let mut pending = Vec::with_capacity(expected);
    for received in 0..expected {
        let msg = reader
            .recv_message(None)
            .map_err(|source| SdkError::ArgumentsInterrupted {
                received,
                expected,
                source,
            })?;
        pending.push(parse_entry(&msg)?);
    }

    debug!(count = pending.len(), "received launch arguments");
    Ok(pending)
}

fn parse_count(msg: &Message) -> Result<usize> {
    if !msg.is_type(ARGUMENTS) {
        return Err(SdkError::Arguments(format!(
            "expected '{ARGUMENTS}' message, got '{}'",
            msg.msg_type
        )));
    }

    let text = msg
        .text()
        .ok_or_else(|| SdkError::Arguments("argument count is not UTF-8".to_string()))?;
    let count = text.trim().parse::<usize>().map_err(|_| {
        SdkError::Arguments(format!("invalid argument count '{}'", text.trim()))
    })?;

    if count > MAX_ARGUMENTS {
        return Err(SdkError::Arguments(format!(
            "too many arguments: {count} (max {MAX_ARGUMENTS})"
        )));
    }
    Ok(count)
}

fn parse_entry(msg: &Message) -> Result<Argument> {
    let value = msg.text().ok_or_else(|| {
        SdkError::Arguments(format!("value of argument '{}' is not UTF-8", msg.msg_type))
    })?;
    Ok(Argument::new(msg.msg_type.clone(), value))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use ncvideo_queue::QueueError;

    use super::*;

    struct Scripted {
        script: VecDeque<std::result::Result<Message, QueueError>>,
        timeouts: Vec<Option<Duration>>,
    }

    impl Scripted {
        fn new(messages: Vec<std::result::Result<Message, QueueError>>) -> Self {
            Self {
                script: messages.into(),
                timeouts: Vec::new(),
            }
        }
    }

    impl QueueReceiver for Scripted {
        fn recv_message(
            &mut self,
            timeout: Option<Duration>,
        ) -> ncvideo_queue::Result<Message> {
            self.timeouts.push(timeout);
            self.script
                .pop_front()
                .unwrap_or(Err(QueueError::ConnectionClosed))
        }
    }

    fn msg(msg_type: &str, body: &str) -> std::result::Result<Message, QueueError> {
        Ok(Message::new(msg_type, body.as_bytes().to_vec()))
    }

    #[test]
    fn receives_declared_arguments_in_order() {
        let mut reader = Scripted::new(vec![
            msg("arguments", "3"),
            msg("input", "/media/clip.mkv"),
            msg("threshold", "0.25"),
            msg("input", "/media/second.mkv"),
        ]);

        let args = receive_arguments(&mut reader).unwrap();
        assert_eq!(
            args,
            vec![
                Argument::new("input", "/media/clip.mkv"),
                Argument::new("threshold", "0.25"),
                Argument::new("input", "/media/second.mkv"),
            ]
        );
        assert!(reader.timeouts.iter().all(Option::is_none));
    }

    #[test]
    fn zero_arguments() {
        let mut reader = Scripted::new(vec![msg("arguments", "0")]);
        assert!(receive_arguments(&mut reader).unwrap().is_empty());
        assert_eq!(reader.timeouts.len(), 1);
    }

    #[test]
    fn count_tolerates_nul_terminator_and_whitespace() {
        let mut reader = Scripted::new(vec![
            Ok(Message::new("arguments", &b" 1\0"[..])),
            msg("mode", "fast"),
        ]);
        assert_eq!(receive_arguments(&mut reader).unwrap().len(), 1);
    }

    #[test]
    fn wrong_first_message_type_fails() {
        let mut reader = Scripted::new(vec![msg("cmd", "newframe")]);
        assert!(matches!(
            receive_arguments(&mut reader),
            Err(SdkError::Arguments(_))
        ));
    }

    #[test]
    fn non_numeric_count_fails() {
        let mut reader = Scripted::new(vec![msg("arguments", "three")]);
        assert!(matches!(
            receive_arguments(&mut reader),
            Err(SdkError::Arguments(_))
        ));
    }

    #[test]
    fn excessive_count_fails_before_reading_entries() {
        let mut reader = Scripted::new(vec![msg("arguments", "4097")]);
        assert!(matches!(
            receive_arguments(&mut reader),
            Err(SdkError::Arguments(_))
        ));
        assert_eq!(reader.timeouts.len(), 1);
    }

    #[test]
    fn short_delivery_exposes_no_partial_list() {
        let mut reader = Scripted::new(vec![
            msg("arguments", "3"),
            msg("input", "a.mkv"),
            Err(QueueError::ConnectionClosed),
        ]);

        match receive_arguments(&mut reader) {
            Err(SdkError::ArgumentsInterrupted {
                received, expected, ..
            }) => {
                assert_eq!(received, 1);
                assert_eq!(expected, 3);
            }
            other => panic!("expected interrupted handshake, got {other:?}"),
        }
    }

    #[test]
    fn non_utf8_value_fails() {
        let mut reader = Scripted::new(vec![
            msg("arguments", "1"),
            Ok(Message::new("blob", vec![0xff, 0x00, 0xfe])),
        ]);
        assert!(matches!(
            receive_arguments(&mut reader),
            Err(SdkError::Arguments(_))
        ));
    }

    #[test]
    fn display_is_key_equals_value() {
        assert_eq!(Argument::new("fps", "24").to_string(), "fps=24");
    }
}
