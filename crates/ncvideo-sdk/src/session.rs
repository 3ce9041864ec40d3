use std::fmt;
use std::time::Duration;

use ncvideo_queue::vocab::{error_type, CMD, NEWFRAME, QUIT, READY, RESULTS, STATUS};
use ncvideo_queue::{Message, QueueReader, QueueReceiver, QueueSender, QueueWriter};
use ncvideo_transport::{IpcStream, SharedRegion};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::arguments::{receive_arguments, Argument};
use crate::error::{Result, SdkError};
use crate::frame::FrameBuffer;
use crate::metadata::{pixel_region, FrameMetadata, HEADER_PAGE_SIZE};

/// Where the session stands in the per-frame request/reply cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Arguments received, no frame held.
    Connected,
    /// `ready` was sent and no reply has arrived yet.
    AwaitingReply,
    /// A frame was delivered and is current.
    HaveFrame,
    /// The host sent `quit`, or the inbound queue can no longer be read.
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connected => "connected",
            SessionState::AwaitingReply => "awaiting_reply",
            SessionState::HaveFrame => "have_frame",
            SessionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// A worker's connection to a frameserver host.
///
/// Holds the inbound and outbound queues, the read-only frame region and
/// the launch arguments. Frames returned by [`wait_for_frame`] borrow the
/// session, so they cannot outlive the next request or the session itself.
///
/// [`wait_for_frame`]: Session::wait_for_frame
pub struct Session<R = QueueReader<IpcStream>, W = QueueWriter<IpcStream>, M = SharedRegion> {
    reader: R,
    writer: W,
    region: M,
    args: Vec<Argument>,
    state: SessionState,
    current: Option<FrameMetadata>,
    epoch: u64,
    last_error: Option<String>,
}

impl<R, W, M> Session<R, W, M>
where
    R: QueueReceiver,
    W: QueueSender,
    M: AsRef<[u8]>,
{
    /// Build a session from already-open collaborators and run the
    /// argument handshake on `reader`.
    pub fn from_parts(mut reader: R, writer: W, region: M) -> Result<Self> {
        let len = region.as_ref().len();
        if len < HEADER_PAGE_SIZE {
            return Err(SdkError::RegionTooSmall {
                needed: HEADER_PAGE_SIZE,
                len,
            });
        }

        let args = receive_arguments(&mut reader)?;
        debug!(args = args.len(), region_len = len, "session established");

        Ok(Self {
            reader,
            writer,
            region,
            args,
            state: SessionState::Connected,
            current: None,
            epoch: 0,
            last_error: None,
        })
    }

    /// Ask the host for the next frame and wait for its answer.
    ///
    /// `timeout` bounds the `ready` send and, separately, the wait for the
    /// reply. `None` blocks. A timeout leaves the session usable.
    ///
    /// Returns [`SdkError::HostQuit`] once when the host shuts down and
    /// [`SdkError::Terminated`] on every call after that. A closed or
    /// desynchronised inbound queue terminates the session the same way.
    pub fn wait_for_frame(&mut self, timeout: Option<Duration>) -> Result<FrameBuffer<'_>> {
        self.current = None;
        if self.state == SessionState::HaveFrame {
            self.state = SessionState::Connected;
        }

        let meta = match self.next_frame(timeout) {
            Ok(meta) => meta,
            Err(err) => return Err(self.record(err)),
        };

        let pixels = pixel_region(self.region.as_ref(), &meta)?;
        Ok(FrameBuffer::borrowed(
            meta.width,
            meta.height,
            meta.info(),
            pixels,
            self.epoch,
        ))
    }

    fn next_frame(&mut self, timeout: Option<Duration>) -> Result<FrameMetadata> {
        self.ensure_live()?;

        self.writer
            .send_message(STATUS, READY.as_bytes(), timeout)
            .map_err(|err| SdkError::from_queue(err, timeout))?;
        self.state = SessionState::AwaitingReply;

        let msg = match self.reader.recv_message(timeout) {
            Ok(msg) => msg,
            Err(err) => {
                if err.ends_stream() {
                    warn!(error = %err, "inbound queue unusable, terminating session");
                    self.state = SessionState::Terminated;
                }
                return Err(SdkError::from_queue(err, timeout));
            }
        };

        if !msg.is_type(CMD) {
            self.state = SessionState::Connected;
            return Err(unexpected(&msg));
        }

        match msg.text() {
            Some(NEWFRAME) => {
                self.state = SessionState::Connected;
                let region = self.region.as_ref();
                let meta = FrameMetadata::decode(region)?;
                pixel_region(region, &meta)?;

                self.epoch += 1;
                self.current = Some(meta);
                self.state = SessionState::HaveFrame;
                trace!(
                    epoch = self.epoch,
                    width = meta.width,
                    height = meta.height,
                    pts = meta.pts,
                    "frame delivered"
                );
                Ok(meta)
            }
            Some(QUIT) => {
                self.state = SessionState::Terminated;
                debug!("host requested quit");
                Err(SdkError::HostQuit)
            }
            _ => {
                self.state = SessionState::Connected;
                Err(unexpected(&msg))
            }
        }
    }

    /// Report a failure to the host as `error <code>` with `text` as body.
    pub fn report_error(&mut self, code: i32, text: &str) -> Result<()> {
        let sent = self.ensure_live().and_then(|()| {
            self.writer
                .send_message(&error_type(code), text.as_bytes(), None)
                .map_err(|err| SdkError::from_queue(err, None))
        });
        sent.map_err(|err| self.record(err))
    }

    /// Send a result payload to the host.
    ///
    /// Payloads larger than the outbound queue's message limit are refused
    /// before anything is sent. On a timeout after part of the payload was
    /// written, the queue finishes it ahead of the next outbound message, so
    /// retrying the same result would deliver it twice.
    pub fn report_result(&mut self, timeout: Option<Duration>, data: &[u8]) -> Result<()> {
        let sent = self.send_result(timeout, data);
        sent.map_err(|err| self.record(err))
    }

    fn send_result(&mut self, timeout: Option<Duration>, data: &[u8]) -> Result<()> {
        self.ensure_live()?;

        let max = self.writer.max_message_len();
        if data.len() > max {
            return Err(SdkError::ResultTooLarge {
                size: data.len(),
                max,
            });
        }

        let mut buffer = self
            .writer
            .acquire_buffer(timeout)
            .map_err(|err| SdkError::from_queue(err, timeout))?;
        buffer.copy_from(data);
        self.writer
            .commit_buffer(buffer, RESULTS)
            .map_err(|err| SdkError::from_queue(err, timeout))
    }

    fn ensure_live(&self) -> Result<()> {
        if self.state == SessionState::Terminated {
            return Err(SdkError::Terminated);
        }
        Ok(())
    }
}

impl<R, W, M: AsRef<[u8]>> Session<R, W, M> {
    /// Launch arguments in the order the host sent them.
    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    /// Value of the first argument named `key`.
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    /// The header record as it currently reads in the shared region.
    pub fn metadata(&self) -> FrameMetadata {
        FrameMetadata::decode(self.region.as_ref()).unwrap_or_default()
    }

    /// Total frame count advertised by the host.
    pub fn num_frames(&self) -> u32 {
        self.metadata().num_frames
    }

    pub fn frame_rate(&self) -> f64 {
        self.metadata().fps
    }

    /// Whether the host estimated the frame rate rather than reading it.
    pub fn fps_guessed(&self) -> bool {
        self.metadata().fps_guessed
    }

    /// Snapshot taken when the current frame was delivered.
    pub fn current_metadata(&self) -> Option<&FrameMetadata> {
        self.current.as_ref()
    }

    /// The frame returned by the last successful [`wait_for_frame`](Session::wait_for_frame).
    pub fn current_frame(&self) -> Option<FrameBuffer<'_>> {
        let meta = self.current?;
        let pixels = pixel_region(self.region.as_ref(), &meta).ok()?;
        Some(FrameBuffer::borrowed(
            meta.width,
            meta.height,
            meta.info(),
            pixels,
            self.epoch,
        ))
    }

    /// Number of frames delivered so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Text of the most recent failed operation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn receiver(&self) -> &R {
        &self.reader
    }

    pub fn sender(&self) -> &W {
        &self.writer
    }

    pub fn region(&self) -> &M {
        &self.region
    }

    /// Take the session apart without closing anything.
    pub fn into_parts(self) -> (R, W, M) {
        (self.reader, self.writer, self.region)
    }

    fn record(&mut self, err: SdkError) -> SdkError {
        match &err {
            SdkError::UnexpectedMessage { .. } => warn!(error = %err, "protocol violation"),
            SdkError::HostQuit | SdkError::Timeout(_) => {}
            _ => debug!(error = %err, "session operation failed"),
        }
        self.last_error = Some(err.to_string());
        err
    }
}

impl Session {
    /// Close both queues and unmap the frame region.
    pub fn disconnect(self) {
        let (reader, writer, region) = self.into_parts();
        let inbound = reader.into_inner();
        let outbound = writer.into_inner();
        if let Err(err) = outbound.shutdown() {
            debug!(error = %err, "outbound queue shutdown failed");
        }
        if let Err(err) = inbound.shutdown() {
            debug!(error = %err, "inbound queue shutdown failed");
        }
        debug!(region = %region.path().display(), "session disconnected");
    }
}

impl<R, W, M> fmt::Debug for Session<R, W, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("args", &self.args)
            .field("state", &self.state)
            .field("epoch", &self.epoch)
            .field("current", &self.current)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

fn unexpected(msg: &Message) -> SdkError {
    let body = String::from_utf8_lossy(&msg.body);
    SdkError::UnexpectedMessage {
        msg_type: msg.msg_type.clone(),
        body: body.trim_end_matches('\0').to_string(),
    }
}
