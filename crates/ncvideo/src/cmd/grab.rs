use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ncvideo_sdk::{
    connect_with_config, scale_to, write_tga, FrameBuffer, ScaleMode, SdkError, Session,
    SessionConfig,
};
use tracing::{debug, info, warn};

use crate::cmd::{parse_dimensions, parse_timeout, GrabArgs};
use crate::exit::{image_error, io_error, sdk_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_arguments, print_frame, print_summary, FrameRecord, GrabSummary, OutputFormat};

/// Error code sent to the host when a frame could not be processed.
const PROCESSING_FAILED: i32 = 1;

pub fn run(args: GrabArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_timeout(&args.timeout)?;
    let target_size = args.scale.as_deref().map(parse_dimensions).transpose()?;

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir).map_err(|err| io_error("create output directory", err))?;
    }

    let mut config = SessionConfig {
        shm_dir: args.shm_dir.clone(),
        ..SessionConfig::default()
    };
    if let Some(dir) = &args.runtime_dir {
        config.runtime_dir = dir.clone();
    }

    let mut session = connect_with_config(&args.queue, &args.region, &config)
        .map_err(|err| sdk_error("connect failed", err))?;
    info!(
        queue = %args.queue,
        region = %args.region,
        arguments = session.args().len(),
        "connected to host"
    );
    print_arguments(session.args(), format);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut grabbed = 0u64;
    let stopped_by = loop {
        if !running.load(Ordering::SeqCst) {
            break "interrupt";
        }
        if args.count.is_some_and(|count| grabbed >= count) {
            break "count";
        }

        let outcome = match session.wait_for_frame(Some(timeout)) {
            Ok(frame) => process_frame(&frame, grabbed, target_size, args.mode, args.out_dir.as_deref()),
            Err(SdkError::HostQuit) => break "host",
            Err(err) => return Err(sdk_error("waiting for frame failed", err)),
        };

        let record = match outcome {
            Ok(record) => record,
            Err(err) => {
                if let Err(report_err) = session.report_error(PROCESSING_FAILED, &err.message) {
                    warn!(error = %report_err, "could not report failure to host");
                }
                return Err(err);
            }
        };

        print_frame(&record, format);
        if args.report {
            report_record(&mut session, &record, timeout)?;
        }
        grabbed += 1;
    };

    let summary = GrabSummary {
        frames: grabbed,
        stopped_by,
        num_frames: session.num_frames(),
        fps: session.frame_rate(),
    };
    session.disconnect();
    print_summary(&summary, format);
    Ok(SUCCESS)
}

fn process_frame(
    frame: &FrameBuffer<'_>,
    index: u64,
    target_size: Option<(u32, u32)>,
    mode: ScaleMode,
    out_dir: Option<&Path>,
) -> CliResult<FrameRecord> {
    let scaled = match target_size {
        Some((width, height)) => {
            Some(scale_to(frame, width, height, mode).map_err(|err| image_error("scale failed", err))?)
        }
        None => None,
    };
    let output: &FrameBuffer<'_> = match &scaled {
        Some(scaled) => scaled,
        None => frame,
    };

    let file = match out_dir {
        Some(dir) => {
            let path = dir.join(format!("frame-{index:06}.tga"));
            write_tga(output, &path).map_err(|err| image_error("write tga failed", err))?;
            debug!(path = %path.display(), "frame written");
            Some(path.display().to_string())
        }
        None => None,
    };

    let info = frame.info();
    Ok(FrameRecord {
        index,
        width: frame.width(),
        height: frame.height(),
        flags: info.flags,
        byte_pos: info.byte_pos,
        dts: info.dts,
        pts: info.pts,
        output_width: output.width(),
        output_height: output.height(),
        file,
    })
}

fn report_record(session: &mut Session, record: &FrameRecord, timeout: Duration) -> CliResult<()> {
    let body = serde_json::to_vec(record)
        .map_err(|err| CliError::new(INTERNAL, format!("encode report failed: {err}")))?;
    session
        .report_result(Some(timeout), &body)
        .map_err(|err| sdk_error("report failed", err))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
