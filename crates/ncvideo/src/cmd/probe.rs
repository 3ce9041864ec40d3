use ncvideo_sdk::metadata::{pixel_region, FrameMetadata};
use ncvideo_transport::{resolve_region_path, SharedRegion};
use tracing::debug;

use crate::cmd::ProbeArgs;
use crate::exit::{sdk_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_probe, OutputFormat, ProbeOutput};

pub fn run(args: ProbeArgs, format: OutputFormat) -> CliResult<i32> {
    let path = resolve_region_path(&args.region, &args.shm_dir);
    let region = SharedRegion::open(&path)
        .map_err(|err| transport_error(&format!("open region '{}'", args.region), err))?;

    let bytes: &[u8] = region.as_ref();
    let metadata =
        FrameMetadata::decode(bytes).map_err(|err| sdk_error("read frame header", err))?;
    let frame_len = metadata.frame_len().ok();
    let holds_frame = pixel_region(bytes, &metadata).is_ok();
    debug!(path = %path.display(), len = region.len(), holds_frame, "probed region");

    print_probe(
        &ProbeOutput {
            region: path.display().to_string(),
            region_len: region.len(),
            frame_len,
            holds_frame,
            metadata,
        },
        format,
    );
    Ok(SUCCESS)
}
