//! Worker that writes a scaled TGA thumbnail of every frame a host serves.
//!
//! Run against the mock host:
//!   cargo run --example mock-host
//!   cargo run --example thumbnail-worker -- <queue-path> <region-path> [out-dir]

use std::path::PathBuf;
use std::time::Duration;

use ncvideo::sdk::{scale_to, write_tga, ScaleMode, SdkError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(queue), Some(region)) = (args.next(), args.next()) else {
        eprintln!("usage: thumbnail-worker <queue> <region> [out-dir]");
        std::process::exit(64);
    };
    let out_dir = args.next().map(PathBuf::from).unwrap_or_else(std::env::temp_dir);

    let mut session = ncvideo::connect(&queue, &region)?;
    for arg in session.args() {
        eprintln!("arg {arg}");
    }

    let mut written = 0u32;
    loop {
        let frame = match session.wait_for_frame(Some(Duration::from_secs(10))) {
            Ok(frame) => frame,
            Err(SdkError::HostQuit) => break,
            Err(e) => return Err(e.into()),
        };
        let pts = frame.info().pts;
        let thumb = scale_to(
            &frame,
            (frame.width() / 4).max(1),
            (frame.height() / 4).max(1),
            ScaleMode::Best,
        )?;
        let path = out_dir.join(format!("thumb-{pts:06}.tga"));
        write_tga(&thumb, &path)?;
        eprintln!("wrote {}", path.display());

        let report = path.display().to_string();
        session.report_result(Some(Duration::from_secs(5)), report.as_bytes())?;
        written += 1;
    }

    eprintln!("{written} thumbnail(s) written");
    session.disconnect();
    Ok(())
}
