//! Stand-in frameserver host that serves a synthetic gradient clip.
//!
//! Run with:
//!   cargo run --example mock-host
//!
//! In another terminal (paths are printed on startup):
//!   cargo run --features cli -- grab <queue-path> <region-path> --out-dir /tmp/frames

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use ncvideo::queue::{vocab, QueueReader, QueueWriter};
use ncvideo::sdk::{FrameMetadata, PIXEL_OFFSET};
use ncvideo::transport::UnixDomainSocket;

const WIDTH: u32 = 160;
const HEIGHT: u32 = 90;
const FRAMES: u32 = 10;

fn write_frame(region: &Path, index: u32) -> Result<(), Box<dyn std::error::Error>> {
    let meta = FrameMetadata {
        num_frames: FRAMES,
        width: WIDTH,
        height: HEIGHT,
        flags: u32::from(index == 0),
        fps: 24.0,
        fps_guessed: false,
        byte_pos: i64::from(index) * 8192,
        dts: i64::from(index),
        pts: i64::from(index),
    };
    let mut page = vec![0u8; PIXEL_OFFSET];
    meta.encode_into(&mut page)?;

    let mut pixels = Vec::with_capacity((WIDTH * HEIGHT * 3) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            pixels.push((x * 255 / WIDTH) as u8);
            pixels.push((y * 255 / HEIGHT) as u8);
            pixels.push((index * 255 / FRAMES) as u8);
        }
    }

    let mut file = OpenOptions::new().write(true).open(region)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&page)?;
    file.write_all(&pixels)?;
    file.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join(format!("ncvideo-mock-{}", std::process::id()));
    fs::create_dir_all(&dir)?;
    let region = dir.join("frames");
    fs::write(&region, vec![0u8; PIXEL_OFFSET + (WIDTH * HEIGHT * 3) as usize])?;

    let from_worker = UnixDomainSocket::bind(dir.join("clip.sock"))?;
    let to_worker = UnixDomainSocket::bind(dir.join("clip_host_writer.sock"))?;
    eprintln!("queue:  {}", dir.join("clip").display());
    eprintln!("region: {}", region.display());

    let mut incoming = QueueReader::new(from_worker.accept()?);
    let mut outgoing = QueueWriter::new(to_worker.accept()?);
    eprintln!("Worker connected");

    outgoing.send(vocab::ARGUMENTS, b"1")?;
    outgoing.send("source", b"gradient")?;

    let mut next = 0;
    loop {
        let msg = match incoming.read_message() {
            Ok(msg) => msg,
            Err(e) => {
                eprintln!("Worker disconnected: {e}");
                break;
            }
        };

        if msg.is_type(vocab::STATUS) && msg.text() == Some(vocab::READY) {
            if next == FRAMES {
                outgoing.send(vocab::CMD, vocab::QUIT.as_bytes())?;
                break;
            }
            write_frame(&region, next)?;
            outgoing.send(vocab::CMD, vocab::NEWFRAME.as_bytes())?;
            next += 1;
        } else if let Some(code) = vocab::parse_error_type(&msg.msg_type) {
            eprintln!("Worker error {code}: {}", msg.text().unwrap_or("<binary>"));
        } else {
            eprintln!("{} ({} bytes)", msg.msg_type, msg.body.len());
        }
    }

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}
