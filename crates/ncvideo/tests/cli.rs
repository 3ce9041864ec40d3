#![cfg(all(unix, feature = "cli"))]

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;

use ncvideo::queue::{QueueReader, QueueWriter};
use ncvideo::sdk::{FrameMetadata, TgaHeader, PIXEL_OFFSET};
use ncvideo::transport::UnixDomainSocket;

const WIDTH: u32 = 8;
const HEIGHT: u32 = 4;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/ncvcli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn metadata(pts: i64) -> FrameMetadata {
    FrameMetadata {
        num_frames: 3,
        width: WIDTH,
        height: HEIGHT,
        flags: 1,
        fps: 25.0,
        fps_guessed: true,
        byte_pos: 4096 * pts,
        dts: pts,
        pts,
    }
}

fn create_region(path: &Path) {
    let mut bytes = vec![0u8; PIXEL_OFFSET + (WIDTH * HEIGHT * 3) as usize];
    metadata(0).encode_into(&mut bytes).expect("header fits");
    std::fs::write(path, bytes).expect("region file should be creatable");
}

fn publish_frame(path: &Path, pts: i64) {
    let mut header = vec![0u8; PIXEL_OFFSET];
    metadata(pts).encode_into(&mut header).expect("header fits");
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .expect("region should open");
    file.seek(SeekFrom::Start(0)).expect("seek");
    file.write_all(&header).expect("write header");
    file.write_all(&vec![pts as u8 * 40; (WIDTH * HEIGHT * 3) as usize])
        .expect("write pixels");
    file.flush().expect("flush");
}

fn ncvideo() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ncvideo"));
    cmd.arg("--log-level").arg("error");
    cmd
}

#[test]
fn probe_reports_region_metadata_as_json() {
    let dir = unique_temp_dir("probe");
    let region = dir.join("frames");
    create_region(&region);

    let output = ncvideo()
        .arg("--format")
        .arg("json")
        .arg("probe")
        .arg(&region)
        .output()
        .expect("probe should run");

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"holds_frame\":true"), "{stdout}");
    assert!(stdout.contains("\"num_frames\":3"), "{stdout}");
    assert!(stdout.contains("\"fps_guessed\":true"), "{stdout}");
    assert!(stdout.contains(&format!("\"frame_len\":{}", WIDTH * HEIGHT * 3)));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn probe_short_region_is_data_invalid() {
    let dir = unique_temp_dir("short");
    let region = dir.join("frames");
    std::fs::write(&region, [0u8; 16]).expect("write");

    let output = ncvideo()
        .arg("probe")
        .arg(&region)
        .output()
        .expect("probe should run");

    assert_eq!(output.status.code(), Some(60));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_crate_version() {
    let output = ncvideo().arg("version").output().expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("ncvideo {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn grab_pulls_frames_writes_tga_and_reports() {
    let dir = unique_temp_dir("grab");
    let region = dir.join("frames");
    let out_dir = dir.join("out");
    create_region(&region);

    let from_worker = UnixDomainSocket::bind(dir.join("job.sock")).expect("bind outbound");
    let to_worker =
        UnixDomainSocket::bind(dir.join("job_host_writer.sock")).expect("bind inbound");

    let host_region = region.clone();
    let host = thread::spawn(move || {
        let mut incoming = QueueReader::new(from_worker.accept().expect("accept writer"));
        let mut outgoing = QueueWriter::new(to_worker.accept().expect("accept reader"));

        outgoing.send("arguments", b"1").unwrap();
        outgoing.send("thumbs", b"on").unwrap();

        let mut reports = Vec::new();
        for pts in 1..=2i64 {
            let ready = incoming.read_message().unwrap();
            assert_eq!(ready.text(), Some("ready"));
            publish_frame(&host_region, pts);
            outgoing.send("cmd", b"newframe").unwrap();

            let report = incoming.read_message().unwrap();
            assert_eq!(report.msg_type, "results");
            reports.push(report.text().unwrap_or_default().to_string());
        }

        let ready = incoming.read_message().unwrap();
        assert_eq!(ready.text(), Some("ready"));
        outgoing.send("cmd", b"quit").unwrap();
        reports
    });

    let output = ncvideo()
        .arg("--format")
        .arg("json")
        .arg("grab")
        .arg("job")
        .arg(&region)
        .arg("--runtime-dir")
        .arg(&dir)
        .arg("--out-dir")
        .arg(&out_dir)
        .arg("--scale")
        .arg("4x2")
        .arg("--report")
        .output()
        .expect("grab should run");

    let reports = host.join().expect("host thread should finish");
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"key\":\"thumbs\""), "{stdout}");
    assert!(stdout.contains("\"stopped_by\":\"host\""), "{stdout}");
    assert!(stdout.contains("\"frames\":2"), "{stdout}");

    assert_eq!(reports.len(), 2);
    assert!(reports[0].contains("\"pts\":1"), "{}", reports[0]);
    assert!(reports[1].contains("\"output_width\":4"), "{}", reports[1]);

    let tga = std::fs::read(out_dir.join("frame-000001.tga")).expect("second frame written");
    let header = TgaHeader::parse(&tga).expect("valid tga header");
    assert_eq!((header.width, header.height), (4, 2));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn grab_missing_queue_is_transport_error() {
    let dir = unique_temp_dir("missing");
    let region = dir.join("frames");
    create_region(&region);

    let output = ncvideo()
        .arg("grab")
        .arg("nobody")
        .arg(&region)
        .arg("--runtime-dir")
        .arg(&dir)
        .output()
        .expect("grab should run");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("queue 'nobody'"), "{stderr}");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn grab_rejects_bad_scale_before_connecting() {
    let output = ncvideo()
        .arg("grab")
        .arg("job")
        .arg("frames")
        .arg("--scale")
        .arg("wide")
        .output()
        .expect("grab should run");

    assert_eq!(output.status.code(), Some(64));
}
