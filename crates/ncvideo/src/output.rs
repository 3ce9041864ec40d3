use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use ncvideo_sdk::{Argument, FrameMetadata};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One grabbed frame as reported on stdout and, with `--report`, to the host.
#[derive(Debug, Serialize)]
pub struct FrameRecord {
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub flags: u32,
    pub byte_pos: i64,
    pub dts: i64,
    pub pts: i64,
    pub output_width: u32,
    pub output_height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// What `grab` did before it stopped.
#[derive(Debug, Serialize)]
pub struct GrabSummary {
    pub frames: u64,
    pub stopped_by: &'static str,
    pub num_frames: u32,
    pub fps: f64,
}

#[derive(Debug, Serialize)]
pub struct ProbeOutput {
    pub region: String,
    pub region_len: usize,
    pub frame_len: Option<usize>,
    pub holds_frame: bool,
    pub metadata: FrameMetadata,
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_arguments(args: &[Argument], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ArgumentsOutput<'a> {
                arguments: &'a [Argument],
            }
            print_json(&ArgumentsOutput { arguments: args });
        }
        OutputFormat::Table => {
            if args.is_empty() {
                return;
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ARGUMENT", "VALUE"]);
            for arg in args {
                table.add_row(vec![arg.key.clone(), arg.value.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for arg in args {
                println!("arg {arg}");
            }
        }
    }
}

pub fn print_frame(record: &FrameRecord, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAME", "SIZE", "PTS", "DTS", "BYTE POS", "FILE"])
                .add_row(vec![
                    record.index.to_string(),
                    format!("{}x{}", record.width, record.height),
                    record.pts.to_string(),
                    record.dts.to_string(),
                    record.byte_pos.to_string(),
                    record.file.clone().unwrap_or_else(|| "-".to_string()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "frame={} size={}x{} pts={} dts={} pos={}{}",
                record.index,
                record.width,
                record.height,
                record.pts,
                record.dts,
                record.byte_pos,
                record
                    .file
                    .as_deref()
                    .map(|f| format!(" file={f}"))
                    .unwrap_or_default()
            );
        }
    }
}

pub fn print_summary(summary: &GrabSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(summary),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!(
                "grabbed {} frame(s), stopped by {} (source: {} frames at {:.3} fps)",
                summary.frames, summary.stopped_by, summary.num_frames, summary.fps
            );
        }
    }
}

pub fn print_probe(out: &ProbeOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let meta = &out.metadata;
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in [
                ("region", out.region.clone()),
                ("region bytes", out.region_len.to_string()),
                ("size", format!("{}x{}", meta.width, meta.height)),
                ("frames", meta.num_frames.to_string()),
                (
                    "fps",
                    format!(
                        "{:.3}{}",
                        meta.fps,
                        if meta.fps_guessed { " (guessed)" } else { "" }
                    ),
                ),
                ("flags", format!("{:#x}", meta.flags)),
                ("byte pos", meta.byte_pos.to_string()),
                ("dts", meta.dts.to_string()),
                ("pts", meta.pts.to_string()),
                ("holds frame", out.holds_frame.to_string()),
            ] {
                table.add_row(vec![field.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let meta = &out.metadata;
            println!("Frame Region:");
            println!("  Path:        {}", out.region);
            println!("  Bytes:       {}", out.region_len);
            println!("  Size:        {}x{}", meta.width, meta.height);
            println!("  Frames:      {}", meta.num_frames);
            println!(
                "  FPS:         {:.3}{}",
                meta.fps,
                if meta.fps_guessed { " (guessed)" } else { "" }
            );
            println!("  PTS/DTS:     {}/{}", meta.pts, meta.dts);
            println!("  Holds frame: {}", out.holds_frame);
        }
    }
}
