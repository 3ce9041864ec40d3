use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use ncvideo_sdk::ScaleMode;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod grab;
pub mod probe;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a host and pull frames.
    Grab(GrabArgs),
    /// Print the frame metadata currently in a shared region.
    Probe(ProbeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Grab(args) => grab::run(args, format),
        Command::Probe(args) => probe::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct GrabArgs {
    /// Queue name (or socket path) the host listens on.
    pub queue: String,
    /// Shared region name (or file path) holding frames.
    pub region: String,
    /// Stop after N frames.
    #[arg(long)]
    pub count: Option<u64>,
    /// Per-request timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// Write each frame as a TGA file into this directory.
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
    /// Scale frames to WIDTHxHEIGHT before writing.
    #[arg(long, value_name = "WxH")]
    pub scale: Option<String>,
    /// Scaling kernel.
    #[arg(long, default_value = "best")]
    pub mode: ScaleMode,
    /// Send a JSON record for each frame back to the host.
    #[arg(long)]
    pub report: bool,
    /// Directory holding queue sockets.
    #[arg(long, env = "NCVIDEO_RUNTIME_DIR", value_name = "DIR")]
    pub runtime_dir: Option<PathBuf>,
    /// Directory holding shared-memory regions.
    #[arg(long, env = "NCVIDEO_SHM_DIR", value_name = "DIR", default_value = "/dev/shm")]
    pub shm_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Shared region name (or file path).
    pub region: String,
    /// Directory holding shared-memory regions.
    #[arg(long, env = "NCVIDEO_SHM_DIR", value_name = "DIR", default_value = "/dev/shm")]
    pub shm_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Parse `WIDTHxHEIGHT`.
pub(crate) fn parse_dimensions(input: &str) -> CliResult<(u32, u32)> {
    let invalid = || CliError::new(USAGE, format!("invalid size '{input}', expected WIDTHxHEIGHT"));
    let (w, h) = input
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let width: u32 = w.parse().map_err(|_| invalid())?;
    let height: u32 = h.parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(CliError::new(USAGE, "scale dimensions must be non-zero"));
    }
    Ok((width, height))
}
