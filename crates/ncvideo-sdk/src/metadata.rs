//! Frame metadata decoded from the header page of the shared region.
//!
//! The host writes a fixed-layout record at the start of the region and the
//! pixels of the current frame one page further in. Everything here reads
//! by offset out of a byte slice; nothing holds a typed view of the mapping.
//!
//! ```text
//! offset  size  field
//!      0     4  width            u32
//!      4     4  height           u32
//!      8     4  total frames     u32
//!     12     4  flags            u32
//!     16     8  fps              f64
//!     24     1  fps guessed      u8 (non-zero = true)
//!     32     8  byte position    i64
//!     40     8  dts              i64
//!     48     8  pts              i64
//!   4096   w*h*3  pixels, row-major RGB
//! ```
//!
//! Multi-byte fields use the machine's native byte order; host and worker
//! always share a machine.

use serde::Serialize;

use crate::error::{Result, SdkError};

/// Size of the header page. Pixel data starts right after it.
pub const HEADER_PAGE_SIZE: usize = 4096;

/// Byte offset of the pixel data in the region.
pub const PIXEL_OFFSET: usize = HEADER_PAGE_SIZE;

/// Interleaved RGB.
pub const BYTES_PER_PIXEL: usize = 3;

const WIDTH: usize = 0;
const HEIGHT: usize = 4;
const NUM_FRAMES: usize = 8;
const FLAGS: usize = 12;
const FPS: usize = 16;
const FPS_GUESSED: usize = 24;
const BYTE_POS: usize = 32;
const DTS: usize = 40;
const PTS: usize = 48;

/// Bytes of the header page actually used by the record.
pub const METADATA_LEN: usize = PTS + 8;

/// Per-frame fields copied into every frame buffer taken from the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameInfo {
    pub flags: u32,
    pub byte_pos: i64,
    pub dts: i64,
    pub pts: i64,
}

/// A snapshot of the header record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameMetadata {
    pub num_frames: u32,
    pub width: u32,
    pub height: u32,
    pub flags: u32,
    pub fps: f64,
    pub fps_guessed: bool,
    pub byte_pos: i64,
    pub dts: i64,
    pub pts: i64,
}

impl FrameMetadata {
    /// Decode the header record from the start of `region`.
    pub fn decode(region: &[u8]) -> Result<Self> {
        if region.len() < METADATA_LEN {
            return Err(SdkError::RegionTooSmall {
                needed: METADATA_LEN,
                len: region.len(),
            });
        }

        Ok(Self {
            width: read_u32(region, WIDTH),
            height: read_u32(region, HEIGHT),
            num_frames: read_u32(region, NUM_FRAMES),
            flags: read_u32(region, FLAGS),
            fps: f64::from_ne_bytes(read_array(region, FPS)),
            fps_guessed: region[FPS_GUESSED] != 0,
            byte_pos: i64::from_ne_bytes(read_array(region, BYTE_POS)),
            dts: i64::from_ne_bytes(read_array(region, DTS)),
            pts: i64::from_ne_bytes(read_array(region, PTS)),
        })
    }

    /// Write the record into the start of `region`, the way a host does.
    pub fn encode_into(&self, region: &mut [u8]) -> Result<()> {
        if region.len() < METADATA_LEN {
            return Err(SdkError::RegionTooSmall {
                needed: METADATA_LEN,
                len: region.len(),
            });
        }

        region[WIDTH..WIDTH + 4].copy_from_slice(&self.width.to_ne_bytes());
        region[HEIGHT..HEIGHT + 4].copy_from_slice(&self.height.to_ne_bytes());
        region[NUM_FRAMES..NUM_FRAMES + 4].copy_from_slice(&self.num_frames.to_ne_bytes());
        region[FLAGS..FLAGS + 4].copy_from_slice(&self.flags.to_ne_bytes());
        region[FPS..FPS + 8].copy_from_slice(&self.fps.to_ne_bytes());
        region[FPS_GUESSED..BYTE_POS].fill(0);
        region[FPS_GUESSED] = u8::from(self.fps_guessed);
        region[BYTE_POS..BYTE_POS + 8].copy_from_slice(&self.byte_pos.to_ne_bytes());
        region[DTS..DTS + 8].copy_from_slice(&self.dts.to_ne_bytes());
        region[PTS..PTS + 8].copy_from_slice(&self.pts.to_ne_bytes());
        Ok(())
    }

    /// Per-frame fields of this snapshot.
    pub fn info(&self) -> FrameInfo {
        FrameInfo {
            flags: self.flags,
            byte_pos: self.byte_pos,
            dts: self.dts,
            pts: self.pts,
        }
    }

    /// Size of one frame's pixel data.
    pub fn frame_len(&self) -> Result<usize> {
        frame_len(self.width, self.height).ok_or(SdkError::FrameTooLarge {
            width: self.width,
            height: self.height,
        })
    }
}

/// `width * height * 3`, or `None` on overflow.
pub fn frame_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(BYTES_PER_PIXEL)
}

/// The pixel bytes described by `meta`, bounds-checked against `region`.
pub fn pixel_region<'a>(region: &'a [u8], meta: &FrameMetadata) -> Result<&'a [u8]> {
    let len = meta.frame_len()?;
    let end = PIXEL_OFFSET
        .checked_add(len)
        .ok_or(SdkError::FrameTooLarge {
            width: meta.width,
            height: meta.height,
        })?;
    region
        .get(PIXEL_OFFSET..end)
        .ok_or(SdkError::RegionTooSmall {
            needed: end,
            len: region.len(),
        })
}

fn read_u32(region: &[u8], offset: usize) -> u32 {
    u32::from_ne_bytes(read_array(region, offset))
}

fn read_array<const N: usize>(region: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&region[offset..offset + N]);
    out
}
