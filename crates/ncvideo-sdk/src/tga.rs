use std::fs::File;
use std::io::Write;
use std::path::Path;

use bytes::{BufMut, Bytes};
use tracing::debug;

use crate::error::ImageError;
use crate::frame::FrameBuffer;
use crate::metadata::BYTES_PER_PIXEL;

/// Length of the fixed TGA header.
pub const TGA_HEADER_LEN: usize = 18;

const IMAGE_TYPE_TRUECOLOR: u8 = 2;
const BITS_PER_PIXEL: u8 = 24;

/// The fields of a TGA header this encoder writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TgaHeader {
    pub image_type: u8,
    pub width: u16,
    pub height: u16,
    pub bits_per_pixel: u8,
}

impl TgaHeader {
    /// Decode the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let header = bytes.get(..TGA_HEADER_LEN)?;
        Some(Self {
            image_type: header[2],
            width: u16::from_le_bytes([header[12], header[13]]),
            height: u16::from_le_bytes([header[14], header[15]]),
            bits_per_pixel: header[16],
        })
    }
}

/// Encode `frame` as an uncompressed 24-bit TGA image.
///
/// Rows are stored bottom row first and pixels as BGR, matching the
/// format's default origin.
pub fn encode_tga(frame: &FrameBuffer<'_>) -> Result<Bytes, ImageError> {
    let (width, height) = tga_dimensions(frame)?;

    let pixels = frame.data();
    let total = TGA_HEADER_LEN + pixels.len();
    let mut out = Vec::new();
    out.try_reserve_exact(total)
        .map_err(|_| ImageError::Alloc { bytes: total })?;

    out.put_bytes(0, 2);
    out.put_u8(IMAGE_TYPE_TRUECOLOR);
    out.put_bytes(0, 9);
    out.put_u16_le(width);
    out.put_u16_le(height);
    out.put_u8(BITS_PER_PIXEL);
    out.put_u8(0);

    let stride = frame.stride();
    if stride > 0 {
        for row in pixels.chunks_exact(stride).rev() {
            for px in row.chunks_exact(BYTES_PER_PIXEL) {
                out.put_slice(&[px[2], px[1], px[0]]);
            }
        }
    }

    Ok(Bytes::from(out))
}

/// Encode `frame` and write it to `path`, replacing any existing file.
pub fn write_tga(frame: &FrameBuffer<'_>, path: impl AsRef<Path>) -> Result<(), ImageError> {
    let path = path.as_ref();
    let encoded = encode_tga(frame)?;

    let mut file = File::create(path).map_err(|source| ImageError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(&encoded)
        .and_then(|()| file.flush())
        .map_err(|source| ImageError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(path = %path.display(), bytes = encoded.len(), "wrote tga");
    Ok(())
}

fn tga_dimensions(frame: &FrameBuffer<'_>) -> Result<(u16, u16), ImageError> {
    match (u16::try_from(frame.width()), u16::try_from(frame.height())) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(ImageError::TooLargeForTga {
            width: frame.width(),
            height: frame.height(),
        }),
    }
}
