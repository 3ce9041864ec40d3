//! Resampling RGB24 frames into a sub-rectangle of a writable target.
//!
//! Two kernels are provided. Nearest-neighbour picks
//! `floor(x * src_w / dst_w)`. Bicubic is a 4x4 cubic convolution with the
//! Keys kernel (`a = -0.5`), sampling the source at
//! `(x + 0.5) * src_w / dst_w - 0.5` and replicating edge pixels. Scaling a
//! frame to its own size with either kernel reproduces it exactly.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ImageError;
use crate::frame::FrameBuffer;
use crate::metadata::BYTES_PER_PIXEL;

const KEYS_A: f32 = -0.5;
const TAPS: usize = 4;

/// Resampling kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    Nearest,
    Bicubic,
    /// Highest quality available; currently bicubic.
    #[default]
    Best,
}

impl ScaleMode {
    fn is_nearest(self) -> bool {
        matches!(self, ScaleMode::Nearest)
    }
}

impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScaleMode::Nearest => "nearest",
            ScaleMode::Bicubic => "bicubic",
            ScaleMode::Best => "best",
        };
        f.write_str(name)
    }
}

impl FromStr for ScaleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(ScaleMode::Nearest),
            "bicubic" => Ok(ScaleMode::Bicubic),
            "best" => Ok(ScaleMode::Best),
            other => Err(format!(
                "unknown scale mode '{other}' (expected nearest, bicubic or best)"
            )),
        }
    }
}

/// Destination rectangle in target pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole of a `width` x `height` target.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    fn fits(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

/// Resample all of `src` into `rect` of `dst`.
///
/// Pixels of `dst` outside `rect` are left as they were. On error nothing
/// in `dst` is modified.
pub fn scale(
    src: &FrameBuffer<'_>,
    dst: &mut FrameBuffer<'_>,
    rect: Rect,
    mode: ScaleMode,
) -> Result<(), ImageError> {
    if !dst.is_owned() {
        return Err(ImageError::NotWritable);
    }
    if !rect.fits(dst.width(), dst.height()) {
        return Err(ImageError::OutOfBounds {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            target_width: dst.width(),
            target_height: dst.height(),
        });
    }
    if src.is_empty() {
        return Err(ImageError::EmptySource);
    }

    let dst_stride = dst.stride();
    let target = Target {
        data: dst.data_mut()?,
        stride: dst_stride,
        rect,
    };

    if mode.is_nearest() {
        scale_nearest(src, target);
        Ok(())
    } else {
        scale_bicubic(src, target)
    }
}

/// Scale `src` into a new owned `width` x `height` buffer.
pub fn scale_to(
    src: &FrameBuffer<'_>,
    width: u32,
    height: u32,
    mode: ScaleMode,
) -> Result<FrameBuffer<'static>, ImageError> {
    let mut dst = FrameBuffer::create(width, height)?;
    scale(src, &mut dst, Rect::full(width, height), mode)?;
    dst.set_info(src.info());
    Ok(dst)
}

struct Target<'d> {
    data: &'d mut [u8],
    stride: usize,
    rect: Rect,
}

impl Target<'_> {
    fn offset(&self, x: u32, y: u32) -> usize {
        (self.rect.y + y) as usize * self.stride + (self.rect.x + x) as usize * BYTES_PER_PIXEL
    }
}

fn scale_nearest(src: &FrameBuffer<'_>, mut target: Target<'_>) {
    let (sw, sh) = (u64::from(src.width()), u64::from(src.height()));
    let (tw, th) = (u64::from(target.rect.width), u64::from(target.rect.height));
    let src_data = src.data();
    let src_stride = src.stride();

    for y in 0..target.rect.height {
        let sy = ((u64::from(y) * sh / th).min(sh - 1)) as usize;
        for x in 0..target.rect.width {
            let sx = ((u64::from(x) * sw / tw).min(sw - 1)) as usize;
            let from = sy * src_stride + sx * BYTES_PER_PIXEL;
            let to = target.offset(x, y);
            target.data[to..to + BYTES_PER_PIXEL]
                .copy_from_slice(&src_data[from..from + BYTES_PER_PIXEL]);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Tap {
    idx: [usize; TAPS],
    w: [f32; TAPS],
}

fn scale_bicubic(src: &FrameBuffer<'_>, mut target: Target<'_>) -> Result<(), ImageError> {
    let columns = taps(src.width(), target.rect.width)?;
    let rows = taps(src.height(), target.rect.height)?;
    let src_data = src.data();
    let src_stride = src.stride();

    for (y, row) in rows.iter().enumerate() {
        for (x, col) in columns.iter().enumerate() {
            let mut acc = [0f32; BYTES_PER_PIXEL];
            for (sy, wy) in row.idx.iter().zip(row.w) {
                if wy == 0.0 {
                    continue;
                }
                let line = sy * src_stride;
                for (sx, wx) in col.idx.iter().zip(col.w) {
                    let weight = wy * wx;
                    if weight == 0.0 {
                        continue;
                    }
                    let px = line + sx * BYTES_PER_PIXEL;
                    for (c, sum) in acc.iter_mut().enumerate() {
                        *sum += weight * f32::from(src_data[px + c]);
                    }
                }
            }

            let to = target.offset(x as u32, y as u32);
            for (c, sum) in acc.into_iter().enumerate() {
                target.data[to + c] = sum.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(())
}

/// Source indices and weights for every target position along one axis.
fn taps(src_len: u32, dst_len: u32) -> Result<Vec<Tap>, ImageError> {
    let count = dst_len as usize;
    let mut out = Vec::new();
    out.try_reserve_exact(count)
        .map_err(|_| ImageError::Alloc {
            bytes: count.saturating_mul(std::mem::size_of::<Tap>()),
        })?;

    let ratio = src_len as f64 / dst_len as f64;
    let last = src_len as i64 - 1;
    for i in 0..dst_len {
        let center = (f64::from(i) + 0.5) * ratio - 0.5;
        let base = center.floor();
        let frac = (center - base) as f32;
        let base = base as i64;

        let mut tap = Tap {
            idx: [0; TAPS],
            w: [0.0; TAPS],
        };
        for k in 0..TAPS {
            let offset = k as i64 - 1;
            tap.idx[k] = (base + offset).clamp(0, last) as usize;
            tap.w[k] = cubic_weight(frac - offset as f32);
        }
        out.push(tap);
    }
    Ok(out)
}

fn cubic_weight(t: f32) -> f32 {
    let t = t.abs();
    if t <= 1.0 {
        ((KEYS_A + 2.0) * t - (KEYS_A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((KEYS_A * t - 5.0 * KEYS_A) * t + 8.0 * KEYS_A) * t - 4.0 * KEYS_A
    } else {
        0.0
    }
}
