use crate::error::ImageError;
use crate::metadata::{frame_len, FrameInfo, BYTES_PER_PIXEL};

/// Pixel storage of a [`FrameBuffer`].
#[derive(Debug, Clone)]
pub enum Pixels<'a> {
    /// A read-only view of the shared region, taken at frame `epoch`.
    Borrowed { bytes: &'a [u8], epoch: u64 },
    /// Heap storage owned by the buffer.
    Owned(Vec<u8>),
}

/// An RGB24 image, row-major with no row padding.
///
/// Frames handed out by the session borrow the shared region and are
/// read-only. Buffers made with [`FrameBuffer::create`] or
/// [`FrameBuffer::to_owned_frame`] own their pixels and can be scaled into.
#[derive(Debug, Clone)]
pub struct FrameBuffer<'a> {
    width: u32,
    height: u32,
    info: FrameInfo,
    pixels: Pixels<'a>,
}

impl FrameBuffer<'static> {
    /// Allocate a zeroed, writable buffer.
    pub fn create(width: u32, height: u32) -> Result<Self, ImageError> {
        let len = frame_len(width, height).ok_or(ImageError::Alloc { bytes: usize::MAX })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| ImageError::Alloc { bytes: len })?;
        data.resize(len, 0);

        Ok(Self {
            width,
            height,
            info: FrameInfo::default(),
            pixels: Pixels::Owned(data),
        })
    }

    /// Wrap existing RGB bytes in a writable buffer.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImageError> {
        let expected = frame_len(width, height).ok_or(ImageError::Alloc { bytes: usize::MAX })?;
        if data.len() != expected {
            return Err(ImageError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            info: FrameInfo::default(),
            pixels: Pixels::Owned(data),
        })
    }
}

impl<'a> FrameBuffer<'a> {
    pub(crate) fn borrowed(
        width: u32,
        height: u32,
        info: FrameInfo,
        bytes: &'a [u8],
        epoch: u64,
    ) -> Self {
        Self {
            width,
            height,
            info,
            pixels: Pixels::Borrowed { bytes, epoch },
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Per-frame metadata captured when the frame was delivered.
    pub fn info(&self) -> FrameInfo {
        self.info
    }

    pub fn set_info(&mut self, info: FrameInfo) {
        self.info = info;
    }

    pub fn pixels(&self) -> &Pixels<'a> {
        &self.pixels
    }

    /// Raw RGB bytes.
    pub fn data(&self) -> &[u8] {
        match &self.pixels {
            Pixels::Borrowed { bytes, .. } => bytes,
            Pixels::Owned(data) => data,
        }
    }

    /// Mutable RGB bytes; fails for borrowed frames.
    pub fn data_mut(&mut self) -> Result<&mut [u8], ImageError> {
        match &mut self.pixels {
            Pixels::Borrowed { .. } => Err(ImageError::NotWritable),
            Pixels::Owned(data) => Ok(data),
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.pixels, Pixels::Owned(_))
    }

    /// Frame epoch of a borrowed view, `None` for owned buffers.
    pub fn epoch(&self) -> Option<u64> {
        match self.pixels {
            Pixels::Borrowed { epoch, .. } => Some(epoch),
            Pixels::Owned(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Length of one row in bytes.
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Copy the pixels into a writable buffer that outlives the session borrow.
    pub fn to_owned_frame(&self) -> Result<FrameBuffer<'static>, ImageError> {
        let src = self.data();
        let mut data = Vec::new();
        data.try_reserve_exact(src.len())
            .map_err(|_| ImageError::Alloc { bytes: src.len() })?;
        data.extend_from_slice(src);

        Ok(FrameBuffer {
            width: self.width,
            height: self.height,
            info: self.info,
            pixels: Pixels::Owned(data),
        })
    }

    /// RGB triple at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride() + x as usize * BYTES_PER_PIXEL;
        let px = self.data().get(offset..offset + BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2]])
    }
}
