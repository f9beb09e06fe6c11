//! Frame geometry and buffer types shared by every session.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Frame geometry in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Create a new frame size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total byte length of one RGB24 frame of this size.
    #[must_use]
    pub const fn frame_bytes(self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for FrameSize {
    type Err = Error;

    /// Parse a `WIDTHxHEIGHT` specifier, e.g. `1280x720`.
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::MalformedSizeSpec(s.to_owned());

        let (width, height) = s.split_once('x').ok_or_else(malformed)?;
        let width: u32 = width.parse().map_err(|_| malformed())?;
        let height: u32 = height.parse().map_err(|_| malformed())?;

        if width == 0 || height == 0 {
            return Err(malformed());
        }

        Ok(Self { width, height })
    }
}

/// An owned RGB24 raster of exactly `width * height * 3` bytes,
/// row-major height x width x 3.
///
/// A `FrameBuffer` is always fully populated; readers report end-of-stream
/// instead of handing out a partially filled buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    data: Vec<u8>,
    size: FrameSize,
}

impl FrameBuffer {
    /// Wrap an owned byte vector as a frame.
    ///
    /// # Errors
    ///
    /// Returns `FrameSizeMismatch` if `data.len()` is not exactly
    /// `size.frame_bytes()`.
    pub fn from_vec(data: Vec<u8>, size: FrameSize) -> Result<Self> {
        if data.len() != size.frame_bytes() {
            return Err(Error::FrameSizeMismatch {
                expected: size.frame_bytes(),
                actual: data.len(),
                size,
            });
        }
        Ok(Self { data, size })
    }

    /// Create a zero-filled frame of the given size.
    #[must_use]
    pub fn zeroed(size: FrameSize) -> Self {
        Self {
            data: vec![0; size.frame_bytes()],
            size,
        }
    }

    /// Frame geometry.
    #[must_use]
    pub const fn size(&self) -> FrameSize {
        self.size
    }

    /// Raw interleaved RGB bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the frame and return its bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// RGB values at the given pixel coordinates, or `None` when out of
    /// bounds.
    #[must_use]
    pub fn pixel_at(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }

        let offset = ((y * self.size.width + x) * 3) as usize;
        let r = *self.data.get(offset)?;
        let g = *self.data.get(offset + 1)?;
        let b = *self.data.get(offset + 2)?;
        Some((r, g, b))
    }
}
