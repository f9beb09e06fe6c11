//! Core descriptors, options, and the backend/session trait seams.

use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::frame::{FrameBuffer, FrameSize};

/// Codec tag representation (e.g. mp4v, MJPG, RGB3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Create a new `FourCC` from a 4-byte array.
    #[must_use]
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    /// MPEG-4 part 2 codec tag.
    pub const MP4V: Self = Self::new(b"mp4v");
    /// MJPEG codec tag (Motion JPEG).
    pub const MJPG: Self = Self::new(b"MJPG");
    /// RGB3 pixel format (24-bit RGB).
    pub const RGB3: Self = Self::new(b"RGB3");
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{}", byte as char)?;
        }
        Ok(())
    }
}

impl From<v4l::FourCC> for FourCC {
    fn from(fourcc: v4l::FourCC) -> Self {
        Self(fourcc.repr)
    }
}

impl From<FourCC> for v4l::FourCC {
    fn from(fourcc: FourCC) -> Self {
        Self::new(&fourcc.0)
    }
}

/// Source or target descriptor: a device index or a URI/path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Device index (e.g. 0 for /dev/video0).
    Index(u32),
    /// URI or filesystem path.
    Uri(String),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Uri(uri) => write!(f, "{uri}"),
        }
    }
}

impl From<u32> for Source {
    fn from(index: u32) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for Source {
    fn from(uri: &str) -> Self {
        Self::Uri(uri.to_owned())
    }
}

impl From<String> for Source {
    fn from(uri: String) -> Self {
        Self::Uri(uri)
    }
}

/// Capture parameters. Unset values keep the device-native defaults read
/// back at open time.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Requested frame rate, or `None` for the device-native rate.
    pub fps: Option<u32>,
    /// Requested frame width, or `None` for the device-native width.
    pub width: Option<u32>,
    /// Requested frame height, or `None` for the device-native height.
    pub height: Option<u32>,
    /// Delay between reopen attempts while the source is unavailable.
    pub reopen_backoff: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            fps: None,
            width: None,
            height: None,
            reopen_backoff: Duration::from_secs(5),
        }
    }
}

/// Encode parameters for a device-backed writer.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Codec tag handed to the backend.
    pub codec: FourCC,
    /// Output frame rate.
    pub fps: u32,
    /// Output frame geometry.
    pub size: FrameSize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            codec: FourCC::MP4V,
            fps: 30,
            size: FrameSize::new(1280, 720),
        }
    }
}

/// Abstraction over a native capture resource.
///
/// Implementations wrap one opened device; the session layer owns the
/// reopen/retry policy, so `open` reports failure instead of blocking.
pub trait CaptureBackend: Sized {
    /// Open the backend for the given source.
    fn open(source: &Source) -> Result<Self>;

    /// Whether the backend is ready to deliver frames.
    fn is_ready(&self) -> bool;

    /// Current frame geometry.
    fn size(&self) -> Result<FrameSize>;

    /// Request a frame geometry. Returns the geometry actually in effect.
    fn set_size(&mut self, size: FrameSize) -> Result<FrameSize>;

    /// Current frame rate.
    fn fps(&self) -> Result<u32>;

    /// Request a frame rate. Returns the rate actually in effect.
    fn set_fps(&mut self, fps: u32) -> Result<u32>;

    /// Blocking read of one frame. `Ok(None)` signals end of stream.
    fn read_frame(&mut self) -> Result<Option<FrameBuffer>>;
}

/// Abstraction over a native encode resource.
pub trait EncodeBackend: Sized {
    /// Open the backend bound to the target and output parameters.
    fn open(target: &Source, codec: FourCC, fps: u32, size: FrameSize) -> Result<Self>;

    /// Blocking write of one frame.
    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<()>;
}

/// A pull-based producer of frames, device- or process-backed.
pub trait FrameSource {
    /// Blocking read of the next frame. `Ok(None)` signals end of stream.
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>>;
}

/// A consumer of frames, device- or process-backed.
pub trait FrameSink {
    /// Blocking write of one frame.
    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<()>;
}
