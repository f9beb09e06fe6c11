//! Device-backed encode session.

use std::fmt;

use tracing::debug;

use crate::error::{Error, Result};
use crate::frame::FrameBuffer;
use crate::traits::{EncodeBackend, EncodeOptions, FrameSink, Source};

/// An encode session bound to one output target.
///
/// Unlike capture there is no wait-for-the-world retry: the target and
/// parameters are fully caller-controlled, so an open failure indicates a
/// caller error and is reported immediately.
pub struct DeviceEncodeSession<B: EncodeBackend> {
    target: Source,
    options: EncodeOptions,
    backend: Option<B>,
}

impl<B: EncodeBackend> DeviceEncodeSession<B> {
    /// Open an encode session bound to the target and output parameters.
    pub fn open(target: impl Into<Source>, options: EncodeOptions) -> Result<Self> {
        let target = target.into();
        let backend = B::open(&target, options.codec, options.fps, options.size)?;
        debug!(target = %target, codec = %options.codec, "initialized encode session");
        Ok(Self {
            target,
            options,
            backend: Some(backend),
        })
    }

    /// Open an encode session using a custom connector. Tests inject
    /// recording backends here; production code goes through [`Self::open`].
    pub fn open_with<F>(target: Source, options: EncodeOptions, connect: F) -> Result<Self>
    where
        F: FnOnce(&Source, &EncodeOptions) -> Result<B>,
    {
        let backend = connect(&target, &options)?;
        Ok(Self {
            target,
            options,
            backend: Some(backend),
        })
    }

    /// Output parameters this session was opened with.
    #[must_use]
    pub const fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Release the backing resource. Idempotent.
    pub fn release(&mut self) {
        if self.backend.take().is_some() {
            debug!(target = %self.target, "encode session is stopped");
        }
    }
}

impl<B: EncodeBackend> FrameSink for DeviceEncodeSession<B> {
    /// Blocking write of one frame.
    ///
    /// The frame's geometry must exactly match the configured output size;
    /// a mismatch is a caller error and reported as `FrameSizeMismatch`.
    /// Writing after release is reported as `SessionReleased`.
    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<()> {
        let backend = self.backend.as_mut().ok_or(Error::SessionReleased)?;
        if frame.size() != self.options.size {
            return Err(Error::FrameSizeMismatch {
                expected: self.options.size.frame_bytes(),
                actual: frame.as_bytes().len(),
                size: self.options.size,
            });
        }
        backend.write_frame(frame)
    }
}

impl<B: EncodeBackend> Drop for DeviceEncodeSession<B> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<B: EncodeBackend> fmt::Display for DeviceEncodeSession<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DeviceEncodeSession(target={}, codec={}, fps={}, size={})",
            self.target, self.options.codec, self.options.fps, self.options.size
        )
    }
}
