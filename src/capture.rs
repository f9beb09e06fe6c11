//! Device-backed capture session with reopen-on-failure.

use std::fmt;
use std::thread;

use tracing::{debug, warn};

use crate::error::Result;
use crate::frame::{FrameBuffer, FrameSize};
use crate::traits::{CaptureBackend, CaptureOptions, FrameSource, Source};

/// A capture session bound to one source descriptor.
///
/// Opening blocks and retries with a fixed backoff until the backend opens
/// and reports ready; a live camera or stream source may come online after
/// the process starts, and a momentarily unavailable source must never
/// terminate the caller. Once ready, requested width/height/fps are
/// applied; unset parameters keep the device-native values.
///
/// Sessions are single-owner and single-threaded; release between frame
/// reads is safe, release from another thread mid-read is not supported.
pub struct DeviceCaptureSession<B: CaptureBackend> {
    source: Source,
    options: CaptureOptions,
    backend: Option<B>,
    size: Option<FrameSize>,
    fps: Option<u32>,
}

impl<B: CaptureBackend> DeviceCaptureSession<B> {
    /// Open a capture session, blocking until the source is available.
    pub fn open(source: impl Into<Source>, options: CaptureOptions) -> Self {
        let source = source.into();
        Self::open_with(source, options, B::open)
    }

    /// Open a capture session using a custom connector.
    ///
    /// The connector is invoked once per attempt until it returns a ready
    /// backend. Production code goes through [`Self::open`]; tests inject
    /// scripted backends here.
    pub fn open_with<F>(source: Source, options: CaptureOptions, mut connect: F) -> Self
    where
        F: FnMut(&Source) -> Result<B>,
    {
        let mut backend = loop {
            match connect(&source) {
                Ok(backend) if backend.is_ready() => break backend,
                Ok(_) => debug!(source = %source, "capture is not opened, reopening.."),
                Err(err) => {
                    debug!(source = %source, error = %err, "capture is not opened, reopening..");
                }
            }
            thread::sleep(options.reopen_backoff);
        };

        let (size, fps) = configure(&mut backend, &options);
        debug!(source = %source, ?size, ?fps, "capture is opened");

        Self {
            source,
            options,
            backend: Some(backend),
            size,
            fps,
        }
    }

    /// Capture parameters this session was opened with.
    #[must_use]
    pub const fn options(&self) -> &CaptureOptions {
        &self.options
    }

    /// Whether the session currently holds a ready backend.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.backend.as_ref().is_some_and(B::is_ready)
    }

    /// Frame geometry in effect, if the backend reported one.
    #[must_use]
    pub const fn size(&self) -> Option<FrameSize> {
        self.size
    }

    /// Frame rate in effect, if the backend reported one.
    #[must_use]
    pub const fn fps(&self) -> Option<u32> {
        self.fps
    }

    /// Release the backing resource. Idempotent; releasing before a frame
    /// was ever read or more than once is a no-op.
    pub fn release(&mut self) {
        if self.backend.take().is_some() {
            debug!(source = %self.source, "capture session is stopped");
        }
    }
}

/// Apply requested parameters, keeping device-native values for anything
/// the caller left unset. Failures fall back to the native value.
fn configure<B: CaptureBackend>(
    backend: &mut B,
    options: &CaptureOptions,
) -> (Option<FrameSize>, Option<u32>) {
    let size = match backend.size() {
        Ok(native) => {
            let requested = FrameSize::new(
                options.width.unwrap_or(native.width),
                options.height.unwrap_or(native.height),
            );
            match backend.set_size(requested) {
                Ok(actual) => Some(actual),
                Err(err) => {
                    warn!(%requested, error = %err, "failed to apply frame size");
                    Some(native)
                }
            }
        }
        Err(err) => {
            warn!(error = %err, "failed to query native frame size");
            None
        }
    };

    let fps = match backend.fps() {
        Ok(native) => {
            let requested = options.fps.unwrap_or(native);
            match backend.set_fps(requested) {
                Ok(actual) => Some(actual),
                Err(err) => {
                    warn!(requested, error = %err, "failed to apply frame rate");
                    Some(native)
                }
            }
        }
        Err(err) => {
            warn!(error = %err, "failed to query native frame rate");
            None
        }
    };

    (size, fps)
}

impl<B: CaptureBackend> FrameSource for DeviceCaptureSession<B> {
    /// Blocking read of the next frame.
    ///
    /// Never returns `Err`: end of stream, device failure, and reads after
    /// release all surface as `Ok(None)`, and callers detect stream end by
    /// this sentinel.
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(None);
        };
        match backend.read_frame() {
            Ok(frame) => Ok(frame),
            Err(err) => {
                debug!(source = %self.source, error = %err, "no frame received");
                Ok(None)
            }
        }
    }
}

impl<B: CaptureBackend> Drop for DeviceCaptureSession<B> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<B: CaptureBackend> fmt::Display for DeviceCaptureSession<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceCaptureSession(source={})", self.source)
    }
}
