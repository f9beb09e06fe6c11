//! Mock backends for testing without hardware.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::frame::{FrameBuffer, FrameSize};
use crate::traits::{CaptureBackend, EncodeBackend, FourCC, Source};

/// Test pattern types for mock frame generation.
#[derive(Debug, Clone, Copy)]
pub enum TestPattern {
    /// Eight vertical RGB color bars.
    ColorBars,
    /// Horizontal luminance gradient from dark to light.
    Gradient,
    /// Solid color with the given RGB values.
    Solid(u8, u8, u8),
}

/// Mock capture backend delivering generated RGB24 frames.
pub struct MockCaptureBackend {
    ready: bool,
    size: FrameSize,
    fps: u32,
    pattern: TestPattern,
    frames_remaining: Option<usize>,
    fail_reads: bool,
}

impl Default for MockCaptureBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCaptureBackend {
    /// Create a ready mock with 640x480 @ 30fps and an unlimited frame
    /// supply.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ready: true,
            size: FrameSize::new(640, 480),
            fps: 30,
            pattern: TestPattern::ColorBars,
            frames_remaining: None,
            fail_reads: false,
        }
    }

    /// Mark the backend as not ready, modelling a source that opened but
    /// is not yet delivering.
    #[must_use]
    pub const fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Set the native frame geometry.
    #[must_use]
    pub const fn with_size(mut self, size: FrameSize) -> Self {
        self.size = size;
        self
    }

    /// Set the native frame rate.
    #[must_use]
    pub const fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Limit the backend to a finite number of frames before end of
    /// stream.
    #[must_use]
    pub const fn with_frames(mut self, count: usize) -> Self {
        self.frames_remaining = Some(count);
        self
    }

    /// Set the test pattern for frame generation.
    #[must_use]
    pub const fn with_pattern(mut self, pattern: TestPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Make every read fail, modelling a device that died mid-stream.
    #[must_use]
    pub const fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }
}

impl CaptureBackend for MockCaptureBackend {
    fn open(_source: &Source) -> Result<Self> {
        Ok(Self::new())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn size(&self) -> Result<FrameSize> {
        Ok(self.size)
    }

    fn set_size(&mut self, size: FrameSize) -> Result<FrameSize> {
        self.size = size;
        Ok(self.size)
    }

    fn fps(&self) -> Result<u32> {
        Ok(self.fps)
    }

    fn set_fps(&mut self, fps: u32) -> Result<u32> {
        self.fps = fps;
        Ok(self.fps)
    }

    fn read_frame(&mut self) -> Result<Option<FrameBuffer>> {
        if self.fail_reads {
            return Err(Error::Stream("simulated read failure".to_owned()));
        }

        if let Some(remaining) = &mut self.frames_remaining {
            if *remaining == 0 {
                return Ok(None);
            }
            *remaining -= 1;
        }

        let data = generate_test_frame(self.size, self.pattern);
        FrameBuffer::from_vec(data, self.size).map(Some)
    }
}

/// Mock encode backend recording every written frame.
pub struct MockEncodeBackend {
    size: FrameSize,
    recorded: Rc<RefCell<Vec<FrameBuffer>>>,
}

impl MockEncodeBackend {
    /// Create a mock bound to the given output geometry.
    #[must_use]
    pub fn new(size: FrameSize) -> Self {
        Self {
            size,
            recorded: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Record written frames into a shared vector owned by the test.
    #[must_use]
    pub fn with_recorder(mut self, recorder: Rc<RefCell<Vec<FrameBuffer>>>) -> Self {
        self.recorded = recorder;
        self
    }
}

impl EncodeBackend for MockEncodeBackend {
    fn open(_target: &Source, _codec: FourCC, _fps: u32, size: FrameSize) -> Result<Self> {
        Ok(Self::new(size))
    }

    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<()> {
        if frame.size() != self.size {
            return Err(Error::Stream("backend received a mismatched frame".to_owned()));
        }
        self.recorded.borrow_mut().push(frame.clone());
        Ok(())
    }
}

/// Generate RGB24 test frame data for the given pattern.
fn generate_test_frame(size: FrameSize, pattern: TestPattern) -> Vec<u8> {
    let mut data = vec![0_u8; size.frame_bytes()];

    match pattern {
        TestPattern::ColorBars => generate_color_bars(&mut data, size),
        TestPattern::Gradient => generate_gradient(&mut data, size),
        TestPattern::Solid(r, g, b) => generate_solid(&mut data, r, g, b),
    }

    data
}

/// Eight RGB color bars: White, Yellow, Cyan, Green, Magenta, Red, Blue,
/// Black.
fn generate_color_bars(data: &mut [u8], size: FrameSize) {
    let bars: [(u8, u8, u8); 8] = [
        (255, 255, 255), // White
        (255, 255, 0),   // Yellow
        (0, 255, 255),   // Cyan
        (0, 255, 0),     // Green
        (255, 0, 255),   // Magenta
        (255, 0, 0),     // Red
        (0, 0, 255),     // Blue
        (0, 0, 0),       // Black
    ];

    let bar_width = (size.width / 8).max(1);

    for y in 0..size.height {
        for x in 0..size.width {
            let bar_idx = (x / bar_width).min(7) as usize;
            let (r, g, b) = bars[bar_idx];

            let offset = ((y * size.width + x) * 3) as usize;
            if offset + 2 < data.len() {
                data[offset] = r;
                data[offset + 1] = g;
                data[offset + 2] = b;
            }
        }
    }
}

/// Horizontal gray gradient from dark to light.
fn generate_gradient(data: &mut [u8], size: FrameSize) {
    for y in 0..size.height {
        for x in 0..size.width {
            #[allow(clippy::cast_possible_truncation)]
            let level = ((x * 255) / size.width.max(1)) as u8;
            let offset = ((y * size.width + x) * 3) as usize;

            if offset + 2 < data.len() {
                data[offset] = level;
                data[offset + 1] = level;
                data[offset + 2] = level;
            }
        }
    }
}

/// Solid RGB frame.
fn generate_solid(data: &mut [u8], r: u8, g: u8, b: u8) {
    for pixel in data.chunks_exact_mut(3) {
        pixel[0] = r;
        pixel[1] = g;
        pixel[2] = b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_backend_defaults() {
        let backend = MockCaptureBackend::new();
        assert!(backend.is_ready());
        assert_eq!(backend.size().expect("size should succeed"), FrameSize::new(640, 480));
        assert_eq!(backend.fps().expect("fps should succeed"), 30);
    }

    #[test]
    fn test_mock_backend_set_parameters() {
        let mut backend = MockCaptureBackend::new();
        let actual = backend
            .set_size(FrameSize::new(1280, 720))
            .expect("set_size should succeed");
        assert_eq!(actual, FrameSize::new(1280, 720));

        let fps = backend.set_fps(15).expect("set_fps should succeed");
        assert_eq!(fps, 15);
    }

    #[test]
    fn test_frame_supply_exhausts() {
        let mut backend = MockCaptureBackend::new()
            .with_size(FrameSize::new(2, 2))
            .with_frames(1);

        assert!(backend.read_frame().expect("read should succeed").is_some());
        assert!(backend.read_frame().expect("read should succeed").is_none());
    }

    #[test]
    fn test_color_bars_pattern() {
        let size = FrameSize::new(640, 480);
        let data = generate_test_frame(size, TestPattern::ColorBars);

        assert_eq!(data.len(), size.frame_bytes());
        // First bar is white.
        assert_eq!(&data[0..3], &[255, 255, 255]);
        // Last bar is black.
        let last = (479 * 640 + 639) * 3;
        assert_eq!(&data[last..last + 3], &[0, 0, 0]);
    }

    #[test]
    fn test_gradient_pattern() {
        let size = FrameSize::new(640, 480);
        let data = generate_test_frame(size, TestPattern::Gradient);

        // Left edge dark, right edge bright.
        assert!(data[0] < 10);
        let last = (479 * 640 + 638) * 3;
        assert!(data[last] > 200);
    }

    #[test]
    fn test_solid_pattern() {
        let size = FrameSize::new(64, 64);
        let data = generate_test_frame(size, TestPattern::Solid(10, 20, 30));

        assert_eq!(&data[0..3], &[10, 20, 30]);
        assert_eq!(&data[data.len() - 3..], &[10, 20, 30]);
    }

    #[test]
    fn test_failing_reads() {
        let mut backend = MockCaptureBackend::new().failing_reads();
        assert!(matches!(backend.read_frame(), Err(Error::Stream(_))));
    }
}
