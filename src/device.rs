//! V4L2 backend implementations using the v4l crate.
//!
//! Frames cross the device boundary as RGB24 (`RGB3`) rasters via the
//! device's read/write I/O, so both backends satisfy the fixed
//! `width * height * 3` frame shape without any conversion.

use std::io::{ErrorKind, Read, Write};

use v4l::capability::Flags;
use v4l::video::{Capture, Output};
use v4l::{Device, Fraction};

use crate::error::{Error, Result};
use crate::frame::{FrameBuffer, FrameSize};
use crate::traits::{CaptureBackend, EncodeBackend, FourCC, Source};

/// Open a V4L2 device for an index or /dev path descriptor.
///
/// Network URIs are not something V4L2 can address; they are reported as
/// unsupported rather than retried.
fn open_device(descriptor: &Source) -> Result<Device> {
    match descriptor {
        Source::Index(index) => Device::new(*index as usize)
            .map_err(|err| Error::DeviceOpenFailed(err.to_string())),
        Source::Uri(uri) if uri.starts_with("/dev/") => {
            Device::with_path(uri).map_err(|err| Error::DeviceOpenFailed(err.to_string()))
        }
        Source::Uri(uri) => Err(Error::UnsupportedSource(uri.clone())),
    }
}

/// Frame rate carried by a parameter struct's frame interval, or `None`
/// for a degenerate interval.
const fn fps_from_interval(interval: Fraction) -> Option<u32> {
    if interval.numerator == 0 {
        None
    } else {
        Some(interval.denominator / interval.numerator)
    }
}

/// V4L2 capture backend reading RGB24 frames from a video device.
pub struct V4l2Capture {
    device: Device,
    can_capture: bool,
    active: Option<FrameSize>,
}

impl CaptureBackend for V4l2Capture {
    fn open(source: &Source) -> Result<Self> {
        let device = open_device(source)?;
        let caps = device
            .query_caps()
            .map_err(|err| Error::DeviceOpenFailed(err.to_string()))?;

        Ok(Self {
            device,
            can_capture: caps.capabilities.contains(Flags::VIDEO_CAPTURE),
            active: None,
        })
    }

    fn is_ready(&self) -> bool {
        self.can_capture
    }

    fn size(&self) -> Result<FrameSize> {
        let fmt =
            Capture::format(&self.device).map_err(|err| Error::Stream(err.to_string()))?;
        Ok(FrameSize::new(fmt.width, fmt.height))
    }

    fn set_size(&mut self, size: FrameSize) -> Result<FrameSize> {
        let requested = v4l::Format::new(size.width, size.height, FourCC::RGB3.into());
        let actual = Capture::set_format(&mut self.device, &requested)
            .map_err(|err| Error::Stream(err.to_string()))?;

        let actual = FrameSize::new(actual.width, actual.height);
        self.active = Some(actual);
        Ok(actual)
    }

    fn fps(&self) -> Result<u32> {
        let params =
            Capture::params(&self.device).map_err(|err| Error::Stream(err.to_string()))?;
        fps_from_interval(params.interval)
            .ok_or_else(|| Error::Stream("device reported a zero frame interval".to_owned()))
    }

    fn set_fps(&mut self, fps: u32) -> Result<u32> {
        let mut params =
            Capture::params(&self.device).map_err(|err| Error::Stream(err.to_string()))?;
        params.interval = Fraction::new(1, fps);
        let params = Capture::set_params(&mut self.device, &params)
            .map_err(|err| Error::Stream(err.to_string()))?;
        fps_from_interval(params.interval)
            .ok_or_else(|| Error::Stream("device reported a zero frame interval".to_owned()))
    }

    fn read_frame(&mut self) -> Result<Option<FrameBuffer>> {
        let size = match self.active {
            Some(size) => size,
            None => {
                let size = self.size()?;
                self.active = Some(size);
                size
            }
        };

        let mut data = vec![0_u8; size.frame_bytes()];
        match self.device.read_exact(&mut data) {
            Ok(()) => FrameBuffer::from_vec(data, size).map(Some),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// V4L2 encode backend writing frames to a video output device.
pub struct V4l2Encode {
    device: Device,
}

impl EncodeBackend for V4l2Encode {
    fn open(target: &Source, codec: FourCC, fps: u32, size: FrameSize) -> Result<Self> {
        let mut device = open_device(target)?;
        let caps = device
            .query_caps()
            .map_err(|err| Error::DeviceOpenFailed(err.to_string()))?;

        if !caps.capabilities.contains(Flags::VIDEO_OUTPUT) {
            return Err(Error::DeviceOpenFailed(format!(
                "{target} does not support video output"
            )));
        }

        let requested = v4l::Format::new(size.width, size.height, codec.into());
        Output::set_format(&mut device, &requested)
            .map_err(|err| Error::DeviceOpenFailed(err.to_string()))?;

        let mut params =
            Output::params(&device).map_err(|err| Error::DeviceOpenFailed(err.to_string()))?;
        params.interval = Fraction::new(1, fps);
        Output::set_params(&mut device, &params)
            .map_err(|err| Error::DeviceOpenFailed(err.to_string()))?;

        Ok(Self { device })
    }

    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<()> {
        self.device.write_all(frame.as_bytes())?;
        Ok(())
    }
}
