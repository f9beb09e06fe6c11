//! Frameio: raw RGB24 video frame I/O
//!
//! This library provides a uniform abstraction for reading and writing
//! sequences of raw video frames from two backends: V4L2 devices (behind
//! the [`CaptureBackend`]/[`EncodeBackend`] traits, enabling tests with
//! mock devices) and external encoder/decoder processes communicating raw
//! bytes over a pipe.

pub mod capture;
pub mod device;
pub mod error;
pub mod frame;
pub mod pipe;
pub mod traits;
pub mod writer;

#[cfg(test)]
pub mod mock;

pub use capture::DeviceCaptureSession;
pub use device::{V4l2Capture, V4l2Encode};
pub use error::{Error, Result};
pub use frame::{FrameBuffer, FrameSize};
pub use pipe::{PipeDecodeSession, PipeEncodeSession};
pub use traits::{
    CaptureBackend, CaptureOptions, EncodeBackend, EncodeOptions, FourCC, FrameSink,
    FrameSource, Source,
};
pub use writer::DeviceEncodeSession;
