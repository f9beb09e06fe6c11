//! Error type shared by all sessions.

use std::path::PathBuf;

use crate::frame::FrameSize;

/// Error type for frame I/O operations.
///
/// End-of-stream is never an error: readers signal it with `None` or by
/// exhausting their frame iterator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An explicitly configured binary path does not exist.
    #[error("binary not found: {}", .0.display())]
    BinaryNotFound(PathBuf),

    /// The external binary is missing from `PATH` or failed its version
    /// check.
    #[error("`{binary}` is not usable: {reason}")]
    ProcessUnavailable {
        /// The binary that was probed.
        binary: String,
        /// Why the probe failed.
        reason: String,
    },

    /// The argument list carries no `-s WIDTHxHEIGHT` size specifier.
    #[error("no `-s WIDTHxHEIGHT` size specifier in argument list")]
    MissingSizeSpec,

    /// A size specifier was present but could not be parsed.
    #[error("malformed frame size `{0}`, expected WIDTHxHEIGHT")]
    MalformedSizeSpec(String),

    /// The source descriptor cannot be handled by this backend.
    #[error("source `{0}` is not supported by this backend")]
    UnsupportedSource(String),

    /// Failed to open a device.
    #[error("failed to open device: {0}")]
    DeviceOpenFailed(String),

    /// Error during a streaming read or write.
    #[error("stream error: {0}")]
    Stream(String),

    /// A frame's byte length does not match the configured geometry.
    #[error("frame is {actual} bytes, expected {expected} for {size}")]
    FrameSizeMismatch {
        /// Byte length the geometry requires.
        expected: usize,
        /// Byte length actually supplied.
        actual: usize,
        /// The configured geometry.
        size: FrameSize,
    },

    /// The session was already released.
    #[error("session already released")]
    SessionReleased,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for frame I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
