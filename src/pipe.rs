//! External-process frame sessions communicating raw bytes over pipes.
//!
//! Both sessions spawn one external encoder/decoder process (ffmpeg by
//! default) and treat its pipe as an unframed byte stream: the decode side
//! slices it into fixed-size frames, the encode side serializes frames
//! into it. Frame geometry is supplied out-of-band through the argument
//! list; the stream itself carries no headers or boundaries.

use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::frame::{FrameBuffer, FrameSize};
use crate::traits::{FrameSink, FrameSource};

/// Binary name resolved from `PATH` when no explicit path is given.
const DEFAULT_BINARY: &str = "ffmpeg";

/// Resolve the external binary path.
///
/// An explicit path must exist and is used verbatim; otherwise the default
/// name is left to `PATH` resolution at spawn time.
fn resolve_binary(binary: Option<PathBuf>) -> Result<PathBuf> {
    match binary {
        Some(path) if path.exists() => Ok(path),
        Some(path) => Err(Error::BinaryNotFound(path)),
        None => Ok(PathBuf::from(DEFAULT_BINARY)),
    }
}

/// Verify the binary is installed by running its version query.
///
/// Guards against silently reading garbage from a process that never
/// started correctly: a missing binary or non-zero exit fails session
/// construction before anything is spawned for data.
fn check_installation(binary: &Path) -> Result<()> {
    let output = Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .output();

    match output {
        Ok(output) if output.status.success() => {
            if let Some(line) = String::from_utf8_lossy(&output.stdout).lines().next() {
                debug!(binary = %binary.display(), info = line, "installation info");
            }
            Ok(())
        }
        Ok(output) => Err(Error::ProcessUnavailable {
            binary: binary.display().to_string(),
            reason: format!("version check exited with {}", output.status),
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(Error::ProcessUnavailable {
            binary: binary.display().to_string(),
            reason: "not installed or not found in PATH".to_owned(),
        }),
        Err(err) => Err(Error::ProcessUnavailable {
            binary: binary.display().to_string(),
            reason: err.to_string(),
        }),
    }
}

/// Find the `-s WIDTHxHEIGHT` size specifier in the argument list.
///
/// The decode byte stream carries no self-describing frame boundaries, so
/// slicing is impossible without it.
fn parse_size_arg(args: &[String]) -> Result<FrameSize> {
    let position = args
        .iter()
        .position(|arg| arg == "-s")
        .ok_or(Error::MissingSizeSpec)?;
    let spec = args.get(position + 1).ok_or(Error::MissingSizeSpec)?;
    spec.parse()
}

/// Reap a child after its pipe endpoint was closed.
///
/// The process is never forcibly killed; it is expected to exit on its own
/// once it observes end-of-input or a closed output pipe.
fn reap(child: &mut Child) {
    match child.wait() {
        Ok(status) => debug!(%status, "external process exited"),
        Err(err) => debug!(error = %err, "failed to reap external process"),
    }
}

/// An external decoder process read as a lazy sequence of frames.
///
/// The process is spawned with only its standard output connected;
/// standard error is discarded, as diagnostic detail from the decode
/// process is not part of this component's contract.
pub struct PipeDecodeSession {
    binary: PathBuf,
    args: Vec<String>,
    size: FrameSize,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
}

impl PipeDecodeSession {
    /// Verify the binary and spawn the decoder with the given arguments.
    ///
    /// The argument list must carry a `-s WIDTHxHEIGHT` size specifier;
    /// `binary` is an optional explicit path, which must exist.
    pub fn spawn<I, S>(args: I, binary: Option<PathBuf>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let binary = resolve_binary(binary)?;
        let size = parse_size_arg(&args)?;
        check_installation(&binary)?;

        let mut child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| {
            Error::Stream("spawned process has no stdout pipe".to_owned())
        })?;

        debug!(binary = %binary.display(), %size, "initialized pipe decode session");

        Ok(Self {
            binary,
            args,
            size,
            child: Some(child),
            stdout: Some(stdout),
        })
    }

    /// Frame geometry parsed from the argument list.
    #[must_use]
    pub const fn size(&self) -> FrameSize {
        self.size
    }

    /// A lazy, pull-based iterator over the remaining frames.
    ///
    /// Each advance performs one blocking frame read. The sequence is not
    /// restartable; it is tied to the live process pipe, and re-iterating
    /// requires a new session.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames { session: self }
    }

    /// Close the output pipe and reap the process. Idempotent.
    pub fn release(&mut self) {
        if self.stdout.take().is_none() {
            return;
        }
        debug!("stopping pipe decode session..");
        if let Some(mut child) = self.child.take() {
            reap(&mut child);
        }
        debug!("pipe decode session is stopped");
    }
}

impl FrameSource for PipeDecodeSession {
    /// Blocking read of the next frame.
    ///
    /// Reads exactly `width * height * 3` bytes, blocking until the full
    /// frame is available. `Ok(None)` signals a closed pipe, which is
    /// normal termination; a short final chunk is discarded with a warning
    /// rather than handed out partially filled, so a stream of `n` bytes
    /// deterministically yields `n / frame_bytes` frames. Reading after
    /// release is reported as `SessionReleased`.
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        let stdout = self.stdout.as_mut().ok_or(Error::SessionReleased)?;
        let expected = self.size.frame_bytes();
        let mut data = vec![0_u8; expected];
        let mut filled = 0;

        while filled < expected {
            match stdout.read(&mut data[filled..]) {
                Ok(0) => {
                    if filled > 0 {
                        warn!(filled, expected, "discarding short final chunk");
                    } else {
                        debug!("no frame received");
                    }
                    return Ok(None);
                }
                Ok(read) => filled += read,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }

        FrameBuffer::from_vec(data, self.size).map(Some)
    }
}

impl Drop for PipeDecodeSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Display for PipeDecodeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PipeDecodeSession(binary={}, args={:?})",
            self.binary.display(),
            self.args
        )
    }
}

/// Iterator over the frames of a [`PipeDecodeSession`].
pub struct Frames<'a> {
    session: &'a mut PipeDecodeSession,
}

impl Iterator for Frames<'_> {
    type Item = Result<FrameBuffer>;

    fn next(&mut self) -> Option<Self::Item> {
        self.session.next_frame().transpose()
    }
}

/// An external encoder process fed frames over its standard input.
///
/// No size negotiation happens on the write path: the process derives its
/// frame geometry from its own argument list, and the caller is trusted to
/// supply buffers matching that geometry.
pub struct PipeEncodeSession {
    binary: PathBuf,
    args: Vec<String>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl PipeEncodeSession {
    /// Verify the binary and spawn the encoder with the given arguments.
    pub fn spawn<I, S>(args: I, binary: Option<PathBuf>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let binary = resolve_binary(binary)?;
        check_installation(&binary)?;

        let mut child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| {
            Error::Stream("spawned process has no stdin pipe".to_owned())
        })?;

        debug!(binary = %binary.display(), "initialized pipe encode session");

        Ok(Self {
            binary,
            args,
            child: Some(child),
            stdin: Some(stdin),
        })
    }

    /// Close the input pipe and reap the process. Idempotent.
    ///
    /// Closing stdin is the end-of-input signal; the encoder is expected
    /// to finish its output and exit on its own.
    pub fn release(&mut self) {
        if self.stdin.take().is_none() {
            return;
        }
        debug!("stopping pipe encode session..");
        if let Some(mut child) = self.child.take() {
            reap(&mut child);
        }
        debug!("pipe encode session is stopped");
    }
}

impl FrameSink for PipeEncodeSession {
    /// Blocking write of one frame's raw bytes to the input pipe.
    /// Writing after release is reported as `SessionReleased`.
    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or(Error::SessionReleased)?;
        stdin.write_all(frame.as_bytes())?;
        Ok(())
    }
}

impl Drop for PipeEncodeSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Display for PipeEncodeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PipeEncodeSession(binary={}, args={:?})",
            self.binary.display(),
            self.args
        )
    }
}
