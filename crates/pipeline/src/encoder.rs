//! Append-only video sinks.
//!
//! A [`VideoSink`] is opened once per run, receives every frame strictly in
//! index order, and is then either finished (flushed and closed) or aborted.
//! [`FfmpegVideoSink`] pipes raw RGB24 frames into an `ffmpeg` child process
//! that writes an H.264 MP4; [`MemoryVideoSink`] keeps the frames in memory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use image::RgbImage;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;

/// Maximum encoder stderr captured for error reports (1 MiB).
const MAX_STDERR_BYTES: u64 = 1024 * 1024;

/// Error type for video encoding.
#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    #[error("ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("failed to start encoder: {0}")]
    Spawn(std::io::Error),

    #[error("failed to write frame to encoder: {0}")]
    Write(std::io::Error),

    #[error("encoder failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("frame is {actual_width}x{actual_height}, stream expects {expected_width}x{expected_height}")]
    FrameSize {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("video stream is not open")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Geometry and rate of a raw video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl VideoFormat {
    fn check(&self, frame: &RgbImage) -> Result<(), EncoderError> {
        let (actual_width, actual_height) = frame.dimensions();
        if (actual_width, actual_height) != (self.width, self.height) {
            return Err(EncoderError::FrameSize {
                expected_width: self.width,
                expected_height: self.height,
                actual_width,
                actual_height,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait VideoSink: Send {
    /// Start a new stream written to `path`.
    async fn open(&mut self, path: &Path, format: VideoFormat) -> Result<(), EncoderError>;

    /// Append the next frame.
    async fn append(&mut self, frame: &RgbImage) -> Result<(), EncoderError>;

    /// Flush and close the stream. Fails if the stream is not open.
    async fn finish(&mut self) -> Result<(), EncoderError>;

    /// Close the stream without flushing. Never fails; a no-op when closed.
    async fn abort(&mut self);
}

// ---------------------------------------------------------------------------
// ffmpeg
// ---------------------------------------------------------------------------

struct EncoderProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_task: JoinHandle<Vec<u8>>,
    format: VideoFormat,
    path: PathBuf,
    frames: u64,
}

impl EncoderProcess {
    /// Wait for the child to exit and collect its stderr.
    async fn wait(mut self) -> Result<(std::process::ExitStatus, String), EncoderError> {
        drop(self.stdin.take());
        let status = self.child.wait().await?;
        let stderr = self.stderr_task.await.unwrap_or_default();
        Ok((status, String::from_utf8_lossy(&stderr).into_owned()))
    }
}

/// Encodes frames by piping raw RGB24 into `ffmpeg` (libx264, yuv420p, 2 Mbit/s).
///
/// The child is spawned with `kill_on_drop`, so dropping an open sink
/// terminates the encoder.
pub struct FfmpegVideoSink {
    program: PathBuf,
    process: Option<EncoderProcess>,
}

impl FfmpegVideoSink {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            process: None,
        }
    }

    /// Command-line arguments for encoding a raw stream of `format` into `path`.
    pub fn encoder_args(path: &Path, format: VideoFormat) -> Vec<OsString> {
        let size = format!("{}x{}", format.width, format.height);
        let fps = format.fps.to_string();
        let mut args: Vec<OsString> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            size.as_str(),
            "-r",
            fps.as_str(),
            "-i",
            "-",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            "2M",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(path.as_os_str().to_owned());
        args
    }

    async fn fail_with(&mut self, err: std::io::Error) -> EncoderError {
        let Some(process) = self.process.take() else {
            return EncoderError::Write(err);
        };
        match process.wait().await {
            Ok((status, stderr)) if !status.success() => EncoderError::ExecutionFailed {
                exit_code: status.code(),
                stderr,
            },
            _ => EncoderError::Write(err),
        }
    }
}

#[async_trait]
impl VideoSink for FfmpegVideoSink {
    async fn open(&mut self, path: &Path, format: VideoFormat) -> Result<(), EncoderError> {
        self.abort().await;

        let mut child = Command::new(&self.program)
            .args(Self::encoder_args(path, format))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => EncoderError::NotFound(e),
                _ => EncoderError::Spawn(e),
            })?;

        let stdin = child.stdin.take();
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(read_stream(stderr));

        tracing::debug!(
            program = %self.program.display(),
            path = %path.display(),
            width = format.width,
            height = format.height,
            fps = format.fps,
            "Started video encoder"
        );
        self.process = Some(EncoderProcess {
            child,
            stdin,
            stderr_task,
            format,
            path: path.to_path_buf(),
            frames: 0,
        });
        Ok(())
    }

    async fn append(&mut self, frame: &RgbImage) -> Result<(), EncoderError> {
        let process = self.process.as_mut().ok_or(EncoderError::Closed)?;
        process.format.check(frame)?;
        let stdin = process.stdin.as_mut().ok_or(EncoderError::Closed)?;
        if let Err(e) = stdin.write_all(frame.as_raw()).await {
            return Err(self.fail_with(e).await);
        }
        process.frames += 1;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), EncoderError> {
        let mut process = self.process.take().ok_or(EncoderError::Closed)?;
        if let Some(mut stdin) = process.stdin.take() {
            stdin.flush().await.map_err(EncoderError::Write)?;
        }
        let frames = process.frames;
        let path = process.path.clone();
        let (status, stderr) = process.wait().await?;
        if !status.success() {
            return Err(EncoderError::ExecutionFailed {
                exit_code: status.code(),
                stderr,
            });
        }
        tracing::info!(frames, path = %path.display(), "Video encoded");
        Ok(())
    }

    async fn abort(&mut self) {
        if let Some(mut process) = self.process.take() {
            drop(process.stdin.take());
            if let Err(e) = process.child.kill().await {
                tracing::warn!(error = %e, "Failed to stop video encoder");
            }
            process.stderr_task.abort();
        }
    }
}

/// Read an output stream into a buffer, capped at [`MAX_STDERR_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(h) = handle {
        let _ = h.take(MAX_STDERR_BYTES).read_to_end(&mut buf).await;
    }
    buf
}

// ---------------------------------------------------------------------------
// In-memory sink
// ---------------------------------------------------------------------------

/// Records every appended frame. Can be told to fail after a number of
/// frames to exercise the run's failure path.
#[derive(Debug, Default)]
pub struct MemoryVideoSink {
    path: Option<PathBuf>,
    format: Option<VideoFormat>,
    frames: Vec<RgbImage>,
    open: bool,
    finished: bool,
    aborted: bool,
    fail_after: Option<usize>,
}

impl MemoryVideoSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose append fails once `frames` frames have been accepted.
    pub fn failing_after(frames: usize) -> Self {
        Self {
            fail_after: Some(frames),
            ..Self::default()
        }
    }

    pub fn frames(&self) -> &[RgbImage] {
        &self.frames
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn format(&self) -> Option<VideoFormat> {
        self.format
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn was_aborted(&self) -> bool {
        self.aborted
    }
}

#[async_trait]
impl VideoSink for MemoryVideoSink {
    async fn open(&mut self, path: &Path, format: VideoFormat) -> Result<(), EncoderError> {
        self.path = Some(path.to_path_buf());
        self.format = Some(format);
        self.frames.clear();
        self.open = true;
        self.finished = false;
        self.aborted = false;
        Ok(())
    }

    async fn append(&mut self, frame: &RgbImage) -> Result<(), EncoderError> {
        let format = match self.format {
            Some(format) if self.open => format,
            _ => return Err(EncoderError::Closed),
        };
        format.check(frame)?;
        if self.fail_after.is_some_and(|n| self.frames.len() >= n) {
            return Err(EncoderError::Write(std::io::Error::other(
                "simulated encoder failure",
            )));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), EncoderError> {
        if !self.open {
            return Err(EncoderError::Closed);
        }
        self.open = false;
        self.finished = true;
        Ok(())
    }

    async fn abort(&mut self) {
        if self.open {
            self.open = false;
            self.aborted = true;
        }
    }
}
