//! Stream capture module
//!
//! Records a resolved stream into the media library using an external capture
//! tool (rtmpdump by default). The recording goes to a private temporary file
//! first and is only moved to its destination once the tool succeeded.

use crate::temp::create_temp_file;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while capturing a stream
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The temporary capture file could not be created
    #[error("Could not create temporary file in {dir}: {source}")]
    TempFile { dir: PathBuf, source: io::Error },

    /// The capture tool could not be started
    #[error("Could not run {tool}: {source}")]
    Spawn { tool: PathBuf, source: io::Error },

    /// The capture tool exited unsuccessfully
    #[error("{tool} failed with {status}")]
    ToolFailed { tool: PathBuf, status: ExitStatus },

    /// The finished recording could not be moved into place
    #[error("Could not move recording to {destination}: {source}")]
    Publish {
        destination: PathBuf,
        source: io::Error,
    },
}

/// Records a stream URL into a file.
///
/// Implementors either leave a complete recording at `destination` or return
/// an error and leave `destination` untouched.
pub trait StreamCapturer {
    fn capture(&self, stream_url: &str, destination: &Path) -> Result<(), CaptureError>;
}

impl<T: StreamCapturer + ?Sized> StreamCapturer for &T {
    fn capture(&self, stream_url: &str, destination: &Path) -> Result<(), CaptureError> {
        (**self).capture(stream_url, destination)
    }
}

/// Stream capturer invoking an external rtmpdump compatible executable.
///
/// The tool is run as `<tool> --quiet --url <stream> --flv <temp file>`. Its
/// standard error is passed through to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCaptureTool {
    tool_path: PathBuf,
    scratch_dir: PathBuf,
}

impl ExternalCaptureTool {
    /// Creates a capturer for the given tool, recording into `scratch_dir`.
    pub fn new(tool_path: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool_path: tool_path.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Path of the capture executable
    pub fn tool_path(&self) -> &Path {
        &self.tool_path
    }
}

impl StreamCapturer for ExternalCaptureTool {
    fn capture(&self, stream_url: &str, destination: &Path) -> Result<(), CaptureError> {
        // Removed on every return path; after a successful move there is nothing left to remove
        let temp = create_temp_file(&self.scratch_dir, "capture", "flv").map_err(|e| {
            CaptureError::TempFile {
                dir: self.scratch_dir.clone(),
                source: e,
            }
        })?;

        debug!(
            tool = %self.tool_path.display(),
            stream_url,
            temp = %temp.display(),
            "running capture tool"
        );

        let status = Command::new(&self.tool_path)
            .arg("--quiet")
            .arg("--url")
            .arg(stream_url)
            .arg("--flv")
            .arg(temp.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| CaptureError::Spawn {
                tool: self.tool_path.clone(),
                source: e,
            })?;

        if !status.success() {
            return Err(CaptureError::ToolFailed {
                tool: self.tool_path.clone(),
                status,
            });
        }

        publish(temp.path(), destination)
    }
}

/// Moves a finished recording to its destination, creating the show directory if needed.
fn publish(recording: &Path, destination: &Path) -> Result<(), CaptureError> {
    let publish_error = |e| CaptureError::Publish {
        destination: destination.to_path_buf(),
        source: e,
    };

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(publish_error)?;
    }

    fs::rename(recording, destination).map_err(publish_error)
}

/// Runs the library rescan command for a directory that received new recordings.
pub fn run_rescan_hook(command: &Path, directory: &Path) -> Result<(), CaptureError> {
    debug!(command = %command.display(), directory = %directory.display(), "running rescan hook");

    let status = Command::new(command)
        .arg(directory)
        .stdin(Stdio::null())
        .status()
        .map_err(|e| CaptureError::Spawn {
            tool: command.to_path_buf(),
            source: e,
        })?;

    if !status.success() {
        return Err(CaptureError::ToolFailed {
            tool: command.to_path_buf(),
            status,
        });
    }

    Ok(())
}
