// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the photo booth

use std::fmt;
use std::path::PathBuf;

/// Result type alias using BoothError
pub type BoothResult<T> = Result<T, BoothError>;

/// Main booth error type
#[derive(Debug, Clone)]
pub enum BoothError {
    /// Camera-related errors
    Camera(CameraError),
    /// Session flow errors
    Session(SessionError),
    /// Compositing errors
    Compositing(CompositingError),
    /// Printer hand-off errors
    Printer(PrinterError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
}

/// Camera-specific errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// Device could not be opened
    OpenFailed { port: usize, reason: String },
    /// Device opened but the one-frame probe produced nothing usable
    ProbeFailed { port: usize },
    /// Frame read failed mid-stream
    ReadFailed(String),
    /// Operation requires an open device
    NotOpen,
    /// No working camera on any scanned port
    NoCameraFound,
}

/// Session flow errors
#[derive(Debug, Clone)]
pub enum SessionError {
    /// No frame available in the buffer at shutter time
    FrameUnavailable,
    /// A shot is already being taken
    CaptureInProgress,
    /// Operation not valid in the current phase
    InvalidPhase { expected: &'static str },
    /// No active session
    NoSession,
}

/// Compositing errors
#[derive(Debug, Clone)]
pub enum CompositingError {
    /// Frame template image could not be loaded
    TemplateMissing(PathBuf),
    /// A session photo could not be read back from disk
    PhotoUnreadable(PathBuf),
    /// QR encoder collaborator failed
    QrFailed(String),
    /// Final image could not be written
    WriteFailed(String),
}

/// Printer hand-off errors
#[derive(Debug, Clone)]
pub enum PrinterError {
    /// Spooler invocation failed or exited non-zero
    SpoolFailed(String),
}

impl fmt::Display for BoothError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoothError::Camera(e) => write!(f, "Camera error: {}", e),
            BoothError::Session(e) => write!(f, "Session error: {}", e),
            BoothError::Compositing(e) => write!(f, "Compositing error: {}", e),
            BoothError::Printer(e) => write!(f, "Printer error: {}", e),
            BoothError::Config(msg) => write!(f, "Configuration error: {}", msg),
            BoothError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::OpenFailed { port, reason } => {
                write!(f, "Failed to open camera on port {}: {}", port, reason)
            }
            CameraError::ProbeFailed { port } => {
                write!(f, "Camera on port {} failed the probe read", port)
            }
            CameraError::ReadFailed(msg) => write!(f, "Frame read failed: {}", msg),
            CameraError::NotOpen => write!(f, "Camera is not open"),
            CameraError::NoCameraFound => write!(f, "No working camera found"),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::FrameUnavailable => write!(f, "No frame available for capture"),
            SessionError::CaptureInProgress => write!(f, "Capture already in progress"),
            SessionError::InvalidPhase { expected } => {
                write!(f, "Invalid session phase, expected {}", expected)
            }
            SessionError::NoSession => write!(f, "No active session"),
        }
    }
}

impl fmt::Display for CompositingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositingError::TemplateMissing(path) => {
                write!(f, "Frame template not found: {}", path.display())
            }
            CompositingError::PhotoUnreadable(path) => {
                write!(f, "Photo could not be read: {}", path.display())
            }
            CompositingError::QrFailed(msg) => write!(f, "QR encoding failed: {}", msg),
            CompositingError::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
        }
    }
}

impl fmt::Display for PrinterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrinterError::SpoolFailed(msg) => write!(f, "Print spool failed: {}", msg),
        }
    }
}

impl std::error::Error for BoothError {}
impl std::error::Error for CameraError {}
impl std::error::Error for SessionError {}
impl std::error::Error for CompositingError {}
impl std::error::Error for PrinterError {}

// Conversions from sub-errors to BoothError
impl From<CameraError> for BoothError {
    fn from(err: CameraError) -> Self {
        BoothError::Camera(err)
    }
}

impl From<SessionError> for BoothError {
    fn from(err: SessionError) -> Self {
        BoothError::Session(err)
    }
}

impl From<CompositingError> for BoothError {
    fn from(err: CompositingError) -> Self {
        BoothError::Compositing(err)
    }
}

impl From<PrinterError> for BoothError {
    fn from(err: PrinterError) -> Self {
        BoothError::Printer(err)
    }
}

// Conversions for I/O errors
impl From<std::io::Error> for BoothError {
    fn from(err: std::io::Error) -> Self {
        BoothError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for CompositingError {
    fn from(err: std::io::Error) -> Self {
        CompositingError::WriteFailed(err.to_string())
    }
}
