use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a FITS stream was rejected as corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptReason {
    /// The header or pixel scan ran past the available bytes.
    UnexpectedEndOfFile,
    /// The header lacks `SIMPLE`, has a bad axis count, or declares no pixels.
    ImageTypeNotSupported,
    /// The header declares an unusable value (e.g. an unknown BITPIX).
    ImproperImageHeader,
}

impl fmt::Display for CorruptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorruptReason::UnexpectedEndOfFile => write!(f, "unexpected end of file"),
            CorruptReason::ImageTypeNotSupported => write!(f, "image type not supported"),
            CorruptReason::ImproperImageHeader => write!(f, "improper image header"),
        }
    }
}

/// Which resource limit was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceReason {
    /// A frame or row buffer could not be allocated.
    MemoryAllocationFailed,
}

impl fmt::Display for ResourceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceReason::MemoryAllocationFailed => write!(f, "memory allocation failed"),
        }
    }
}

/// All errors that can occur while coding FITS images.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The underlying file could not be opened or created.
    #[error("unable to open `{}`: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The stream is not a decodable FITS image.
    #[error("corrupt image{}: {reason}{}", display_filename(.filename), display_offset(.offset))]
    CorruptImage {
        reason: CorruptReason,
        filename: Option<String>,
        offset: Option<u64>,
    },
    /// Allocation failed for header, row or frame buffers.
    #[error("resource limit exceeded: {0}")]
    ResourceLimit(ResourceReason),
    /// Unrecognized BITPIX value.
    #[error("invalid BITPIX value: {0}")]
    InvalidBitpix(i64),
    /// The data range collapses to a single value and cannot be scaled.
    #[error("degenerate data range: min {min} equals max {max}")]
    Domain { min: f64, max: f64 },
    /// The requested encoding cannot be expressed in FITS.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    /// The progress callback asked to stop.
    #[error("operation cancelled")]
    Cancelled,
    /// An I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Frame geometry does not match an array shape.
    #[cfg(feature = "array")]
    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

fn display_filename(filename: &Option<String>) -> String {
    match filename {
        Some(name) => format!(" `{name}`"),
        None => String::new(),
    }
}

fn display_offset(offset: &Option<u64>) -> String {
    match offset {
        Some(off) => format!(" at byte {off}"),
        None => String::new(),
    }
}

impl Error {
    /// Build a corrupt-image error detected at `offset`.
    pub fn corrupt(reason: CorruptReason, offset: u64) -> Self {
        Error::CorruptImage {
            reason,
            filename: None,
            offset: Some(offset),
        }
    }

    /// Attach the name of the file being decoded to corrupt-image errors.
    pub fn with_filename(self, name: &str) -> Self {
        match self {
            Error::CorruptImage {
                reason,
                filename: None,
                offset,
            } if !name.is_empty() => Error::CorruptImage {
                reason,
                filename: Some(name.to_string()),
                offset,
            },
            other => other,
        }
    }

    /// The corrupt-image reason, if this is a corrupt-image error.
    pub fn corrupt_reason(&self) -> Option<CorruptReason> {
        match self {
            Error::CorruptImage { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
