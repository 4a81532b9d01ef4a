use crate::index::types::Fingerprint;
use std::io;
use thiserror::Error;

/// Failures raised by index strategies backed by storage.
///
/// The in-memory strategies in this crate never produce one; the variant
/// exists so storage-backed implementations of [`crate::index::Index`] can
/// report failures without widening the trait.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index storage failure: {0}")]
    Storage(#[from] io::Error),

    #[error("index rejected fingerprint {fingerprint}: {reason}")]
    Rejected {
        fingerprint: Fingerprint,
        reason: String,
    },
}

/// A fingerprint string that is not 1 to 16 hexadecimal digits
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid fingerprint {0:?}: expected up to 16 hexadecimal digits")]
pub struct ParseFingerprintError(pub String);

/// Failures while turning image bytes into a fingerprint.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("malformed image: {0}")]
    Decode(String),

    #[error("image has no pixels")]
    EmptyImage,

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("failed to read image: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for HashError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(_) => HashError::UnsupportedFormat,
            image::ImageError::IoError(e) => HashError::Io(e),
            other => HashError::Decode(other.to_string()),
        }
    }
}

/// Errors surfaced by the database layer and index persistence.
#[derive(Debug, Error)]
pub enum Error {
    #[error("image not found: {0}")]
    NotFound(Fingerprint),

    #[error("underlying index does not support loading or saving")]
    NotSupported,

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("corrupt index data: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid location metadata: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
