//! Error types for resource decoding.

use std::path::PathBuf;
use thiserror::Error;

use crate::container::ChunkType;

/// Main error type for hwtools operations.
///
/// Every variant is scoped to a single resource: a failure decoding one
/// file never poisons the registry or other resources.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// A read ran past the end of the buffer
    #[error("Unexpected end of data: {len} bytes at offset {offset}")]
    UnexpectedEof { offset: usize, len: usize },

    /// A chunk every consumer of this resource kind relies on is absent
    #[error("Required chunk not found: {0}")]
    ChunkNotFound(ChunkType),

    /// Container header or table is inconsistent with the file
    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    /// Terrain atlas size or sampling stride does not describe a square grid
    #[error("Invalid terrain grid: {0}")]
    InvalidGrid(String),

    /// Resource was requested as one kind but is another
    #[error("Resource kind mismatch: expected {expected}, got {actual}")]
    KindMismatch { expected: String, actual: String },

    /// An external collaborator (converter, expander) was needed but not configured
    #[error("No {0} configured")]
    MissingCollaborator(&'static str),

    /// Block decompression failed
    #[error("Texture decompression failed: {0}")]
    Decompress(String),

    /// XML parse or lookup failure
    #[error("XML error: {0}")]
    Xml(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a malformed-container error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedContainer(msg.into())
    }

    /// Create a kind-mismatch error.
    pub fn kind_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        Self::KindMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Result type alias for hwtools operations.
pub type Result<T> = std::result::Result<T, Error>;
