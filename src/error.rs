//! Error taxonomy for reading image containers and walking directories.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while scanning.
///
/// Only [`ScanError::DirectoryRead`] is fatal to a scan; every other variant
/// is reported against a single file, which is then skipped.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A directory could not be listed during traversal.
    #[error("cannot read directory {}: {source}", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Magic bytes or a required start marker were missing.
    #[error("format mismatch: {0}")]
    FormatMismatch(&'static str),

    /// A PNG chunk's stored CRC does not match its type and body.
    #[error(
        "checksum mismatch in {} chunk (stored {stored:#010x}, computed {computed:#010x})",
        String::from_utf8_lossy(chunk_type)
    )]
    CorruptChunk {
        chunk_type: [u8; 4],
        stored: u32,
        computed: u32,
    },

    /// The JPEG APP0 segment does not carry a JFIF identifier.
    #[error("invalid JFIF signature")]
    InvalidSignature,

    /// No JPEG end-of-image marker was found.
    #[error("EOI marker not found")]
    EndMarkerNotFound,

    /// The stream ended before a complete structure could be read.
    #[error("unexpected end of stream")]
    TruncatedStream,

    /// Any other I/O failure (open, permission, device).
    #[error(transparent)]
    Io(io::Error),
}

impl ScanError {
    /// Whether this error should abort the whole scan.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::DirectoryRead { .. })
    }
}

impl From<io::Error> for ScanError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ScanError::TruncatedStream
        } else {
            ScanError::Io(err)
        }
    }
}

impl From<walkdir::Error> for ScanError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        ScanError::DirectoryRead { path, source: err }
    }
}
