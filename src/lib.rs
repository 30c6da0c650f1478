//! # cropscan
//!
//! Library to detect "acropalypse" images: PNG and JPEG files that were
//! cropped or edited in place without being truncated, so the bytes of the
//! larger pre-edit image are still sitting after the new end-of-image marker.
//!
//! ## Supported formats and threats
//!
//! - **PNG**
//!   - [CVE-2023-21036](https://www.cve.org/CVERecord?id=CVE-2023-21036): Google Pixel Markup.
//!   - [CVE-2023-28303](https://www.cve.org/CVERecord?id=CVE-2023-28303): Windows Snipping Tool.
//!
//!   Detected by walking the chunk list to the first `IEND` and checking
//!   whether the remaining bytes end in a second, empty `IEND` chunk.
//!
//! - **JPEG (JFIF)** – data after the first EOI marker that itself ends in EOI.
//!
//! ## Example
//!
//! ```no_run
//! use cropscan::{FileOutcome, Verdict};
//!
//! let bytes = std::fs::read("screenshot.png").unwrap();
//! match cropscan::analyze(&bytes) {
//!     FileOutcome::Checked(f) if f.verdict == Verdict::Vulnerable => {
//!         println!("{} bytes of leftover image data", f.trailer_len)
//!     }
//!     FileOutcome::Checked(_) => {}
//!     FileOutcome::Unreadable(e) => eprintln!("Error: {e}"),
//!     FileOutcome::NotApplicable => {}
//! }
//! ```
//!
//! For whole directory trees see [`scanner::Scanner`].

mod error;
mod result;
pub mod jpeg;
#[cfg(feature = "cli")]
pub mod logging;
pub mod png;
pub mod scanner;

use std::io::{self, Cursor, Read};

pub use error::ScanError;
pub use jpeg::analyze_jpeg;
pub use png::analyze_png;
pub use result::{FileOutcome, Finding, Threat, TrustLevel, Verdict};
pub use scanner::{check_file, ScanConfig, ScanSummary, Scanner};

/// Bytes needed to tell the supported formats apart.
pub const SNIFF_LEN: usize = 2;

/// File type hint for routing (by magic).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FileType {
    Png,
    Jpeg,
    Unknown,
}

impl FileType {
    /// Preferred extension for this type (e.g. "png"); `None` for Unknown.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            FileType::Png => Some("png"),
            FileType::Jpeg => Some("jpg"),
            FileType::Unknown => None,
        }
    }

    /// Short label for display.
    pub fn label(self) -> &'static str {
        match self {
            FileType::Png => "PNG",
            FileType::Jpeg => "JPEG",
            FileType::Unknown => "unknown",
        }
    }
}

/// Detect file type from the first bytes: `89 50` is PNG, `FF D8` is JPEG.
#[inline]
pub fn detect_file_type(prefix: &[u8]) -> FileType {
    match prefix {
        [0x89, b'P', ..] => FileType::Png,
        [0xFF, 0xD8, ..] => FileType::Jpeg,
        _ => FileType::Unknown,
    }
}

/// Fill `buf` as far as the stream allows; returns the count read.
fn read_prefix<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Sniff a stream and run the matching reader and validator.
///
/// The sniffed prefix is chained back in front of the stream, so the reader
/// sees the file from its first byte. A read error while sniffing fails the
/// file; there is no retry.
pub fn check_stream<R: Read>(mut reader: R) -> FileOutcome {
    let mut prefix = [0u8; SNIFF_LEN];
    let n = match read_prefix(&mut reader, &mut prefix) {
        Ok(n) => n,
        Err(e) => return FileOutcome::Unreadable(e.into()),
    };

    let file_type = detect_file_type(&prefix[..n]);
    let mut stream = Cursor::new(&prefix[..n]).chain(reader);
    match file_type {
        FileType::Png => png::analyze_png(&mut stream).into(),
        FileType::Jpeg => jpeg::analyze_jpeg(&mut stream).into(),
        FileType::Unknown => FileOutcome::NotApplicable,
    }
}

/// Analyze an in-memory file.
#[inline]
pub fn analyze(data: &[u8]) -> FileOutcome {
    check_stream(data)
}

/// Result of analyzing one item in a batch (path or index + outcome).
#[derive(Debug)]
pub struct BatchItem<T> {
    pub path_or_id: T,
    pub outcome: FileOutcome,
}

/// Analyze many buffers in sequence.
pub fn analyze_batch<I, B>(items: I) -> Vec<BatchItem<B>>
where
    I: IntoIterator<Item = (B, Vec<u8>)>,
{
    items
        .into_iter()
        .map(|(path_or_id, bytes)| BatchItem {
            path_or_id,
            outcome: analyze(&bytes),
        })
        .collect()
}
