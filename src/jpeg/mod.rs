//! JPEG acropalypse detection.
//!
//! After the first end-of-image marker a well-formed JFIF file has nothing
//! left. A cropped file written over a larger original keeps the original's
//! tail, which itself ends in `FF D9`.

mod analyzer;
mod parser;

pub use analyzer::{analyze_jpeg, ends_with_eoi};
pub use parser::{is_jpeg, read_trailer, APP0_MARKER, EOI_MARKER, JFIF_IDENTIFIER, SOI_MARKER};
