//! PNG acropalypse detection (CVE-2023-21036, CVE-2023-28303).
//!
//! A cropped PNG written over the original without truncation ends with a
//! second, intact `IEND` chunk after the real one. The parser walks the chunk
//! list to the first `IEND`; the analyzer looks for that phantom tail.
//!
//! References:
//! - https://www.w3.org/TR/png/#5Chunk-layout
//! - https://github.com/infobyte/CVE-2023-21036

mod analyzer;
mod parser;

pub use analyzer::{analyze_png, has_phantom_iend, iend_field_offsets, IendOffsets};
pub use parser::{
    is_png, read_chunk, read_signature, read_trailer, Chunk, IEND, IEND_CRC, PNG_SIGNATURE,
};
