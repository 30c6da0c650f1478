//! JPEG marker reader: SOI, APP0/JFIF header, then a content scan for the
//! first EOI. Does not walk entropy-coded data.

use std::io::Read;

use memchr::memmem;

use crate::error::ScanError;

/// Start of image.
pub const SOI_MARKER: [u8; 2] = [0xFF, 0xD8];
/// Application segment 0 (JFIF).
pub const APP0_MARKER: [u8; 2] = [0xFF, 0xE0];
/// End of image.
pub const EOI_MARKER: [u8; 2] = [0xFF, 0xD9];
pub const JFIF_IDENTIFIER: &[u8; 4] = b"JFIF";

/// Check if data starts with SOI.
#[inline]
pub fn is_jpeg(data: &[u8]) -> bool {
    data.starts_with(&SOI_MARKER)
}

#[inline]
fn read_marker<R: Read>(reader: &mut R) -> Result<[u8; 2], ScanError> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read a JFIF stream and return the bytes after its first EOI marker, but
/// only when they themselves end in EOI.
///
/// `Ok(None)` means there is nothing to check: either the second marker is
/// not APP0 (non-JFIF variants are not analyzed) or the data after the first
/// EOI does not close with another EOI.
pub fn read_trailer<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, ScanError> {
    if read_marker(reader)? != SOI_MARKER {
        return Err(ScanError::FormatMismatch("invalid SOI marker"));
    }
    let second = read_marker(reader)?;
    if second != APP0_MARKER {
        log::debug!("jpeg: second marker {:02X}{:02X} is not APP0", second[0], second[1]);
        return Ok(None);
    }

    let size = u16::from_be_bytes(read_marker(reader)?);
    let mut app0 = vec![0u8; usize::from(size.saturating_sub(2))];
    reader.read_exact(&mut app0)?;
    if !app0.starts_with(JFIF_IDENTIFIER) {
        return Err(ScanError::InvalidSignature);
    }

    let mut rest = Vec::new();
    reader.read_to_end(&mut rest)?;
    let eoi = memmem::find(&rest, &EOI_MARKER).ok_or(ScanError::EndMarkerNotFound)?;

    let trailer = rest.split_off(eoi + EOI_MARKER.len());
    log::debug!("jpeg: EOI at body offset {}, {} trailing bytes", eoi, trailer.len());
    if !trailer.is_empty() && trailer.ends_with(&EOI_MARKER) {
        Ok(Some(trailer))
    } else {
        Ok(None)
    }
}
