//! PNG trailer analysis: does the data after `IEND` end in a second, empty,
//! correctly checksummed `IEND` chunk?

use std::io::Read;

use crate::error::ScanError;
use crate::png::parser::{read_trailer, IEND_CRC};
use crate::result::{Finding, Threat, TrustLevel};
use crate::FileType;

const ACROPALYPSE_ID: &str = "CVE-2023-21036";
const ACROPALYPSE_DESC: &str =
    "Cropped PNG retains the pre-edit image after IEND (acropalypse; also CVE-2023-28303)";
const ACROPALYPSE_REF: &str = "https://github.com/infobyte/CVE-2023-21036";

/// Length field + type + CRC of an empty chunk.
const MIN_PHANTOM_LEN: usize = 12;

/// Field offsets of a phantom `IEND` chunk that would end a trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IendOffsets {
    /// Start of the 4-byte length field.
    pub length: usize,
    /// Start of the 4-byte type field.
    pub chunk_type: usize,
    /// Start of the 4-byte CRC field.
    pub crc: usize,
}

/// Locate the fields of an empty chunk ending exactly at `trailer_len`.
/// Returns `None` when the trailer is too short to hold one.
#[inline]
pub fn iend_field_offsets(trailer_len: usize) -> Option<IendOffsets> {
    if trailer_len < MIN_PHANTOM_LEN {
        return None;
    }
    let chunk_type = trailer_len - 8;
    Some(IendOffsets {
        length: chunk_type - 4,
        chunk_type,
        crc: chunk_type + 4,
    })
}

#[inline]
fn be_u32_at(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// True if the trailer ends with a zero-length chunk whose CRC is that of
/// an empty `IEND`.
pub fn has_phantom_iend(trailer: &[u8]) -> bool {
    let Some(off) = iend_field_offsets(trailer.len()) else {
        return false;
    };
    be_u32_at(trailer, off.length) == Some(0) && be_u32_at(trailer, off.crc) == Some(IEND_CRC)
}

/// Read a PNG stream and decide whether it carries leftover pre-edit data.
pub fn analyze_png<R: Read>(reader: &mut R) -> Result<Finding, ScanError> {
    let trailer = read_trailer(reader)?;
    let trailer_len = trailer.len();

    if trailer.is_empty() || !has_phantom_iend(&trailer) {
        if trailer_len > 0 {
            log::debug!("png: {} trailing bytes without a phantom IEND", trailer_len);
        }
        return Ok(Finding::clean(FileType::Png, trailer_len));
    }

    Ok(Finding::vulnerable(
        FileType::Png,
        trailer_len,
        vec![Threat {
            id: ACROPALYPSE_ID.to_string(),
            description: ACROPALYPSE_DESC.to_string(),
            reference: Some(ACROPALYPSE_REF.to_string()),
            trust: TrustLevel::High,
        }],
    ))
}
