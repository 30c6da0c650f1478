//! JPEG trailer analysis.

use std::io::Read;

use crate::error::ScanError;
use crate::jpeg::parser::{read_trailer, EOI_MARKER};
use crate::result::{Finding, Threat, TrustLevel};
use crate::FileType;

const ACROPALYPSE_ID: &str = "CVE-2023-21036";
const ACROPALYPSE_DESC: &str =
    "Cropped JPEG retains a second image tail ending in EOI after the first EOI (acropalypse)";
const ACROPALYPSE_REF: &str = "https://gist.github.com/DavidBuchanan314/93de9d07f7fab494bcdf17c2bd6cef02";

/// True if the trailer is non-empty and its last two bytes are EOI.
#[inline]
pub fn ends_with_eoi(trailer: &[u8]) -> bool {
    !trailer.is_empty() && trailer.ends_with(&EOI_MARKER)
}

/// Read a JPEG stream and decide whether it carries leftover pre-edit data.
///
/// Trust is low: a second EOI can also come from data some tools append on
/// purpose (e.g. preview images), so hits are worth a manual look.
pub fn analyze_jpeg<R: Read>(reader: &mut R) -> Result<Finding, ScanError> {
    let Some(trailer) = read_trailer(reader)? else {
        return Ok(Finding::clean(FileType::Jpeg, 0));
    };
    if !ends_with_eoi(&trailer) {
        return Ok(Finding::clean(FileType::Jpeg, trailer.len()));
    }
    Ok(Finding::vulnerable(
        FileType::Jpeg,
        trailer.len(),
        vec![Threat {
            id: ACROPALYPSE_ID.to_string(),
            description: ACROPALYPSE_DESC.to_string(),
            reference: Some(ACROPALYPSE_REF.to_string()),
            trust: TrustLevel::Low,
        }],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Verdict;
    use std::io::Cursor;

    #[test]
    fn eoi_checks() {
        assert!(ends_with_eoi(&[0xFF, 0xD9]));
        assert!(ends_with_eoi(&[0x00, 0x01, 0xFF, 0xD9]));
        assert!(!ends_with_eoi(&[]));
        assert!(!ends_with_eoi(&[0xD9]));
        assert!(!ends_with_eoi(&[0xFF, 0xD9, 0x00]));
    }

    #[test]
    fn single_eoi_is_clean() {
        let mut v = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x06];
        v.extend_from_slice(b"JFIF");
        v.extend_from_slice(&[0x01, 0x02, 0xFF, 0xD9]);
        let f = analyze_jpeg(&mut Cursor::new(v)).unwrap();
        assert_eq!(f.verdict, Verdict::Clean);
        assert_eq!(f.trailer_len, 0);
    }

    #[test]
    fn double_eoi_is_vulnerable() {
        let mut v = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x06];
        v.extend_from_slice(b"JFIF");
        v.extend_from_slice(&[0x01, 0xFF, 0xD9, 0x55, 0x66, 0xFF, 0xD9]);
        let f = analyze_jpeg(&mut Cursor::new(v)).unwrap();
        assert_eq!(f.verdict, Verdict::Vulnerable);
        assert_eq!(f.trailer_len, 4);
        assert_eq!(f.threats[0].trust, TrustLevel::Low);
    }
}
