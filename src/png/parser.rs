//! Minimal PNG chunk reader: signature, length-prefixed CRC-checked chunks,
//! and whatever follows the first `IEND`.
//! See https://www.w3.org/TR/png/#5DataRep

use std::io::Read;

use crate::error::ScanError;

/// PNG file signature (8 bytes).
pub const PNG_SIGNATURE: [u8; 8] = *b"\x89PNG\r\n\x1a\n";
/// Image trailer chunk type.
pub const IEND: [u8; 4] = *b"IEND";
/// CRC-32 of an empty `IEND` chunk (type bytes only, no body).
pub const IEND_CRC: u32 = 0xAE42_6082;

/// One chunk as stored in the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_type: [u8; 4],
    pub body: Vec<u8>,
    pub crc: u32,
}

impl Chunk {
    #[inline]
    pub fn is_iend(&self) -> bool {
        self.chunk_type == IEND
    }
}

/// Check if data starts with the PNG signature.
#[inline]
pub fn is_png(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

#[inline]
fn read_u32_be<R: Read>(reader: &mut R) -> Result<u32, ScanError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Read and verify the 8-byte signature.
pub fn read_signature<R: Read>(reader: &mut R) -> Result<(), ScanError> {
    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;
    if magic != PNG_SIGNATURE {
        return Err(ScanError::FormatMismatch("invalid PNG magic number"));
    }
    Ok(())
}

/// Read one chunk (length, type, body, CRC) and verify its CRC.
///
/// The body is read through `take` so a bogus length cannot force a large
/// allocation before the stream runs out.
pub fn read_chunk<R: Read>(reader: &mut R) -> Result<Chunk, ScanError> {
    let len = read_u32_be(reader)?;
    let mut chunk_type = [0u8; 4];
    reader.read_exact(&mut chunk_type)?;

    let mut body = Vec::new();
    reader.by_ref().take(u64::from(len)).read_to_end(&mut body)?;
    if body.len() as u64 != u64::from(len) {
        return Err(ScanError::TruncatedStream);
    }

    let crc = read_u32_be(reader)?;
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&chunk_type);
    hasher.update(&body);
    let computed = hasher.finalize();
    if computed != crc {
        return Err(ScanError::CorruptChunk {
            chunk_type,
            stored: crc,
            computed,
        });
    }

    Ok(Chunk {
        chunk_type,
        body,
        crc,
    })
}

/// Walk the PNG up to and including the first `IEND` chunk and return every
/// byte after it. An empty vector means the file ends where it should.
pub fn read_trailer<R: Read>(reader: &mut R) -> Result<Vec<u8>, ScanError> {
    read_signature(reader)?;

    let mut chunks = 0usize;
    loop {
        let chunk = read_chunk(reader)?;
        chunks += 1;
        log::trace!(
            "png chunk {} ({} bytes)",
            String::from_utf8_lossy(&chunk.chunk_type),
            chunk.body.len()
        );
        if chunk.is_iend() {
            break;
        }
    }

    let mut trailer = Vec::new();
    reader.read_to_end(&mut trailer)?;
    log::debug!("png: {} chunks, {} trailing bytes", chunks, trailer.len());
    Ok(trailer)
}
