//! Section framing: compression scheme, lengths, payload, trailing checksum.
//!
//! Every top-level part of an M3G file is one section:
//!
//! ```text
//! +---------------------+
//! | scheme              |  1 byte (0 = none, 1 = zlib)
//! +---------------------+
//! | total length        |  4 bytes (u32 LE, whole section)
//! +---------------------+
//! | uncompressed length |  4 bytes (u32 LE)
//! +---------------------+
//! | payload             |  total length - 13 bytes
//! +---------------------+
//! | Adler-32 checksum   |  4 bytes (u32 LE, over all preceding bytes)
//! +---------------------+
//! ```

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::debug;

use super::stream::{M3gReader, M3gWriter};
use crate::util::{Error, Result};

/// Fixed framing overhead: scheme + two lengths + checksum.
const SECTION_OVERHEAD: u32 = 13;

/// Payload compression scheme.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompressionScheme {
    /// Payload stored as-is.
    None,
    /// Payload wrapped in a zlib stream at best compression.
    Deflate,
}

impl CompressionScheme {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Deflate),
            _ => None,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Deflate => 1,
        }
    }
}

/// Compress a payload with zlib at maximum compression.
pub fn deflate(payload: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(payload)?;
    Ok(encoder.finish()?)
}

/// Inverse of [`deflate`], with the expected output size known up front.
fn inflate(data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(expected_len);
    decoder
        .read_to_end(&mut out)
        .map_err(|_| Error::invalid("corrupt zlib stream in section payload"))?;
    if out.len() != expected_len {
        return Err(Error::invalid(format!(
            "section inflated to {} bytes, header said {}",
            out.len(),
            expected_len
        )));
    }
    Ok(out)
}

/// Frame a payload into a complete section.
pub fn write_section(payload: &[u8], scheme: CompressionScheme) -> Result<Vec<u8>> {
    let on_wire = match scheme {
        CompressionScheme::None => payload.to_vec(),
        CompressionScheme::Deflate => deflate(payload)?,
    };

    let mut w = M3gWriter::new();
    w.write_u8(scheme.as_u8());
    w.write_u32(on_wire.len() as u32 + SECTION_OVERHEAD);
    w.write_u32(payload.len() as u32);
    w.put(&on_wire);
    let sum = w.checksum();
    w.set_checksum_enabled(false);
    w.write_u32(sum);
    Ok(w.into_inner())
}

/// Read one section from the reader, returning the decompressed payload.
///
/// The checksum is verified against the Adler-32 accumulated over the bytes
/// as they came off the wire, compressed form included.
pub fn read_section(r: &mut M3gReader<'_>) -> Result<Vec<u8>> {
    r.reset_checksum();
    r.set_checksum_enabled(true);

    let scheme_byte = r.read_u8()?;
    let scheme = CompressionScheme::from_u8(scheme_byte)
        .ok_or(Error::UnknownCompressionScheme(scheme_byte))?;
    let total_length = r.read_u32()?;
    let uncompressed_length = r.read_u32()?;
    if total_length < SECTION_OVERHEAD {
        return Err(Error::invalid(format!(
            "section total length {total_length} below framing minimum"
        )));
    }
    let on_wire = r.bytes((total_length - SECTION_OVERHEAD) as usize)?;

    let expected = r.checksum();
    r.set_checksum_enabled(false);
    let actual = r.read_u32()?;
    if actual != expected {
        return Err(Error::ChecksumMismatch { expected, actual });
    }

    let payload = match scheme {
        CompressionScheme::None => {
            if on_wire.len() != uncompressed_length as usize {
                return Err(Error::invalid(
                    "uncompressed section length disagrees with payload size",
                ));
            }
            on_wire.to_vec()
        }
        CompressionScheme::Deflate => inflate(on_wire, uncompressed_length as usize)?,
    };
    debug!(
        scheme = scheme_byte,
        wire_len = on_wire.len(),
        payload_len = payload.len(),
        "read section"
    );
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(payload: &[u8], scheme: CompressionScheme) -> Vec<u8> {
        let framed = write_section(payload, scheme).unwrap();
        let mut r = M3gReader::new(&framed);
        let out = read_section(&mut r).unwrap();
        assert!(r.at_end());
        out
    }

    #[test]
    fn test_roundtrip_uncompressed() {
        let payload = b"some section payload";
        assert_eq!(roundtrip(payload, CompressionScheme::None), payload);
    }

    #[test]
    fn test_roundtrip_deflate() {
        let payload: Vec<u8> = std::iter::repeat(b"abcabc".as_slice())
            .take(200)
            .flatten()
            .copied()
            .collect();
        assert_eq!(roundtrip(&payload, CompressionScheme::Deflate), payload);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(roundtrip(b"", CompressionScheme::None), b"");
    }

    #[test]
    fn test_total_length_field() {
        let framed = write_section(b"12345", CompressionScheme::None).unwrap();
        assert_eq!(framed.len(), 5 + 13);
        let mut r = M3gReader::new(&framed);
        r.read_u8().unwrap();
        assert_eq!(r.read_u32().unwrap(), 5 + 13);
        assert_eq!(r.read_u32().unwrap(), 5);
    }

    #[test]
    fn test_flipped_byte_fails_checksum() {
        let framed = write_section(b"payload bytes here", CompressionScheme::None).unwrap();
        // Flip every payload byte in turn; each must be detected.
        for i in 9..framed.len() - 4 {
            let mut corrupt = framed.clone();
            corrupt[i] ^= 0x40;
            let mut r = M3gReader::new(&corrupt);
            assert!(
                matches!(read_section(&mut r), Err(Error::ChecksumMismatch { .. })),
                "flip at offset {i} went undetected"
            );
        }
    }

    #[test]
    fn test_unknown_scheme() {
        let mut framed = write_section(b"x", CompressionScheme::None).unwrap();
        framed[0] = 9;
        let mut r = M3gReader::new(&framed);
        assert!(matches!(
            read_section(&mut r),
            Err(Error::UnknownCompressionScheme(9))
        ));
    }

    #[test]
    fn test_truncated_section() {
        let framed = write_section(b"longer payload", CompressionScheme::None).unwrap();
        let mut r = M3gReader::new(&framed[..framed.len() - 6]);
        assert!(matches!(
            read_section(&mut r),
            Err(Error::UnexpectedEndOfStream)
        ));
    }

    #[test]
    fn test_bad_uncompressed_length() {
        let mut framed = write_section(b"abcdef", CompressionScheme::None).unwrap();
        // Patch the uncompressed length and fix the checksum so only the
        // length check can fire.
        framed[5] = 3;
        let sum = adler32::adler32(&framed[..framed.len() - 4]);
        let n = framed.len();
        framed[n - 4..].copy_from_slice(&sum.to_le_bytes());
        let mut r = M3gReader::new(&framed);
        assert!(matches!(
            read_section(&mut r),
            Err(Error::InvalidStructure(_))
        ));
    }
}
