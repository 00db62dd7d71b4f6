//! Fixed-layout frame header codec.
//!
//! The header is the first 20 bytes of the shared region, packed
//! little-endian regardless of host byte order:
//! magic(i32) | width(i32) | height(i32) | timestamp(i64).

use thiserror::Error;

use crate::error::{Error, Result};

/// Sentinel identifying a valid, compatible region layout.
pub const MAGIC: i32 = 0x0CA7_CA7;

/// Encoded header size in bytes: 4 + 4 + 4 + 8.
pub const HEADER_SIZE: usize = 20;

/// BGRA8, one pixel per position.
pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("header truncated: got {0} bytes, need {HEADER_SIZE}")]
    Truncated(usize),
}

/// Decoded view of the region's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub magic: i32,
    pub width: i32,
    pub height: i32,
    pub timestamp: i64,
}

impl FrameHeader {
    /// Header for a frame the writer is about to publish.
    pub fn new(width: i32, height: i32, timestamp: i64) -> Result<Self> {
        payload_len(width, height)?;
        Ok(Self {
            magic: MAGIC,
            width,
            height,
            timestamp,
        })
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.magic.to_le_bytes());
        buf[4..8].copy_from_slice(&self.width.to_le_bytes());
        buf[8..12].copy_from_slice(&self.height.to_le_bytes());
        buf[12..20].copy_from_slice(&self.timestamp.to_le_bytes());
        buf
    }

    /// Decodes the leading `HEADER_SIZE` bytes of `buf`.
    ///
    /// Magic is returned as-is; validating it is the reader's call.
    pub fn decode(buf: &[u8]) -> std::result::Result<Self, DecodeError> {
        if buf.len() < HEADER_SIZE {
            return Err(DecodeError::Truncated(buf.len()));
        }
        // Slice bounds are checked above; the try_into calls cannot fail.
        Ok(Self {
            magic: i32::from_le_bytes(buf[0..4].try_into().unwrap()),
            width: i32::from_le_bytes(buf[4..8].try_into().unwrap()),
            height: i32::from_le_bytes(buf[8..12].try_into().unwrap()),
            timestamp: i64::from_le_bytes(buf[12..20].try_into().unwrap()),
        })
    }

    /// Freshness key: two headers describe the same frame iff these match.
    pub fn key(&self) -> (i32, i32, i64) {
        (self.width, self.height, self.timestamp)
    }
}

/// Payload size for the given dimensions, or `InvalidDimensions`.
pub fn payload_len(width: i32, height: i32) -> Result<usize> {
    if width <= 0 || height <= 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    Ok(width as usize * height as usize * BYTES_PER_PIXEL)
}

/// Total region size (header + payload) for the given dimensions.
pub fn region_size(width: i32, height: i32) -> Result<usize> {
    Ok(HEADER_SIZE + payload_len(width, height)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let header = FrameHeader::new(1280, 720, 1_700_000_000_123).unwrap();
        let decoded = FrameHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.magic, MAGIC);
    }

    #[test]
    fn wire_layout_is_little_endian() {
        let header = FrameHeader::new(2, 3, 0x0102_0304_0506_0708).unwrap();
        let buf = header.encode();
        assert_eq!(&buf[0..4], &[0xA7, 0x7C, 0xCA, 0x00]);
        assert_eq!(&buf[4..8], &[2, 0, 0, 0]);
        assert_eq!(&buf[8..12], &[3, 0, 0, 0]);
        assert_eq!(&buf[12..20], &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let err = FrameHeader::decode(&[0u8; 19]).unwrap_err();
        assert_eq!(err, DecodeError::Truncated(19));
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let mut buf = FrameHeader::new(4, 4, 7).unwrap().encode().to_vec();
        buf.extend_from_slice(&[0xFF; 64]);
        let decoded = FrameHeader::decode(&buf).unwrap();
        assert_eq!(decoded.key(), (4, 4, 7));
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        assert!(matches!(
            FrameHeader::new(0, 720, 0),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(
            payload_len(1280, -1),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn region_size_includes_header() {
        assert_eq!(region_size(1280, 720).unwrap(), HEADER_SIZE + 1280 * 720 * 4);
    }
}
