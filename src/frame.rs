//! Owned frame snapshot handed to the camera side.

use bytes::Bytes;

use crate::transport::header::{payload_len, FrameHeader, BYTES_PER_PIXEL};

/// One complete, verified frame copied out of the shared region.
///
/// The payload is immutable and cheaply cloneable, so the polling driver can
/// redeliver the same snapshot every tick without copying pixels. Snapshots
/// are replaced wholesale on each update, never mutated in place.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    /// BGRA8 pixels, row-major, top row first, no stride padding.
    pub data: Bytes,
    pub width: i32,
    pub height: i32,
    /// Producer-side capture time in milliseconds since epoch.
    pub timestamp: i64,
}

impl FrameSnapshot {
    pub(crate) fn from_parts(header: &FrameHeader, data: Bytes) -> Self {
        debug_assert_eq!(
            data.len(),
            payload_len(header.width, header.height).unwrap_or(0)
        );
        Self {
            data,
            width: header.width,
            height: header.height,
            timestamp: header.timestamp,
        }
    }

    /// Solid opaque black frame, delivered before any real frame arrives.
    pub fn placeholder(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let pixels = width as usize * height as usize;
        let mut data = vec![0u8; pixels * BYTES_PER_PIXEL];
        for px in data.chunks_exact_mut(BYTES_PER_PIXEL) {
            px[3] = 0xFF; // opaque alpha
        }
        Self {
            data: Bytes::from(data),
            width,
            height,
            timestamp: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
