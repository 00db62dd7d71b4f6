use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::transport::header::DecodeError;

pub type Result<T> = std::result::Result<T, Error>;

/// Transport-level errors.
///
/// `RegionNotFound`, `RegionTooSmall` and `InvalidMagic` are recoverable by
/// retrying the connection later; the rest indicate misuse on the calling
/// side or an I/O failure from the OS.
#[derive(Debug, Error)]
pub enum Error {
    #[error("shared region not found at {path}")]
    RegionNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("shared region is {len} bytes, smaller than the frame header")]
    RegionTooSmall { len: u64 },

    #[error("region magic {found:#x} does not match {expected:#x}")]
    InvalidMagic { found: i32, expected: i32 },

    #[error("payload is {actual} bytes but {width}x{height} requires {expected}")]
    PayloadSizeMismatch {
        width: i32,
        height: i32,
        expected: usize,
        actual: usize,
    },

    #[error("frame dimensions {width}x{height} must be positive")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("writer has been stopped")]
    WriterStopped,

    #[error("reader is not connected")]
    NotConnected,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Io(#[from] io::Error),
}
