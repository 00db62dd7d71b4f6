//! Shared-memory frame transport: wire layout, region mapping, and the
//! writer/reader pair that trade frames through it without a lock.

pub mod header;
pub mod reader;
pub mod region;
pub mod writer;

pub use header::{FrameHeader, HEADER_SIZE, MAGIC};
pub use reader::{FrameReader, PollOutcome};
pub use region::MappedRegion;
pub use writer::FrameWriter;
