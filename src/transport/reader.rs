//! Consumer-side frame reader.
//!
//! The reader shares no lock with the writer; it relies on the writer's
//! payload-before-header ordering and bounds the remaining race with a
//! double read: header, payload copy, header again. A header that changed
//! in between means the payload copy may mix two frames, so the attempt is
//! discarded and the previous snapshot stays current.

use std::path::{Path, PathBuf};
use std::sync::atomic::{fence, Ordering};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::frame::FrameSnapshot;
use crate::transport::header::{payload_len, FrameHeader, HEADER_SIZE, MAGIC};
use crate::transport::region::MappedRegion;

/// Outcome of one poll cycle.
///
/// `TransientShort` and `Torn` both mean "nothing new this tick, try again",
/// but callers may want to tell a producer mid-resize apart from a lost race.
#[derive(Debug)]
pub enum PollOutcome {
    /// A new, internally consistent frame was adopted.
    Fresh(FrameSnapshot),
    /// Header matches the last adopted frame; payload was not touched.
    Unchanged,
    /// Region is (momentarily) smaller than its header claims, or the header
    /// itself is garbage under a valid magic. Expected mid-resize.
    TransientShort,
    /// The header changed while the payload was being copied.
    Torn,
}

impl PollOutcome {
    /// The freshly adopted frame, if any.
    pub fn into_frame(self) -> Option<FrameSnapshot> {
        match self {
            PollOutcome::Fresh(frame) => Some(frame),
            _ => None,
        }
    }
}

pub struct FrameReader {
    path: PathBuf,
    region: Option<MappedRegion>,
    /// `(width, height, timestamp)` of the last adopted frame.
    last_seen: Option<(i32, i32, i64)>,
    /// Set after a short poll so the next one remaps at the file's new size.
    needs_refresh: bool,
}

impl FrameReader {
    /// A reader in the `Disconnected` state; `connect` attaches it.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            region: None,
            last_seen: None,
            needs_refresh: false,
        }
    }

    /// Maps the region read-only. `RegionNotFound` just means the producer
    /// has not started yet; the caller retries later.
    pub fn connect(&mut self) -> Result<()> {
        if self.region.is_some() {
            return Ok(());
        }
        let region = MappedRegion::open_readonly(&self.path)?;
        info!(path = %self.path.display(), len = region.len(), "reader connected");
        self.region = Some(region);
        self.needs_refresh = false;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.region.is_some()
    }

    /// Checks the region for a frame newer than the last adopted one.
    ///
    /// Structural failures (`InvalidMagic`, I/O on remap) disconnect the
    /// reader before returning the error, so the caller can simply retry
    /// `connect` on its next tick.
    pub fn poll(&mut self) -> Result<PollOutcome> {
        let Some(region) = self.region.as_mut() else {
            return Err(Error::NotConnected);
        };

        if self.needs_refresh {
            self.needs_refresh = false;
            if let Err(err) = region.refresh() {
                self.disconnect();
                return Err(err);
            }
        }

        let Some(data) = region.as_slice() else {
            return Err(Error::NotConnected);
        };

        if data.len() < HEADER_SIZE {
            self.needs_refresh = true;
            return Ok(PollOutcome::TransientShort);
        }
        // Cannot be Truncated: length checked above.
        let first = FrameHeader::decode(data)?;
        if first.magic != MAGIC {
            let found = first.magic;
            warn!(found, expected = MAGIC, "region magic mismatch, disconnecting");
            self.disconnect();
            return Err(Error::InvalidMagic {
                found,
                expected: MAGIC,
            });
        }

        if Some(first.key()) == self.last_seen {
            return Ok(PollOutcome::Unchanged);
        }

        // A valid magic over nonsense dimensions reads as a half-written
        // header; skip the cycle rather than fail.
        let expected = match payload_len(first.width, first.height) {
            Ok(len) => len,
            Err(_) => {
                self.needs_refresh = true;
                return Ok(PollOutcome::TransientShort);
            }
        };
        if data.len() < HEADER_SIZE + expected {
            self.needs_refresh = true;
            return Ok(PollOutcome::TransientShort);
        }

        let payload = Bytes::copy_from_slice(&data[HEADER_SIZE..HEADER_SIZE + expected]);
        // Pairs with the writer's release fence: the re-read header decides
        // whether the copy above was taken under a stable frame.
        fence(Ordering::Acquire);
        let second = FrameHeader::decode(data)?;

        match resolve(&first, &second, payload) {
            PollOutcome::Fresh(frame) => {
                self.last_seen = Some(first.key());
                debug!(
                    width = frame.width,
                    height = frame.height,
                    timestamp = frame.timestamp,
                    "adopted new frame"
                );
                Ok(PollOutcome::Fresh(frame))
            }
            outcome => Ok(outcome),
        }
    }

    /// Unmaps; idempotent. The freshness key survives a reconnect, so an
    /// unchanged region does not get re-adopted as "new".
    pub fn disconnect(&mut self) {
        if let Some(mut region) = self.region.take() {
            region.unmap();
            debug!(path = %self.path.display(), "reader disconnected");
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Decides whether a payload copied between two header reads may be adopted.
///
/// Pure so the torn-read policy is testable without shared memory: inject any
/// two decoded headers and a payload and inspect the verdict.
fn resolve(first: &FrameHeader, second: &FrameHeader, payload: Bytes) -> PollOutcome {
    if first.key() != second.key() {
        warn!(
            first = ?first.key(),
            second = ?second.key(),
            "torn read detected, dropping frame"
        );
        return PollOutcome::Torn;
    }
    PollOutcome::Fresh(FrameSnapshot::from_parts(first, payload))
}
