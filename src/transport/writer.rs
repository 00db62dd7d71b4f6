//! Producer-side frame writer.
//!
//! One writer per region, fed sequentially from the render loop. The only
//! synchronization with readers is write order: the payload lands first, the
//! header describing it lands last. A reader that observes a new header can
//! therefore trust the payload beneath it, up to the torn-read window its
//! double-read check closes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{fence, Ordering};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::transport::header::{payload_len, FrameHeader, HEADER_SIZE};
use crate::transport::region::MappedRegion;

pub struct FrameWriter {
    path: PathBuf,
    region: Option<MappedRegion>,
    width: i32,
    height: i32,
}

impl FrameWriter {
    /// Creates the shared region sized for the initial dimensions and seeds
    /// it with a valid header at timestamp zero, so readers can validate the
    /// magic before the first real frame arrives.
    ///
    /// Failure here (permissions, disk) is surfaced to the caller; nothing
    /// visible to existing readers is corrupted.
    pub fn start(path: impl AsRef<Path>, width: i32, height: i32) -> Result<Self> {
        let path = path.as_ref();
        let mut region = MappedRegion::create_or_resize(path, width, height)?;
        write_header(&mut region, &FrameHeader::new(width, height, 0)?)?;

        info!(path = %path.display(), width, height, "frame writer started");
        Ok(Self {
            path: path.to_path_buf(),
            region: Some(region),
            width,
            height,
        })
    }

    /// Publishes one frame. Requires the writer to be active.
    ///
    /// A dimension change resizes the region first; readers mid-read see a
    /// short region and skip that poll, which is the accepted race.
    pub fn submit_frame(
        &mut self,
        width: i32,
        height: i32,
        pixels: &[u8],
        timestamp: i64,
    ) -> Result<()> {
        let expected = payload_len(width, height)?;
        if pixels.len() != expected {
            return Err(Error::PayloadSizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }

        let region = self.region.as_mut().ok_or(Error::WriterStopped)?;
        if (width, height) != (self.width, self.height) {
            debug!(
                old_width = self.width,
                old_height = self.height,
                width,
                height,
                "resizing shared region"
            );
            region.resize(width, height)?;
            self.width = width;
            self.height = height;
        }

        let buf = region.as_mut_slice().ok_or(Error::WriterStopped)?;
        buf[HEADER_SIZE..HEADER_SIZE + expected].copy_from_slice(pixels);
        // Payload must be visible before the header that describes it.
        fence(Ordering::Release);
        buf[..HEADER_SIZE].copy_from_slice(&FrameHeader::new(width, height, timestamp)?.encode());
        Ok(())
    }

    /// Unmaps the region; idempotent. The backing file is left behind so a
    /// reader can keep serving the terminal frame.
    pub fn stop(&mut self) {
        if let Some(mut region) = self.region.take() {
            region.unmap();
            info!(path = %self.path.display(), "frame writer stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.region.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FrameWriter {
    fn drop(&mut self) {
        self.stop();
    }
}

fn write_header(region: &mut MappedRegion, header: &FrameHeader) -> Result<()> {
    let buf = region.as_mut_slice().ok_or(Error::WriterStopped)?;
    buf[..HEADER_SIZE].copy_from_slice(&header.encode());
    Ok(())
}
