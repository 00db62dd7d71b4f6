//! Camera-facing polling driver.
//!
//! The OS camera framework pulls a frame per tick at its own cadence and
//! cannot be handed an error, so every failure path degrades to "repeat the
//! last frame". Before any frame was ever received, the driver serves an
//! opaque black placeholder at the configured dimensions.

use std::path::Path;

use tracing::{debug, warn};

use crate::frame::FrameSnapshot;
use crate::transport::reader::{FrameReader, PollOutcome};

pub struct PollingDriver {
    reader: FrameReader,
    last: Option<FrameSnapshot>,
    placeholder: FrameSnapshot,
}

impl PollingDriver {
    pub fn new(path: impl AsRef<Path>, placeholder_width: i32, placeholder_height: i32) -> Self {
        Self {
            reader: FrameReader::new(path),
            last: None,
            placeholder: FrameSnapshot::placeholder(placeholder_width, placeholder_height),
        }
    }

    /// Produces the frame for this camera tick. Never blocks, never fails.
    ///
    /// A disconnected reader gets one reconnect attempt per tick; opening the
    /// backing file is cheap at camera rates, so no backoff is kept.
    pub fn tick(&mut self) -> FrameSnapshot {
        if !self.reader.is_connected() {
            if let Err(err) = self.reader.connect() {
                debug!(%err, "producer not available");
                return self.fallback();
            }
        }

        match self.reader.poll() {
            Ok(PollOutcome::Fresh(frame)) => {
                self.last = Some(frame.clone());
                frame
            }
            Ok(PollOutcome::Unchanged)
            | Ok(PollOutcome::TransientShort)
            | Ok(PollOutcome::Torn) => self.fallback(),
            Err(err) => {
                // The reader has already disconnected itself; reconnect next tick.
                warn!(%err, "poll failed, serving previous frame");
                self.fallback()
            }
        }
    }

    /// Last adopted frame if the producer ever delivered one.
    pub fn last_frame(&self) -> Option<&FrameSnapshot> {
        self.last.as_ref()
    }

    fn fallback(&self) -> FrameSnapshot {
        self.last.clone().unwrap_or_else(|| self.placeholder.clone())
    }
}
