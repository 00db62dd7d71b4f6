pub mod driver;
pub mod error;
pub mod frame;
pub mod transport;

use std::path::PathBuf;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

pub use driver::PollingDriver;
pub use error::{Error, Result};
pub use frame::FrameSnapshot;
pub use transport::{FrameReader, FrameWriter, PollOutcome};

/// Global configuration that can be atomically swapped at runtime
pub static CONFIG: once_cell::sync::Lazy<ArcSwap<Config>> =
    once_cell::sync::Lazy::new(|| ArcSwap::from_pointee(Config::default()));

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub transport: TransportConfig,
    pub driver: DriverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Well-known path of the backing file, agreed out-of-band with the
    /// producer and any camera-side consumers.
    pub region_path: PathBuf,
    pub width: i32,
    pub height: i32,
    pub fps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Dimensions of the placeholder served before any real frame arrives.
    pub placeholder_width: i32,
    pub placeholder_height: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: TransportConfig {
                region_path: std::env::temp_dir().join("camlink_frame.raw"),
                width: 1280,
                height: 720,
                fps: 30,
            },
            driver: DriverConfig {
                placeholder_width: 1280,
                placeholder_height: 720,
            },
        }
    }
}
