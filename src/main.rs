//! Camlink loopback demo: a synthetic producer and a camera-style consumer
//! trading frames through one shared region inside this process.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use camlink::transport::header::BYTES_PER_PIXEL;
use camlink::{Config, FrameWriter, PollingDriver};
use color_eyre::Result;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter("camlink=debug")
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    info!("Camlink loopback demo launching...");

    // Load configuration
    let config = Config::default();
    camlink::CONFIG.store(Arc::new(config.clone()));

    let transport = config.transport;
    let frame_interval = Duration::from_millis(1000 / u64::from(transport.fps.max(1)));

    // Producer: renders a synthetic moving gradient into the shared region
    let mut writer = FrameWriter::start(&transport.region_path, transport.width, transport.height)?;
    let (width, height) = (transport.width, transport.height);
    let producer_interval = frame_interval;
    let producer = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(producer_interval);
        let mut tick = 0u32;
        loop {
            ticker.tick().await;
            let pixels = render_test_frame(width, height, tick);
            if let Err(e) = writer.submit_frame(width, height, &pixels, now_millis()) {
                error!("Failed to submit frame: {}", e);
                break;
            }
            tick = tick.wrapping_add(1);
        }
    });

    // Consumer: ticks the polling driver the way a camera callback would
    let mut driver = PollingDriver::new(
        &transport.region_path,
        config.driver.placeholder_width,
        config.driver.placeholder_height,
    );
    let consumer = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(frame_interval);
        let mut last_timestamp = i64::MIN;
        let mut delivered = 0u64;
        let mut fresh = 0u64;
        loop {
            ticker.tick().await;
            let frame = driver.tick();
            delivered += 1;
            if frame.timestamp != last_timestamp {
                last_timestamp = frame.timestamp;
                fresh += 1;
            }
            if delivered % 60 == 0 {
                info!(delivered, fresh, "camera ticks served");
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Camlink shutting down");
    producer.abort();
    consumer.abort();
    Ok(())
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Moving BGRA gradient, enough to see motion on the consumer side.
fn render_test_frame(width: i32, height: i32, tick: u32) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let mut pixels = vec![0u8; w * h * BYTES_PER_PIXEL];
    for y in 0..h {
        for x in 0..w {
            let px = &mut pixels[(y * w + x) * BYTES_PER_PIXEL..][..BYTES_PER_PIXEL];
            px[0] = (x + tick as usize) as u8; // B
            px[1] = (y + tick as usize) as u8; // G
            px[2] = tick as u8; // R
            px[3] = 0xFF; // A
        }
    }
    pixels
}
