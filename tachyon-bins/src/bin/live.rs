//! Live pipeline driven by a synthetic feed
//!
//! Three stage threads (intensity, decision, risk) chained by SPSC rings.
//! A feed thread publishes seeded synthetic events stamped with the
//! monotonic clock; the main thread plays the order gateway. Ctrl-C stops
//! the feed and drains the pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tachyon::core::{Clock, MonotonicClock};
use tachyon::pipeline::LivePipeline;
use tachyon::replay::SyntheticSource;
use tachyon::risk::RiskState;
use tachyon_bins::common::{print_metrics, setup, CommonArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the live pipeline against a synthetic feed")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Events to publish (0 = until Ctrl-C)
    #[arg(long, default_value = "100000")]
    events: usize,

    /// Pause between published events, in microseconds
    #[arg(long, default_value = "0")]
    gap_us: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = setup(&args.common)?;

    tracing::info!("=== Tachyon: Live Pipeline ===");

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::Release);
        })
        .context("Failed to install Ctrl-C handler")?;
    }

    let risk = Arc::new(RiskState::from_config(&config.risk));
    let (pipeline, mut feed, mut orders) = LivePipeline::start(&config, Arc::clone(&risk))?;

    // Template flow; timestamps are replaced by the live clock
    let template = SyntheticSource::from_config(config.replay.seed, &config.replay.synthetic).generate();
    anyhow::ensure!(!template.is_empty(), "replay.synthetic.count must be positive for the live feed");
    let batch = template.len();
    let limit = args.events;
    let gap = Duration::from_micros(args.gap_us);

    let feed_thread = {
        let running = Arc::clone(&running);
        std::thread::Builder::new()
            .name("tachyon-feed".to_string())
            .spawn(move || {
                let clock = MonotonicClock::new();
                let mut published = 0u64;
                let mut sequence_id = 0u64;
                while running.load(Ordering::Acquire) && (limit == 0 || (sequence_id as usize) < limit) {
                    let mut event = template[sequence_id as usize % batch];
                    sequence_id += 1;
                    event.sequence_id = sequence_id;
                    event.timestamp_ns = clock.now_ns();
                    if feed.publish(event) {
                        published += 1;
                    }
                    if !gap.is_zero() {
                        std::thread::sleep(gap);
                    }
                }
                published
            })
            .context("Failed to spawn feed thread")?
    };

    // Gateway: drain orders while the feed runs
    let mut received = 0u64;
    while !feed_thread.is_finished() {
        match orders.try_pop() {
            Some(order) => {
                received += 1;
                tracing::trace!("order {}", order);
            }
            None => std::thread::yield_now(),
        }
    }

    let published = feed_thread
        .join()
        .map_err(|_| anyhow::anyhow!("feed thread panicked"))?;
    let metrics = pipeline.shutdown()?;
    while orders.try_pop().is_some() {
        received += 1;
    }

    tracing::info!("Published {} events, gateway received {} orders", published, received);
    tracing::info!("Final risk state: {}", risk.snapshot());
    print_metrics(&metrics);
    Ok(())
}
