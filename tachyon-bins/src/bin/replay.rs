//! Deterministic replay
//!
//! Replays a CSV event file (or seeded synthetic flow) through the trading
//! cycle and writes `replay.log`, `risk.log`, `MANIFEST` and `manifest.json`
//! to the output directory.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tachyon::replay::{run_replay, verify_run, write_events_csv, ReplaySource, SyntheticSource};
use tachyon_bins::common::{setup, unix_millis, CommonArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "Deterministic replay with hash-chained audit output")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Event CSV (sequence_id,timestamp_ns,side,kind,price,size); synthetic flow when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Seed for synthetic flow and fill simulation
    #[arg(long)]
    seed: Option<u64>,

    /// Synthetic event count
    #[arg(long)]
    count: Option<usize>,

    /// Output directory for the audit files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also write the synthetic input to this CSV file
    #[arg(long)]
    record: Option<PathBuf>,

    /// Verify the written run before exiting
    #[arg(long)]
    verify: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = setup(&args.common)?;

    if let Some(seed) = args.seed {
        config.replay.seed = seed;
    }
    if let Some(count) = args.count {
        config.replay.synthetic.count = count;
    }
    if let Some(dir) = &args.output_dir {
        config.replay.output_dir = dir.clone();
    }

    tracing::info!("=== Tachyon: Replay ===");

    let source = match &args.input {
        Some(path) => ReplaySource::Csv(path.clone()),
        None => {
            let synthetic = SyntheticSource::from_config(config.replay.seed, &config.replay.synthetic);
            if let Some(path) = &args.record {
                write_events_csv(path, &synthetic.generate())
                    .with_context(|| format!("Failed to record synthetic input to {}", path.display()))?;
            }
            ReplaySource::Synthetic(synthetic)
        }
    };

    let output_dir = config.replay.output_dir.clone();
    let summary = run_replay(config, source, unix_millis()).context("Replay failed")?;

    if args.verify {
        let chains = verify_run(&output_dir).context("Verification of the written run failed")?;
        tracing::info!("Verified {} chains", chains.len());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }

    Ok(())
}
