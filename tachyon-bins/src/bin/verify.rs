//! Offline audit verification
//!
//! Recomputes the MANIFEST digests and every hash chain of a replay output
//! directory. Exits non-zero on the first mismatch.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tachyon::replay::verify_run;

#[derive(Parser, Debug)]
#[command(author, version, about = "Verify a replay output directory")]
struct Args {
    /// Replay output directory
    dir: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tachyon::utils::init_logger(&args.log_level, false);

    let chains = verify_run(&args.dir)
        .with_context(|| format!("Integrity check failed for {}", args.dir.display()))?;

    for chain in &chains {
        println!("OK  {:<12} {} entries  head {}", chain.file, chain.entries, chain.head);
    }
    Ok(())
}
