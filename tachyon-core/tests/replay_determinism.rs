//! End-to-end replay tests
//!
//! Same seed and input ⇒ byte-identical `replay.log`, `risk.log` and
//! `MANIFEST`. Any edit to the output is caught by verification.

use std::path::Path;
use tachyon::config::PipelineConfig;
use tachyon::core::{MarketEvent, Side};
use tachyon::replay::{
    run_replay, verify_chain, verify_manifest, verify_run, write_events_csv, ReplayEngine, ReplayError,
    ReplayPhase, ReplaySource, SyntheticSource,
};

fn config(dir: &Path, seed: u64) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.replay.seed = seed;
    config.replay.output_dir = dir.to_path_buf();
    // tight enough that the synthetic flow hits the limit
    config.risk.position_limit = 30;
    config
}

fn read(dir: &Path, file: &str) -> Vec<u8> {
    std::fs::read(dir.join(file)).unwrap()
}

// ===== DETERMINISM =====

#[test]
fn test_same_seed_byte_identical() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();

    let run = |dir: &Path, generated_at: u64| {
        run_replay(
            config(dir, 42),
            ReplaySource::Synthetic(SyntheticSource::new(42, 1_000)),
            generated_at,
        )
        .unwrap()
    };
    let first = run(a.path(), 1);
    let second = run(b.path(), 2);

    assert_eq!(first.events, 1_000);
    assert!(first.accepted > 0);
    assert!(first.rejected > 0, "limit never hit; risk.log would be empty");

    for file in ["replay.log", "risk.log", "MANIFEST"] {
        assert_eq!(read(a.path(), file), read(b.path(), file), "{} differs", file);
    }
    assert_eq!(first.replay_chain, second.replay_chain);
    assert_eq!(first.risk_chain, second.risk_chain);

    // manifest.json differs only by generated_at
    let json_a: serde_json::Value = serde_json::from_slice(&read(a.path(), "manifest.json")).unwrap();
    let mut json_b: serde_json::Value = serde_json::from_slice(&read(b.path(), "manifest.json")).unwrap();
    assert_eq!(json_b["generated_at"], 2);
    json_b["generated_at"] = serde_json::json!(1);
    assert_eq!(json_a, json_b);
}

#[test]
fn test_different_seed_different_output() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let events = SyntheticSource::new(42, 300).generate();

    let first = run_replay(config(a.path(), 1), ReplaySource::Events(events.clone()), 0).unwrap();
    let second = run_replay(config(b.path(), 2), ReplaySource::Events(events), 0).unwrap();

    // same input, different fill draws and genesis
    assert_eq!(first.input_sha256, second.input_sha256);
    assert_ne!(first.replay_chain.head, second.replay_chain.head);
}

#[test]
fn test_csv_and_synthetic_agree() {
    let csv_dir = tempfile::tempdir().unwrap();
    let out_a = tempfile::tempdir().unwrap();
    let out_b = tempfile::tempdir().unwrap();

    let source = SyntheticSource::new(42, 500);
    let csv = csv_dir.path().join("events.csv");
    write_events_csv(&csv, &source.generate()).unwrap();

    let from_csv = run_replay(config(out_a.path(), 42), ReplaySource::Csv(csv), 0).unwrap();
    let from_rng = run_replay(config(out_b.path(), 42), ReplaySource::Synthetic(source), 0).unwrap();

    assert_eq!(from_csv.input_sha256, from_rng.input_sha256);
    assert_eq!(read(out_a.path(), "replay.log"), read(out_b.path(), "replay.log"));
}

#[test]
fn test_ledger_matches_gate() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run_replay(
        config(dir.path(), 42),
        ReplaySource::Synthetic(SyntheticSource::new(42, 1_000)),
        0,
    )
    .unwrap();

    assert_eq!(summary.fills, summary.accepted);
    assert_eq!(summary.ledger_position, summary.risk_position);
    assert!(summary.ledger_position.abs() <= 30);
    assert_eq!(summary.avg_decision_latency_ns, 400.0);
    assert_eq!(summary.replay_chain.entries, summary.events + summary.fills);
    assert_eq!(summary.risk_chain.entries, summary.rejected);
}

// ===== FULL SCHEDULER =====

#[test]
fn test_full_pool_drops_and_counts() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), 42);
    config.scheduler.pool_capacity = 4;
    let events: Vec<MarketEvent> = (1..=8)
        .map(|seq| MarketEvent::trade(seq, 1_000, Side::Buy, 100.0, 2))
        .collect();

    let summary = run_replay(config, ReplaySource::Events(events), 0).unwrap();

    assert_eq!(summary.events, 4);
    assert_eq!(summary.dropped, 4);
    assert_eq!(summary.fills, summary.accepted);
    assert_eq!(summary.risk_position, summary.ledger_position);
    assert_eq!(
        summary.replay_chain.entries,
        summary.events + summary.fills + summary.dropped
    );

    // drops are part of the verified chain
    verify_run(dir.path()).unwrap();
    let log = String::from_utf8(read(dir.path(), "replay.log")).unwrap();
    assert_eq!(log.matches("dropped=input").count(), 4);
}

#[test]
fn test_backlogged_run_is_deterministic() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let mut source = SyntheticSource::new(7, 500);
    source.mean_gap_ns = 100;

    let run = |dir: &Path| {
        let mut config = config(dir, 7);
        config.scheduler.pool_capacity = 4;
        // fills outlive many inputs, so the pool backs up
        config.replay.fill.base_latency_ns = 50_000;
        run_replay(config, ReplaySource::Synthetic(source), 0).unwrap()
    };
    let first = run(a.path());
    let second = run(b.path());

    assert!(first.dropped > 0);
    assert!(first.events + first.dropped >= 500);
    assert_eq!(first.fills, first.accepted);
    assert_eq!(first.risk_position, first.ledger_position);
    assert_eq!(first.dropped, second.dropped);
    assert_eq!(first.replay_chain, second.replay_chain);
    for file in ["replay.log", "risk.log", "MANIFEST"] {
        assert_eq!(read(a.path(), file), read(b.path(), file), "{} differs", file);
    }
}

// ===== VERIFICATION =====

#[test]
fn test_written_run_verifies() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run_replay(
        config(dir.path(), 42),
        ReplaySource::Synthetic(SyntheticSource::new(42, 1_000)),
        0,
    )
    .unwrap();

    let chains = verify_run(dir.path()).unwrap();
    assert_eq!(chains[0], summary.replay_chain);
    assert_eq!(chains[1], summary.risk_chain);
}

#[test]
fn test_tampered_replay_log_detected() {
    let dir = tempfile::tempdir().unwrap();
    run_replay(
        config(dir.path(), 42),
        ReplaySource::Synthetic(SyntheticSource::new(42, 200)),
        0,
    )
    .unwrap();

    // flip the size of the first event record (line 6, after the 5 header lines)
    let path = dir.path().join("replay.log");
    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    lines[5] = lines[5].replacen("seq=1 ", "seq=9 ", 1);
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();

    match verify_chain(&path) {
        Err(ReplayError::IntegrityFailure { file, line, .. }) => {
            assert_eq!(file, "replay.log");
            assert_eq!(line, 6);
        }
        other => panic!("expected integrity failure, got {other:?}"),
    }
    assert!(matches!(
        verify_manifest(dir.path()),
        Err(ReplayError::IntegrityFailure { .. })
    ));
}

#[test]
fn test_truncated_chain_caught_by_manifest() {
    let dir = tempfile::tempdir().unwrap();
    run_replay(
        config(dir.path(), 42),
        ReplaySource::Synthetic(SyntheticSource::new(42, 50)),
        0,
    )
    .unwrap();

    // truncating the chain keeps every remaining hash valid
    let path = dir.path().join("replay.log");
    let content = std::fs::read_to_string(&path).unwrap();
    let kept: Vec<&str> = content.lines().take(10).collect();
    std::fs::write(&path, kept.join("\n") + "\n").unwrap();

    assert!(verify_chain(&path).is_ok());
    assert!(verify_manifest(dir.path()).is_err());
    assert!(matches!(
        verify_run(dir.path()),
        Err(ReplayError::IntegrityFailure { .. })
    ));
}

// ===== STATE MACHINE =====

#[test]
fn test_state_machine_misuse() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = ReplayEngine::new(config(dir.path(), 42)).unwrap();
    assert_eq!(engine.phase(), ReplayPhase::Idle);

    assert!(matches!(engine.run(0), Err(ReplayError::InvalidTransition { .. })));

    engine
        .load(ReplaySource::Synthetic(SyntheticSource::new(42, 10)))
        .unwrap();
    assert_eq!(engine.phase(), ReplayPhase::Loading);
    assert!(matches!(
        engine.load(ReplaySource::Events(Vec::new())),
        Err(ReplayError::InvalidTransition {
            from: ReplayPhase::Loading,
            to: ReplayPhase::Loading
        })
    ));

    engine.run(0).unwrap();
    assert_eq!(engine.phase(), ReplayPhase::Done);

    assert!(matches!(
        engine.run(0),
        Err(ReplayError::InvalidTransition {
            from: ReplayPhase::Done,
            to: ReplayPhase::Replaying
        })
    ));
    assert!(matches!(
        engine.load(ReplaySource::Events(Vec::new())),
        Err(ReplayError::InvalidTransition { from: ReplayPhase::Done, .. })
    ));
}

#[test]
fn test_invalid_config_refused() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), 42);
    config.scheduler.wheel_slots = 100;
    assert!(matches!(ReplayEngine::new(config), Err(ReplayError::Config(_))));
}
