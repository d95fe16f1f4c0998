//! Deterministic Replay and Audit
//!
//! Replays a recorded (or synthetic) event stream through the same trading
//! cycle the live pipeline runs, simulates fills with a seeded RNG, and
//! writes a hash-chained audit trail that can be verified offline.
//!
//! ## Output directory
//! ```text
//! replay.log     every dispatched event and fill, SHA-256 chained
//! risk.log       every rejected decision, SHA-256 chained
//! MANIFEST       `sha256sum -c` compatible digests of both logs
//! manifest.json  digests, chain heads, entry counts, generation time
//! ```
//!
//! Identical seed and input always produce byte-identical `replay.log`,
//! `risk.log` and `MANIFEST`.

pub mod audit;
pub mod engine;
pub mod fill;
pub mod ledger;
pub mod manifest;
pub mod source;

pub use audit::{verify_chain, AuditLog, ChainKind, ChainSummary};
pub use engine::{run_replay, ReplayEngine, ReplaySummary};
pub use fill::{FillSimulator, SimulatedFill};
pub use ledger::ReplayLedger;
pub use manifest::{verify_manifest, verify_run, ManifestDocument, ManifestEntry, MANIFEST_FILE, MANIFEST_JSON};
pub use source::{parse_events_csv, read_events_csv, write_events, write_events_csv, ReplaySource, SyntheticSource};

use crate::core::{ConfigError, ErrorKind};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Replay engine lifecycle
///
/// `Idle -> Loading -> Replaying -> Finalizing -> Done`, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReplayPhase {
    Idle = 0,
    Loading = 1,
    Replaying = 2,
    Finalizing = 3,
    Done = 4,
}

impl ReplayPhase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReplayPhase::Idle => "Idle",
            ReplayPhase::Loading => "Loading",
            ReplayPhase::Replaying => "Replaying",
            ReplayPhase::Finalizing => "Finalizing",
            ReplayPhase::Done => "Done",
        }
    }

    /// Whether `self -> next` is a legal transition
    pub const fn can_transition_to(&self, next: ReplayPhase) -> bool {
        matches!(
            (self, next),
            (ReplayPhase::Idle, ReplayPhase::Loading)
                | (ReplayPhase::Loading, ReplayPhase::Replaying)
                | (ReplayPhase::Replaying, ReplayPhase::Finalizing)
                | (ReplayPhase::Finalizing, ReplayPhase::Done)
        )
    }
}

impl fmt::Display for ReplayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("invalid replay transition {from} -> {to}")]
    InvalidTransition { from: ReplayPhase, to: ReplayPhase },

    #[error("integrity failure in {file} at line {line}: {reason}")]
    IntegrityFailure {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {file} at line {line}: {reason}")]
    Parse {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("CSV error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("manifest JSON error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ReplayError {
    /// Taxonomy class, where one applies
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ReplayError::IntegrityFailure { .. } => Some(ErrorKind::ReplayIntegrityFailure),
            ReplayError::Config(_) => Some(ErrorKind::ConfigInvalid),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReplayError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn integrity(file: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        ReplayError::IntegrityFailure {
            file: file.into(),
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        use ReplayPhase::*;
        assert!(Idle.can_transition_to(Loading));
        assert!(Loading.can_transition_to(Replaying));
        assert!(Replaying.can_transition_to(Finalizing));
        assert!(Finalizing.can_transition_to(Done));

        assert!(!Idle.can_transition_to(Replaying));
        assert!(!Loading.can_transition_to(Loading));
        assert!(!Done.can_transition_to(Idle));
        assert!(!Replaying.can_transition_to(Loading));
    }

    #[test]
    fn test_error_kinds() {
        let err = ReplayError::integrity("replay.log", 7, "hash mismatch");
        assert_eq!(err.kind(), Some(ErrorKind::ReplayIntegrityFailure));
        assert!(err.to_string().contains("line 7"));

        let err = ReplayError::InvalidTransition {
            from: ReplayPhase::Idle,
            to: ReplayPhase::Done,
        };
        assert_eq!(err.kind(), None);
        assert_eq!(err.to_string(), "invalid replay transition Idle -> Done");
    }
}
