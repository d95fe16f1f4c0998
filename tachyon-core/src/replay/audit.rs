//! Hash-chained audit logs
//!
//! ```text
//! # tachyon-audit v1
//! # chain=replay
//! # seed=42
//! # input_sha256=<hex>
//! # genesis=<hex>
//! <body> prev=<hex> hash=<hex>
//! ...
//! ```
//!
//! `genesis = SHA-256("tachyon-audit/" || chain || seed_le || input_sha256)`
//! and each entry's `hash = SHA-256(prev || body)`, both as lowercase hex.
//! Editing, dropping or reordering any line breaks every hash after it.

use super::ReplayError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const AUDIT_VERSION: u32 = 1;
const MAGIC: &str = "# tachyon-audit v1";
const GENESIS_TAG: &[u8] = b"tachyon-audit/";

/// Which audit layer a chain belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChainKind {
    Replay = 0,
    Risk = 1,
}

impl ChainKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ChainKind::Replay => "replay",
            ChainKind::Risk => "risk",
        }
    }

    pub const fn file_name(&self) -> &'static str {
        match self {
            ChainKind::Replay => "replay.log",
            ChainKind::Risk => "risk.log",
        }
    }

    pub fn parse(s: &str) -> Option<ChainKind> {
        match s {
            "replay" => Some(ChainKind::Replay),
            "risk" => Some(ChainKind::Risk),
            _ => None,
        }
    }
}

/// Final state of a written (or verified) chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSummary {
    pub file: String,
    pub head: String,
    pub entries: u64,
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn genesis_hash(kind: ChainKind, seed: u64, input_sha256: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(GENESIS_TAG);
    hasher.update(kind.as_str().as_bytes());
    hasher.update(seed.to_le_bytes());
    hasher.update(input_sha256.as_bytes());
    hex::encode(hasher.finalize())
}

#[inline]
pub fn chain_hash(prev: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prev.as_bytes());
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

/// Append-only writer for one chain
pub struct AuditLog {
    kind: ChainKind,
    path: PathBuf,
    writer: BufWriter<File>,
    head: String,
    entries: u64,
}

impl AuditLog {
    /// Create `<dir>/<kind>.log` (truncating) and write its header
    pub fn create(dir: &Path, kind: ChainKind, seed: u64, input_sha256: &str) -> Result<Self, ReplayError> {
        let path = dir.join(kind.file_name());
        let file = File::create(&path).map_err(|e| ReplayError::io(&path, e))?;
        let mut writer = BufWriter::new(file);

        let genesis = genesis_hash(kind, seed, input_sha256);
        write!(
            writer,
            "{}\n# chain={}\n# seed={}\n# input_sha256={}\n# genesis={}\n",
            MAGIC,
            kind.as_str(),
            seed,
            input_sha256,
            genesis
        )
        .map_err(|e| ReplayError::io(&path, e))?;

        Ok(Self {
            kind,
            path,
            writer,
            head: genesis,
            entries: 0,
        })
    }

    /// Chain one entry; `body` is a single line
    pub fn append(&mut self, body: &str) -> Result<(), ReplayError> {
        debug_assert!(!body.contains('\n'), "audit body must be one line");

        let hash = chain_hash(&self.head, body);
        writeln!(self.writer, "{} prev={} hash={}", body, self.head, hash)
            .map_err(|e| ReplayError::io(&self.path, e))?;
        self.head = hash;
        self.entries += 1;
        Ok(())
    }

    pub fn kind(&self) -> ChainKind {
        self.kind
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close, returning the chain head
    pub fn finish(mut self) -> Result<ChainSummary, ReplayError> {
        self.writer.flush().map_err(|e| ReplayError::io(&self.path, e))?;
        Ok(ChainSummary {
            file: self.kind.file_name().to_string(),
            head: self.head,
            entries: self.entries,
        })
    }
}

fn header_field<'a>(line: Option<&'a str>, key: &str) -> Option<&'a str> {
    line?.strip_prefix("# ")?.strip_prefix(key)?.strip_prefix('=')
}

/// Split `<body> prev=<hex> hash=<hex>`
fn split_entry(line: &str) -> Option<(&str, &str, &str)> {
    let (rest, hash) = line.rsplit_once(" hash=")?;
    let (body, prev) = rest.rsplit_once(" prev=")?;
    Some((body, prev, hash))
}

/// Recompute every hash in a chain file
///
/// The first mismatch is fatal and reported with its 1-based line number.
///
/// A chain checks only itself: entries cut from the tail leave a shorter
/// chain that still verifies. Truncation is caught by the `MANIFEST`
/// digest, so use `verify_manifest` or `verify_run` on a full run directory.
pub fn verify_chain(path: &Path) -> Result<ChainSummary, ReplayError> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let content = std::fs::read_to_string(path).map_err(|e| ReplayError::io(path, e))?;
    let mut lines = content.lines();

    if lines.next() != Some(MAGIC) {
        return Err(ReplayError::integrity(&file, 1, "missing audit header"));
    }
    let kind = header_field(lines.next(), "chain")
        .and_then(ChainKind::parse)
        .ok_or_else(|| ReplayError::integrity(&file, 2, "bad chain field"))?;
    let seed = header_field(lines.next(), "seed")
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| ReplayError::integrity(&file, 3, "bad seed field"))?;
    let input_sha256 = header_field(lines.next(), "input_sha256")
        .ok_or_else(|| ReplayError::integrity(&file, 4, "bad input digest field"))?;
    let genesis = header_field(lines.next(), "genesis")
        .ok_or_else(|| ReplayError::integrity(&file, 5, "bad genesis field"))?;

    let expected_genesis = genesis_hash(kind, seed, input_sha256);
    if genesis != expected_genesis {
        return Err(ReplayError::integrity(&file, 5, "genesis does not match header"));
    }

    let mut head = expected_genesis;
    let mut entries = 0u64;
    for (idx, line) in lines.enumerate() {
        let line_no = idx + 6;
        let (body, prev, hash) = split_entry(line)
            .ok_or_else(|| ReplayError::integrity(&file, line_no, "malformed entry"))?;

        if prev != head {
            return Err(ReplayError::integrity(&file, line_no, "prev does not match chain head"));
        }
        if chain_hash(prev, body) != hash {
            return Err(ReplayError::integrity(&file, line_no, "hash mismatch"));
        }
        head = hash.to_string();
        entries += 1;
    }

    Ok(ChainSummary { file, head, entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_chain(dir: &Path, bodies: &[&str]) -> ChainSummary {
        let mut log = AuditLog::create(dir, ChainKind::Replay, 42, &sha256_hex(b"input")).unwrap();
        for body in bodies {
            log.append(body).unwrap();
        }
        log.finish().unwrap()
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_genesis_depends_on_inputs() {
        let a = genesis_hash(ChainKind::Replay, 42, "x");
        assert_ne!(a, genesis_hash(ChainKind::Risk, 42, "x"));
        assert_ne!(a, genesis_hash(ChainKind::Replay, 43, "x"));
        assert_ne!(a, genesis_hash(ChainKind::Replay, 42, "y"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_write_then_verify() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_chain(dir.path(), &["seq=1 a", "seq=2 b", "seq=3 c"]);
        assert_eq!(written.entries, 3);

        let verified = verify_chain(&dir.path().join("replay.log")).unwrap();
        assert_eq!(verified, written);
    }

    #[test]
    fn test_empty_chain_head_is_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_chain(dir.path(), &[]);
        assert_eq!(written.head, genesis_hash(ChainKind::Replay, 42, &sha256_hex(b"input")));
        assert_eq!(verify_chain(&dir.path().join("replay.log")).unwrap().entries, 0);
    }

    #[test]
    fn test_tampered_body_detected() {
        let dir = tempfile::tempdir().unwrap();
        write_chain(dir.path(), &["seq=1 a", "seq=2 b", "seq=3 c"]);
        let path = dir.path().join("replay.log");

        let content = std::fs::read_to_string(&path).unwrap().replace("seq=2 b", "seq=2 B");
        std::fs::write(&path, content).unwrap();

        match verify_chain(&path) {
            Err(ReplayError::IntegrityFailure { file, line, .. }) => {
                assert_eq!(file, "replay.log");
                assert_eq!(line, 7);
            }
            other => panic!("expected integrity failure, got {other:?}"),
        }
    }

    #[test]
    fn test_dropped_line_detected() {
        let dir = tempfile::tempdir().unwrap();
        write_chain(dir.path(), &["seq=1 a", "seq=2 b", "seq=3 c"]);
        let path = dir.path().join("replay.log");

        let content: Vec<String> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .filter(|l| !l.starts_with("seq=2"))
            .map(str::to_string)
            .collect();
        std::fs::write(&path, content.join("\n")).unwrap();

        assert!(matches!(
            verify_chain(&path),
            Err(ReplayError::IntegrityFailure { line: 7, .. })
        ));
    }

    #[test]
    fn test_header_tamper_detected() {
        let dir = tempfile::tempdir().unwrap();
        write_chain(dir.path(), &["seq=1 a"]);
        let path = dir.path().join("replay.log");

        let content = std::fs::read_to_string(&path).unwrap().replace("# seed=42", "# seed=41");
        std::fs::write(&path, content).unwrap();

        assert!(matches!(
            verify_chain(&path),
            Err(ReplayError::IntegrityFailure { line: 5, .. })
        ));
    }
}
