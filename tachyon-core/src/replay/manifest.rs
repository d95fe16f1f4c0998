//! Run manifests
//!
//! `MANIFEST` is plain `sha256sum` output (`<hex>  <file>`), so a run can be
//! checked with `sha256sum -c MANIFEST` and no Rust at all. `manifest.json`
//! adds chain heads and entry counts, plus `generated_at`, which is supplied
//! by the caller and is the only wall-clock value in a run's output.

use super::audit::{verify_chain, ChainSummary, AUDIT_VERSION};
use super::ReplayError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub const MANIFEST_FILE: &str = "MANIFEST";
pub const MANIFEST_JSON: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    pub sha256: String,
    pub chain_head: String,
    pub entries: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDocument {
    pub version: u32,
    pub seed: u64,
    pub input_sha256: String,
    /// Unix milliseconds, supplied by the caller
    pub generated_at: u64,
    pub files: Vec<ManifestEntry>,
}

/// Streaming SHA-256 of a file, lowercase hex
pub fn hash_file(path: &Path) -> Result<String, ReplayError> {
    let file = File::open(path).map_err(|e| ReplayError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer).map_err(|e| ReplayError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Write `MANIFEST` and `manifest.json` for finished chains
pub fn write_manifest(
    dir: &Path,
    chains: &[ChainSummary],
    seed: u64,
    input_sha256: &str,
    generated_at: u64,
) -> Result<ManifestDocument, ReplayError> {
    let mut files = Vec::with_capacity(chains.len());
    let mut sums = String::new();

    for chain in chains {
        let sha256 = hash_file(&dir.join(&chain.file))?;
        sums.push_str(&format!("{}  {}\n", sha256, chain.file));
        files.push(ManifestEntry {
            file: chain.file.clone(),
            sha256,
            chain_head: chain.head.clone(),
            entries: chain.entries,
        });
    }

    let manifest_path = dir.join(MANIFEST_FILE);
    std::fs::write(&manifest_path, sums).map_err(|e| ReplayError::io(&manifest_path, e))?;

    let document = ManifestDocument {
        version: AUDIT_VERSION,
        seed,
        input_sha256: input_sha256.to_string(),
        generated_at,
        files,
    };
    let json_path = dir.join(MANIFEST_JSON);
    let json = serde_json::to_string_pretty(&document)?;
    std::fs::write(&json_path, json).map_err(|e| ReplayError::io(&json_path, e))?;

    tracing::info!("Wrote manifest for {} files to {}", document.files.len(), dir.display());
    Ok(document)
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/') && !name.contains('\\')
}

/// Recompute every digest listed in `MANIFEST`
///
/// Returns `(file, sha256)` pairs in manifest order.
pub fn verify_manifest(dir: &Path) -> Result<Vec<(String, String)>, ReplayError> {
    let path = dir.join(MANIFEST_FILE);
    let content = std::fs::read_to_string(&path).map_err(|e| ReplayError::io(&path, e))?;

    let mut verified = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let (digest, file) = line
            .split_once("  ")
            .ok_or_else(|| ReplayError::integrity(MANIFEST_FILE, line_no, "malformed line"))?;
        if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ReplayError::integrity(MANIFEST_FILE, line_no, "malformed digest"));
        }
        if !is_plain_file_name(file) {
            return Err(ReplayError::integrity(
                MANIFEST_FILE,
                line_no,
                format!("{}: not a plain file name", file),
            ));
        }

        let actual = hash_file(&dir.join(file))?;
        if !actual.eq_ignore_ascii_case(digest) {
            return Err(ReplayError::integrity(
                MANIFEST_FILE,
                line_no,
                format!("{}: digest mismatch", file),
            ));
        }
        verified.push((file.to_string(), actual));
    }

    if verified.is_empty() {
        return Err(ReplayError::integrity(MANIFEST_FILE, 0, "no entries"));
    }
    Ok(verified)
}

/// Full offline check of a run directory
///
/// Digests from `MANIFEST`, every chain recomputed, and (when present) chain
/// heads and counts cross-checked against `manifest.json`.
pub fn verify_run(dir: &Path) -> Result<Vec<ChainSummary>, ReplayError> {
    let digests = verify_manifest(dir)?;

    let mut chains = Vec::with_capacity(digests.len());
    for (file, _) in &digests {
        chains.push(verify_chain(&dir.join(file))?);
    }

    let json_path = dir.join(MANIFEST_JSON);
    if json_path.exists() {
        let json = std::fs::read_to_string(&json_path).map_err(|e| ReplayError::io(&json_path, e))?;
        let document: ManifestDocument = serde_json::from_str(&json)?;

        for entry in &document.files {
            let position = digests.iter().position(|(file, _)| *file == entry.file);
            let Some(i) = position else {
                return Err(ReplayError::integrity(
                    MANIFEST_JSON,
                    0,
                    format!("{}: not listed in {}", entry.file, MANIFEST_FILE),
                ));
            };
            if digests[i].1 != entry.sha256 || chains[i].head != entry.chain_head || chains[i].entries != entry.entries
            {
                return Err(ReplayError::integrity(
                    MANIFEST_JSON,
                    0,
                    format!("{}: does not match the verified chain", entry.file),
                ));
            }
        }
    }

    tracing::info!("Verified {} chains in {}", chains.len(), dir.display());
    Ok(chains)
}
