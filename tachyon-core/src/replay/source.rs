//! Replay event sources
//!
//! CSV layout (header required):
//! ```text
//! sequence_id,timestamp_ns,side,kind,price,size
//! 1,1000,BUY,TRADE,100.25,5
//! ```

use super::ReplayError;
use crate::config::SyntheticConfig;
use crate::core::{EventKind, MarketEvent, Side};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str = "sequence_id,timestamp_ns,side,kind,price,size";

/// Where a replay's events come from
#[derive(Debug, Clone)]
pub enum ReplaySource {
    Csv(PathBuf),
    Synthetic(SyntheticSource),
    /// Events already in memory
    Events(Vec<MarketEvent>),
}

impl ReplaySource {
    pub fn load(self) -> Result<Vec<MarketEvent>, ReplayError> {
        match self {
            ReplaySource::Csv(path) => read_events_csv(&path),
            ReplaySource::Synthetic(source) => Ok(source.generate()),
            ReplaySource::Events(events) => Ok(events),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ReplaySource::Csv(path) => format!("csv:{}", path.display()),
            ReplaySource::Synthetic(s) => format!("synthetic:seed={},count={}", s.seed, s.count),
            ReplaySource::Events(events) => format!("memory:{}", events.len()),
        }
    }
}

/// Seeded synthetic order flow
///
/// Sides come in runs (a buy is likely followed by another buy), which is
/// the self-exciting pattern the intensity engine is built to pick up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticSource {
    pub seed: u64,
    pub count: usize,
    pub start_price: f64,
    pub mean_gap_ns: u64,
}

impl SyntheticSource {
    pub fn new(seed: u64, count: usize) -> Self {
        Self::from_config(seed, &SyntheticConfig { count, ..SyntheticConfig::default() })
    }

    pub fn from_config(seed: u64, config: &SyntheticConfig) -> Self {
        Self {
            seed,
            count: config.count,
            start_price: config.start_price,
            mean_gap_ns: config.mean_gap_ns,
        }
    }

    pub fn generate(&self) -> Vec<MarketEvent> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut events = Vec::with_capacity(self.count);
        let mut price = self.start_price;
        let mut timestamp_ns = 0u64;
        let mut side = Side::Buy;

        for i in 0..self.count {
            // exponential inter-arrival, at least 1ns
            let u: f64 = rng.gen();
            let gap = (-(self.mean_gap_ns as f64) * (1.0 - u).ln()).max(1.0);
            timestamp_ns = timestamp_ns.saturating_add(gap as u64);

            if rng.gen_bool(0.3) {
                side = side.opposite();
            }

            let kind = match rng.gen_range(0..20u32) {
                0 => EventKind::Cancel,
                1..=3 => EventKind::Quote,
                _ => EventKind::Trade,
            };

            let step: f64 = rng.gen_range(-0.0005..0.0005);
            price = ((price * (1.0 + step)) * 100.0).round() / 100.0;
            let size = rng.gen_range(1..=100u64);

            events.push(MarketEvent::new(i as u64 + 1, timestamp_ns, side, price, size, kind));
        }

        events
    }
}

fn parse_side(field: &str) -> Option<Side> {
    match field.to_ascii_uppercase().as_str() {
        "BUY" | "B" => Some(Side::Buy),
        "SELL" | "S" => Some(Side::Sell),
        _ => None,
    }
}

fn parse_kind(field: &str) -> Option<EventKind> {
    match field.to_ascii_uppercase().as_str() {
        "TRADE" => Some(EventKind::Trade),
        "QUOTE" => Some(EventKind::Quote),
        "CANCEL" => Some(EventKind::Cancel),
        _ => None,
    }
}

/// One CSV row as written
#[derive(Serialize)]
struct CsvRow {
    sequence_id: u64,
    timestamp_ns: u64,
    side: &'static str,
    kind: &'static str,
    price: f64,
    size: u64,
}

impl From<&MarketEvent> for CsvRow {
    fn from(event: &MarketEvent) -> Self {
        Self {
            sequence_id: event.sequence_id,
            timestamp_ns: event.timestamp_ns,
            side: event.side.as_str(),
            kind: event.kind.as_str(),
            price: event.price,
            size: event.size,
        }
    }
}

/// One CSV row as read; side and kind are matched case-insensitively
#[derive(Deserialize)]
struct CsvRecord {
    sequence_id: u64,
    timestamp_ns: u64,
    side: String,
    kind: String,
    price: f64,
    size: u64,
}

impl CsvRecord {
    fn into_event(self) -> Result<MarketEvent, String> {
        let side = parse_side(&self.side).ok_or_else(|| format!("unknown side {:?}", self.side))?;
        let kind = parse_kind(&self.kind).ok_or_else(|| format!("unknown kind {:?}", self.kind))?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!("price must be finite and non-negative (got {})", self.price));
        }
        Ok(MarketEvent::new(self.sequence_id, self.timestamp_ns, side, self.price, self.size, kind))
    }
}

fn parse_error(file: &str, line: u64, reason: impl Into<String>) -> ReplayError {
    ReplayError::Parse {
        file: file.to_string(),
        line: line as usize,
        reason: reason.into(),
    }
}

/// Write the header and one row per event
///
/// Floats use the shortest round-trip form, so a written file reads back
/// bit-identical and the byte stream is a canonical encoding of the events.
pub fn write_events<W: Write>(writer: W, events: &[MarketEvent]) -> Result<W, csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    for event in events {
        csv.serialize(CsvRow::from(event))?;
    }
    if events.is_empty() {
        csv.write_record(CSV_HEADER.split(','))?;
    }
    csv.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

/// Parse events from any reader; `name` labels errors
///
/// Blank lines and `#` comment lines are skipped, fields are trimmed.
pub fn parse_events_csv<R: Read>(reader: R, name: &str) -> Result<Vec<MarketEvent>, ReplayError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let headers = csv
        .headers()
        .map_err(|e| parse_error(name, e.position().map_or(0, |p| p.line()), e.to_string()))?
        .clone();
    if headers.is_empty() {
        return Err(parse_error(name, 0, "missing header"));
    }
    if !headers.iter().eq(CSV_HEADER.split(',')) {
        let line = headers.position().map_or(1, |p| p.line());
        return Err(parse_error(name, line, format!("expected header {:?}", CSV_HEADER)));
    }

    let mut events = Vec::new();
    let mut record = csv::StringRecord::new();
    loop {
        match csv.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => return Err(parse_error(name, e.position().map_or(0, |p| p.line()), e.to_string())),
        }
        let line = record.position().map_or(0, |p| p.line());
        let row: CsvRecord = record
            .deserialize(Some(&headers))
            .map_err(|e| parse_error(name, line, e.to_string()))?;
        events.push(row.into_event().map_err(|reason| parse_error(name, line, reason))?);
    }

    Ok(events)
}

pub fn read_events_csv(path: &Path) -> Result<Vec<MarketEvent>, ReplayError> {
    let file = File::open(path).map_err(|e| ReplayError::io(path, e))?;
    let events = parse_events_csv(BufReader::new(file), &path.display().to_string())?;
    tracing::info!("Loaded {} events from {}", events.len(), path.display());
    Ok(events)
}

pub fn write_events_csv(path: &Path, events: &[MarketEvent]) -> Result<(), ReplayError> {
    let file = File::create(path).map_err(|e| ReplayError::io(path, e))?;
    let mut writer = write_events(BufWriter::new(file), events).map_err(|e| ReplayError::Csv {
        file: path.display().to_string(),
        source: e,
    })?;
    writer.flush().map_err(|e| ReplayError::io(path, e))?;

    tracing::info!("Wrote {} events to {}", events.len(), path.display());
    Ok(())
}
