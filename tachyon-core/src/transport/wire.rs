//! Versioned binary layout for market events
//!
//! `WireEvent` is the record that crosses a process boundary (shared memory,
//! capture files). Layout is fixed: one cache line, little-endian fields at
//! stable offsets, a leading version tag so readers can refuse layouts they
//! do not understand.
//!
//! This module only defines the cross-process layout. The in-process rings
//! carry `MarketEvent` directly and never encode to `WireEvent`.
//!
//! ```text
//! offset  size  field
//!      0     2  version
//!      2     1  side
//!      3     1  kind
//!      4     4  (padding)
//!      8     8  sequence_id
//!     16     8  timestamp_ns
//!     24     8  price (IEEE-754 bits)
//!     32     8  size
//!     40    24  (reserved, zero)
//! ```

use crate::core::{DecodeError, EventKind, MarketEvent, Side};

/// Current layout version
pub const LAYOUT_VERSION: u16 = 1;

/// Encoded size of a `WireEvent`
pub const WIRE_EVENT_SIZE: usize = 64;

/// Fixed 64-byte market event record
///
/// Used at process boundaries only; see the module docs.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C, align(64))]
pub struct WireEvent {
    pub version: u16,
    pub side: u8,
    pub kind: u8,
    _pad0: [u8; 4],
    pub sequence_id: u64,
    pub timestamp_ns: u64,
    pub price: f64,
    pub size: u64,
    _reserved: [u8; 24],
}

const _: () = assert!(std::mem::size_of::<WireEvent>() == WIRE_EVENT_SIZE);
const _: () = assert!(std::mem::align_of::<WireEvent>() == 64);

impl WireEvent {
    /// Encode a market event at the current layout version
    #[inline]
    pub const fn from_event(event: &MarketEvent) -> Self {
        Self {
            version: LAYOUT_VERSION,
            side: event.side as u8,
            kind: event.kind as u8,
            _pad0: [0; 4],
            sequence_id: event.sequence_id,
            timestamp_ns: event.timestamp_ns,
            price: event.price,
            size: event.size,
            _reserved: [0; 24],
        }
    }

    /// Decode back into a market event, validating version and tags
    #[inline]
    pub fn to_event(&self) -> Result<MarketEvent, DecodeError> {
        if self.version != LAYOUT_VERSION {
            return Err(DecodeError::UnsupportedVersion {
                found: self.version,
                expected: LAYOUT_VERSION,
            });
        }
        let side = Side::from_u8(self.side).ok_or(DecodeError::InvalidSide(self.side))?;
        let kind = EventKind::from_u8(self.kind).ok_or(DecodeError::InvalidKind(self.kind))?;

        Ok(MarketEvent::new(
            self.sequence_id,
            self.timestamp_ns,
            side,
            self.price,
            self.size,
            kind,
        ))
    }

    /// Serialize to the little-endian byte layout
    pub fn to_bytes(&self) -> [u8; WIRE_EVENT_SIZE] {
        let mut buf = [0u8; WIRE_EVENT_SIZE];
        buf[0..2].copy_from_slice(&self.version.to_le_bytes());
        buf[2] = self.side;
        buf[3] = self.kind;
        buf[8..16].copy_from_slice(&self.sequence_id.to_le_bytes());
        buf[16..24].copy_from_slice(&self.timestamp_ns.to_le_bytes());
        buf[24..32].copy_from_slice(&self.price.to_bits().to_le_bytes());
        buf[32..40].copy_from_slice(&self.size.to_le_bytes());
        buf
    }

    /// Parse from bytes
    ///
    /// Only length and version are checked here; tag validation happens in
    /// `to_event`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < WIRE_EVENT_SIZE {
            return Err(DecodeError::Truncated {
                len: bytes.len(),
                need: WIRE_EVENT_SIZE,
            });
        }

        let version = u16::from_le_bytes([bytes[0], bytes[1]]);
        if version != LAYOUT_VERSION {
            return Err(DecodeError::UnsupportedVersion {
                found: version,
                expected: LAYOUT_VERSION,
            });
        }

        Ok(Self {
            version,
            side: bytes[2],
            kind: bytes[3],
            _pad0: [0; 4],
            sequence_id: read_u64(bytes, 8),
            timestamp_ns: read_u64(bytes, 16),
            price: f64::from_bits(read_u64(bytes, 24)),
            size: read_u64(bytes, 32),
            _reserved: [0; 24],
        })
    }
}

#[inline(always)]
fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(word)
}
