//! Zero-overhead pipeline record types
//!
//! All records that cross a stage boundary are `Copy`, fixed-size and
//! heap-free so they can live inside ring slots and scheduler pools.

use std::fmt;

/// Order-flow side
///
/// Single byte enum for minimal size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// Signed direction: +1 for buy, -1 for sell
    #[inline(always)]
    pub const fn sign(self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }

    /// The other side of the book
    #[inline(always)]
    pub const fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Decode from the wire tag
    #[inline]
    pub const fn from_u8(tag: u8) -> Option<Side> {
        match tag {
            0 => Some(Side::Buy),
            1 => Some(Side::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of market event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    Trade = 0,
    Quote = 1,
    Cancel = 2,
}

impl EventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::Trade => "TRADE",
            EventKind::Quote => "QUOTE",
            EventKind::Cancel => "CANCEL",
        }
    }

    #[inline]
    pub const fn from_u8(tag: u8) -> Option<EventKind> {
        match tag {
            0 => Some(EventKind::Trade),
            1 => Some(EventKind::Quote),
            2 => Some(EventKind::Cancel),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable market event produced once by ingestion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketEvent {
    pub sequence_id: u64,
    pub timestamp_ns: u64,
    pub side: Side,
    pub price: f64,
    pub size: u64,
    pub kind: EventKind,
}

impl MarketEvent {
    #[inline(always)]
    pub const fn new(
        sequence_id: u64,
        timestamp_ns: u64,
        side: Side,
        price: f64,
        size: u64,
        kind: EventKind,
    ) -> Self {
        Self {
            sequence_id,
            timestamp_ns,
            side,
            price,
            size,
            kind,
        }
    }

    /// Shorthand for a trade print
    #[inline]
    pub const fn trade(sequence_id: u64, timestamp_ns: u64, side: Side, price: f64, size: u64) -> Self {
        Self::new(sequence_id, timestamp_ns, side, price, size, EventKind::Trade)
    }
}

impl Default for MarketEvent {
    fn default() -> Self {
        Self::new(0, 0, Side::Buy, 0.0, 0, EventKind::Quote)
    }
}

impl fmt::Display for MarketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} px={} sz={}",
            self.kind, self.side, self.price, self.size
        )
    }
}

/// Output of the decision stage, consumed exactly once by the risk gate
///
/// A decision with `size == 0` is a hold: nothing to send.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub timestamp_ns: u64,
    pub side: Side,
    pub price: f64,
    pub size: u64,
    pub signal_strength: f64,
}

impl Decision {
    #[inline(always)]
    pub const fn hold(timestamp_ns: u64, signal_strength: f64) -> Self {
        Self {
            timestamp_ns,
            side: Side::Buy,
            price: 0.0,
            size: 0,
            signal_strength,
        }
    }

    /// True when the decision wants an order
    #[inline(always)]
    pub const fn is_actionable(&self) -> bool {
        self.size > 0
    }

    /// Signed position delta this decision would apply
    #[inline(always)]
    pub fn position_delta(&self) -> Option<i64> {
        i64::try_from(self.size)
            .ok()
            .map(|size| size * self.side.sign())
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_actionable() {
            write!(
                f,
                "{} px={} sz={} strength={}",
                self.side, self.price, self.size, self.signal_strength
            )
        } else {
            write!(f, "HOLD strength={}", self.signal_strength)
        }
    }
}

/// Accepted decision, handed to the order gateway
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Order {
    /// Deterministic id assigned by the risk gate
    pub order_id: u64,
    /// Sequence id of the market event that caused it
    pub sequence_id: u64,
    pub timestamp_ns: u64,
    pub side: Side,
    pub price: f64,
    pub size: u64,
}

impl Default for Order {
    fn default() -> Self {
        Self {
            order_id: 0,
            sequence_id: 0,
            timestamp_ns: 0,
            side: Side::Buy,
            price: 0.0,
            size: 0,
        }
    }
}

impl Order {
    /// Signed position delta this order applied at the gate
    #[inline(always)]
    pub fn position_delta(&self) -> Option<i64> {
        i64::try_from(self.size)
            .ok()
            .map(|size| size * self.side.sign())
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} px={} sz={}",
            self.order_id, self.side, self.price, self.size
        )
    }
}
