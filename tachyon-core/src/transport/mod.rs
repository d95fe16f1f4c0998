//! Inter-stage transport
//!
//! - `ring`: bounded lock-free SPSC ring between pinned stage threads
//! - `wire`: fixed 64-byte versioned record for cross-process hand-off

pub mod ring;
pub mod wire;

pub use ring::{Consumer, Producer, SpscRing};
pub use wire::{WireEvent, LAYOUT_VERSION, WIRE_EVENT_SIZE};
