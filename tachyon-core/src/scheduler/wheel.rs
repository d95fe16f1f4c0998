//! Single-level timing wheel
//!
//! `slots` buckets of `slot_width_ns` each. A bucket holds the events of
//! exactly one tick: the wheel only accepts ticks in
//! `[drained_tick, drained_tick + slots)`, so no two live ticks share a slot.
//! Buckets are intrusive doubly linked lists through the event pool.

use super::heap::{BoundedHeap, HeapEntry};
use super::pool::{EventPool, Location, NIL};

pub(crate) struct TimingWheel {
    heads: Vec<u32>,
    mask: u64,
    slot_width_ns: u64,
    /// First tick whose bucket has not been moved to the heap yet
    drained_tick: u64,
}

impl TimingWheel {
    /// `slots` must be a power of two and `slot_width_ns` non-zero
    ///
    /// The horizon starts at the tick containing `start_ns`.
    pub fn new(slots: usize, slot_width_ns: u64, start_ns: u64) -> Self {
        Self {
            heads: vec![NIL; slots],
            mask: slots as u64 - 1,
            slot_width_ns,
            drained_tick: start_ns / slot_width_ns,
        }
    }

    #[inline(always)]
    pub fn tick_of(&self, time_ns: u64) -> u64 {
        time_ns / self.slot_width_ns
    }

    #[inline(always)]
    fn slots(&self) -> u64 {
        self.mask + 1
    }

    /// True if an event due at `tick` can be linked into the wheel
    #[inline(always)]
    pub fn accepts(&self, tick: u64) -> bool {
        tick >= self.drained_tick && tick - self.drained_tick < self.slots()
    }

    /// Link a node into the bucket for `tick` (caller checked `accepts`)
    #[inline]
    pub fn link<P>(&mut self, pool: &mut EventPool<P>, index: u32, tick: u64) {
        let slot = (tick & self.mask) as u32;
        let head = self.heads[slot as usize];

        if head != NIL {
            pool.node_mut(head).prev = index;
        }
        let node = pool.node_mut(index);
        node.next = head;
        node.prev = NIL;
        node.location = Location::Wheel(slot);
        self.heads[slot as usize] = index;
    }

    /// Unlink a node from whatever bucket holds it
    #[inline]
    pub fn unlink<P>(&mut self, pool: &mut EventPool<P>, index: u32) {
        let (slot, prev, next) = {
            let node = pool.node(index);
            match node.location {
                Location::Wheel(slot) => (slot, node.prev, node.next),
                _ => return,
            }
        };

        if prev == NIL {
            self.heads[slot as usize] = next;
        } else {
            pool.node_mut(prev).next = next;
        }
        if next != NIL {
            pool.node_mut(next).prev = prev;
        }

        let node = pool.node_mut(index);
        node.next = NIL;
        node.prev = NIL;
    }

    /// Move every bucket up to and including `tick` into the heap
    ///
    /// Visits at most `slots` buckets no matter how far time jumps.
    pub fn drain_through<P>(&mut self, pool: &mut EventPool<P>, heap: &mut BoundedHeap, tick: u64) {
        if tick < self.drained_tick {
            return;
        }

        let span = (tick - self.drained_tick).saturating_add(1).min(self.slots());
        for t in self.drained_tick..self.drained_tick.saturating_add(span) {
            let slot = (t & self.mask) as usize;
            let mut cursor = std::mem::replace(&mut self.heads[slot], NIL);

            while cursor != NIL {
                let node = pool.node_mut(cursor);
                let next = node.next;
                node.next = NIL;
                node.prev = NIL;
                node.location = Location::Heap;
                let entry = HeapEntry {
                    fire_time_ns: node.fire_time_ns,
                    sequence_id: node.sequence_id,
                    index: cursor,
                };
                // heap is sized to the pool, never full here
                heap.push(entry);
                cursor = next;
            }
        }

        self.drained_tick = tick.saturating_add(1);
    }

    /// Earliest `(fire_time_ns, sequence_id)` held by the wheel
    pub fn earliest<P>(&self, pool: &EventPool<P>) -> Option<(u64, u64)> {
        for t in self.drained_tick..self.drained_tick.saturating_add(self.slots()) {
            let mut cursor = self.heads[(t & self.mask) as usize];
            let mut best: Option<(u64, u64)> = None;

            while cursor != NIL {
                let node = pool.node(cursor);
                let key = (node.fire_time_ns, node.sequence_id);
                if best.map_or(true, |b| key < b) {
                    best = Some(key);
                }
                cursor = node.next;
            }

            if best.is_some() {
                return best;
            }
        }
        None
    }
}
