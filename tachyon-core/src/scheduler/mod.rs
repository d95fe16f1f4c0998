//! Nanosecond Event Scheduler
//!
//! Timing wheel in front of a bounded min-heap, both indexing into one fixed
//! event pool.
//!
//! ## Ordering
//! Events dispatch in `(fire_time_ns, sequence_id)` order. The wheel only
//! buckets events by tick; when time advances through a bucket its events
//! move into the heap, and the heap alone decides dispatch order.
//!
//! ## Placement
//! - `fire_time_ns <= now`: heap, fires on the next `advance`
//! - within the wheel horizon: wheel bucket, O(1) insert and cancel
//! - beyond the horizon: heap directly
//!
//! ## Capacity
//! The pool is allocated once (default 4096 nodes). A full pool rejects the
//! event with `CapacityExceeded`; nothing grows after construction.

mod heap;
mod pool;
mod wheel;

use crate::config::SchedulerConfig;
use crate::core::{CapacityExceeded, ConfigError};
use heap::{BoundedHeap, HeapEntry};
use pool::{EventPool, Location};
use wheel::TimingWheel;

/// An event handed back by `advance`
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent<P> {
    pub fire_time_ns: u64,
    pub sequence_id: u64,
    pub payload: P,
}

/// Cancellation token returned by `schedule`
///
/// Carries the pool slot's generation, so a handle whose event already fired
/// (or was cancelled) never matches a later event reusing the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle {
    index: u32,
    generation: u32,
    sequence_id: u64,
}

impl EventHandle {
    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }
}

pub struct EventScheduler<P> {
    pool: EventPool<P>,
    wheel: TimingWheel,
    heap: BoundedHeap,
    now_ns: u64,
    next_sequence: u64,
    dispatched: u64,
}

impl<P> EventScheduler<P> {
    /// Build a scheduler with its clock at zero
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        Self::with_start_time(config, 0)
    }

    /// Build a scheduler whose clock starts at `start_ns`
    ///
    /// Useful when event timestamps are epoch-based, so the wheel horizon
    /// begins where the events are.
    pub fn with_start_time(config: SchedulerConfig, start_ns: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        tracing::debug!(
            "Event scheduler: {} slots x {}ns, pool {}",
            config.wheel_slots,
            config.slot_width_ns,
            config.pool_capacity
        );

        Ok(Self {
            pool: EventPool::with_capacity(config.pool_capacity),
            wheel: TimingWheel::new(config.wheel_slots, config.slot_width_ns, start_ns),
            heap: BoundedHeap::with_capacity(config.pool_capacity),
            now_ns: start_ns,
            next_sequence: 0,
            dispatched: 0,
        })
    }

    /// Schedule with the next auto-assigned sequence id
    #[inline]
    pub fn schedule(&mut self, payload: P, fire_time_ns: u64) -> Result<EventHandle, CapacityExceeded> {
        let sequence_id = self.next_sequence;
        let handle = self.insert(payload, fire_time_ns, sequence_id)?;
        self.next_sequence = self.next_sequence.saturating_add(1);
        Ok(handle)
    }

    /// Schedule with a caller-supplied sequence id
    ///
    /// Auto-assigned ids stay above every id seen here.
    #[inline]
    pub fn schedule_with_sequence(
        &mut self,
        payload: P,
        fire_time_ns: u64,
        sequence_id: u64,
    ) -> Result<EventHandle, CapacityExceeded> {
        let handle = self.insert(payload, fire_time_ns, sequence_id)?;
        self.reserve_sequence(sequence_id.saturating_add(1));
        Ok(handle)
    }

    /// Move the next auto-assigned sequence id forward to at least `next`
    pub fn reserve_sequence(&mut self, next: u64) {
        self.next_sequence = self.next_sequence.max(next);
    }

    fn insert(&mut self, payload: P, fire_time_ns: u64, sequence_id: u64) -> Result<EventHandle, CapacityExceeded> {
        let index = self
            .pool
            .alloc(fire_time_ns, sequence_id, payload)
            .ok_or(CapacityExceeded {
                capacity: self.pool.capacity(),
            })?;

        let tick = self.wheel.tick_of(fire_time_ns);
        if fire_time_ns > self.now_ns && self.wheel.accepts(tick) {
            self.wheel.link(&mut self.pool, index, tick);
        } else {
            self.pool.node_mut(index).location = Location::Heap;
            self.heap.push(HeapEntry {
                fire_time_ns,
                sequence_id,
                index,
            });
        }

        Ok(EventHandle {
            index,
            generation: self.pool.node(index).generation,
            sequence_id,
        })
    }

    /// Cancel a pending event; false if it already fired or was cancelled
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        if !self.pool.is_live(handle.index, handle.generation) {
            return false;
        }

        match self.pool.node(handle.index).location {
            Location::Wheel(_) => self.wheel.unlink(&mut self.pool, handle.index),
            Location::Heap => {
                self.heap.remove(handle.index);
            }
            Location::Free => return false,
        }
        self.pool.release(handle.index);
        true
    }

    /// Dispatch every event due at or before `now_ns`, in order
    ///
    /// Returns the number of events dispatched. Moving time backwards is a
    /// no-op.
    pub fn advance(&mut self, now_ns: u64, dispatch: &mut impl FnMut(ScheduledEvent<P>)) -> usize {
        if now_ns < self.now_ns {
            return 0;
        }
        self.now_ns = now_ns;

        let tick = self.wheel.tick_of(now_ns);
        self.wheel.drain_through(&mut self.pool, &mut self.heap, tick);

        let mut count = 0;
        while self.heap.peek().is_some_and(|top| top.fire_time_ns <= now_ns) {
            let Some(entry) = self.heap.pop() else {
                break;
            };
            if let Some(payload) = self.pool.release(entry.index) {
                dispatch(ScheduledEvent {
                    fire_time_ns: entry.fire_time_ns,
                    sequence_id: entry.sequence_id,
                    payload,
                });
                count += 1;
            }
        }

        self.dispatched += count as u64;
        count
    }

    /// `advance` into a fresh `Vec` (allocates; for replay and tests)
    pub fn advance_collect(&mut self, now_ns: u64) -> Vec<ScheduledEvent<P>> {
        let mut out = Vec::new();
        self.advance(now_ns, &mut |event| out.push(event));
        out
    }

    /// Fire time of the earliest pending event
    pub fn next_fire_time(&self) -> Option<u64> {
        let heap_min = self.heap.peek().map(|e| e.fire_time_ns);
        let wheel_min = self.wheel.earliest(&self.pool).map(|(fire, _)| fire);
        match (heap_min, wheel_min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn pending(&self) -> usize {
        self.pool.in_use()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn now_ns(&self) -> u64 {
        self.now_ns
    }

    /// Total events dispatched since construction
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SchedulerConfig {
        SchedulerConfig {
            wheel_slots: 16,
            slot_width_ns: 100,
            pool_capacity: 8,
        }
    }

    fn fired<P: Clone>(events: &[ScheduledEvent<P>]) -> Vec<P> {
        events.iter().map(|e| e.payload.clone()).collect()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut cfg = small_config();
        cfg.wheel_slots = 10;
        assert!(EventScheduler::<u8>::new(cfg).is_err());

        let mut cfg = small_config();
        cfg.slot_width_ns = 0;
        assert!(EventScheduler::<u8>::new(cfg).is_err());

        let mut cfg = small_config();
        cfg.pool_capacity = 0;
        assert!(EventScheduler::<u8>::new(cfg).is_err());
    }

    #[test]
    fn test_tie_break_by_sequence() {
        let mut sched = EventScheduler::new(SchedulerConfig::default()).unwrap();
        sched.schedule_with_sequence("a", 5_000, 0).unwrap();
        sched.schedule_with_sequence("c", 3_000, 2).unwrap();
        sched.schedule_with_sequence("b", 3_000, 1).unwrap();
        sched.schedule_with_sequence("d", 9_000, 3).unwrap();

        let out = sched.advance_collect(10_000);
        assert_eq!(fired(&out), vec!["b", "c", "a", "d"]);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_only_due_events_fire() {
        let mut sched = EventScheduler::new(small_config()).unwrap();
        sched.schedule(1, 150).unwrap();
        sched.schedule(2, 250).unwrap();

        assert_eq!(fired(&sched.advance_collect(200)), vec![1]);
        assert_eq!(sched.next_fire_time(), Some(250));
        assert_eq!(fired(&sched.advance_collect(250)), vec![2]);
        assert_eq!(sched.next_fire_time(), None);
    }

    #[test]
    fn test_same_tick_after_drain() {
        let mut sched = EventScheduler::new(small_config()).unwrap();
        sched.advance_collect(110);
        sched.schedule('x', 150).unwrap();
        assert!(sched.advance_collect(140).is_empty());
        assert_eq!(fired(&sched.advance_collect(150)), vec!['x']);
    }

    #[test]
    fn test_past_event_fires_next_advance() {
        let mut sched = EventScheduler::new(small_config()).unwrap();
        sched.advance_collect(1_000);
        sched.schedule("late", 10).unwrap();
        let out = sched.advance_collect(1_000);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].fire_time_ns, 10);
    }

    #[test]
    fn test_backwards_advance_is_noop() {
        let mut sched = EventScheduler::new(small_config()).unwrap();
        sched.schedule(1, 500).unwrap();
        sched.advance_collect(400);
        assert!(sched.advance_collect(100).is_empty());
        assert_eq!(sched.now_ns(), 400);
        assert_eq!(sched.pending(), 1);
    }

    #[test]
    fn test_beyond_horizon() {
        // horizon = 16 * 100ns
        let mut sched = EventScheduler::new(small_config()).unwrap();
        sched.schedule("far", 50_000).unwrap();
        sched.schedule("near", 300).unwrap();
        sched.schedule("wrap", 1_650).unwrap();

        assert_eq!(fired(&sched.advance_collect(1_000)), vec!["near"]);
        assert_eq!(fired(&sched.advance_collect(2_000)), vec!["wrap"]);
        assert_eq!(sched.next_fire_time(), Some(50_000));
        assert_eq!(fired(&sched.advance_collect(60_000)), vec!["far"]);
    }

    #[test]
    fn test_wheel_wraps_many_revolutions() {
        let mut sched = EventScheduler::new(small_config()).unwrap();
        let mut now = 0;
        for i in 0..200u64 {
            let fire = now + 250;
            sched.schedule(i, fire).unwrap();
            now = fire;
            assert_eq!(fired(&sched.advance_collect(now)), vec![i]);
        }
    }

    #[test]
    fn test_cancel_wheel_and_heap() {
        let mut sched = EventScheduler::new(small_config()).unwrap();
        let near = sched.schedule("near", 200).unwrap();
        let far = sched.schedule("far", 100_000).unwrap();
        sched.schedule("keep", 300).unwrap();

        assert!(sched.cancel(near));
        assert!(sched.cancel(far));
        assert!(!sched.cancel(near));
        assert_eq!(sched.pending(), 1);
        assert_eq!(fired(&sched.advance_collect(200_000)), vec!["keep"]);
    }

    #[test]
    fn test_stale_handle_never_cancels_reused_slot() {
        let cfg = SchedulerConfig {
            pool_capacity: 1,
            ..small_config()
        };
        let mut sched = EventScheduler::new(cfg).unwrap();
        let old = sched.schedule(1, 100).unwrap();
        sched.advance_collect(100);

        let fresh = sched.schedule(2, 200).unwrap();
        assert!(!sched.cancel(old));
        assert_eq!(sched.pending(), 1);
        assert!(sched.cancel(fresh));
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut sched = EventScheduler::new(small_config()).unwrap();
        for i in 0..8 {
            sched.schedule(i, 100 + i as u64).unwrap();
        }
        let err = sched.schedule(99, 500).unwrap_err();
        assert_eq!(err.capacity, 8);

        sched.advance_collect(100);
        assert!(sched.schedule(99, 500).is_ok());
    }

    #[test]
    fn test_auto_sequence_stays_ahead() {
        let mut sched = EventScheduler::new(small_config()).unwrap();
        sched.schedule_with_sequence((), 100, 41).unwrap();
        let h = sched.schedule((), 100).unwrap();
        assert_eq!(h.sequence_id(), 42);
    }

    #[test]
    fn test_start_time_moves_horizon() {
        let start = 1_700_000_000_000_000_000;
        let mut sched = EventScheduler::with_start_time(small_config(), start).unwrap();
        sched.schedule("a", start + 300).unwrap();
        sched.schedule("b", start + 100).unwrap();
        assert_eq!(sched.next_fire_time(), Some(start + 100));
        assert_eq!(fired(&sched.advance_collect(start + 1_000)), vec!["b", "a"]);
        assert_eq!(sched.dispatched(), 2);
    }
}
