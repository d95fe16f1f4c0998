//! Lock-Free SPSC Ring
//!
//! Bounded single-producer / single-consumer ring of fixed-size records.
//!
//! ## Memory ordering
//! - `tail` is written only by the producer (Release), read by the consumer (Acquire)
//! - `head` is written only by the consumer (Release), read by the producer (Acquire)
//! - Both counters increase monotonically; slot index is `counter & mask`
//!
//! Each side keeps a private copy of its own counter plus a cached copy of the
//! other side's counter, and only touches the shared cache line when the cached
//! value says the ring is full (producer) or empty (consumer).

use crate::core::ConfigError;
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

struct Shared<T> {
    /// Next slot to read (consumer owned)
    head: CachePadded<AtomicU64>,
    /// Next slot to write (producer owned)
    tail: CachePadded<AtomicU64>,
    /// Set once the producer is dropped
    closed: AtomicBool,
    mask: u64,
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// SAFETY: slots are only accessed by the single producer (between head and
// tail + capacity) or the single consumer (between head and tail), and the
// head/tail handoff is Release/Acquire.
unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send> Sync for Shared<T> {}

impl<T> Shared<T> {
    #[inline(always)]
    fn capacity(&self) -> u64 {
        self.mask + 1
    }

    #[inline(always)]
    fn slot(&self, index: u64) -> *mut MaybeUninit<T> {
        // mask keeps the index inside the buffer
        self.buffer[(index & self.mask) as usize].get()
    }

    #[inline]
    fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.saturating_sub(head) as usize
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        for index in head..tail {
            // SAFETY: every slot in [head, tail) holds an initialized value
            // that was never popped.
            unsafe { (*self.slot(index)).assume_init_drop() };
        }
    }
}

/// Owner of a freshly built ring, before it is split into its two ends
pub struct SpscRing<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send> SpscRing<T> {
    /// Allocate a ring with `capacity` slots
    ///
    /// Capacity must be a non-zero power of two. This is the only allocation
    /// the ring ever makes.
    pub fn with_capacity(capacity: usize) -> Result<Self, ConfigError> {
        let capacity = ConfigError::require_power_of_two("ring capacity", capacity)?;

        let buffer = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            shared: Arc::new(Shared {
                head: CachePadded::new(AtomicU64::new(0)),
                tail: CachePadded::new(AtomicU64::new(0)),
                closed: AtomicBool::new(false),
                mask: capacity as u64 - 1,
                buffer,
            }),
        })
    }

    /// Split into the unique producer and consumer ends
    pub fn split(self) -> (Producer<T>, Consumer<T>) {
        let producer = Producer {
            shared: Arc::clone(&self.shared),
            tail: 0,
            cached_head: 0,
        };
        let consumer = Consumer {
            shared: self.shared,
            head: 0,
            cached_tail: 0,
        };
        (producer, consumer)
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity() as usize
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Writing end of a ring
pub struct Producer<T> {
    shared: Arc<Shared<T>>,
    tail: u64,
    cached_head: u64,
}

impl<T: Send> Producer<T> {
    /// Push without blocking
    ///
    /// Returns the value back when the ring is full so the caller decides
    /// whether to drop, count or retry.
    #[inline(always)]
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        let capacity = self.shared.capacity();

        if self.tail.wrapping_sub(self.cached_head) >= capacity {
            self.cached_head = self.shared.head.load(Ordering::Acquire);
            if self.tail.wrapping_sub(self.cached_head) >= capacity {
                return Err(value);
            }
        }

        // SAFETY: slot `tail` is outside [head, tail) so the consumer does not
        // read it until the Release store below publishes it.
        unsafe { (*self.shared.slot(self.tail)).write(value) };
        self.tail += 1;
        self.shared.tail.store(self.tail, Ordering::Release);
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity() as usize
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
    }
}

/// Reading end of a ring
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
    head: u64,
    cached_tail: u64,
}

impl<T: Send> Consumer<T> {
    /// Pop the oldest record, if any
    #[inline(always)]
    pub fn try_pop(&mut self) -> Option<T> {
        if self.head == self.cached_tail {
            self.cached_tail = self.shared.tail.load(Ordering::Acquire);
            if self.head == self.cached_tail {
                return None;
            }
        }

        // SAFETY: slot `head` is in [head, tail), written and published by the
        // producer. Advancing head below hands it back.
        let value = unsafe { (*self.shared.slot(self.head)).assume_init_read() };
        self.head += 1;
        self.shared.head.store(self.head, Ordering::Release);
        Some(value)
    }

    /// True once the producer has been dropped
    ///
    /// Records pushed before the drop remain poppable; drain with `try_pop`
    /// after observing this.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity() as usize
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
