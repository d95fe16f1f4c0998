//! Property-based tests for the SPSC ring
//!
//! The ring must behave exactly like a bounded FIFO queue, whatever the
//! interleaving of pushes and pops, and across threads.

use proptest::prelude::*;
use std::collections::VecDeque;
use tachyon::transport::SpscRing;

// ===== SINGLE-THREADED MODEL CHECK =====

/// Property: any op sequence matches a bounded `VecDeque`
///
/// `true` = push the next value, `false` = pop.
#[test]
fn prop_matches_bounded_queue() {
    proptest!(|(log2_cap in 0u32..6, ops in prop::collection::vec(any::<bool>(), 0..500))| {
        let capacity = 1usize << log2_cap;
        let (mut tx, mut rx) = SpscRing::with_capacity(capacity).unwrap().split();
        let mut model = VecDeque::new();
        let mut next = 0u64;

        for push in ops {
            if push {
                let result = tx.try_push(next);
                if model.len() < capacity {
                    prop_assert!(result.is_ok());
                    model.push_back(next);
                } else {
                    prop_assert_eq!(result, Err(next));
                }
                next += 1;
            } else {
                prop_assert_eq!(rx.try_pop(), model.pop_front());
            }
            prop_assert_eq!(rx.len(), model.len());
        }

        // drain what's left, still in order
        while let Some(expected) = model.pop_front() {
            prop_assert_eq!(rx.try_pop(), Some(expected));
        }
        prop_assert!(rx.try_pop().is_none());
    });
}

// ===== CROSS-THREAD FIFO =====

/// Property: every value arrives exactly once, in push order
#[test]
fn prop_cross_thread_fifo() {
    proptest!(ProptestConfig::with_cases(16), |(count in 1u64..20_000, log2_cap in 1u32..8)| {
        let (mut tx, mut rx) = SpscRing::with_capacity(1 << log2_cap).unwrap().split();

        let producer = std::thread::spawn(move || {
            for i in 0..count {
                let mut value = i;
                while let Err(back) = tx.try_push(value) {
                    value = back;
                    std::hint::spin_loop();
                }
            }
        });

        let mut expected = 0u64;
        while expected < count {
            if let Some(value) = rx.try_pop() {
                prop_assert_eq!(value, expected);
                expected += 1;
            } else {
                std::hint::spin_loop();
            }
        }
        producer.join().unwrap();

        prop_assert!(rx.try_pop().is_none());
        prop_assert!(rx.is_closed());
    });
}

#[test]
fn test_zero_capacity_rejected() {
    assert!(SpscRing::<u64>::with_capacity(0).is_err());
    assert!(SpscRing::<u64>::with_capacity(6).is_err());
}
