//! Live pipeline end-to-end over real threads
//!
//! Feed, three stage threads and an order consumer all run concurrently.
//! Whatever interleaving the OS picks, every emitted order reaches the
//! consumer and the shared position never leaves the limit.

use crossbeam_utils::Backoff;
use std::sync::Arc;
use std::thread;
use tachyon::config::PipelineConfig;
use tachyon::replay::SyntheticSource;
use tachyon::transport::Consumer;
use tachyon::{LivePipeline, Order, RiskState};

fn drain_orders(mut orders: Consumer<Order>) -> Vec<Order> {
    let backoff = Backoff::new();
    let mut received = Vec::new();
    loop {
        match orders.try_pop() {
            Some(order) => {
                received.push(order);
                backoff.reset();
            }
            None if orders.is_closed() => {
                // the producer may have pushed between the pop and the check
                while let Some(order) = orders.try_pop() {
                    received.push(order);
                }
                return received;
            }
            None => backoff.snooze(),
        }
    }
}

fn config(limit: i64) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.risk.position_limit = limit;
    config.transport.egress_capacity = 1 << 16;
    config
}

#[test]
fn test_orders_match_position() {
    const EVENTS: usize = 20_000;
    const LIMIT: i64 = 50;

    let config = config(LIMIT);
    let risk = Arc::new(RiskState::from_config(&config.risk));
    let (pipeline, mut feed, orders) = LivePipeline::start(&config, Arc::clone(&risk)).unwrap();

    let consumer = thread::spawn(move || drain_orders(orders));

    for event in SyntheticSource::new(7, EVENTS).generate() {
        while !feed.publish(event) {
            std::hint::spin_loop();
        }
    }
    drop(feed);

    let stats = pipeline.gate_stats();
    let metrics = pipeline.shutdown().unwrap();
    let received = consumer.join().unwrap();

    assert_eq!(metrics.events_ingested, EVENTS as u64);
    assert_eq!(metrics.intensity_updates, EVENTS as u64);
    assert_eq!(metrics.egress_dropped, 0);
    assert_eq!(received.len() as u64, metrics.orders_emitted);

    let signed: i64 = received.iter().map(|o| o.side.sign() * o.size as i64).sum();
    assert_eq!(risk.position(), signed);
    assert!(risk.position().abs() <= LIMIT);
    assert!(stats.accepted <= metrics.orders_emitted);

    // gate assigns order ids in acceptance order
    assert!(received.windows(2).all(|w| w[0].order_id < w[1].order_id));
}

#[test]
fn test_halted_risk_emits_nothing() {
    let config = config(1_000);
    let risk = Arc::new(RiskState::from_config(&config.risk));
    risk.halt();

    let (pipeline, mut feed, orders) = LivePipeline::start(&config, Arc::clone(&risk)).unwrap();
    let consumer = thread::spawn(move || drain_orders(orders));

    for event in SyntheticSource::new(11, 2_000).generate() {
        while !feed.publish(event) {
            std::hint::spin_loop();
        }
    }
    drop(feed);

    let metrics = pipeline.shutdown().unwrap();
    let received = consumer.join().unwrap();

    assert!(received.is_empty());
    assert_eq!(metrics.orders_emitted, 0);
    assert_eq!(risk.position(), 0);
}

#[test]
fn test_shutdown_flag_stops_busy_feed() {
    let config = config(1_000);
    let risk = Arc::new(RiskState::from_config(&config.risk));
    let (pipeline, mut feed, orders) = LivePipeline::start(&config, risk).unwrap();
    let consumer = thread::spawn(move || drain_orders(orders));

    // feed keeps the producer alive; only the flag can stop the stages
    for event in SyntheticSource::new(3, 1_000).generate() {
        feed.publish(event);
    }

    let metrics = pipeline.shutdown().unwrap();
    drop(feed);
    let received = consumer.join().unwrap();

    assert_eq!(metrics.events_ingested + metrics.ingress_dropped, 1_000);
    assert_eq!(received.len() as u64, metrics.orders_emitted);
}
