//! Lock-Free Ring Buffer for Event Capture
//!
//! SPSC (Single Producer, Single Consumer) ring buffer connecting the input
//! hook callback to the collector thread that persists events.
//!
//! - Producer (hook callback): never blocks; a full buffer drops the event
//!   and counts it rather than stalling the hook.
//! - Consumer (collector thread): drains in batches and flushes to the
//!   session event log.
//!
//! Built on the `rtrb` crate; this wrapper adds drop accounting so capture
//! loss is observable.

use super::types::RawEvent;
use rtrb::RingBuffer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default ring buffer capacity (must be a power of 2)
pub const DEFAULT_CAPACITY: usize = 8192;

/// Shared counters for monitoring capture health.
#[derive(Debug, Default)]
pub struct RingBufferStats {
    /// Events successfully pushed
    pub events_pushed: AtomicU64,
    /// Events dropped because the buffer was full
    pub events_dropped: AtomicU64,
    /// Events consumed by the collector
    pub events_consumed: AtomicU64,
}

/// Event ring buffer factory.
pub struct EventRingBuffer;

impl EventRingBuffer {
    /// Create a buffer with the given capacity and split it into its
    /// producer and consumer halves.
    pub fn with_capacity(capacity: usize) -> (EventProducer, EventConsumer) {
        let (producer, consumer) = RingBuffer::new(capacity);
        let stats = Arc::new(RingBufferStats::default());
        (
            EventProducer {
                inner: producer,
                stats: Arc::clone(&stats),
            },
            EventConsumer {
                inner: consumer,
                stats,
            },
        )
    }
}

/// Producer half, owned by the hook callback.
pub struct EventProducer {
    inner: rtrb::Producer<RawEvent>,
    stats: Arc<RingBufferStats>,
}

impl EventProducer {
    /// Push an event without blocking.
    ///
    /// Returns `false` if the buffer was full and the event was dropped.
    pub fn push(&mut self, event: RawEvent) -> bool {
        match self.inner.push(event) {
            Ok(()) => {
                self.stats.events_pushed.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => {
                self.stats.events_dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Number of events dropped so far.
    pub fn dropped_count(&self) -> u64 {
        self.stats.events_dropped.load(Ordering::Relaxed)
    }
}

/// Consumer half, owned by the collector thread.
pub struct EventConsumer {
    inner: rtrb::Consumer<RawEvent>,
    stats: Arc<RingBufferStats>,
}

impl EventConsumer {
    /// Pop a single event, if any.
    pub fn pop(&mut self) -> Option<RawEvent> {
        let event = self.inner.pop().ok()?;
        self.stats.events_consumed.fetch_add(1, Ordering::Relaxed);
        Some(event)
    }

    /// Pop up to `max` events.
    pub fn pop_batch(&mut self, max: usize) -> Vec<RawEvent> {
        let mut batch = Vec::new();
        while batch.len() < max {
            match self.pop() {
                Some(event) => batch.push(event),
                None => break,
            }
        }
        batch
    }

    /// Whether the buffer currently holds no events.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Snapshot of (pushed, dropped, consumed) counters.
    pub fn stats(&self) -> (u64, u64, u64) {
        (
            self.stats.events_pushed.load(Ordering::Relaxed),
            self.stats.events_dropped.load(Ordering::Relaxed),
            self.stats.events_consumed.load(Ordering::Relaxed),
        )
    }
}
