//! Bounded, non-blocking record channel between the simulation loop and its consumers.
//!
//! Built on `tokio::sync::broadcast`: sending never waits, and a receiver that
//! falls behind loses the *oldest* buffered records.
//! The producer is never slowed down by a slow display or file writer.
//!
//! Tokio sizes its ring buffer to a power of two, so each [`RecordReceiver`]
//! trims its backlog to the requested capacity itself whenever it reads.

use crate::error::EnvError;
use crate::records::SimRecord;
use crate::sink::EventSink;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

/// Largest accepted per-receiver capacity.
pub const MAX_CHANNEL_CAPACITY: usize = 1 << 20;

/// Creates a connected sink/receiver pair.
///
/// `capacity` is the number of records a receiver keeps before the oldest are
/// dropped. It must lie in `1..=MAX_CHANNEL_CAPACITY`.
pub fn record_channel(capacity: usize) -> Result<(ChannelSink, RecordReceiver), EnvError> {
    if capacity == 0 || capacity > MAX_CHANNEL_CAPACITY {
        return Err(EnvError::InvalidCapacity {
            requested: capacity,
            max: MAX_CHANNEL_CAPACITY,
        });
    }

    let (tx, rx) = broadcast::channel(capacity);
    Ok((ChannelSink { tx, capacity }, RecordReceiver::new(rx, capacity)))
}

/// Producer half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: broadcast::Sender<SimRecord>,
    capacity: usize,
}

impl ChannelSink {
    /// Attaches an additional consumer that sees records sent from now on.
    pub fn subscribe(&self) -> RecordReceiver {
        RecordReceiver::new(self.tx.subscribe(), self.capacity)
    }

    /// Number of live consumers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl EventSink for ChannelSink {
    fn accept(&mut self, record: SimRecord) -> Result<(), EnvError> {
        self.tx
            .send(record)
            .map(|_| ())
            .map_err(|_| EnvError::sink_closed("no active record receivers"))
    }
}

/// Consumer half. Tracks how many records were dropped before it read them.
#[derive(Debug)]
pub struct RecordReceiver {
    rx: broadcast::Receiver<SimRecord>,
    capacity: usize,
    dropped: u64,
}

impl RecordReceiver {
    fn new(rx: broadcast::Receiver<SimRecord>, capacity: usize) -> Self {
        Self {
            rx,
            capacity,
            dropped: 0,
        }
    }

    fn note_lag(&mut self, n: u64) {
        warn!("Record consumer lagged, {} oldest records dropped", n);
        self.dropped += n;
    }

    /// Skips pending records until at most `capacity` remain.
    fn trim(&mut self) {
        let mut skipped = 0;
        while self.rx.len() > self.capacity {
            match self.rx.try_recv() {
                Ok(_) => skipped += 1,
                Err(TryRecvError::Lagged(n)) => skipped += n,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if skipped > 0 {
            self.note_lag(skipped);
        }
    }

    /// Records lost to overflow so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Returns the next buffered record without waiting.
    pub fn try_next(&mut self) -> Option<SimRecord> {
        self.trim();
        loop {
            match self.rx.try_recv() {
                Ok(record) => return Some(record),
                Err(TryRecvError::Lagged(n)) => self.note_lag(n),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Waits for the next record on the current thread.
    ///
    /// Returns `None` once every sender is gone and the buffer is drained.
    /// Must not be called from inside an async runtime.
    pub fn blocking_next(&mut self) -> Option<SimRecord> {
        self.trim();
        loop {
            match self.rx.blocking_recv() {
                Ok(record) => return Some(record),
                Err(RecvError::Lagged(n)) => self.note_lag(n),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Async variant of [`blocking_next`](Self::blocking_next).
    pub async fn next(&mut self) -> Option<SimRecord> {
        self.trim();
        loop {
            match self.rx.recv().await {
                Ok(record) => return Some(record),
                Err(RecvError::Lagged(n)) => self.note_lag(n),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Drains everything currently buffered.
    pub fn drain(&mut self) -> Vec<SimRecord> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::CollisionRecord;
    use crate::types::Severity;

    fn record(i: usize) -> SimRecord {
        SimRecord::Collision(CollisionRecord {
            time_label: format!("00:00.{}", i),
            agent_a: "a".into(),
            agent_b: "b".into(),
            ttc: 1.5,
            distance: 10.0,
            severity: Severity::Medium,
        })
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let (mut sink, mut rx) = record_channel(4).unwrap();

        // Producer never blocks even though nobody is reading
        for i in 0..6 {
            sink.accept(record(i)).unwrap();
        }

        let received = rx.drain();
        assert_eq!(rx.dropped(), 2);
        assert_eq!(received.len(), 4);
        assert_eq!(received[0].time_label(), Some("00:00.2"));
        assert_eq!(received[3].time_label(), Some("00:00.5"));
    }

    #[test]
    fn test_capacity_is_exact() {
        let (mut sink, mut rx) = record_channel(5).unwrap();
        for i in 0..7 {
            sink.accept(record(i)).unwrap();
        }

        let received = rx.drain();
        assert_eq!(rx.dropped(), 2);
        assert_eq!(received.len(), 5);
        assert_eq!(received[0].time_label(), Some("00:00.2"));
        assert_eq!(received[4].time_label(), Some("00:00.6"));
    }

    #[test]
    fn test_capacity_is_exact_past_ring_overflow() {
        // Rounded ring holds 8, receiver keeps 5
        let (mut sink, mut rx) = record_channel(5).unwrap();
        for i in 0..12 {
            sink.accept(record(i)).unwrap();
        }

        let received = rx.drain();
        assert_eq!(rx.dropped(), 7);
        assert_eq!(received.len(), 5);
        assert_eq!(received[0].time_label(), Some("00:00.7"));
    }

    #[test]
    fn test_invalid_capacity_rejected() {
        assert!(matches!(
            record_channel(0),
            Err(EnvError::InvalidCapacity { requested: 0, .. })
        ));
        assert!(matches!(
            record_channel(usize::MAX),
            Err(EnvError::InvalidCapacity { max: MAX_CHANNEL_CAPACITY, .. })
        ));
        assert_eq!(record_channel(1).unwrap().0.capacity(), 1);
    }

    #[test]
    fn test_sink_reports_closed_without_receivers() {
        let (mut sink, rx) = record_channel(8).unwrap();
        drop(rx);

        assert_eq!(sink.receiver_count(), 0);
        assert!(matches!(sink.accept(SimRecord::End), Err(EnvError::SinkClosed(_))));
    }

    #[test]
    fn test_blocking_consumer_thread() {
        let (mut sink, mut rx) = record_channel(64).unwrap();

        let consumer = std::thread::spawn(move || {
            let mut seen = Vec::new();
            while let Some(record) = rx.blocking_next() {
                if record == SimRecord::End {
                    break;
                }
                seen.push(record);
            }
            seen
        });

        for i in 0..10 {
            sink.accept(record(i)).unwrap();
        }
        sink.accept(SimRecord::End).unwrap();

        let seen = consumer.join().unwrap();
        assert_eq!(seen.len(), 10);
        assert_eq!(seen[9].time_label(), Some("00:00.9"));
    }

    #[tokio::test]
    async fn test_async_consumer_drains_after_close() {
        let (mut sink, mut rx) = record_channel(16).unwrap();
        let mut late = sink.subscribe();

        sink.accept(record(1)).unwrap();
        sink.accept(record(2)).unwrap();
        drop(sink);

        assert_eq!(rx.next().await, Some(record(1)));
        assert_eq!(rx.next().await, Some(record(2)));
        assert_eq!(rx.next().await, None);

        // A second subscriber sees the same stream
        assert_eq!(late.drain().len(), 2);
    }
}
