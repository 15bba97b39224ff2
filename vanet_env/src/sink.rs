//! Collaborator interfaces: where snapshots come from and where records go.

use crate::error::EnvError;
use crate::records::SimRecord;
use crate::types::Snapshot;

/// Consumer of the ordered record stream produced by each step.
///
/// # Implementations
///
/// - **Channel**: [`ChannelSink`](crate::ChannelSink) - bounded, never blocks the producer
/// - **Memory**: [`VecSink`] - collects everything (tests, exports)
/// - **Fan-out**: [`TeeSink`] - feeds two sinks with the same stream
///
/// # Ordering
///
/// Records are handed over in emission order. Within one step that is every
/// collision record first, then every message record.
pub trait EventSink {
    /// Accepts one record.
    ///
    /// # Returns
    /// * `Ok(())` - Record handed off (not necessarily consumed yet)
    /// * `Err(EnvError::SinkClosed)` - Nobody is listening any more
    fn accept(&mut self, record: SimRecord) -> Result<(), EnvError>;

    /// Accepts a batch in order, stopping at the first failure.
    fn accept_all(&mut self, records: Vec<SimRecord>) -> Result<(), EnvError> {
        for record in records {
            self.accept(record)?;
        }
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn accept(&mut self, record: SimRecord) -> Result<(), EnvError> {
        (**self).accept(record)
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn accept(&mut self, record: SimRecord) -> Result<(), EnvError> {
        (**self).accept(record)
    }
}

/// Producer of per-step kinematic snapshots (the traffic driver).
pub trait SnapshotSource {
    /// Advances the driver by one step and returns the fresh snapshot.
    ///
    /// `None` means the driver has nothing more to offer and the loop should stop.
    fn next_snapshot(&mut self) -> Option<Snapshot>;
}

/// Sink that keeps every record in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    records: Vec<SimRecord>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[SimRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<SimRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EventSink for VecSink {
    fn accept(&mut self, record: SimRecord) -> Result<(), EnvError> {
        self.records.push(record);
        Ok(())
    }
}

/// Forwards every record to two sinks, first then second.
///
/// Both sinks always see the record; the first failure is reported.
#[derive(Debug, Default)]
pub struct TeeSink<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> TeeSink<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: EventSink, B: EventSink> EventSink for TeeSink<A, B> {
    fn accept(&mut self, record: SimRecord) -> Result<(), EnvError> {
        let first = self.first.accept(record.clone());
        let second = self.second.accept(record);
        first.and(second)
    }
}
