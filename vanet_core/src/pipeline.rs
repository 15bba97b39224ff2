//! Per-step orchestration: snapshot in, ordered records out.
//!
//! ```text
//! Snapshot ─► CollisionEngine ─► candidates ─┬─► CollisionRecord × n ─┐
//!                                            └─► DisseminationEngine ─┴─► MessageRecord × m ─► EventSink
//! ```
//!
//! Every record of a step carries the same time label, taken from the clock
//! before it advances. Collision records are emitted before message records.

use crate::clock::SimulationClock;
use crate::collision::{CollisionCandidate, CollisionEngine};
use crate::config::VanetConfig;
use crate::dissemination::{DisseminationEngine, MessageEvent};
use crate::error::ConfigError;
use crate::metrics::{RunStats, StepMetrics};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace, warn};
use vanet_env::{CollisionRecord, EventSink, MessageRecord, SimRecord, Snapshot, SnapshotSource};

/// Everything one call to [`WarningPipeline::step`] produced.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Step index the records were labelled with
    pub step: u64,
    pub time_label: String,
    pub candidates: Vec<CollisionCandidate>,
    pub events: Vec<MessageEvent>,
    pub metrics: StepMetrics,
}

/// Collision screening, warning dissemination and record emission for a stream of snapshots.
pub struct WarningPipeline<S, R = ChaCha8Rng> {
    collisions: CollisionEngine,
    dissemination: DisseminationEngine<R>,
    clock: SimulationClock,
    sink: S,
    stats: RunStats,
}

impl<S: EventSink> WarningPipeline<S, ChaCha8Rng> {
    /// Builds both engines and the clock from one validated config.
    pub fn new(config: &VanetConfig, seed: u64, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(
            CollisionEngine::new(config.collision())?,
            DisseminationEngine::seeded(config.dissemination(), seed)?,
            config.clock()?,
            sink,
        ))
    }
}

impl<S: EventSink, R: Rng> WarningPipeline<S, R> {
    pub fn from_parts(
        collisions: CollisionEngine,
        dissemination: DisseminationEngine<R>,
        clock: SimulationClock,
        sink: S,
    ) -> Self {
        Self {
            collisions,
            dissemination,
            clock,
            sink,
            stats: RunStats::default(),
        }
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Processes one snapshot and advances the clock.
    ///
    /// Sink failures are logged and counted; they never abort the step.
    pub fn step(&mut self, snapshot: &Snapshot) -> StepReport {
        let step = self.clock.step();
        let time_label = self.clock.label();

        let candidates = self.collisions.evaluate(snapshot);
        let events = self.dissemination.disseminate(snapshot, &candidates);
        let mut metrics = StepMetrics::observe(snapshot.len(), &candidates, &events);

        for candidate in &candidates {
            let record = SimRecord::Collision(CollisionRecord {
                time_label: time_label.clone(),
                agent_a: candidate.pair.first().clone(),
                agent_b: candidate.pair.second().clone(),
                ttc: candidate.ttc,
                distance: candidate.distance,
                severity: candidate.severity,
            });
            metrics.sink_errors += self.emit(record);
        }

        for event in &events {
            let record = SimRecord::Message(MessageRecord {
                time_label: time_label.clone(),
                sender: event.sender.clone(),
                receiver: event.receiver.clone(),
                kind: event.kind,
                severity: event.severity,
                distance: event.distance,
                delivered: event.delivered,
            });
            metrics.sink_errors += self.emit(record);
        }

        debug!(
            "[{}] step {}: {} agents, {} candidates, {}/{} messages delivered",
            time_label,
            step,
            metrics.agents,
            candidates.len(),
            metrics.messages().delivered,
            metrics.messages().attempted,
        );

        self.stats.absorb(&metrics);
        self.clock.tick();

        StepReport {
            step,
            time_label,
            candidates,
            events,
            metrics,
        }
    }

    /// Pulls snapshots until the source runs dry, an empty snapshot arrives,
    /// or `max_steps` have been processed. Returns the number of steps run.
    pub fn run<D: SnapshotSource + ?Sized>(&mut self, source: &mut D, max_steps: u64) -> u64 {
        let mut processed = 0;
        while processed < max_steps {
            let Some(snapshot) = source.next_snapshot() else {
                debug!("Snapshot source exhausted after {} steps", processed);
                break;
            };
            if snapshot.is_empty() {
                debug!("Empty snapshot at step {}, stopping", self.clock.step());
                break;
            }
            self.step(&snapshot);
            processed += 1;
        }
        processed
    }

    /// Emits the end-of-stream marker.
    pub fn finish(&mut self) -> &RunStats {
        if self.emit(SimRecord::End) > 0 {
            self.stats.sink_errors += 1;
        }
        &self.stats
    }

    /// Returns the number of failures (0 or 1).
    fn emit(&mut self, record: SimRecord) -> u64 {
        trace!("emit {:?}", record);
        match self.sink.accept(record) {
            Ok(()) => 0,
            Err(e) => {
                warn!("Sink rejected record: {}", e);
                1
            }
        }
    }
}
