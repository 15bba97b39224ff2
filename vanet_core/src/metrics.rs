//! Run statistics
//! ==============
//!
//! Counters accumulated by the pipeline across steps:
//! - **Collisions**: candidates reported, split by severity tier
//! - **Messages**: attempted and delivered, split by DIRECT / RELAY
//! - **Sink health**: records the sink refused
//!
//! Counters only ever grow; a fresh run starts from `RunStats::default()`.

use crate::collision::CollisionCandidate;
use crate::dissemination::MessageEvent;
use serde::{Deserialize, Serialize};
use vanet_env::{MessageKind, Severity};

/// Attempted/delivered counts for one message kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCounts {
    pub attempted: u64,
    pub delivered: u64,
}

impl DeliveryCounts {
    /// `delivered / attempted`, or `None` before the first attempt.
    pub fn ratio(&self) -> Option<f64> {
        (self.attempted > 0).then(|| self.delivered as f64 / self.attempted as f64)
    }

    fn record(&mut self, delivered: bool) {
        self.attempted += 1;
        if delivered {
            self.delivered += 1;
        }
    }

    fn merge(&mut self, other: &DeliveryCounts) {
        self.attempted += other.attempted;
        self.delivered += other.delivered;
    }
}

/// Counts per severity tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub critical: u64,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
            Severity::Critical => self.critical,
        }
    }

    pub fn total(&self) -> u64 {
        self.low + self.medium + self.high + self.critical
    }

    fn bump(&mut self, severity: Severity) {
        match severity {
            Severity::Low => self.low += 1,
            Severity::Medium => self.medium += 1,
            Severity::High => self.high += 1,
            Severity::Critical => self.critical += 1,
        }
    }

    fn merge(&mut self, other: &SeverityCounts) {
        self.low += other.low;
        self.medium += other.medium;
        self.high += other.high;
        self.critical += other.critical;
    }
}

/// What one step produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    /// Number of agents in the snapshot
    pub agents: usize,

    /// Collision candidates by tier
    pub collisions: SeverityCounts,

    pub direct: DeliveryCounts,
    pub relay: DeliveryCounts,

    /// Records the sink refused this step
    pub sink_errors: u64,
}

impl StepMetrics {
    pub fn observe(agents: usize, candidates: &[CollisionCandidate], events: &[MessageEvent]) -> Self {
        let mut metrics = Self {
            agents,
            ..Default::default()
        };
        for candidate in candidates {
            metrics.collisions.bump(candidate.severity);
        }
        for event in events {
            match event.kind {
                MessageKind::Direct => metrics.direct.record(event.delivered),
                MessageKind::Relay => metrics.relay.record(event.delivered),
            }
        }
        metrics
    }

    pub fn messages(&self) -> DeliveryCounts {
        let mut total = self.direct;
        total.merge(&self.relay);
        total
    }
}

/// Cumulative counters for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Steps processed
    pub steps: u64,

    /// Largest snapshot seen
    pub peak_agents: usize,

    pub collisions: SeverityCounts,
    pub direct: DeliveryCounts,
    pub relay: DeliveryCounts,

    /// Records the sink refused
    pub sink_errors: u64,

    /// Records a lagging consumer never saw (filled in by the consumer side)
    pub records_dropped: u64,
}

impl RunStats {
    pub fn absorb(&mut self, step: &StepMetrics) {
        self.steps += 1;
        self.peak_agents = self.peak_agents.max(step.agents);
        self.collisions.merge(&step.collisions);
        self.direct.merge(&step.direct);
        self.relay.merge(&step.relay);
        self.sink_errors += step.sink_errors;
    }

    pub fn total_collisions(&self) -> u64 {
        self.collisions.total()
    }

    pub fn messages(&self) -> DeliveryCounts {
        let mut total = self.direct;
        total.merge(&self.relay);
        total
    }

    /// Overall delivered/attempted, or `None` if nothing was sent.
    pub fn delivery_ratio(&self) -> Option<f64> {
        self.messages().ratio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::AgentPair;
    use approx::assert_relative_eq;
    use vanet_env::AgentId;

    fn candidate(a: &str, b: &str, severity: Severity) -> CollisionCandidate {
        CollisionCandidate {
            pair: AgentPair::new(AgentId::from(a), AgentId::from(b)).unwrap(),
            ttc: 1.0,
            distance: 10.0,
            relative_speed: 0.0,
            severity,
        }
    }

    fn event(kind: MessageKind, delivered: bool) -> MessageEvent {
        MessageEvent {
            sender: AgentId::from("a"),
            receiver: AgentId::from("b"),
            kind,
            severity: Severity::Low,
            distance: 5.0,
            delivered,
        }
    }

    #[test]
    fn test_step_metrics_counts() {
        let candidates = vec![
            candidate("a", "b", Severity::Critical),
            candidate("a", "c", Severity::Low),
            candidate("b", "c", Severity::Low),
        ];
        let events = vec![
            event(MessageKind::Direct, true),
            event(MessageKind::Direct, false),
            event(MessageKind::Relay, true),
        ];

        let step = StepMetrics::observe(3, &candidates, &events);
        assert_eq!(step.collisions.total(), 3);
        assert_eq!(step.collisions.get(Severity::Low), 2);
        assert_eq!(step.collisions.get(Severity::Critical), 1);
        assert_eq!(step.direct, DeliveryCounts { attempted: 2, delivered: 1 });
        assert_eq!(step.relay, DeliveryCounts { attempted: 1, delivered: 1 });
        assert_eq!(step.messages().attempted, 3);
    }

    #[test]
    fn test_run_stats_accumulate() {
        let mut stats = RunStats::default();
        assert_eq!(stats.delivery_ratio(), None);

        let step = StepMetrics::observe(
            4,
            &[candidate("a", "b", Severity::Medium)],
            &[event(MessageKind::Direct, true), event(MessageKind::Relay, false)],
        );
        stats.absorb(&step);
        stats.absorb(&StepMetrics::observe(2, &[], &[]));

        assert_eq!(stats.steps, 2);
        assert_eq!(stats.peak_agents, 4);
        assert_eq!(stats.total_collisions(), 1);
        assert_relative_eq!(stats.delivery_ratio().unwrap(), 0.5);
    }
}
