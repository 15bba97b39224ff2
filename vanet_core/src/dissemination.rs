//! The "WARN" Engine - single-hop warning dissemination over a lossy disk-model network
//!
//! For each collision candidate (A, B):
//! 1. DIRECT warnings A→B and B→A, if A and B are within radio range
//! 2. RELAY warnings A→C and B→C to every bystander C in range of that endpoint
//! 3. An independent Bernoulli loss trial per attempted message
//!
//! Connectivity is a pure disk model: two agents hear each other iff their
//! distance is at most `transmission_range`. An agent missing from the
//! snapshot hears nobody.

use crate::collision::CollisionCandidate;
use crate::error::ConfigError;
use crate::geometry;
use crate::severity;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use vanet_env::{AgentId, MessageKind, Severity, Snapshot};

/// Configuration for the DisseminationEngine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisseminationConfig {
    /// Disk radio range (default: 100.0 m)
    pub transmission_range: f64,

    /// Probability that an attempted message is lost (default: 0.05)
    pub packet_loss_rate: f64,
}

impl Default for DisseminationConfig {
    fn default() -> Self {
        Self {
            transmission_range: 100.0,
            packet_loss_rate: 0.05,
        }
    }
}

impl DisseminationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("transmission_range", self.transmission_range)?;
        ConfigError::require_within("packet_loss_rate", self.packet_loss_rate, 0.0, 1.0)?;
        Ok(())
    }
}

/// One attempted warning transmission and its fate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub sender: AgentId,
    pub receiver: AgentId,
    pub kind: MessageKind,
    pub severity: Severity,

    /// Sender-receiver separation (m)
    pub distance: f64,

    /// Outcome of the loss trial
    pub delivered: bool,
}

/// Simulates warning propagation with an injected random source.
///
/// The random source is owned by the engine; two engines seeded alike and fed
/// the same inputs produce identical delivery outcomes.
#[derive(Debug, Clone)]
pub struct DisseminationEngine<R = ChaCha8Rng> {
    config: DisseminationConfig,
    rng: R,
}

impl DisseminationEngine<ChaCha8Rng> {
    /// Creates an engine whose loss trials come from `ChaCha8Rng::seed_from_u64(seed)`.
    pub fn seeded(config: DisseminationConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> DisseminationEngine<R> {
    /// Creates an engine drawing loss trials from `rng`.
    pub fn with_rng(config: DisseminationConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &DisseminationConfig {
        &self.config
    }

    /// Disk-model connectivity. False if either agent is absent.
    pub fn connected(&self, snapshot: &Snapshot, x: &AgentId, y: &AgentId) -> bool {
        self.link_distance(snapshot, x, y).is_some()
    }

    /// Distance between two agents if they can hear each other.
    fn link_distance(&self, snapshot: &Snapshot, x: &AgentId, y: &AgentId) -> Option<f64> {
        let (sx, sy) = (snapshot.get(x)?, snapshot.get(y)?);
        let d = geometry::distance(sx.position(), sy.position());
        (d <= self.config.transmission_range).then_some(d)
    }

    /// Every agent in range of `id`, ascending, excluding `id` itself.
    pub fn neighbors<'a>(&self, snapshot: &'a Snapshot, id: &AgentId) -> Vec<&'a AgentId> {
        snapshot
            .ids()
            .filter(|other| *other != id && self.connected(snapshot, id, other))
            .collect()
    }

    /// Attempts direct and relayed warnings for every candidate, in the given order.
    ///
    /// Output order per candidate: A→B, B→A, then for each bystander C in
    /// ascending id order A→C followed by B→C.
    pub fn disseminate(&mut self, snapshot: &Snapshot, candidates: &[CollisionCandidate]) -> Vec<MessageEvent> {
        let mut events = Vec::new();

        for candidate in candidates {
            let a = candidate.pair.first();
            let b = candidate.pair.second();
            let severity = Self::warning_severity(snapshot, candidate);

            if let Some(d) = self.link_distance(snapshot, a, b) {
                events.push(self.attempt(a, b, MessageKind::Direct, severity, d));
                events.push(self.attempt(b, a, MessageKind::Direct, severity, d));
            }

            for c in snapshot.ids() {
                if c == a || c == b {
                    continue;
                }
                if let Some(d) = self.link_distance(snapshot, a, c) {
                    events.push(self.attempt(a, c, MessageKind::Relay, severity, d));
                }
                if let Some(d) = self.link_distance(snapshot, b, c) {
                    events.push(self.attempt(b, c, MessageKind::Relay, severity, d));
                }
            }
        }

        events
    }

    /// Severity carried by the warnings of one candidate.
    ///
    /// Re-derived from the snapshot through the shared policy; if an endpoint
    /// has already left, the candidate's own classification is used.
    fn warning_severity(snapshot: &Snapshot, candidate: &CollisionCandidate) -> Severity {
        match (snapshot.get(candidate.pair.first()), snapshot.get(candidate.pair.second())) {
            (Some(a), Some(b)) => {
                severity::classify(candidate.ttc, severity::relative_speed(a.speed(), b.speed()))
            }
            _ => candidate.severity,
        }
    }

    fn attempt(
        &mut self,
        sender: &AgentId,
        receiver: &AgentId,
        kind: MessageKind,
        severity: Severity,
        distance: f64,
    ) -> MessageEvent {
        let draw: f64 = self.rng.gen();
        MessageEvent {
            sender: sender.clone(),
            receiver: receiver.clone(),
            kind,
            severity,
            distance,
            delivered: draw >= self.config.packet_loss_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionConfig, CollisionEngine};
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use vanet_env::AgentState;

    fn agent(id: &str, x: f64, y: f64, speed: f64, heading: f64) -> AgentState {
        AgentState::point(id, [x, y], speed, heading).unwrap()
    }

    fn lossless() -> DisseminationEngine {
        DisseminationEngine::seeded(
            DisseminationConfig {
                transmission_range: 100.0,
                packet_loss_rate: 0.0,
            },
            42,
        )
        .unwrap()
    }

    /// A and B head-on 20m apart, C parked 50m north of the origin.
    fn head_on_with_bystander() -> Snapshot {
        Snapshot::from_states(vec![
            agent("A", 0.0, 0.0, 10.0, 90.0),
            agent("B", 20.0, 0.0, 10.0, 270.0),
            agent("C", 10.0, 50.0, 0.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        let bad_range = DisseminationConfig { transmission_range: 0.0, ..Default::default() };
        let bad_loss = DisseminationConfig { packet_loss_rate: 1.5, ..Default::default() };
        let nan_loss = DisseminationConfig { packet_loss_rate: f64::NAN, ..Default::default() };

        assert!(DisseminationEngine::seeded(bad_range, 1).is_err());
        assert!(DisseminationEngine::seeded(bad_loss, 1).is_err());
        assert!(DisseminationEngine::seeded(nan_loss, 1).is_err());
        assert!(DisseminationEngine::seeded(DisseminationConfig { packet_loss_rate: 1.0, ..Default::default() }, 1).is_ok());
    }

    #[test]
    fn test_connectivity() {
        let engine = lossless();
        let snapshot = Snapshot::from_states(vec![
            agent("A", 0.0, 0.0, 0.0, 0.0),
            agent("B", 100.0, 0.0, 0.0, 0.0),
            agent("C", 100.1, 0.0, 0.0, 0.0),
        ])
        .unwrap();

        let (a, b, c) = (AgentId::from("A"), AgentId::from("B"), AgentId::from("C"));
        assert!(engine.connected(&snapshot, &a, &b)); // exactly at range
        assert!(engine.connected(&snapshot, &b, &a));
        assert!(!engine.connected(&snapshot, &a, &c));
        assert!(!engine.connected(&snapshot, &a, &AgentId::from("gone")));

        let near_b: Vec<&str> = engine.neighbors(&snapshot, &b).into_iter().map(|id| id.as_str()).collect();
        assert_eq!(near_b, vec!["A", "C"]);
    }

    #[test]
    fn test_direct_and_relay_all_delivered() {
        let snapshot = head_on_with_bystander();
        let collisions = CollisionEngine::new(CollisionConfig::default()).unwrap();
        let candidates = collisions.evaluate(&snapshot);
        assert_eq!(candidates.len(), 1);

        let mut engine = lossless();
        let events = engine.disseminate(&snapshot, &candidates);

        let summary: Vec<(&str, &str, MessageKind)> = events
            .iter()
            .map(|e| (e.sender.as_str(), e.receiver.as_str(), e.kind))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("A", "B", MessageKind::Direct),
                ("B", "A", MessageKind::Direct),
                ("A", "C", MessageKind::Relay),
                ("B", "C", MessageKind::Relay),
            ]
        );

        assert!(events.iter().all(|e| e.delivered));
        assert!(events.iter().all(|e| e.severity == candidates[0].severity));
        assert_relative_eq!(events[0].distance, 20.0);
        assert_relative_eq!(events[2].distance, (10.0f64 * 10.0 + 50.0 * 50.0).sqrt());
    }

    #[test]
    fn test_out_of_range_bystander_gets_nothing() {
        let mut snapshot = head_on_with_bystander();
        snapshot.insert(agent("D", 500.0, 500.0, 0.0, 0.0)).unwrap();

        let candidates = CollisionEngine::new(CollisionConfig::default()).unwrap().evaluate(&snapshot);
        let events = lossless().disseminate(&snapshot, &candidates);

        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| e.receiver.as_str() != "D"));
    }

    #[test]
    fn test_departed_endpoint() {
        let snapshot = head_on_with_bystander();
        let candidates = CollisionEngine::new(CollisionConfig::default()).unwrap().evaluate(&snapshot);

        // B leaves between the two stages
        let mut later = snapshot.clone();
        later.remove(&AgentId::from("B"));

        let events = lossless().disseminate(&later, &candidates);

        // No direct link, only A's relay to C survives
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sender.as_str(), "A");
        assert_eq!(events[0].kind, MessageKind::Relay);
        assert_eq!(events[0].severity, candidates[0].severity);
    }

    #[test]
    fn test_total_loss() {
        let snapshot = head_on_with_bystander();
        let candidates = CollisionEngine::new(CollisionConfig::default()).unwrap().evaluate(&snapshot);

        let config = DisseminationConfig { packet_loss_rate: 1.0, ..Default::default() };
        let events = DisseminationEngine::seeded(config, 7).unwrap().disseminate(&snapshot, &candidates);

        // Attempts are still recorded
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| !e.delivered));
    }

    #[test]
    fn test_same_seed_same_outcomes() {
        let snapshot = head_on_with_bystander();
        let candidates = CollisionEngine::new(CollisionConfig::default()).unwrap().evaluate(&snapshot);
        let config = DisseminationConfig { packet_loss_rate: 0.5, ..Default::default() };

        let mut e1 = DisseminationEngine::seeded(config, 1234).unwrap();
        let mut e2 = DisseminationEngine::seeded(config, 1234).unwrap();

        for _ in 0..20 {
            assert_eq!(e1.disseminate(&snapshot, &candidates), e2.disseminate(&snapshot, &candidates));
        }
    }

    #[test]
    fn test_delivery_ratio_converges() {
        let snapshot = head_on_with_bystander();
        let candidates = CollisionEngine::new(CollisionConfig::default()).unwrap().evaluate(&snapshot);
        let config = DisseminationConfig { packet_loss_rate: 0.2, ..Default::default() };
        let mut engine = DisseminationEngine::seeded(config, 99).unwrap();

        let mut attempted = 0usize;
        let mut delivered = 0usize;
        for _ in 0..5_000 {
            for event in engine.disseminate(&snapshot, &candidates) {
                attempted += 1;
                delivered += event.delivered as usize;
            }
        }

        // 20_000 Bernoulli trials: std-dev of the ratio is ~0.003
        let ratio = delivered as f64 / attempted as f64;
        assert!((ratio - 0.8).abs() < 0.02, "ratio = {}", ratio);
    }

    proptest! {
        #[test]
        fn prop_events_only_between_connected_agents(
            positions in proptest::collection::vec((-150.0f64..150.0, -150.0f64..150.0), 2..8),
            range in 10.0f64..200.0,
        ) {
            let states: Vec<AgentState> = positions
                .iter()
                .enumerate()
                .map(|(i, (x, y))| agent(&format!("veh_{}", i), *x, *y, 0.0, 0.0))
                .collect();
            let snapshot = Snapshot::from_states(states).unwrap();

            // Treat every pair as a candidate to exercise all links
            let mut candidates = Vec::new();
            let ids: Vec<AgentId> = snapshot.ids().cloned().collect();
            for i in 0..ids.len() {
                for j in i + 1..ids.len() {
                    candidates.push(CollisionCandidate {
                        pair: crate::collision::AgentPair::new(ids[i].clone(), ids[j].clone()).unwrap(),
                        ttc: 1.5,
                        distance: 0.0,
                        relative_speed: 0.0,
                        severity: Severity::Medium,
                    });
                }
            }

            let config = DisseminationConfig { transmission_range: range, packet_loss_rate: 0.0 };
            let mut engine = DisseminationEngine::seeded(config, 0).unwrap();
            for event in engine.disseminate(&snapshot, &candidates) {
                prop_assert!(engine.connected(&snapshot, &event.sender, &event.receiver));
                prop_assert!(engine.connected(&snapshot, &event.receiver, &event.sender));
                prop_assert!(event.distance <= range);
            }
        }
    }
}
