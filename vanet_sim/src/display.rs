//! Live warning board.
//!
//! Text stand-in for an operator display. It consumes the record stream and keeps:
//! - The most recent collision warnings, newest first (bounded)
//! - A one-line status reflecting the latest warning or completion
//! - Running message counts

use std::collections::VecDeque;
use std::fmt::Write as _;
use vanet_env::{CollisionRecord, EnvError, EventSink, SimRecord};

/// Entries kept before the oldest is evicted.
pub const BOARD_CAPACITY: usize = 100;

/// Consumer-side view of a run.
#[derive(Debug, Clone)]
pub struct WarningBoard {
    entries: VecDeque<CollisionRecord>,
    capacity: usize,
    status: String,
    completed: bool,
    warnings_seen: u64,
    messages_seen: u64,
    messages_delivered: u64,
}

impl Default for WarningBoard {
    fn default() -> Self {
        Self::with_capacity(BOARD_CAPACITY)
    }
}

impl WarningBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            status: "Simulation running...".to_string(),
            completed: false,
            warnings_seen: 0,
            messages_seen: 0,
            messages_delivered: 0,
        }
    }

    /// Applies one record.
    pub fn push(&mut self, record: &SimRecord) {
        match record {
            SimRecord::Collision(c) => {
                self.status = format!(
                    "Latest collision risk: {} and {} in {:.2}s",
                    c.agent_a, c.agent_b, c.ttc
                );
                self.entries.push_front(c.clone());
                self.entries.truncate(self.capacity);
                self.warnings_seen += 1;
            }
            SimRecord::Message(m) => {
                self.messages_seen += 1;
                if m.delivered {
                    self.messages_delivered += 1;
                }
            }
            SimRecord::End => {
                self.status = "Simulation completed".to_string();
                self.completed = true;
            }
        }
    }

    /// Newest first.
    pub fn entries(&self) -> impl Iterator<Item = &CollisionRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn warnings_seen(&self) -> u64 {
        self.warnings_seen
    }

    pub fn messages_seen(&self) -> (u64, u64) {
        (self.messages_delivered, self.messages_seen)
    }

    /// Renders the newest `limit` rows as a fixed-width table followed by the status line.
    pub fn render(&self, limit: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<9} {:<12} {:<12} {:>8} {:<8}",
            "Time", "Vehicle 1", "Vehicle 2", "TTC", "Severity"
        );
        for entry in self.entries.iter().take(limit) {
            let _ = writeln!(
                out,
                "{:<9} {:<12} {:<12} {:>7.2}s {:<8}",
                entry.time_label,
                entry.agent_a.as_str(),
                entry.agent_b.as_str(),
                entry.ttc,
                entry.severity.as_str()
            );
        }
        let _ = write!(out, "{}", self.status);
        out
    }
}

impl EventSink for WarningBoard {
    fn accept(&mut self, record: SimRecord) -> Result<(), EnvError> {
        self.push(&record);
        Ok(())
    }
}
