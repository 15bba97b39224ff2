//! Output records handed to an [`EventSink`](crate::EventSink).

use crate::types::{AgentId, MessageKind, Severity};
use serde::{Deserialize, Serialize};

/// CSV header of the collision log.
pub const COLLISION_CSV_HEADER: &str = "Timestamp,Vehicle1,Vehicle2,TTC,Distance,Severity";

/// CSV header of the communication log.
pub const MESSAGE_CSV_HEADER: &str = "Timestamp,Sender,Receiver,MessageType,Severity,Distance,Success";

/// One at-risk pair observed at one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionRecord {
    /// Elapsed simulated time, `MM:SS.d`
    pub time_label: String,
    pub agent_a: AgentId,
    pub agent_b: AgentId,
    /// Seconds
    pub ttc: f64,
    /// Meters
    pub distance: f64,
    pub severity: Severity,
}

impl CollisionRecord {
    /// Renders the record as a collision-log line (two decimals for ttc and distance).
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{:.2},{:.2},{}",
            self.time_label, self.agent_a, self.agent_b, self.ttc, self.distance, self.severity
        )
    }
}

/// One attempted warning transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Elapsed simulated time, `MM:SS.d`
    pub time_label: String,
    pub sender: AgentId,
    pub receiver: AgentId,
    pub kind: MessageKind,
    pub severity: Severity,
    /// Meters between sender and receiver
    pub distance: f64,
    pub delivered: bool,
}

impl MessageRecord {
    /// Renders the record as a communication-log line.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{:.2},{}",
            self.time_label, self.sender, self.receiver, self.kind, self.severity, self.distance, self.delivered
        )
    }
}

/// Anything the core forwards to a sink, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum SimRecord {
    Collision(CollisionRecord),
    Message(MessageRecord),
    /// Emitted once when the driver stops producing steps
    End,
}

impl SimRecord {
    /// Time label of the record (`None` for [`SimRecord::End`]).
    pub fn time_label(&self) -> Option<&str> {
        match self {
            SimRecord::Collision(r) => Some(&r.time_label),
            SimRecord::Message(r) => Some(&r.time_label),
            SimRecord::End => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_csv_line() {
        let record = CollisionRecord {
            time_label: "00:01.5".to_string(),
            agent_a: "veh_0".into(),
            agent_b: "veh_1".into(),
            ttc: 0.571428,
            distance: 20.0,
            severity: Severity::Critical,
        };

        assert_eq!(record.to_csv_line(), "00:01.5,veh_0,veh_1,0.57,20.00,CRITICAL");
    }

    #[test]
    fn test_message_csv_line() {
        let record = MessageRecord {
            time_label: "00:00.1".to_string(),
            sender: "veh_0".into(),
            receiver: "veh_2".into(),
            kind: MessageKind::Relay,
            severity: Severity::Low,
            distance: 87.4567,
            delivered: false,
        };

        assert_eq!(record.to_csv_line(), "00:00.1,veh_0,veh_2,RELAY,LOW,87.46,false");
    }
}
