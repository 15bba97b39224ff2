//! VANET Environment Boundary
//!
//! This crate holds everything the collision and dissemination engines
//! exchange with the outside world, so the engines themselves stay pure:
//! - Snapshots (`AgentState`, `Snapshot`) supplied by a traffic driver
//! - Records (`CollisionRecord`, `MessageRecord`) handed to a display or log
//! - The `EventSink` / `SnapshotSource` seams and a bounded record channel
//!
//! # Example
//!
//! ```ignore
//! use vanet_env::{record_channel, EventSink, SimRecord};
//!
//! let (mut sink, mut rx) = record_channel(1024)?;
//! std::thread::spawn(move || {
//!     while let Some(record) = rx.blocking_next() {
//!         println!("{:?}", record);
//!     }
//! });
//! sink.accept(SimRecord::End)?;
//! ```

mod channel;
mod error;
mod records;
mod sink;
mod types;

pub use channel::{record_channel, ChannelSink, RecordReceiver, MAX_CHANNEL_CAPACITY};
pub use error::EnvError;
pub use records::{CollisionRecord, MessageRecord, SimRecord, COLLISION_CSV_HEADER, MESSAGE_CSV_HEADER};
pub use sink::{EventSink, SnapshotSource, TeeSink, VecSink};
pub use types::{AgentId, AgentState, MessageKind, Severity, Snapshot};
