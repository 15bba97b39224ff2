//! Log exporter.
//!
//! Collects the record stream and writes it out as the two CSV logs plus a
//! JSON run summary:
//!
//! ```text
//! <dir>/collision_log.csv
//! <dir>/communication_log.csv
//! <dir>/summary.json
//! ```

use crate::error::SimError;
use crate::runner::ScenarioResult;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use vanet_env::{
    CollisionRecord, EnvError, EventSink, MessageRecord, SimRecord, COLLISION_CSV_HEADER, MESSAGE_CSV_HEADER,
};

pub const COLLISION_LOG: &str = "collision_log.csv";
pub const COMMUNICATION_LOG: &str = "communication_log.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// Where [`LogExporter::export`] put its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub collisions: PathBuf,
    pub messages: PathBuf,
    pub summary: PathBuf,
}

/// Run summary written next to the logs.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub result: &'a ScenarioResult,

    /// Records the live display never saw
    pub display_dropped: u64,

    pub collision_records: usize,
    pub message_records: usize,
}

/// Sink that keeps every collision and message record for export.
#[derive(Debug, Default)]
pub struct LogExporter {
    collisions: Vec<CollisionRecord>,
    messages: Vec<MessageRecord>,
}

impl LogExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collisions(&self) -> &[CollisionRecord] {
        &self.collisions
    }

    pub fn messages(&self) -> &[MessageRecord] {
        &self.messages
    }

    /// Writes the collision log with its header.
    pub fn write_collision_csv<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}", COLLISION_CSV_HEADER)?;
        for record in &self.collisions {
            writeln!(out, "{}", record.to_csv_line())?;
        }
        Ok(())
    }

    /// Writes the communication log with its header.
    pub fn write_message_csv<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}", MESSAGE_CSV_HEADER)?;
        for record in &self.messages {
            writeln!(out, "{}", record.to_csv_line())?;
        }
        Ok(())
    }

    /// Writes both logs and the summary into `dir`, creating it if needed.
    pub fn export(&self, dir: impl AsRef<Path>, result: &ScenarioResult, display_dropped: u64) -> Result<ExportPaths, SimError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let paths = ExportPaths {
            collisions: dir.join(COLLISION_LOG),
            messages: dir.join(COMMUNICATION_LOG),
            summary: dir.join(SUMMARY_FILE),
        };

        let mut out = BufWriter::new(File::create(&paths.collisions)?);
        self.write_collision_csv(&mut out)?;
        out.flush()?;

        let mut out = BufWriter::new(File::create(&paths.messages)?);
        self.write_message_csv(&mut out)?;
        out.flush()?;

        let summary = RunSummary {
            result,
            display_dropped,
            collision_records: self.collisions.len(),
            message_records: self.messages.len(),
        };
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(&paths.summary, json)?;

        info!(
            "Exported {} collision and {} message records to {}",
            self.collisions.len(),
            self.messages.len(),
            dir.display()
        );
        Ok(paths)
    }
}

impl EventSink for LogExporter {
    fn accept(&mut self, record: SimRecord) -> Result<(), EnvError> {
        match record {
            SimRecord::Collision(r) => self.collisions.push(r),
            SimRecord::Message(r) => self.messages.push(r),
            SimRecord::End => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ScenarioRunner;
    use crate::scenarios::ScenarioId;
    use vanet_env::{MessageKind, Severity};

    fn collision() -> SimRecord {
        SimRecord::Collision(CollisionRecord {
            time_label: "00:01.2".into(),
            agent_a: "veh_0".into(),
            agent_b: "veh_1".into(),
            ttc: 0.8,
            distance: 28.0,
            severity: Severity::Critical,
        })
    }

    fn message(delivered: bool) -> SimRecord {
        SimRecord::Message(MessageRecord {
            time_label: "00:01.2".into(),
            sender: "veh_0".into(),
            receiver: "veh_1".into(),
            kind: MessageKind::Direct,
            severity: Severity::Critical,
            distance: 28.0,
            delivered,
        })
    }

    #[test]
    fn test_csv_output() {
        let mut exporter = LogExporter::new();
        exporter
            .accept_all(vec![collision(), message(true), message(false), SimRecord::End])
            .unwrap();

        let mut buf = Vec::new();
        exporter.write_collision_csv(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Timestamp,Vehicle1,Vehicle2,TTC,Distance,Severity\n00:01.2,veh_0,veh_1,0.80,28.00,CRITICAL\n"
        );

        let mut buf = Vec::new();
        exporter.write_message_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "00:01.2,veh_0,veh_1,DIRECT,CRITICAL,28.00,true");
        assert_eq!(lines[2], "00:01.2,veh_0,veh_1,DIRECT,CRITICAL,28.00,false");
    }

    #[test]
    fn test_export_writes_files() {
        let (result, exporter) = ScenarioRunner::new(42)
            .with_steps(40)
            .run_with_sink(ScenarioId::HeadOn, LogExporter::new())
            .unwrap();

        let dir = std::env::temp_dir().join(format!("vanet_export_test_{}", std::process::id()));
        let paths = exporter.export(&dir, &result, 0).unwrap();

        let collisions = fs::read_to_string(&paths.collisions).unwrap();
        assert!(collisions.starts_with(COLLISION_CSV_HEADER));
        assert_eq!(collisions.lines().count(), exporter.collisions().len() + 1);

        let summary: serde_json::Value = serde_json::from_str(&fs::read_to_string(&paths.summary).unwrap()).unwrap();
        assert_eq!(summary["result"]["scenario"], "head_on");
        assert_eq!(summary["message_records"], exporter.messages().len());

        fs::remove_dir_all(&dir).unwrap();
    }
}
