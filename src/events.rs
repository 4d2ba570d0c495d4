//! Outbound seams: where finished summaries and lifecycle signals go.
//!
//! Both are fire-and-forget. A sink that fails logs the failure; it never
//! affects the probing job.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::error::SinkError;
use crate::ping::GroupSummary;

/// Receives every finished group summary.
pub trait SummarySink: Send + Sync {
    fn persist(&self, summary: &GroupSummary);
}

/// Receives lifecycle notifications from the supervisor.
pub trait EventSink: Send + Sync {
    fn status_toggled(&self, active: bool);
    fn anomaly_detected(&self, target: &str, description: &str);
    fn agent_fault(&self, message: &str);
}

/// Reports lifecycle events through the log.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn status_toggled(&self, active: bool) {
        log::info!("Pinging {}", if active { "started" } else { "stopped" });
    }

    fn anomaly_detected(&self, target: &str, description: &str) {
        log::warn!("Thresholds exceeded for {target}: {description}");
    }

    fn agent_fault(&self, message: &str) {
        log::error!("Probing job faulted: {message}");
    }
}

/// Appends each summary as one JSON line to a file.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, summary: &GroupSummary) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(summary)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl SummarySink for JsonLinesSink {
    fn persist(&self, summary: &GroupSummary) {
        if let Err(e) = self.append(summary) {
            log::error!(
                "Failed to persist summary for {} to {}: {e}",
                summary.target,
                self.path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ping::{GroupEnd, RunningSummary};

    #[test]
    fn summaries_are_appended_as_json_lines() {
        let path = std::env::temp_dir()
            .join(format!("ping-agent-{}", std::process::id()))
            .join("summaries.jsonl");
        let _ = fs::remove_file(&path);
        let sink = JsonLinesSink::new(&path);

        let summary = RunningSummary::new("10.0.0.1").finish(GroupEnd::Completed);
        sink.persist(&summary);
        sink.persist(&summary);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: GroupSummary = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, summary);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn unwritable_path_is_reported_not_raised() {
        let blocker = std::env::temp_dir().join(format!("ping-agent-file-{}", std::process::id()));
        fs::write(&blocker, "").unwrap();
        let sink = JsonLinesSink::new(blocker.join("summaries.jsonl"));
        let summary = RunningSummary::new("10.0.0.1").finish(GroupEnd::Completed);

        assert!(matches!(sink.append(&summary), Err(SinkError::Io(_))));
        sink.persist(&summary);
        let _ = fs::remove_file(&blocker);
    }
}
