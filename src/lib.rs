//! Continuous ICMP probing agent.
//!
//! A [`JobSupervisor`] runs one probing job at a time. Each job issues paced
//! groups of probes through a [`ProbeIssuer`], classifies every outcome,
//! folds it into a [`GroupSummary`] and checks the finished summary against
//! configured quality thresholds.

pub mod config;
pub mod dns_cache;
pub mod error;
pub mod events;
pub mod group;
pub mod pacing;
pub mod ping;
pub mod ping_executor;
pub mod quality;
pub mod stats;
pub mod status;
pub mod supervisor;

pub use config::{AppConfig, BehaviorConfig, ThresholdConfig};
pub use error::{ClassificationError, ConfigError, GroupError, ProbeError, SinkError};
pub use events::{EventSink, JsonLinesSink, LogEventSink, SummarySink};
pub use group::ProbeGroup;
pub use ping::{GroupEnd, GroupSummary, ProbeOutcome};
pub use ping_executor::{IcmpProbeIssuer, ProbeIssuer};
pub use quality::QualityFlags;
pub use status::{IpStatus, ProbeState};
pub use supervisor::{JobDisposition, JobSupervisor};
