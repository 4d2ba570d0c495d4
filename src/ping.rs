use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ThresholdConfig;
use crate::quality::{self, QualityFlags};
use crate::stats;
use crate::status::IpStatus;

/// Minimum ping before the first successful probe.
pub const UNSET_MINIMUM: u64 = u64::MAX;
/// Maximum ping before the first successful probe.
pub const UNSET_MAXIMUM: u64 = u64::MIN;

/// Result of issuing a single probe.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// Raw status ordinal, resolved against the responder's family.
    pub status_code: i32,
    /// Round trip in milliseconds; only meaningful on success.
    pub round_trip_ms: u64,
    pub responder: IpAddr,
    pub issued_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl ProbeOutcome {
    pub fn success(responder: IpAddr, issued_at: DateTime<Utc>, round_trip_ms: u64) -> Self {
        Self {
            status_code: IpStatus::Success.code(),
            round_trip_ms,
            responder,
            issued_at,
            completed_at: Utc::now(),
        }
    }

    pub fn failure(responder: IpAddr, issued_at: DateTime<Utc>, status: IpStatus) -> Self {
        Self {
            status_code: status.code(),
            round_trip_ms: 0,
            responder,
            issued_at,
            completed_at: Utc::now(),
        }
    }

    pub fn responder_is_ipv4(&self) -> bool {
        self.responder.is_ipv4()
    }
}

/// Why a probe group stopped issuing probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupEnd {
    /// The full probe budget was spent.
    Completed,
    /// A halting status was observed.
    Halted,
    /// Consecutive timeouts reached the report threshold.
    TimeoutsReported,
    Cancelled,
}

/// Summary under construction, owned by a single group run.
#[derive(Debug, Clone)]
pub struct RunningSummary {
    pub target: String,
    pub start: DateTime<Utc>,
    pub minimum_ping: u64,
    pub maximum_ping: u64,
    /// Sum of successful round trips until finalized.
    pub ping_sum: u64,
    /// Successful round trips in the order they arrived.
    pub round_trips: Vec<u64>,
    pub terminating_status: Option<IpStatus>,
    pub last_abnormal_status: Option<IpStatus>,
    pub consecutive_timeouts: u32,
    pub packets_sent: u32,
    pub packets_lost: u32,
    pub excluded_pings: u32,
}

impl RunningSummary {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            start: Utc::now(),
            minimum_ping: UNSET_MINIMUM,
            maximum_ping: UNSET_MAXIMUM,
            ping_sum: 0,
            round_trips: Vec::new(),
            terminating_status: None,
            last_abnormal_status: None,
            consecutive_timeouts: 0,
            packets_sent: 0,
            packets_lost: 0,
            excluded_pings: 0,
        }
    }

    /// Finalize the aggregate math and hand out the immutable summary.
    pub fn finish(mut self, end: GroupEnd) -> GroupSummary {
        stats::reset_bounds_if_unused(&mut self);

        GroupSummary {
            average_ping: stats::finalize_average(&self),
            jitter: stats::jitter(&self.round_trips),
            packet_loss: stats::packet_loss(self.packets_sent, self.packets_lost),
            target: self.target,
            start: self.start,
            end: Utc::now(),
            minimum_ping: self.minimum_ping,
            maximum_ping: self.maximum_ping,
            terminating_status: self.terminating_status,
            last_abnormal_status: self.last_abnormal_status,
            consecutive_timeouts: self.consecutive_timeouts,
            packets_sent: self.packets_sent,
            packets_lost: self.packets_lost,
            excluded_pings: self.excluded_pings,
            ended_by: end,
            quality_flags: QualityFlags::NOT_EXCEEDED,
        }
    }
}

/// Finished result of one probe group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub target: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub minimum_ping: u64,
    pub maximum_ping: u64,
    pub average_ping: f64,
    pub jitter: f64,
    /// Percent of probes that timed out.
    pub packet_loss: f64,
    pub terminating_status: Option<IpStatus>,
    pub last_abnormal_status: Option<IpStatus>,
    pub consecutive_timeouts: u32,
    pub packets_sent: u32,
    pub packets_lost: u32,
    pub excluded_pings: u32,
    pub ended_by: GroupEnd,
    pub quality_flags: QualityFlags,
}

impl GroupSummary {
    /// Attach the thresholds this summary exceeded.
    pub fn assess(mut self, thresholds: &ThresholdConfig) -> Self {
        self.quality_flags = quality::evaluate(&self, thresholds);
        self
    }
}
