//! The probing loop for one group.
//!
//! Probes are issued one at a time until the budget is spent, a halting
//! status is seen, timeouts pile up past the report threshold, or the job is
//! cancelled. Whichever happens, the summary is finalized and returned.

use tokio_util::sync::CancellationToken;

use crate::config::BehaviorConfig;
use crate::error::{GroupError, ProbeError};
use crate::pacing::PacingScheduler;
use crate::ping::{GroupEnd, GroupSummary, RunningSummary};
use crate::ping_executor::ProbeIssuer;
use crate::stats;
use crate::status::{self, ProbeState};

pub struct ProbeGroup<'a> {
    issuer: &'a dyn ProbeIssuer,
    behavior: &'a BehaviorConfig,
    target: &'a str,
}

impl<'a> ProbeGroup<'a> {
    pub fn new(issuer: &'a dyn ProbeIssuer, behavior: &'a BehaviorConfig, target: &'a str) -> Self {
        Self {
            issuer,
            behavior,
            target,
        }
    }

    pub async fn run(self, cancel: &CancellationToken) -> Result<GroupSummary, GroupError> {
        let mut summary = RunningSummary::new(self.target);
        let mut pacer = PacingScheduler::new(self.behavior);
        let mut state = ProbeState::Continue;
        let mut remaining = self.behavior.pings_per_call;
        let report_after = self.behavior.report_after_consecutive_timeouts;

        while remaining > 0
            && state != ProbeState::Halt
            && summary.consecutive_timeouts < report_after
            && !cancel.is_cancelled()
        {
            pacer.start_interval();

            let outcome = match self.issuer.issue(self.target, cancel).await {
                Ok(outcome) => outcome,
                Err(ProbeError::Cancelled) => break,
                Err(e) => return Err(e.into()),
            };
            let classification = status::classify(outcome.status_code, outcome.responder_is_ipv4())?;
            let probe_status = classification.status;

            remaining -= 1;
            summary.packets_sent += 1;
            if !probe_status.is_success() {
                summary.excluded_pings += 1;
                summary.last_abnormal_status = Some(probe_status);
            }

            state = classification.state;
            match state {
                ProbeState::Continue => {
                    summary.consecutive_timeouts = 0;
                    if probe_status.is_success() {
                        stats::update_on_success(&mut summary, outcome.round_trip_ms);
                    }
                }
                ProbeState::Pause => {
                    summary.consecutive_timeouts = 0;
                    log::debug!("{}: {} ({})", self.target, classification.brief, classification.extended);
                }
                ProbeState::PacketLossCaution => {
                    summary.consecutive_timeouts += 1;
                    summary.packets_lost += 1;
                }
                ProbeState::Halt => {
                    summary.consecutive_timeouts = 0;
                    summary.terminating_status = Some(probe_status);
                    log::warn!(
                        "{}: halting group after {} probes: {}",
                        self.target,
                        summary.packets_sent,
                        classification.extended
                    );
                }
            }

            pacer.end_interval();
            if state != ProbeState::Halt {
                tokio::select! {
                    _ = pacer.delay() => {}
                    _ = cancel.cancelled() => {}
                }
            }
        }

        let end = if state == ProbeState::Halt {
            GroupEnd::Halted
        } else if summary.consecutive_timeouts >= report_after {
            GroupEnd::TimeoutsReported
        } else if remaining == 0 {
            GroupEnd::Completed
        } else {
            GroupEnd::Cancelled
        };

        let summary = summary.finish(end);
        log::debug!(
            "{}: group ended ({:?}) after {} probes, avg {} ms, loss {}%",
            summary.target,
            end,
            summary.packets_sent,
            summary.average_ping,
            summary.packet_loss
        );
        Ok(summary)
    }
}
