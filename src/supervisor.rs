//! Supervision of the single active probing job.
//!
//! A job runs probe groups against one target until it is stopped, reaches
//! its group limit, or faults. The "current job" slot is the only shared
//! mutable state; every inspect-and-mutate sequence on it happens under one
//! lock, so `start`, `stop` and the post-run reset never interleave.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, BehaviorConfig, ThresholdConfig};
use crate::error::GroupError;
use crate::events::{EventSink, SummarySink};
use crate::group::ProbeGroup;
use crate::pacing::MINIMUM_DELAY;
use crate::ping::GroupEnd;
use crate::ping_executor::ProbeIssuer;
use crate::quality::{self, QualityFlags};

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobDisposition {
    Completed,
    Cancelled,
    Faulted(String),
}

impl JobDisposition {
    fn from_join(result: Result<Result<(), GroupError>, JoinError>, cancel: &CancellationToken) -> Self {
        match result {
            Ok(Ok(())) if cancel.is_cancelled() => JobDisposition::Cancelled,
            Ok(Ok(())) => JobDisposition::Completed,
            Ok(Err(e)) => JobDisposition::Faulted(e.to_string()),
            Err(e) if e.is_cancelled() => JobDisposition::Cancelled,
            Err(e) => JobDisposition::Faulted(format!("probing task panicked: {e}")),
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveJob {
    id: u64,
    target: String,
    cancel: CancellationToken,
    /// Cancelled by the supervising task once the job has fully ended.
    finished: CancellationToken,
}

#[derive(Debug, Default)]
struct JobSlot {
    current: Option<ActiveJob>,
}

impl JobSlot {
    fn try_set(&mut self, job: ActiveJob) -> bool {
        if self.current.is_some() {
            return false;
        }
        self.current = Some(job);
        true
    }

    /// Clear the slot if it still holds job `id`.
    fn clear(&mut self, id: u64) -> bool {
        if self.current.as_ref().is_some_and(|job| job.id == id) {
            self.current = None;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<&ActiveJob> {
        self.current.as_ref()
    }
}

struct Shared {
    issuer: Arc<dyn ProbeIssuer>,
    behavior: BehaviorConfig,
    thresholds: ThresholdConfig,
    summaries: Arc<dyn SummarySink>,
    events: Arc<dyn EventSink>,
    slot: Mutex<JobSlot>,
    next_id: AtomicU64,
}

/// Starts, stops and watches the probing job. Cheap to clone.
#[derive(Clone)]
pub struct JobSupervisor {
    shared: Arc<Shared>,
}

impl JobSupervisor {
    pub fn new(
        issuer: Arc<dyn ProbeIssuer>,
        config: &AppConfig,
        summaries: Arc<dyn SummarySink>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                issuer,
                behavior: config.behavior.clone(),
                thresholds: config.thresholds.clone(),
                summaries,
                events,
                slot: Mutex::new(JobSlot::default()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Launch a job against `target`. Returns false, doing nothing, when a job
    /// is already active.
    pub async fn start(&self, target: impl Into<String>) -> bool {
        let target = target.into();
        let mut slot = self.shared.slot.lock().await;
        if let Some(job) = slot.peek() {
            log::debug!("Start ignored, already pinging {}", job.target);
            return false;
        }

        let job = ActiveJob {
            id: self.shared.next_id.fetch_add(1, Ordering::Relaxed),
            target: target.clone(),
            cancel: CancellationToken::new(),
            finished: CancellationToken::new(),
        };
        let handle = tokio::spawn(run_job(
            Arc::clone(&self.shared),
            target.clone(),
            job.cancel.clone(),
        ));
        tokio::spawn(supervise(Arc::clone(&self.shared), job.clone(), handle));

        slot.try_set(job);
        log::info!("Started pinging {target}");
        self.shared.events.status_toggled(true);
        true
    }

    /// Cancel the active job and wait for it to finish. Returns false when
    /// nothing was running.
    pub async fn stop(&self) -> bool {
        let mut slot = self.shared.slot.lock().await;
        let Some(job) = slot.peek().cloned() else {
            log::debug!("Stop ignored, no active job");
            return false;
        };

        job.cancel.cancel();
        job.finished.cancelled().await;
        slot.clear(job.id);
        log::info!("Stopped pinging {}", job.target);
        true
    }

    pub async fn is_active(&self) -> bool {
        self.shared.slot.lock().await.peek().is_some()
    }

    pub async fn current_target(&self) -> Option<String> {
        self.shared
            .slot
            .lock()
            .await
            .peek()
            .map(|job| job.target.clone())
    }
}

/// Run groups back to back until cancelled, the group limit is hit, or a
/// group faults.
///
/// A halted group skips its trailing delay, so the rest of its `wait_ms`
/// window is waited out here before the next group starts.
async fn run_job(shared: Arc<Shared>, target: String, cancel: CancellationToken) -> Result<(), GroupError> {
    let window = Duration::from_millis(shared.behavior.wait_ms).max(MINIMUM_DELAY);
    let mut groups = 0u32;
    while !cancel.is_cancelled() {
        if shared.behavior.group_limit.is_some_and(|limit| groups >= limit) {
            break;
        }

        let started = Instant::now();
        let summary = ProbeGroup::new(shared.issuer.as_ref(), &shared.behavior, &target)
            .run(&cancel)
            .await?
            .assess(&shared.thresholds);
        groups += 1;

        if summary.packets_sent == 0 {
            continue;
        }
        shared.summaries.persist(&summary);
        if summary.quality_flags != QualityFlags::NOT_EXCEEDED {
            shared
                .events
                .anomaly_detected(&target, &quality::describe(summary.quality_flags));
        }

        if summary.ended_by == GroupEnd::Halted {
            let resume_at = (started + window).max(Instant::now() + MINIMUM_DELAY);
            tokio::select! {
                _ = tokio::time::sleep_until(resume_at) => {}
                _ = cancel.cancelled() => {}
            }
        }
    }
    Ok(())
}

/// Observe how a job ended, then release the slot and notify listeners.
async fn supervise(
    shared: Arc<Shared>,
    job: ActiveJob,
    handle: JoinHandle<Result<(), GroupError>>,
) {
    let disposition = JobDisposition::from_join(handle.await, &job.cancel);
    match &disposition {
        JobDisposition::Faulted(message) => {
            log::error!("Pinging {} faulted: {message}", job.target)
        }
        other => log::info!("Pinging {} ended: {other:?}", job.target),
    }
    job.finished.cancel();

    let mut slot = shared.slot.lock().await;
    slot.clear(job.id);
    shared.events.status_toggled(false);
    if let JobDisposition::Faulted(message) = &disposition {
        shared.events.agent_fault(message);
    }
}
