//! Single-flight job slots
//!
//! A [`JobSlot`] admits at most one running job. Starting takes the
//! running flag under a mutex and hands back a [`JobGuard`]; the flag is
//! released when the guard is dropped, after the worker has written the
//! final status.

use crate::error::JobError;
use crate::status::{JobKind, JobState, JobStatus};
use pcascan_domain::{CancellationToken, JobId};
use pcascan_extractor::artifacts::unix_now;
use pcascan_extractor::{ProgressEvent, ProgressSink};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info};

/// One single-flight job slot with a shared status snapshot
#[derive(Debug, Clone)]
pub struct JobSlot {
    kind: JobKind,
    running: Arc<Mutex<bool>>,
    status: Arc<RwLock<JobStatus>>,
    cancel: CancellationToken,
}

/// Proof that the holder owns the running flag of a slot
#[derive(Debug)]
pub struct JobGuard {
    running: Arc<Mutex<bool>>,
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        *lock(&self.running) = false;
    }
}

impl JobSlot {
    /// Create an idle slot for jobs of `kind`
    pub fn new(kind: JobKind) -> Self {
        Self {
            kind,
            running: Arc::new(Mutex::new(false)),
            status: Arc::new(RwLock::new(JobStatus::default())),
            cancel: CancellationToken::new(),
        }
    }

    /// Kind of job this slot runs
    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Claim the slot for a new job
    ///
    /// Fails with [`JobError::Busy`] without touching the status when a
    /// job is already running.
    pub fn try_begin(&self) -> Result<(JobId, JobGuard), JobError> {
        let mut running = lock(&self.running);
        if *running {
            return Err(JobError::Busy(self.kind));
        }
        *running = true;

        let id = JobId::new();
        self.cancel.reset();
        *self.write_status() = JobStatus::running(id.to_string(), self.kind, unix_now());
        info!(job_id = %id, kind = %self.kind, "Job started");

        Ok((
            id,
            JobGuard {
                running: Arc::clone(&self.running),
            },
        ))
    }

    /// Whether a job is running
    pub fn is_busy(&self) -> bool {
        *lock(&self.running)
    }

    /// Snapshot of the current status
    pub fn status(&self) -> JobStatus {
        match self.status.read() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Return the status to idle
    ///
    /// Rejected with [`JobError::Busy`] while a job is running.
    pub fn reset(&self) -> Result<(), JobError> {
        let running = lock(&self.running);
        if *running {
            return Err(JobError::Busy(self.kind));
        }
        debug!(kind = %self.kind, "Status reset");
        *self.write_status() = JobStatus::default();
        Ok(())
    }

    /// Ask the running job to stop at its next checkpoint
    ///
    /// The running flag stays locked while the token is set, so a job that
    /// starts concurrently is never cancelled by a request aimed at its
    /// predecessor.
    pub fn cancel(&self) {
        let running = lock(&self.running);
        if *running {
            info!(kind = %self.kind, "Cancellation requested");
            self.cancel.cancel();
        }
    }

    /// Token observed by the running job
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Apply `f` to the status
    pub fn update(&self, f: impl FnOnce(&mut JobStatus)) {
        f(&mut *self.write_status());
    }

    /// Mark the job completed
    pub fn complete(&self, current_step: impl Into<String>) {
        self.update(|status| {
            status.status = JobState::Completed;
            status.current_step = current_step.into();
            status.advance(100.0);
            status.completed_at = Some(unix_now());
        });
    }

    /// Mark the job failed
    pub fn fail(&self, err: &JobError) {
        let message = if err.is_cancelled() {
            "cancelled".to_string()
        } else {
            err.to_string()
        };
        if err.is_cancelled() {
            info!(kind = %self.kind, "Job cancelled");
        } else {
            error!(kind = %self.kind, error = %message, "Job failed");
        }

        self.update(|status| {
            status.status = JobState::Error;
            status.current_step = format!("Error: {}", message);
            status.error = Some(message);
            status.completed_at = Some(unix_now());
        });
    }

    fn write_status(&self) -> std::sync::RwLockWriteGuard<'_, JobStatus> {
        self.status
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Progress sink that folds events into a slot's status and forwards them
/// to an observer channel
///
/// Forwarding never waits: when the channel is full or closed the event is
/// dropped and the status snapshot remains the source of truth.
pub struct StatusWriter {
    slot: JobSlot,
    events: mpsc::Sender<ProgressEvent>,
}

impl StatusWriter {
    /// Create a writer for `slot` publishing on `events`
    pub fn new(slot: JobSlot, events: mpsc::Sender<ProgressEvent>) -> Self {
        Self { slot, events }
    }

    /// Publish a step message without touching the extraction counters
    pub fn step(&self, message: impl Into<String>, percent: f32) {
        self.on_event(ProgressEvent::Step {
            message: message.into(),
            percent,
        });
    }
}

impl ProgressSink for StatusWriter {
    fn on_event(&self, event: ProgressEvent) {
        self.slot.update(|status| match &event {
            ProgressEvent::ExperimentCreated { path } => {
                status.experiment_dir = Some(path.clone());
            }
            ProgressEvent::Step { message, percent } => {
                status.current_step = message.clone();
                status.advance(*percent);
            }
            ProgressEvent::ChunksPlanned { total } => {
                status.total_chunks = *total;
            }
            ProgressEvent::ChunkCompleted { result, total_rows } => {
                status.completed_chunks = result.chunk_num;
                status.current_step = format!(
                    "Chunk {}/{} complete: {} rows",
                    result.chunk_num, result.total_chunks, result.row_count
                );
                status.chunk_results.push(result.clone());
                status.total_rows = *total_rows;
            }
            ProgressEvent::Finished { total_rows } => {
                status.total_rows = *total_rows;
            }
        });

        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                debug!(?event, "Progress channel full; event dropped");
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
