//! Job status snapshots
//!
//! A [`JobStatus`] is only mutated by the worker that owns the job.
//! Observers always receive a full copy.

use pcascan_eval::Metrics;
use pcascan_extractor::ChunkResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of job a slot runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Extraction only
    Extraction,
    /// Extraction followed by evaluation against ground truth
    Benchmark,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extraction => f.write_str("extraction"),
            Self::Benchmark => f.write_str("benchmark"),
        }
    }
}

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Nothing has run since the last reset
    #[default]
    Idle,
    /// A job is in progress
    Running,
    /// The last job finished successfully
    Completed,
    /// The last job failed or was cancelled
    Error,
}

impl JobState {
    /// Whether the job has finished, successfully or not
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// Snapshot of one job slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Identifier of the current or last job
    pub job_id: Option<String>,

    /// Kind of the current or last job
    pub kind: Option<JobKind>,

    /// Lifecycle state
    pub status: JobState,

    /// Human-readable description of the current step
    pub current_step: String,

    /// Overall progress; never decreases while running
    pub progress_percent: f32,

    /// Chunks planned for the document
    pub total_chunks: usize,

    /// Chunks finished so far
    pub completed_chunks: usize,

    /// Per-chunk summaries in order
    pub chunk_results: Vec<ChunkResult>,

    /// Rows accumulated so far, then the final row count
    pub total_rows: usize,

    /// Experiment directory once created
    pub experiment_dir: Option<PathBuf>,

    /// Failure message when `status` is `error`
    pub error: Option<String>,

    /// Unix seconds when the job started
    pub started_at: Option<u64>,

    /// Unix seconds when the job finished
    pub completed_at: Option<u64>,

    /// Benchmark project
    pub project_id: Option<String>,

    /// Ground truth rows the benchmark is scored against
    pub ground_truth_count: Option<usize>,

    /// Benchmark evaluation metrics
    pub metrics: Option<Metrics>,
}

impl JobStatus {
    /// Fresh status for a job that is starting now
    pub fn running(job_id: String, kind: JobKind, started_at: u64) -> Self {
        Self {
            job_id: Some(job_id),
            kind: Some(kind),
            status: JobState::Running,
            current_step: "Initializing...".to_string(),
            started_at: Some(started_at),
            ..Self::default()
        }
    }

    /// Raise progress to `percent`, ignoring values below the current one
    pub fn advance(&mut self, percent: f32) {
        self.progress_percent = self.progress_percent.max(percent.clamp(0.0, 100.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let status = JobStatus::default();
        assert_eq!(status.status, JobState::Idle);
        assert_eq!(status.progress_percent, 0.0);
        assert!(status.job_id.is_none());
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut status = JobStatus::running("job".to_string(), JobKind::Extraction, 0);
        status.advance(40.0);
        status.advance(20.0);
        assert_eq!(status.progress_percent, 40.0);
        status.advance(150.0);
        assert_eq!(status.progress_percent, 100.0);
    }

    #[test]
    fn test_serialized_state_names() {
        let status = JobStatus::running("job".to_string(), JobKind::Benchmark, 7);
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["status"], "running");
        assert_eq!(value["kind"], "benchmark");
        assert_eq!(value["started_at"], 7);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Idle.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Error.is_terminal());
    }
}
