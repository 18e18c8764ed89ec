//! Request, outcome and progress types for extraction

use crate::prompt::PcaCatalog;
use pcascan_domain::{ExtractedRow, PageText};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Input to one extraction run
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Document pages in order
    pub pages: Vec<PageText>,

    /// Controlled PCA vocabulary
    pub catalog: PcaCatalog,

    /// Extra fields recorded under `parameters` in `experiment_config.json`
    pub metadata: Map<String, Value>,
}

impl ExtractionRequest {
    /// Create a request with no extra metadata
    pub fn new(pages: Vec<PageText>, catalog: PcaCatalog) -> Self {
        Self {
            pages,
            catalog,
            metadata: Map::new(),
        }
    }

    /// Record an extra metadata field
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Per-chunk summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkResult {
    /// 1-based chunk number
    pub chunk_num: usize,

    /// Number of chunks in the run
    pub total_chunks: usize,

    /// First page of the chunk
    pub pages_start: u32,

    /// Last page of the chunk
    pub pages_end: u32,

    /// Rows the chunk contributed
    pub row_count: usize,
}

/// Result of a completed extraction run
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// The `exp_NNN` directory holding all artifacts
    pub experiment_dir: PathBuf,

    /// Per-chunk summaries in order
    pub chunk_results: Vec<ChunkResult>,

    /// Rows accumulated across chunks before compilation
    pub raw_row_count: usize,

    /// Whether the compile pass failed and raw rows were used instead
    pub compile_fallback: bool,

    /// Rows dropped for a missing or out-of-range PCA number
    pub removed_count: usize,

    /// Final, renumbered rows
    pub rows: Vec<ExtractedRow>,
}

/// Progress notifications emitted by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// The experiment directory has been created
    ExperimentCreated {
        /// Path of the new directory
        path: PathBuf,
    },

    /// A new pipeline step started
    Step {
        /// Human-readable description
        message: String,
        /// Overall progress in percent
        percent: f32,
    },

    /// The document was chunked
    ChunksPlanned {
        /// Number of chunks
        total: usize,
    },

    /// A chunk finished
    ChunkCompleted {
        /// Summary of the chunk
        result: ChunkResult,
        /// Rows accumulated so far
        total_rows: usize,
    },

    /// All artifacts were written
    Finished {
        /// Final row count
        total_rows: usize,
    },
}

/// Receiver of [`ProgressEvent`]s
///
/// Implementations must not block; the orchestrator calls them inline.
pub trait ProgressSink: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: ProgressEvent);
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_event(&self, _event: ProgressEvent) {}
}
