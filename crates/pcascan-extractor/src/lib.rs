//! pcascan Extractor
//!
//! Turns long environmental report text into potentially contaminating
//! activity (PCA) records by calling a language model over word-bounded
//! page chunks.
//!
//! # Architecture
//!
//! ```text
//! pages → PageChunker → chunk prompt → ModelGateway → JsonRecoveryParser
//!       → accumulated rows → compile prompt → filter/renumber → artifacts
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use pcascan_domain::{CancellationToken, PageText};
//! use pcascan_extractor::{
//!     ExtractionOrchestrator, ExtractionRequest, ExtractorConfig, NoProgress, PcaCatalog,
//! };
//! use pcascan_llm::MockGateway;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = MockGateway::new(r#"{"rows": []}"#);
//! let orchestrator = ExtractionOrchestrator::new(gateway, ExtractorConfig::default());
//!
//! let request = ExtractionRequest::new(
//!     vec![PageText::new(1, "100 Main St: gasoline station (1962-1998)")],
//!     PcaCatalog::parse("28. Gasoline and Associated Products Storage in Fixed Tanks"),
//! );
//!
//! let outcome = orchestrator
//!     .run(request, &NoProgress, &CancellationToken::new())
//!     .await?;
//! println!("{} rows in {}", outcome.rows.len(), outcome.experiment_dir.display());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod artifacts;
mod chunking;
mod config;
mod error;
mod extractor;
mod pages;
mod parser;
mod prompt;
mod types;

#[cfg(test)]
mod tests;

pub use artifacts::ExperimentDir;
pub use chunking::PageChunker;
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::{finalize_rows, ExtractionOrchestrator};
pub use pages::{load_pages, parse_json_pages, parse_text_pages};
pub use parser::{rows_of, BraceSpan, FencedBlock, JsonRecoveryParser, RecoveryStrategy, StrictJson};
pub use prompt::{PcaCatalog, PromptBuilder, DEFAULT_INSTRUCTIONS};
pub use types::{
    ChunkResult, ExtractionOutcome, ExtractionRequest, NoProgress, ProgressEvent, ProgressSink,
};
