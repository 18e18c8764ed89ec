//! pcascan Jobs
//!
//! Single-flight job services for extraction and benchmark runs.
//!
//! # Overview
//!
//! - **Slots**: each service admits one running job; a second start is
//!   rejected with [`JobError::Busy`] and leaves the status untouched
//! - **Status**: observers read whole [`JobStatus`] snapshots; progress
//!   never decreases while a job runs
//! - **Events**: every job publishes progress on a bounded channel and
//!   drops events rather than wait on a slow observer
//! - **Cancellation**: honoured between model calls; a cancelled job ends
//!   in the `error` state with the message `cancelled`
//!
//! # Lifecycle
//!
//! ```text
//! idle ──start──▶ running ──▶ completed
//!   ▲                 │
//!   │                 └──────▶ error
//!   └──────reset (not while running)
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use pcascan_domain::PageText;
//! use pcascan_extractor::{ExtractionRequest, ExtractorConfig, PcaCatalog};
//! use pcascan_jobs::{ExtractionService, JobsConfig};
//! use pcascan_llm::MockGateway;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ExtractionService::new(MockGateway::default(), JobsConfig::default());
//!     let request = ExtractionRequest::new(
//!         vec![PageText::new(1, "100 Main St: retail fuel outlet")],
//!         PcaCatalog::parse("28. Gasoline and Associated Products Storage in Fixed Tanks"),
//!     );
//!
//!     let mut handle = service.start(request, ExtractorConfig::default(), None)?;
//!     while let Some(event) = handle.next_event().await {
//!         println!("{:?}", event);
//!     }
//!     let status = handle.wait().await?;
//!     println!("{:?}: {}", status.status, status.current_step);
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [paths]
//! projects_dir = "projects"
//! pca_list = "data/pca_definitions.txt"
//! event_buffer = 64
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod projects;
mod service;
mod slot;
mod status;

pub use config::JobsConfig;
pub use error::JobError;
pub use projects::{discover_projects, find_project, Project};
pub use service::{BenchmarkService, ExtractionService, JobHandle};
pub use slot::{JobGuard, JobSlot, StatusWriter};
pub use status::{JobKind, JobState, JobStatus};
