//! pcascan Domain Layer
//!
//! Core value types shared by every pcascan crate: document pages and
//! chunks, extracted and ground-truth activity records, job identifiers,
//! and the [`ModelGateway`] boundary trait that model backends implement.
//!
//! ## Key Concepts
//!
//! - **PageText / Chunk**: ordered document pages and the word-bounded runs
//!   of pages sent to the model
//! - **ExtractedRow**: one potentially contaminating activity (PCA) record
//! - **GroundTruthRow**: a human-labelled record used for evaluation
//! - **ModelGateway**: "submit prompt, receive text"
//! - **CancellationToken**: cooperative stop flag for running jobs
//!
//! ## Architecture
//!
//! Only serde and uuid are pulled in. Everything that performs I/O lives in
//! other crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod job;
pub mod page;
pub mod row;
pub mod traits;

// Re-exports for convenience
pub use cancel::CancellationToken;
pub use job::JobId;
pub use page::{Chunk, PageText};
pub use row::{ExtractedRow, GroundTruthRow, PcaNumber};
pub use traits::{ModelGateway, ModelParams};
