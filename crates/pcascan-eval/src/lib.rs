//! pcascan Evaluation
//!
//! Scores an extraction run against human-labelled ground truth.
//!
//! Addresses on both sides are normalized and reduced to a street key,
//! PCA identifiers are parsed out of free text, and a greedy one-to-one
//! linker pairs rows whose identifiers agree and whose addresses are
//! compatible and similar enough. Precision, recall, F1 and accuracy follow
//! from the match count.
//!
//! # Example
//!
//! ```
//! use pcascan_domain::{ExtractedRow, GroundTruthRow};
//! use pcascan_eval::{GroundTruth, RecordLinker};
//!
//! let truth = GroundTruth::from_rows(vec![GroundTruthRow {
//!     address: "100 Main Street, Unit 3".to_string(),
//!     pca_text: "#28 Gasoline and Associated Products Storage".to_string(),
//!     source: Some("ERIS".to_string()),
//! }]);
//! let extracted = vec![ExtractedRow::new("100 MAIN ST UNIT 3", Some(28))];
//!
//! let result = RecordLinker::default().evaluate(&truth, &extracted, None);
//! assert_eq!(result.metrics.true_positives, 1);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod ground_truth;
mod linker;
pub mod normalize;
mod report;
pub mod similarity;

pub use config::EvalConfig;
pub use error::EvalError;
pub use ground_truth::GroundTruth;
pub use linker::{
    EvaluationResult, FalseNegative, FalsePositive, Match, Metrics, RecordLinker,
    DEFAULT_MATCH_THRESHOLD,
};
pub use normalize::{addresses_compatible, normalize_address, pca_identifier, street_key};
pub use report::{
    evaluate_experiment, load_extracted_csv, MetricsReport, EVALUATION_DIR, FINAL_CSV,
};
pub use similarity::address_score;
