//! Experiment evaluation reports
//!
//! Reads the final CSV of an experiment, links it against ground truth, and
//! writes the results under `evaluation/` in the experiment directory.

use crate::config::EvalConfig;
use crate::error::EvalError;
use crate::ground_truth::GroundTruth;
use crate::linker::{EvaluationResult, Metrics, RecordLinker};
use pcascan_domain::{ExtractedRow, PcaNumber};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Final rows of an experiment, relative to its directory
pub const FINAL_CSV: &str = "final/final_rows_compiled.csv";

/// Evaluation output directory, relative to the experiment directory
pub const EVALUATION_DIR: &str = "evaluation";

/// Contents of `evaluation/metrics.json`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    /// Ground truth CSV that was used
    pub ground_truth_file: PathBuf,
    /// Final CSV that was evaluated
    pub extracted_file: PathBuf,
    /// Sources kept from the ground truth, if filtered
    pub sources_filter: Option<Vec<String>>,
    /// Summary metrics
    pub metrics: Metrics,
}

/// Read extracted rows from a final CSV
///
/// Missing columns read as empty. A `pca_number` cell that parses as an
/// integer becomes [`PcaNumber::Integer`]; other non-empty text is kept
/// as-is.
pub fn load_extracted_csv(path: &Path) -> Result<Vec<ExtractedRow>, EvalError> {
    if !path.is_file() {
        return Err(EvalError::NotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let address = column("address");
    let relation = column("location_relation_to_site");
    let pca_number = column("pca_number");
    let pca_name = column("pca_name");
    let description = column("description_timeline");
    let source_pages = column("source_pages");
    let identifier = column("pca_identifier");

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };
        let non_empty = |idx: Option<usize>| {
            let value = cell(idx);
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        rows.push(ExtractedRow {
            address: cell(address),
            location_relation_to_site: cell(relation),
            pca_number: non_empty(pca_number).map(|text| match text.parse::<i64>() {
                Ok(n) => PcaNumber::Integer(n),
                Err(_) => PcaNumber::Other(Value::String(text)),
            }),
            pca_name: cell(pca_name),
            description_timeline: cell(description),
            source_pages: non_empty(source_pages),
            pca_identifier: non_empty(identifier).and_then(|text| text.parse().ok()),
            ..ExtractedRow::default()
        });
    }

    Ok(rows)
}

/// Evaluate one experiment directory against a ground truth file
///
/// Writes `evaluation/metrics.json` and, when non-empty, `matches.csv`,
/// `false_negatives.csv` and `false_positives.csv`. An empty report removes
/// the file left by an earlier run.
pub fn evaluate_experiment(
    experiment_dir: &Path,
    ground_truth_file: &Path,
    sources: Option<&[String]>,
    config: &EvalConfig,
) -> Result<EvaluationResult, EvalError> {
    config.validate().map_err(EvalError::Config)?;

    if !experiment_dir.is_dir() {
        return Err(EvalError::NotFound(experiment_dir.to_path_buf()));
    }
    let extracted_file = experiment_dir.join(FINAL_CSV);
    let extracted = load_extracted_csv(&extracted_file)?;
    let ground_truth = GroundTruth::load(ground_truth_file, config)?;

    let linker = RecordLinker::new(config.match_threshold);
    info!(
        experiment = %experiment_dir.display(),
        gt_rows = ground_truth.len(),
        extracted_rows = extracted.len(),
        threshold = linker.threshold(),
        "Evaluating experiment"
    );
    if extracted.is_empty() {
        warn!("Experiment has no extracted rows");
    }

    let result = linker.evaluate(&ground_truth, &extracted, sources);

    let eval_dir = experiment_dir.join(EVALUATION_DIR);
    fs::create_dir_all(&eval_dir)?;

    let report = MetricsReport {
        ground_truth_file: ground_truth_file.to_path_buf(),
        extracted_file,
        sources_filter: sources.map(<[String]>::to_vec),
        metrics: result.metrics,
    };
    fs::write(
        eval_dir.join("metrics.json"),
        serde_json::to_string_pretty(&report)?,
    )?;

    write_csv(&eval_dir.join("matches.csv"), &result.matches)?;
    write_csv(&eval_dir.join("false_negatives.csv"), &result.false_negatives)?;
    write_csv(&eval_dir.join("false_positives.csv"), &result.false_positives)?;

    Ok(result)
}

fn write_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<(), EvalError> {
    if records.is_empty() {
        if path.exists() {
            fs::remove_file(path)?;
        }
        return Ok(());
    }
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
