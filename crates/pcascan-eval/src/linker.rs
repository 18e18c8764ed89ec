//! Greedy record linkage between ground truth and extracted rows
//!
//! Ground truth rows are visited in file order. Each one takes the
//! best-scoring extracted row that has not been consumed yet, provided the
//! PCA identifiers agree, the addresses are compatible, and the address
//! score reaches the threshold. Consumed rows are never reconsidered, so
//! the resulting matching is one-to-one.

use crate::ground_truth::GroundTruth;
use crate::normalize::{addresses_compatible, pca_identifier};
use crate::similarity::address_score;
use pcascan_domain::ExtractedRow;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default minimum address score for a match
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.5;

/// A ground truth row paired with an extracted row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Position of the row in the ground truth file
    #[serde(rename = "gt_idx")]
    pub gt_index: usize,
    /// Position of the row in the extracted rows
    #[serde(rename = "ext_idx")]
    pub ext_index: usize,
    /// Address score in `[0.0, 1.0]`
    pub score: f64,
    /// Ground truth address as written
    pub gt_address: String,
    /// Extracted address as written
    pub ext_address: String,
    /// Shared PCA identifier
    pub pca_number: String,
}

/// A ground truth row with no extracted counterpart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FalseNegative {
    /// Position of the row in the ground truth file
    #[serde(rename = "gt_idx")]
    pub gt_index: usize,
    /// Address as written
    pub address: String,
    /// PCA column text
    pub pca: String,
    /// Identifier parsed from the PCA text
    pub pca_number: Option<String>,
}

/// An extracted row with no ground truth counterpart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FalsePositive {
    /// Position of the row in the extracted rows
    #[serde(rename = "ext_idx")]
    pub ext_index: usize,
    /// Address as written
    pub address: String,
    /// `"{pca_number}: {pca_name}"`
    pub pca: String,
    /// Identifier parsed from the PCA number
    pub pca_number: Option<String>,
}

/// Precision, recall and counts for one evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// TP / extracted
    pub precision: f64,
    /// TP / ground truth
    pub recall: f64,
    /// Harmonic mean of precision and recall
    pub f1_score: f64,
    /// TP / (TP + FP + FN)
    pub accuracy: f64,
    /// Matched pairs
    pub true_positives: usize,
    /// Extracted rows left unmatched
    pub false_positives: usize,
    /// Ground truth rows left unmatched
    pub false_negatives: usize,
    /// Ground truth rows considered
    pub gt_count: usize,
    /// Extracted rows considered
    pub extracted_count: usize,
}

impl Metrics {
    /// Compute metrics from match and row counts
    ///
    /// Every ratio with a zero denominator is 0.
    pub fn compute(true_positives: usize, gt_count: usize, extracted_count: usize) -> Self {
        let false_negatives = gt_count.saturating_sub(true_positives);
        let false_positives = extracted_count.saturating_sub(true_positives);

        let ratio = |num: usize, den: usize| {
            if den == 0 {
                0.0
            } else {
                num as f64 / den as f64
            }
        };

        let precision = ratio(true_positives, extracted_count);
        let recall = ratio(true_positives, gt_count);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        let accuracy = ratio(
            true_positives,
            true_positives + false_positives + false_negatives,
        );

        Self {
            precision,
            recall,
            f1_score,
            accuracy,
            true_positives,
            false_positives,
            false_negatives,
            gt_count,
            extracted_count,
        }
    }
}

/// Outcome of linking one experiment against its ground truth
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Summary metrics
    pub metrics: Metrics,
    /// Accepted pairs, in ground truth order
    pub matches: Vec<Match>,
    /// Unmatched ground truth rows
    pub false_negatives: Vec<FalseNegative>,
    /// Unmatched extracted rows
    pub false_positives: Vec<FalsePositive>,
}

impl EvaluationResult {
    /// Human-readable report
    pub fn summary(&self) -> String {
        let m = &self.metrics;
        let rule = "=".repeat(80);
        let lines = vec![
            rule.clone(),
            "EVALUATION RESULTS".to_string(),
            rule.clone(),
            format!("Ground Truth Rows:    {}", m.gt_count),
            format!("Extracted Rows:       {}", m.extracted_count),
            format!("Correctly Matched:    {}", m.true_positives),
            format!("False Positives:      {}", m.false_positives),
            format!("False Negatives:      {}", m.false_negatives),
            String::new(),
            format!("Precision:  {:.2}%", m.precision * 100.0),
            format!("Recall:     {:.2}%", m.recall * 100.0),
            format!("F1 Score:   {:.2}%", m.f1_score * 100.0),
            format!("Accuracy:   {:.2}%", m.accuracy * 100.0),
            rule,
        ];
        lines.join("\n")
    }
}

/// Matches extracted rows to ground truth
#[derive(Debug, Clone, Copy)]
pub struct RecordLinker {
    threshold: f64,
}

impl Default for RecordLinker {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

struct Candidate<'a> {
    index: usize,
    row: &'a ExtractedRow,
    pca_id: Option<String>,
}

impl RecordLinker {
    /// Create a linker accepting matches scoring at least `threshold`
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Minimum accepted score
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Link `extracted` against `ground_truth`
    ///
    /// When `sources` is given, ground truth rows from other sources are
    /// dropped first.
    pub fn evaluate(
        &self,
        ground_truth: &GroundTruth,
        extracted: &[ExtractedRow],
        sources: Option<&[String]>,
    ) -> EvaluationResult {
        let filtered;
        let ground_truth = match sources {
            Some(sources) => {
                filtered = ground_truth.filter_sources(sources);
                &filtered
            }
            None => ground_truth,
        };

        let candidates: Vec<Candidate<'_>> = extracted
            .iter()
            .enumerate()
            .map(|(index, row)| Candidate {
                index,
                row,
                pca_id: extracted_pca_id(row),
            })
            .collect();
        let mut consumed = vec![false; candidates.len()];
        let mut matches = Vec::new();
        let mut false_negatives = Vec::new();

        for (gt_index, gt_row) in ground_truth.rows() {
            let gt_pca = pca_identifier(&gt_row.pca_text);

            let best = gt_pca.as_deref().and_then(|gt_pca| {
                let mut best: Option<(usize, f64)> = None;
                let mut best_score = 0.0;

                for candidate in &candidates {
                    if consumed[candidate.index] || candidate.pca_id.as_deref() != Some(gt_pca) {
                        continue;
                    }
                    if !addresses_compatible(&gt_row.address, &candidate.row.address) {
                        continue;
                    }
                    let score = address_score(&gt_row.address, &candidate.row.address);
                    if score > best_score {
                        best_score = score;
                        best = Some((candidate.index, score));
                    }
                }

                best.filter(|(_, score)| *score >= self.threshold)
            });

            match (best, gt_pca) {
                (Some((ext_index, score)), Some(pca_number)) => {
                    consumed[ext_index] = true;
                    debug!(gt_index = *gt_index, ext_index, score, "Matched row");
                    matches.push(Match {
                        gt_index: *gt_index,
                        ext_index,
                        score,
                        gt_address: gt_row.address.clone(),
                        ext_address: extracted[ext_index].address.clone(),
                        pca_number,
                    });
                }
                (_, pca_number) => false_negatives.push(FalseNegative {
                    gt_index: *gt_index,
                    address: gt_row.address.clone(),
                    pca: gt_row.pca_text.clone(),
                    pca_number,
                }),
            }
        }

        let false_positives = candidates
            .iter()
            .filter(|c| !consumed[c.index])
            .map(|c| FalsePositive {
                ext_index: c.index,
                address: c.row.address.clone(),
                pca: format!("{}: {}", pca_number_text(c.row), c.row.pca_name),
                pca_number: c.pca_id.clone(),
            })
            .collect();

        let metrics = Metrics::compute(matches.len(), ground_truth.len(), extracted.len());
        info!(
            true_positives = metrics.true_positives,
            gt_count = metrics.gt_count,
            extracted_count = metrics.extracted_count,
            f1 = metrics.f1_score,
            "Evaluation complete"
        );

        EvaluationResult {
            metrics,
            matches,
            false_negatives,
            false_positives,
        }
    }
}

fn pca_number_text(row: &ExtractedRow) -> String {
    row.pca_number
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn extracted_pca_id(row: &ExtractedRow) -> Option<String> {
    pca_identifier(&pca_number_text(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcascan_domain::GroundTruthRow;

    fn gt(address: &str, pca: &str) -> GroundTruthRow {
        GroundTruthRow {
            address: address.to_string(),
            pca_text: pca.to_string(),
            source: None,
        }
    }

    #[test]
    fn test_threshold_gates_matches() {
        assert_eq!(RecordLinker::default().threshold(), DEFAULT_MATCH_THRESHOLD);

        let truth = GroundTruth::from_rows(vec![gt("100 Main St", "#28")]);
        let extracted = vec![ExtractedRow::new("100 Maple Ave", Some(28))];
        let strict = RecordLinker::new(1.0);
        assert_eq!(strict.threshold(), 1.0);
        assert!(strict.evaluate(&truth, &extracted, None).matches.is_empty());
        assert_eq!(RecordLinker::new(0.0).evaluate(&truth, &extracted, None).matches.len(), 1);
    }

    #[test]
    fn test_metrics_zero_safe() {
        let m = Metrics::compute(0, 0, 0);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1_score, 0.0);
        assert_eq!(m.accuracy, 0.0);

        let m = Metrics::compute(0, 3, 0);
        assert_eq!(m.false_negatives, 3);
        assert_eq!(m.precision, 0.0);
    }

    #[test]
    fn test_metrics_values() {
        let m = Metrics::compute(1, 1, 2);
        assert_eq!(m.precision, 0.5);
        assert_eq!(m.recall, 1.0);
        assert!((m.f1_score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.accuracy, 0.5);
        assert_eq!(m.false_positives, 1);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let truth = GroundTruth::from_rows(vec![gt("7 Pine Rd", "#4")]);
        let extracted = vec![
            ExtractedRow::new("7 Pine Rd", Some(4)),
            ExtractedRow::new("7 Pine Rd", Some(4)),
        ];

        let result = RecordLinker::default().evaluate(&truth, &extracted, None);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].ext_index, 0);
        assert_eq!(result.false_positives[0].ext_index, 1);
    }

    #[test]
    fn test_unparseable_gt_identifier_never_matches() {
        let truth = GroundTruth::from_rows(vec![gt("7 Pine Rd", "Unknown activity")]);
        let extracted = vec![ExtractedRow::new("7 Pine Rd", Some(4))];

        let result = RecordLinker::default().evaluate(&truth, &extracted, None);
        assert!(result.matches.is_empty());
        assert_eq!(result.false_negatives[0].pca_number, None);
    }

    #[test]
    fn test_false_positive_pca_text() {
        let truth = GroundTruth::default();
        let mut row = ExtractedRow::new("1 King St", Some(28));
        row.pca_name = "Gasoline Storage".to_string();

        let result = RecordLinker::default().evaluate(&truth, &[row], None);
        assert_eq!(result.false_positives[0].pca, "28: Gasoline Storage");
        assert_eq!(result.false_positives[0].pca_number.as_deref(), Some("28"));
    }

    #[test]
    fn test_summary_mentions_counts() {
        let result = EvaluationResult {
            metrics: Metrics::compute(1, 2, 1),
            ..EvaluationResult::default()
        };
        let summary = result.summary();
        assert!(summary.contains("Ground Truth Rows:    2"));
        assert!(summary.contains("Recall:     50.00%"));
    }
}
