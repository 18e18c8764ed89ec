//! Ground truth loading and source filtering

use crate::config::EvalConfig;
use crate::error::EvalError;
use pcascan_domain::GroundTruthRow;
use std::path::Path;
use tracing::{debug, warn};

/// Labelled activities for one project
///
/// Each row keeps its position in the source file so that reports refer
/// to the same row numbers after filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundTruth {
    rows: Vec<(usize, GroundTruthRow)>,
    has_source_column: bool,
}

impl GroundTruth {
    /// Build ground truth from rows already in memory
    pub fn from_rows(rows: Vec<GroundTruthRow>) -> Self {
        let has_source_column = rows.iter().any(|r| r.source.is_some());
        Self {
            rows: rows.into_iter().enumerate().collect(),
            has_source_column,
        }
    }

    /// Load ground truth from a CSV file
    ///
    /// The address and PCA columns named in `config` are required; the
    /// source column is optional.
    pub fn load(path: &Path, config: &EvalConfig) -> Result<Self, EvalError> {
        if !path.is_file() {
            return Err(EvalError::NotFound(path.to_path_buf()));
        }

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.trim() == name);

        let address_idx = column(&config.address_column).ok_or_else(|| EvalError::MissingColumn {
            column: config.address_column.clone(),
            file: path.to_path_buf(),
        })?;
        let pca_idx = column(&config.pca_column).ok_or_else(|| EvalError::MissingColumn {
            column: config.pca_column.clone(),
            file: path.to_path_buf(),
        })?;
        let source_idx = column(&config.source_column);

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or_default().to_string();
            let source = source_idx
                .and_then(|idx| record.get(idx))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            rows.push((
                index,
                GroundTruthRow {
                    address: field(address_idx),
                    pca_text: field(pca_idx),
                    source,
                },
            ));
        }

        debug!(path = %path.display(), rows = rows.len(), "Loaded ground truth");
        Ok(Self {
            rows,
            has_source_column: source_idx.is_some(),
        })
    }

    /// Rows with their original file positions
    pub fn rows(&self) -> &[(usize, GroundTruthRow)] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the file carried a source column
    pub fn has_source_column(&self) -> bool {
        self.has_source_column
    }

    /// Keep only rows whose source is one of `sources`
    ///
    /// Without a source column every row is kept and a warning is logged.
    pub fn filter_sources(&self, sources: &[String]) -> Self {
        if !self.has_source_column {
            warn!("Ground truth has no source column; using all rows");
            return self.clone();
        }

        let rows = self
            .rows
            .iter()
            .filter(|(_, row)| {
                row.source
                    .as_deref()
                    .is_some_and(|s| sources.iter().any(|wanted| wanted.trim() == s))
            })
            .cloned()
            .collect();

        Self {
            rows,
            has_source_column: true,
        }
    }

    /// Number of rows that would survive [`GroundTruth::filter_sources`]
    pub fn count_for_sources(&self, sources: &[String]) -> usize {
        if !self.has_source_column {
            return self.rows.len();
        }
        self.rows
            .iter()
            .filter(|(_, row)| {
                row.source
                    .as_deref()
                    .is_some_and(|s| sources.iter().any(|wanted| wanted.trim() == s))
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CSV: &str = "\
Address,Potentially Contaminating Activity (PCA),Source
100 Main St,#28 Gasoline Storage,ERIS
\"5 Elm St, Unit 2\",#37 Dry Cleaning,CD
9 Oak Ave,33,ERIS
";

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_ground_truth() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "gt.csv", CSV);

        let gt = GroundTruth::load(&path, &EvalConfig::default()).unwrap();
        assert_eq!(gt.len(), 3);
        assert!(gt.has_source_column());
        assert_eq!(gt.rows()[1].1.address, "5 Elm St, Unit 2");
        assert_eq!(gt.rows()[1].1.source.as_deref(), Some("CD"));
    }

    #[test]
    fn test_filter_keeps_original_indices() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "gt.csv", CSV);
        let gt = GroundTruth::load(&path, &EvalConfig::default()).unwrap();

        let eris = gt.filter_sources(&["ERIS".to_string()]);
        let indices: Vec<usize> = eris.rows().iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(gt.count_for_sources(&["ERIS".to_string()]), 2);
        assert_eq!(gt.count_for_sources(&["FIP".to_string()]), 0);
    }

    #[test]
    fn test_filter_without_source_column_keeps_all() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "gt.csv",
            "Address,Potentially Contaminating Activity (PCA)\n1 King St,#1 Acid Plant\n",
        );
        let gt = GroundTruth::load(&path, &EvalConfig::default()).unwrap();

        assert!(!gt.has_source_column());
        assert_eq!(gt.filter_sources(&["ERIS".to_string()]).len(), 1);
        assert_eq!(gt.count_for_sources(&["ERIS".to_string()]), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = GroundTruth::load(Path::new("/nonexistent/gt.csv"), &EvalConfig::default())
            .unwrap_err();
        assert!(matches!(err, EvalError::NotFound(_)));
    }

    #[test]
    fn test_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "gt.csv", "Street,PCA\n1 King St,1\n");

        let err = GroundTruth::load(&path, &EvalConfig::default()).unwrap_err();
        match err {
            EvalError::MissingColumn { column, .. } => assert_eq!(column, "Address"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
