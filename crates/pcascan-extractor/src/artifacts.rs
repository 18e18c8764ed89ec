//! Experiment directories and the artifacts written into them
//!
//! Layout of one run:
//!
//! ```text
//! exp_007/
//!   experiment_config.json
//!   raw_llm_outputs.log
//!   chunks/chunk_001_pages_001-012.txt
//!   chunks/chunk_001_raw.txt
//!   chunks/chunk_001_fixed.txt      (only when repair ran)
//!   chunks/chunk_001_rows.json
//!   final/all_rows_raw.json
//!   final/compiled_raw.txt
//!   final/compiled_fixed.txt        (only when repair ran)
//!   final/final_rows_compiled.json
//!   final/final_rows_compiled.csv
//! ```

use crate::error::ExtractorError;
use pcascan_domain::ExtractedRow;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Subdirectory for per-chunk artifacts
pub const CHUNKS_DIR: &str = "chunks";
/// Subdirectory for accumulated and final artifacts
pub const FINAL_DIR: &str = "final";
/// Consolidated log of every raw model reply
pub const RAW_LOG_FILE: &str = "raw_llm_outputs.log";
/// Final rows as CSV, relative to the experiment directory
pub const FINAL_CSV: &str = "final/final_rows_compiled.csv";
/// Final rows as JSON, relative to the experiment directory
pub const FINAL_JSON: &str = "final/final_rows_compiled.json";

/// Column order of the final CSV
pub const CSV_COLUMNS: [&str; 7] = [
    "pca_identifier",
    "address",
    "location_relation_to_site",
    "pca_number",
    "pca_name",
    "description_timeline",
    "source_pages",
];

const BANNER: &str = "================================================================================";

/// Handle to one `exp_NNN` directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentDir {
    root: PathBuf,
}

impl ExperimentDir {
    /// Create the next numbered experiment directory under `base`
    ///
    /// The number is one more than the largest existing `exp_NNN`.
    pub fn create_next(base: &Path) -> Result<Self, ExtractorError> {
        fs::create_dir_all(base)?;

        let mut highest = 0;
        for entry in fs::read_dir(base)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(n) = experiment_number(&entry.file_name().to_string_lossy()) {
                highest = highest.max(n);
            }
        }

        let root = base.join(format!("exp_{:03}", highest + 1));
        fs::create_dir_all(root.join(CHUNKS_DIR))?;
        fs::create_dir_all(root.join(FINAL_DIR))?;
        Ok(Self { root })
    }

    /// Directory path
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Directory name, e.g. `exp_007`
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Write `experiment_config.json`
    pub fn write_metadata(&self, parameters: &Map<String, Value>) -> Result<(), ExtractorError> {
        let metadata = json!({
            "experiment": self.name(),
            "timestamp": unix_now(),
            "parameters": parameters,
        });
        self.save_json("experiment_config.json", &metadata)
    }

    /// Write a text artifact at `relative`
    pub fn save_text(&self, relative: &str, text: &str) -> Result<(), ExtractorError> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
        Ok(())
    }

    /// Write a pretty-printed JSON artifact at `relative`
    pub fn save_json<T: Serialize + ?Sized>(
        &self,
        relative: &str,
        value: &T,
    ) -> Result<(), ExtractorError> {
        let text = serde_json::to_string_pretty(value)?;
        self.save_text(relative, &text)
    }

    /// Append one reply to the consolidated raw-output log
    pub fn append_raw_log(&self, header: &str, reply: &str) -> Result<(), ExtractorError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(RAW_LOG_FILE))?;
        write!(
            file,
            "\n{BANNER}\n{header}\nTIMESTAMP: {} | RESPONSE LENGTH: {} chars\n{BANNER}\n\n{reply}\n\n",
            unix_now(),
            reply.chars().count(),
        )?;
        Ok(())
    }

    /// Write rows as CSV at `relative`
    pub fn write_rows_csv(&self, relative: &str, rows: &[ExtractedRow]) -> Result<(), ExtractorError> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_path(&path)?;
        writer.write_record(CSV_COLUMNS)?;
        for row in rows {
            writer.write_record(csv_fields(row))?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn csv_fields(row: &ExtractedRow) -> [String; 7] {
    [
        row.pca_identifier.map(|n| n.to_string()).unwrap_or_default(),
        row.address.clone(),
        row.location_relation_to_site.clone(),
        row.pca_number
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        row.pca_name.clone(),
        row.description_timeline.clone(),
        row.source_pages.clone().unwrap_or_default(),
    ]
}

fn experiment_number(name: &str) -> Option<u32> {
    let digits: String = name
        .strip_prefix("exp_")?
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Seconds since the Unix epoch
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
