//! Output formatting for the CLI.
//!
//! Results go to stdout in the configured format; progress lines are
//! rendered separately for stderr.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use pcascan_eval::{EvaluationResult, Metrics};
use pcascan_extractor::ProgressEvent;
use pcascan_jobs::{JobStatus, Project};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the project listing.
    pub fn format_projects(&self, projects: &[Project]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(projects)?),
            OutputFormat::Table => Ok(self.format_projects_table(projects)),
        }
    }

    fn format_projects_table(&self, projects: &[Project]) -> String {
        if projects.is_empty() {
            return self.colorize("No projects found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Project", "Pages", "Ground truth", "GT rows"]);
        for project in projects {
            builder.push_record([
                project.id.clone(),
                file_name(&project.pages_file),
                file_name(&project.ground_truth_file),
                project.ground_truth_count.to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format evaluation results.
    pub fn format_evaluation(&self, result: &EvaluationResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&result.metrics)?),
            OutputFormat::Table => Ok(result.summary()),
        }
    }

    /// Format metrics alone.
    pub fn format_metrics(&self, metrics: &Metrics) -> Result<String> {
        if let OutputFormat::Json = self.format {
            return Ok(serde_json::to_string_pretty(metrics)?);
        }

        let mut builder = Builder::default();
        builder.push_record(["Metric", "Value"]);
        builder.push_record(["Precision".to_string(), percent(metrics.precision)]);
        builder.push_record(["Recall".to_string(), percent(metrics.recall)]);
        builder.push_record(["F1".to_string(), percent(metrics.f1_score)]);
        builder.push_record(["Accuracy".to_string(), percent(metrics.accuracy)]);
        builder.push_record(["True positives".to_string(), metrics.true_positives.to_string()]);
        builder.push_record(["False positives".to_string(), metrics.false_positives.to_string()]);
        builder.push_record(["False negatives".to_string(), metrics.false_negatives.to_string()]);

        let mut table = builder.build();
        table.with(Style::rounded());
        Ok(table.to_string())
    }

    /// Format the final status of a job.
    pub fn format_status(&self, status: &JobStatus) -> Result<String> {
        if let OutputFormat::Json = self.format {
            return Ok(serde_json::to_string_pretty(status)?);
        }

        let mut lines = vec![self.success(&status.current_step)];
        if let Some(dir) = &status.experiment_dir {
            lines.push(format!("Experiment: {}", dir.display()));
        }
        lines.push(format!(
            "Chunks: {}/{}, rows: {}",
            status.completed_chunks, status.total_chunks, status.total_rows
        ));
        Ok(lines.join("\n"))
    }

    /// Render a progress event as one line.
    pub fn progress(&self, event: &ProgressEvent) -> String {
        match event {
            ProgressEvent::ExperimentCreated { path } => {
                self.info(&format!("Experiment directory: {}", path.display()))
            }
            ProgressEvent::Step { message, percent } => {
                format!("[{:>3.0}%] {}", percent, message)
            }
            ProgressEvent::ChunksPlanned { total } => {
                self.info(&format!("{} chunk(s) planned", total))
            }
            ProgressEvent::ChunkCompleted { result, total_rows } => format!(
                "Chunk {}/{} (pages {}-{}): {} rows, {} total",
                result.chunk_num,
                result.total_chunks,
                result.pages_start,
                result.pages_end,
                result.row_count,
                total_rows
            ),
            ProgressEvent::Finished { total_rows } => {
                self.success(&format!("Extraction finished: {} rows", total_rows))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
