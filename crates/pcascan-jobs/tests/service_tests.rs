//! Integration tests for pcascan-jobs
//!
//! These tests drive the extraction and benchmark services end to end with
//! a scripted gateway and temporary directories.

use pcascan_domain::PageText;
use pcascan_eval::EvalConfig;
use pcascan_extractor::{ExtractionRequest, ExtractorConfig, PcaCatalog, ProgressEvent};
use pcascan_jobs::{
    BenchmarkService, ExtractionService, JobError, JobKind, JobState, JobsConfig,
};
use pcascan_llm::MockGateway;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const ROW_REPLY: &str = r#"{"rows": [{"address": "100 Main St", "location_relation_to_site": "On-Site", "pca_number": 28, "pca_name": "Gasoline and Associated Products Storage in Fixed Tanks", "description_timeline": "Retail fuel outlet 1962-1998"}]}"#;

fn extractor_config(root: &Path) -> ExtractorConfig {
    ExtractorConfig {
        model: "mock-model".to_string(),
        output_dir: root.join("output"),
        ..ExtractorConfig::default()
    }
}

fn jobs_config(root: &Path) -> JobsConfig {
    JobsConfig {
        projects_dir: root.join("projects"),
        pca_list: root.join("pca_definitions.txt"),
        ..JobsConfig::default()
    }
}

fn request() -> ExtractionRequest {
    ExtractionRequest::new(
        vec![
            PageText::new(1, "100 Main St retail fuel outlet"),
            PageText::new(2, "No further findings"),
        ],
        PcaCatalog::parse("28. Gasoline and Associated Products Storage in Fixed Tanks"),
    )
}

#[tokio::test]
async fn test_extraction_job_completes() {
    let root = TempDir::new().unwrap();
    let service = ExtractionService::new(MockGateway::new(ROW_REPLY), jobs_config(root.path()));

    let mut handle = service
        .start(request(), extractor_config(root.path()), None)
        .unwrap();
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }
    let status = handle.wait().await.unwrap();

    assert_eq!(status.status, JobState::Completed);
    assert_eq!(status.kind, Some(JobKind::Extraction));
    assert_eq!(status.progress_percent, 100.0);
    assert_eq!(status.total_chunks, 1);
    assert_eq!(status.completed_chunks, 1);
    assert_eq!(status.total_rows, 1);
    assert!(status.error.is_none());
    assert!(status.completed_at.is_some());

    let exp = status.experiment_dir.clone().unwrap();
    assert!(exp.join("final/final_rows_compiled.csv").exists());

    assert!(matches!(events.first(), Some(ProgressEvent::ExperimentCreated { .. })));
    assert!(matches!(events.last(), Some(ProgressEvent::Finished { total_rows: 1 })));
    assert!(!service.is_busy());
    assert_eq!(service.status(), status);
}

#[tokio::test]
async fn test_second_start_rejected_while_running() {
    let root = TempDir::new().unwrap();
    let gateway = MockGateway::new(ROW_REPLY).with_delay(Duration::from_millis(200));
    let service = ExtractionService::new(gateway, jobs_config(root.path()));

    let handle = service
        .start(request(), extractor_config(root.path()), None)
        .unwrap();
    let before = service.status();
    assert!(service.is_busy());

    let err = service
        .start(request(), extractor_config(root.path()), None)
        .err()
        .unwrap();
    assert!(matches!(err, JobError::Busy(JobKind::Extraction)));
    assert_eq!(service.status().job_id, before.job_id);

    assert!(matches!(service.reset(), Err(JobError::Busy(_))));

    let status = handle.wait().await.unwrap();
    assert_eq!(status.status, JobState::Completed);

    service.reset().unwrap();
    assert_eq!(service.status().status, JobState::Idle);
}

#[tokio::test]
async fn test_cancelled_job_ends_in_error() {
    let root = TempDir::new().unwrap();
    let gateway = MockGateway::new(ROW_REPLY).with_delay(Duration::from_millis(100));
    let service = ExtractionService::new(gateway.clone(), jobs_config(root.path()));

    let handle = service
        .start(request(), extractor_config(root.path()), None)
        .unwrap();
    service.cancel();
    let status = handle.wait().await.unwrap();

    assert_eq!(status.status, JobState::Error);
    assert_eq!(status.error.as_deref(), Some("cancelled"));
    // At most the in-flight call completes; compile never runs
    assert!(gateway.call_count() <= 1);
}

#[tokio::test]
async fn test_gateway_failure_ends_in_error() {
    let root = TempDir::new().unwrap();
    let gateway = MockGateway::default();
    gateway.push_error("quota exhausted");
    let service = ExtractionService::new(gateway, jobs_config(root.path()));

    let handle = service
        .start(request(), extractor_config(root.path()), None)
        .unwrap();
    let status = handle.wait().await.unwrap();

    assert_eq!(status.status, JobState::Error);
    assert!(status.error.unwrap().contains("quota exhausted"));
    assert!(status.experiment_dir.is_some());
    assert!(!service.is_busy());
}

fn write_project(root: &Path) -> PathBuf {
    fs::write(
        root.join("pca_definitions.txt"),
        "28. Gasoline and Associated Products Storage in Fixed Tanks\n37. Operation of Dry Cleaning Equipment\n",
    )
    .unwrap();

    let project = root.join("projects").join("site_a");
    fs::create_dir_all(&project).unwrap();
    fs::write(
        project.join("ERIS_report.txt"),
        "100 Main St retail fuel outlet\x0c9 Elm St dry cleaner",
    )
    .unwrap();
    fs::write(
        project.join("PCA_ground_truth.csv"),
        "Address,Potentially Contaminating Activity (PCA),Source\n\
         100 Main Street,#28 Gasoline and Associated Products Storage in Fixed Tanks,ERIS\n\
         9 Elm St,#37 Operation of Dry Cleaning Equipment,CD\n",
    )
    .unwrap();
    project
}

#[tokio::test]
async fn test_benchmark_job_reports_metrics() {
    let root = TempDir::new().unwrap();
    write_project(root.path());
    let service = BenchmarkService::new(
        MockGateway::new(ROW_REPLY),
        jobs_config(root.path()),
        EvalConfig::default(),
    );

    let handle = service
        .start("site_a", extractor_config(root.path()), None)
        .unwrap();
    let status = handle.wait().await.unwrap();

    assert_eq!(status.status, JobState::Completed, "{:?}", status.error);
    assert_eq!(status.project_id.as_deref(), Some("site_a"));
    assert_eq!(status.ground_truth_count, Some(1));
    assert_eq!(status.progress_percent, 100.0);

    let metrics = status.metrics.unwrap();
    assert_eq!(metrics.true_positives, 1);
    assert_eq!(metrics.gt_count, 1);
    assert_eq!(metrics.recall, 1.0);
    assert!(status.current_step.contains("Recall: 100.0%"));

    let exp = status.experiment_dir.unwrap();
    assert!(exp.join("evaluation/metrics.json").exists());
}

#[tokio::test]
async fn test_benchmark_unknown_project() {
    let root = TempDir::new().unwrap();
    write_project(root.path());
    let service = BenchmarkService::new(
        MockGateway::default(),
        jobs_config(root.path()),
        EvalConfig::default(),
    );

    let handle = service
        .start("missing", extractor_config(root.path()), None)
        .unwrap();
    let status = handle.wait().await.unwrap();

    assert_eq!(status.status, JobState::Error);
    assert!(status.error.unwrap().contains("Not found"));
    assert!(status.experiment_dir.is_none());
}
