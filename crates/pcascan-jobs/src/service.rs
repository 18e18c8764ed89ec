//! Extraction and benchmark services
//!
//! Each service owns one [`JobSlot`] and runs its job on a tokio task. The
//! caller gets a [`JobHandle`] with the job id, a bounded stream of
//! progress events, and the final status once the task ends.

use crate::config::JobsConfig;
use crate::error::JobError;
use crate::projects::find_project;
use crate::slot::{JobSlot, StatusWriter};
use crate::status::{JobKind, JobStatus};
use pcascan_domain::{CancellationToken, JobId, ModelGateway};
use pcascan_eval::{evaluate_experiment, EvalConfig, GroundTruth};
use pcascan_extractor::{
    load_pages, ExtractionOrchestrator, ExtractionRequest, ExtractorConfig, PcaCatalog,
    ProgressEvent,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Progress before the project files have been read
const PROGRESS_LOCATE: f32 = 2.0;
const PROGRESS_CATALOG: f32 = 8.0;
const PROGRESS_PAGES: f32 = 10.0;
/// Progress once extraction is done and evaluation starts
const PROGRESS_EVALUATE: f32 = 90.0;

/// A started job
pub struct JobHandle {
    id: JobId,
    events: mpsc::Receiver<ProgressEvent>,
    task: JoinHandle<JobStatus>,
}

impl JobHandle {
    /// Identifier of the job
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Next progress event, or `None` once the job has finished
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        self.events.recv().await
    }

    /// Wait for the job and return its final status
    pub async fn wait(self) -> Result<JobStatus, JobError> {
        self.task
            .await
            .map_err(|e| JobError::Worker(e.to_string()))
    }
}

/// Runs extraction jobs one at a time
pub struct ExtractionService<G>
where
    G: ModelGateway,
{
    gateway: Arc<G>,
    slot: JobSlot,
    config: JobsConfig,
}

impl<G> ExtractionService<G>
where
    G: ModelGateway + 'static,
{
    /// Create a service that owns its gateway
    pub fn new(gateway: G, config: JobsConfig) -> Self {
        Self::from_shared(Arc::new(gateway), config)
    }

    /// Create a service around a shared gateway
    pub fn from_shared(gateway: Arc<G>, config: JobsConfig) -> Self {
        Self {
            gateway,
            slot: JobSlot::new(JobKind::Extraction),
            config,
        }
    }

    /// Snapshot of the current or last job
    pub fn status(&self) -> JobStatus {
        self.slot.status()
    }

    /// Whether a job is running
    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    /// Return the status to idle; rejected while running
    pub fn reset(&self) -> Result<(), JobError> {
        self.slot.reset()
    }

    /// Ask the running job to stop
    pub fn cancel(&self) {
        self.slot.cancel();
    }

    /// Start extracting `request`
    ///
    /// Must be called from within a tokio runtime. Fails with
    /// [`JobError::Busy`] when a job is already running.
    pub fn start(
        &self,
        request: ExtractionRequest,
        extractor: ExtractorConfig,
        api_key: Option<String>,
    ) -> Result<JobHandle, JobError> {
        self.config.validate().map_err(JobError::Config)?;
        let (id, guard) = self.slot.try_begin()?;

        let (tx, rx) = mpsc::channel(self.config.event_buffer);
        let writer = StatusWriter::new(self.slot.clone(), tx);
        let orchestrator =
            ExtractionOrchestrator::from_shared(Arc::clone(&self.gateway), extractor)
                .with_api_key(api_key);
        let slot = self.slot.clone();
        let cancel = slot.cancellation_token();

        let task = tokio::spawn(async move {
            let _guard = guard;
            match orchestrator.run(request, &writer, &cancel).await {
                Ok(outcome) => {
                    info!(job_id = %id, rows = outcome.rows.len(), "Extraction job completed");
                    slot.complete(format!(
                        "Complete! {} rows extracted ({} removed without a valid PCA number)",
                        outcome.rows.len(),
                        outcome.removed_count
                    ));
                }
                Err(e) => slot.fail(&JobError::from(e)),
            }
            slot.status()
        });

        Ok(JobHandle {
            id,
            events: rx,
            task,
        })
    }
}

/// Runs benchmark jobs (extraction plus evaluation) one at a time
pub struct BenchmarkService<G>
where
    G: ModelGateway,
{
    gateway: Arc<G>,
    slot: JobSlot,
    config: JobsConfig,
    eval: EvalConfig,
}

impl<G> BenchmarkService<G>
where
    G: ModelGateway + 'static,
{
    /// Create a service that owns its gateway
    pub fn new(gateway: G, config: JobsConfig, eval: EvalConfig) -> Self {
        Self::from_shared(Arc::new(gateway), config, eval)
    }

    /// Create a service around a shared gateway
    pub fn from_shared(gateway: Arc<G>, config: JobsConfig, eval: EvalConfig) -> Self {
        Self {
            gateway,
            slot: JobSlot::new(JobKind::Benchmark),
            config,
            eval,
        }
    }

    /// Snapshot of the current or last job
    pub fn status(&self) -> JobStatus {
        self.slot.status()
    }

    /// Whether a job is running
    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    /// Return the status to idle; rejected while running
    pub fn reset(&self) -> Result<(), JobError> {
        self.slot.reset()
    }

    /// Ask the running job to stop
    pub fn cancel(&self) {
        self.slot.cancel();
    }

    /// Start benchmarking `project_id`
    ///
    /// Ground truth is filtered to the configured default sources. Must be
    /// called from within a tokio runtime.
    pub fn start(
        &self,
        project_id: &str,
        extractor: ExtractorConfig,
        api_key: Option<String>,
    ) -> Result<JobHandle, JobError> {
        self.config.validate().map_err(JobError::Config)?;
        self.eval.validate().map_err(JobError::Config)?;
        let (id, guard) = self.slot.try_begin()?;

        let project_id = project_id.to_string();
        self.slot
            .update(|status| status.project_id = Some(project_id.clone()));

        let (tx, rx) = mpsc::channel(self.config.event_buffer);
        let job = BenchmarkJob {
            gateway: Arc::clone(&self.gateway),
            slot: self.slot.clone(),
            writer: StatusWriter::new(self.slot.clone(), tx),
            config: self.config.clone(),
            eval: self.eval.clone(),
            cancel: self.slot.cancellation_token(),
        };

        let task = tokio::spawn(async move {
            let _guard = guard;
            info!(job_id = %id, project = %project_id, "Benchmark job started");
            match job.run(&project_id, extractor, api_key).await {
                Ok(summary) => job.slot.complete(summary),
                Err(e) => job.slot.fail(&e),
            }
            job.slot.status()
        });

        Ok(JobHandle {
            id,
            events: rx,
            task,
        })
    }
}

struct BenchmarkJob<G: ModelGateway> {
    gateway: Arc<G>,
    slot: JobSlot,
    writer: StatusWriter,
    config: JobsConfig,
    eval: EvalConfig,
    cancel: CancellationToken,
}

impl<G> BenchmarkJob<G>
where
    G: ModelGateway + 'static,
{
    async fn run(
        &self,
        project_id: &str,
        extractor: ExtractorConfig,
        api_key: Option<String>,
    ) -> Result<String, JobError> {
        self.writer.step("Locating project files...", PROGRESS_LOCATE);
        let project = find_project(&self.config.projects_dir, project_id, &self.eval)?;

        let sources = self.eval.default_sources.clone();
        let ground_truth = GroundTruth::load(&project.ground_truth_file, &self.eval)?;
        let ground_truth_count = ground_truth.count_for_sources(&sources);
        if ground_truth.has_source_column() {
            info!(
                selected = ground_truth_count,
                total = ground_truth.len(),
                "Ground truth rows selected by source"
            );
        } else {
            warn!("Ground truth has no source column; using all rows");
        }
        self.slot
            .update(|status| status.ground_truth_count = Some(ground_truth_count));

        self.writer.step("Loading PCA definitions...", PROGRESS_CATALOG);
        let catalog = PcaCatalog::load(&self.config.pca_list)?;

        self.writer.step(
            format!("Reading pages from {}...", project.pages_file.display()),
            PROGRESS_PAGES,
        );
        let pages = load_pages(&project.pages_file)?;

        let request = ExtractionRequest::new(pages, catalog)
            .with_metadata("project_id", project.id.clone())
            .with_metadata("pages_file", project.pages_file.display().to_string())
            .with_metadata("benchmark", true);
        let orchestrator = ExtractionOrchestrator::from_shared(
            Arc::clone(&self.gateway),
            extractor.with_benchmark_progress(),
        )
        .with_api_key(api_key);
        let outcome = orchestrator.run(request, &self.writer, &self.cancel).await?;

        if self.cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        self.writer.step("Running evaluation...", PROGRESS_EVALUATE);
        let experiment_dir = outcome.experiment_dir.clone();
        let ground_truth_file = project.ground_truth_file.clone();
        let eval = self.eval.clone();
        let result = tokio::task::spawn_blocking(move || {
            evaluate_experiment(&experiment_dir, &ground_truth_file, Some(&sources), &eval)
        })
        .await
        .map_err(|e| JobError::Worker(e.to_string()))??;

        let metrics = result.metrics;
        info!(
            true_positives = metrics.true_positives,
            false_positives = metrics.false_positives,
            false_negatives = metrics.false_negatives,
            recall = metrics.recall,
            "Benchmark evaluation complete"
        );
        self.slot.update(|status| {
            status.metrics = Some(metrics);
            status.total_rows = outcome.rows.len();
        });

        Ok(format!(
            "Complete! Recall: {:.1}% ({} extracted / {} ground truth)",
            metrics.recall * 100.0,
            outcome.rows.len(),
            ground_truth_count
        ))
    }
}
