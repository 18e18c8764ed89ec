//! Extraction orchestrator
//!
//! Drives one run end to end: chunk the document, call the model once per
//! chunk, recover JSON from each reply, compile the accumulated rows in a
//! final deduplication call, then filter, renumber and persist.

use crate::artifacts::{ExperimentDir, FINAL_CSV, FINAL_JSON};
use crate::chunking::PageChunker;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::{rows_of, JsonRecoveryParser};
use crate::prompt::{PromptBuilder, DEFAULT_INSTRUCTIONS};
use crate::types::{
    ChunkResult, ExtractionOutcome, ExtractionRequest, ProgressEvent, ProgressSink,
};
use pcascan_domain::{CancellationToken, ExtractedRow, ModelGateway, ModelParams};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where one model call's artifacts go
struct CallArtifacts {
    raw_file: String,
    fixed_file: String,
    log_header: String,
}

/// Runs the extraction pipeline against a [`ModelGateway`]
pub struct ExtractionOrchestrator<G>
where
    G: ModelGateway,
{
    gateway: Arc<G>,
    config: ExtractorConfig,
    params: ModelParams,
    parser: JsonRecoveryParser,
}

impl<G> ExtractionOrchestrator<G>
where
    G: ModelGateway + 'static,
{
    /// Create an orchestrator that owns its gateway
    pub fn new(gateway: G, config: ExtractorConfig) -> Self {
        Self::from_shared(Arc::new(gateway), config)
    }

    /// Create an orchestrator around a shared gateway
    pub fn from_shared(gateway: Arc<G>, config: ExtractorConfig) -> Self {
        let params = ModelParams::new(config.model.clone(), config.temperature);
        Self {
            gateway,
            config,
            params,
            parser: JsonRecoveryParser::default(),
        }
    }

    /// Send `api_key` with every call
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.params.api_key = api_key;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Run one extraction
    ///
    /// Cancellation is checked before every model call and after every
    /// reply. A gateway or filesystem failure aborts the run; artifacts
    /// written up to that point stay on disk.
    pub async fn run(
        &self,
        request: ExtractionRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExtractionOutcome, ExtractorError> {
        self.config.validate().map_err(ExtractorError::Config)?;
        if request.pages.is_empty() {
            return Err(ExtractorError::InvalidInput(
                "document has no pages".to_string(),
            ));
        }

        let instructions = match &self.config.prompt_template {
            Some(path) => PromptBuilder::load_instructions(path)?,
            None => DEFAULT_INSTRUCTIONS.to_string(),
        };
        let prompts = PromptBuilder::new(instructions, &request.catalog);

        let exp = ExperimentDir::create_next(&self.config.output_dir)?;
        info!(
            experiment = %exp.name(),
            pages = request.pages.len(),
            catalog_entries = request.catalog.len(),
            "Extraction started"
        );
        sink.on_event(ProgressEvent::ExperimentCreated {
            path: exp.path().to_path_buf(),
        });

        let mut parameters = request.metadata.clone();
        parameters.insert("model".to_string(), json!(self.config.model));
        parameters.insert("temperature".to_string(), json!(self.config.temperature));
        parameters.insert(
            "chunk_word_limit".to_string(),
            json!(self.config.chunk_word_limit),
        );
        parameters.insert("page_count".to_string(), json!(request.pages.len()));
        exp.write_metadata(&parameters)?;

        let chunks = PageChunker::new(self.config.chunk_word_limit).chunk(&request.pages);
        let total = chunks.len();
        info!(chunks = total, word_limit = self.config.chunk_word_limit, "Document chunked");
        sink.on_event(ProgressEvent::ChunksPlanned { total });
        sink.on_event(ProgressEvent::Step {
            message: format!("Chunked {} pages into {} chunks", request.pages.len(), total),
            percent: self.config.progress_baseline,
        });

        let mut all_rows: Vec<ExtractedRow> = Vec::new();
        let mut chunk_results = Vec::with_capacity(total);

        for (i, chunk) in chunks.iter().enumerate() {
            let idx = i + 1;
            sink.on_event(ProgressEvent::Step {
                message: format!(
                    "Processing chunk {}/{} (pages {}-{})...",
                    idx, total, chunk.start, chunk.end
                ),
                percent: self.config.chunk_progress(idx, total),
            });

            exp.save_text(
                &format!(
                    "chunks/chunk_{:03}_pages_{:03}-{:03}.txt",
                    idx, chunk.start, chunk.end
                ),
                &chunk.text(),
            )?;

            let artifacts = CallArtifacts {
                raw_file: format!("chunks/chunk_{:03}_raw.txt", idx),
                fixed_file: format!("chunks/chunk_{:03}_fixed.txt", idx),
                log_header: format!(
                    "CHUNK {}/{} | PAGES {}-{} | MODEL: {}",
                    idx, total, chunk.start, chunk.end, self.config.model
                ),
            };
            let parsed = self
                .call_and_parse(&exp, prompts.chunk_prompt(chunk), &artifacts, cancel)
                .await?;

            let mut rows = Vec::new();
            match parsed.as_ref().and_then(rows_of) {
                Some(items) => {
                    rows = decode_rows(items, idx);
                    for row in &mut rows {
                        row.default_source_pages(chunk.start, chunk.end);
                    }
                    exp.save_json(&format!("chunks/chunk_{:03}_rows.json", idx), &rows)?;
                    info!(chunk = idx, rows = rows.len(), "Chunk extracted");
                }
                None => warn!(chunk = idx, "No valid rows extracted from reply"),
            }

            let result = ChunkResult {
                chunk_num: idx,
                total_chunks: total,
                pages_start: chunk.start,
                pages_end: chunk.end,
                row_count: rows.len(),
            };
            all_rows.extend(rows);
            exp.save_json("final/all_rows_raw.json", &all_rows)?;

            chunk_results.push(result.clone());
            sink.on_event(ProgressEvent::ChunkCompleted {
                result,
                total_rows: all_rows.len(),
            });
        }

        sink.on_event(ProgressEvent::Step {
            message: format!("Processed {} chunks, {} raw rows", total, all_rows.len()),
            percent: self.config.progress_chunk_band_end,
        });

        let (compiled, compile_fallback) = self
            .compile(&exp, &prompts, &all_rows, sink, cancel)
            .await?;

        let (rows, removed_count) =
            finalize_rows(compiled, self.config.pca_min, self.config.pca_max);
        info!(
            removed = removed_count,
            kept = rows.len(),
            "Filtered rows without a valid PCA number"
        );
        exp.save_json(FINAL_JSON, &rows)?;

        sink.on_event(ProgressEvent::Step {
            message: "Saving CSV...".to_string(),
            percent: self.config.progress_persist,
        });
        exp.write_rows_csv(FINAL_CSV, &rows)?;

        info!(experiment = %exp.name(), rows = rows.len(), "Extraction complete");
        sink.on_event(ProgressEvent::Finished {
            total_rows: rows.len(),
        });

        Ok(ExtractionOutcome {
            experiment_dir: exp.path().to_path_buf(),
            chunk_results,
            raw_row_count: all_rows.len(),
            compile_fallback,
            removed_count,
            rows,
        })
    }

    /// Deduplicate across chunks; falls back to the raw rows when the reply
    /// cannot be recovered
    async fn compile(
        &self,
        exp: &ExperimentDir,
        prompts: &PromptBuilder,
        raw_rows: &[ExtractedRow],
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<(Vec<ExtractedRow>, bool), ExtractorError> {
        sink.on_event(ProgressEvent::Step {
            message: "Compiling and deduplicating results...".to_string(),
            percent: self.config.progress_compile,
        });
        info!(raw_rows = raw_rows.len(), "Compile pass started");

        let artifacts = CallArtifacts {
            raw_file: "final/compiled_raw.txt".to_string(),
            fixed_file: "final/compiled_fixed.txt".to_string(),
            log_header: format!("COMPILE STEP | MODEL: {}", self.config.model),
        };
        let parsed = self
            .call_and_parse(exp, prompts.compile_prompt(raw_rows)?, &artifacts, cancel)
            .await?;

        match parsed.as_ref().and_then(rows_of) {
            Some(items) => {
                let rows = decode_rows(items, 0);
                info!(compiled_rows = rows.len(), "Compile pass complete");
                Ok((rows, false))
            }
            None => {
                warn!("Compile reply unusable, falling back to raw rows");
                Ok((raw_rows.to_vec(), true))
            }
        }
    }

    /// One model call plus at most one repair call
    async fn call_and_parse(
        &self,
        exp: &ExperimentDir,
        prompt: String,
        artifacts: &CallArtifacts,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, ExtractorError> {
        ensure_active(cancel)?;
        debug!(prompt_chars = prompt.len(), "Calling model");
        let raw = self.submit(prompt).await?;
        ensure_active(cancel)?;

        debug!(reply_chars = raw.len(), "Model replied");
        exp.save_text(&artifacts.raw_file, &raw)?;
        exp.append_raw_log(&artifacts.log_header, &raw)?;

        if let Some(value) = self.parser.parse(&raw) {
            return Ok(Some(value));
        }

        warn!(artifact = %artifacts.raw_file, "JSON parse failed, requesting repair");
        let fixed = self.submit(PromptBuilder::repair_prompt(&raw)).await?;
        ensure_active(cancel)?;

        exp.save_text(&artifacts.fixed_file, &fixed)?;
        exp.append_raw_log(
            &format!("{} | JSON FIX ATTEMPT", artifacts.log_header),
            &fixed,
        )?;

        let value = self.parser.parse(&fixed);
        if value.is_none() {
            warn!(artifact = %artifacts.fixed_file, "JSON repair failed");
        }
        Ok(value)
    }

    /// Call the gateway on a blocking thread
    async fn submit(&self, prompt: String) -> Result<String, ExtractorError> {
        let gateway = Arc::clone(&self.gateway);
        let params = self.params.clone();

        tokio::task::spawn_blocking(move || {
            gateway
                .submit(&prompt, &params)
                .map_err(|e| ExtractorError::Gateway(e.to_string()))
        })
        .await
        .map_err(|e| ExtractorError::Join(e.to_string()))?
    }
}

fn ensure_active(cancel: &CancellationToken) -> Result<(), ExtractorError> {
    if cancel.is_cancelled() {
        return Err(ExtractorError::Cancelled);
    }
    Ok(())
}

fn decode_rows(items: &[Value], chunk: usize) -> Vec<ExtractedRow> {
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let row = ExtractedRow::from_value(item);
            if row.is_none() {
                warn!(chunk, index = i, "Skipping row that is not a record object");
            }
            row
        })
        .collect()
}

/// Keep rows whose PCA number is an integer in `[pca_min, pca_max]` and
/// number them from 1
///
/// Returns the kept rows and how many were removed.
pub fn finalize_rows(
    rows: Vec<ExtractedRow>,
    pca_min: i64,
    pca_max: i64,
) -> (Vec<ExtractedRow>, usize) {
    let before = rows.len();
    let mut kept: Vec<ExtractedRow> = rows
        .into_iter()
        .filter(|row| {
            row.pca_integer()
                .is_some_and(|n| (pca_min..=pca_max).contains(&n))
        })
        .collect();

    for (i, row) in kept.iter_mut().enumerate() {
        row.pca_identifier = Some(i as u32 + 1);
    }

    let removed = before - kept.len();
    (kept, removed)
}
