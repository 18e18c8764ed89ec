//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::commands::follow;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use pcascan_domain::ModelGateway;
use pcascan_extractor::{load_pages, ExtractionRequest, PcaCatalog};
use pcascan_jobs::{ExtractionService, JobStatus};
use std::sync::Arc;

/// Execute the extract command.
pub async fn execute_extract<G>(
    args: ExtractArgs,
    config: &Config,
    gateway: Arc<G>,
    formatter: &Formatter,
) -> Result<JobStatus>
where
    G: ModelGateway + 'static,
{
    let mut extractor = config.extractor.clone();
    args.model.apply(&mut extractor);
    extractor.validate().map_err(CliError::Config)?;

    let pca_list = args
        .pca_list
        .clone()
        .unwrap_or_else(|| config.paths.pca_list.clone());
    let catalog = PcaCatalog::load(&pca_list)?;
    let pages = load_pages(&args.pages)?;
    tracing::info!(
        pages = pages.len(),
        pca_entries = catalog.len(),
        "Inputs loaded"
    );

    let request = ExtractionRequest::new(pages, catalog)
        .with_metadata("pages_file", args.pages.display().to_string())
        .with_metadata("pca_list", pca_list.display().to_string());

    let service = ExtractionService::from_shared(gateway, config.paths.clone());
    let handle = service.start(request, extractor, args.model.api_key.clone())?;
    let status = follow(handle, || service.cancel(), formatter).await?;

    println!("{}", formatter.format_status(&status)?);
    Ok(status)
}
