//! Benchmark command implementation.

use crate::cli::BenchmarkArgs;
use crate::commands::follow;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use pcascan_domain::ModelGateway;
use pcascan_jobs::{BenchmarkService, JobStatus};
use std::sync::Arc;

/// Execute the benchmark command.
pub async fn execute_benchmark<G>(
    args: BenchmarkArgs,
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

    let mut paths = config.paths.clone();
    if let Some(dir) = &args.projects_dir {
        paths.projects_dir = dir.clone();
    }
    if let Some(list) = &args.pca_list {
        paths.pca_list = list.clone();
    }

    let service = BenchmarkService::from_shared(gateway, paths, config.eval.clone());
    let handle = service.start(&args.project, extractor, args.model.api_key.clone())?;
    let status = follow(handle, || service.cancel(), formatter).await?;

    println!("{}", formatter.format_status(&status)?);
    if let Some(metrics) = &status.metrics {
        println!("{}", formatter.format_metrics(metrics)?);
    }
    Ok(status)
}
