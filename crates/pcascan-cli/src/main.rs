//! pcascan CLI - Extract and benchmark PCA rows from environmental site reports.

use anyhow::Context;
use clap::Parser;
use pcascan_cli::commands;
use pcascan_cli::{Cli, CliError, Command, Config, Formatter};
use pcascan_llm::GeminiGateway;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, results to stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load(cli.config.as_deref())?;
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let formatter = Formatter::new(format, !cli.no_color && config.settings.color);

    // The blocking HTTP client must be created and dropped outside the runtime
    let gateway = if cli.command.needs_gateway() {
        Some(Arc::new(GeminiGateway::new()?))
    } else {
        None
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let outcome = runtime.block_on(run(cli.command, &config, gateway.clone(), &formatter));
    drop(runtime);

    if let Err(e) = outcome {
        eprintln!("{}", formatter.error(&e.to_string()));
        std::process::exit(1);
    }
    Ok(())
}

async fn run(
    command: Command,
    config: &Config,
    gateway: Option<Arc<GeminiGateway>>,
    formatter: &Formatter,
) -> pcascan_cli::Result<()> {
    match command {
        Command::Extract(args) => {
            if args.model.api_key.is_none() {
                return Err(CliError::MissingApiKey);
            }
            let gateway = gateway.ok_or(CliError::Config("No model gateway".into()))?;
            commands::execute_extract(args, config, gateway, formatter).await?;
        }
        Command::Benchmark(args) => {
            if args.model.api_key.is_none() {
                return Err(CliError::MissingApiKey);
            }
            let gateway = gateway.ok_or(CliError::Config("No model gateway".into()))?;
            commands::execute_benchmark(args, config, gateway, formatter).await?;
        }
        Command::Evaluate(args) => {
            commands::execute_evaluate(args, config, formatter)?;
        }
        Command::Projects(args) => {
            commands::execute_projects(args, config, formatter)?;
        }
    }
    Ok(())
}
