//! Evaluate command implementation.

use crate::cli::EvaluateArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use pcascan_eval::{evaluate_experiment, EvaluationResult, EVALUATION_DIR};

/// Execute the evaluate command.
///
/// With no `--sources` every ground truth row counts.
pub fn execute_evaluate(
    args: EvaluateArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<EvaluationResult> {
    let mut eval = config.eval.clone();
    if let Some(threshold) = args.threshold {
        eval.match_threshold = threshold;
    }
    eval.validate().map_err(CliError::Config)?;

    let sources = (!args.sources.is_empty()).then_some(args.sources.as_slice());
    let result = evaluate_experiment(&args.experiment, &args.ground_truth, sources, &eval)?;

    println!("{}", formatter.format_evaluation(&result)?);
    eprintln!(
        "{}",
        formatter.info(&format!(
            "Reports written to {}",
            args.experiment.join(EVALUATION_DIR).display()
        ))
    );
    Ok(result)
}
