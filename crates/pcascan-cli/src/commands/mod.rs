//! Command implementations.

pub mod benchmark;
pub mod evaluate;
pub mod extract;
pub mod projects;

pub use self::benchmark::execute_benchmark;
pub use self::evaluate::execute_evaluate;
pub use self::extract::execute_extract;
pub use self::projects::execute_projects;

use crate::error::{CliError, Result};
use crate::output::Formatter;
use pcascan_jobs::{JobHandle, JobState, JobStatus};

/// Stream a job's progress to stderr and return its final status.
///
/// Ctrl-C asks the job to stop; the job then ends at its next checkpoint.
/// A job that does not complete is reported as [`CliError::JobFailed`].
pub(crate) async fn follow(
    mut handle: JobHandle,
    cancel: impl Fn(),
    formatter: &Formatter,
) -> Result<JobStatus> {
    let mut interrupted = false;
    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => eprintln!("{}", formatter.progress(&event)),
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                eprintln!(
                    "{}",
                    formatter.warning("Interrupted, stopping after the current model call...")
                );
                cancel();
            }
        }
    }

    let status = handle.wait().await?;
    match status.status {
        JobState::Completed => Ok(status),
        _ => Err(CliError::JobFailed(
            status
                .error
                .clone()
                .unwrap_or_else(|| status.current_step.clone()),
        )),
    }
}
