//! Projects command implementation.

use crate::cli::ProjectsArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use pcascan_jobs::{discover_projects, Project};

/// Execute the projects command.
pub fn execute_projects(
    args: ProjectsArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<Vec<Project>> {
    let dir = args
        .projects_dir
        .unwrap_or_else(|| config.paths.projects_dir.clone());
    let projects = discover_projects(&dir, &config.eval)?;

    println!("{}", formatter.format_projects(&projects)?);
    Ok(projects)
}
