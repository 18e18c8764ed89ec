//! Benchmark project discovery
//!
//! A project is a directory under the projects root holding an `ERIS*`
//! pages file (`.json` or `.txt`) and a `PCA*.csv` ground truth file.

use crate::error::JobError;
use pcascan_eval::{EvalConfig, GroundTruth};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A benchmark project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    /// Directory name
    pub id: String,
    /// Document pages
    pub pages_file: PathBuf,
    /// Human-labelled activities
    pub ground_truth_file: PathBuf,
    /// Ground truth rows from the default benchmark sources
    pub ground_truth_count: usize,
}

/// List complete projects under `projects_dir`, sorted by id
///
/// A missing root yields an empty list. Directories without both files are
/// skipped.
pub fn discover_projects(
    projects_dir: &Path,
    eval: &EvalConfig,
) -> Result<Vec<Project>, JobError> {
    if !projects_dir.is_dir() {
        debug!(dir = %projects_dir.display(), "Projects directory does not exist");
        return Ok(Vec::new());
    }

    let mut dirs: Vec<PathBuf> = fs::read_dir(projects_dir)
        .map_err(|e| JobError::Config(format!("{}: {}", projects_dir.display(), e)))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    Ok(dirs
        .iter()
        .filter_map(|dir| inspect_project(dir, eval).ok())
        .collect())
}

/// Look up one project by id
pub fn find_project(
    projects_dir: &Path,
    project_id: &str,
    eval: &EvalConfig,
) -> Result<Project, JobError> {
    if project_id.is_empty()
        || project_id.contains(['/', '\\'])
        || project_id == "."
        || project_id == ".."
    {
        return Err(JobError::InvalidProject(project_id.to_string()));
    }

    let dir = projects_dir.join(project_id);
    if !dir.is_dir() {
        return Err(JobError::NotFound(dir));
    }
    inspect_project(&dir, eval)
}

fn inspect_project(dir: &Path, eval: &EvalConfig) -> Result<Project, JobError> {
    let id = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let files = sorted_files(dir);
    let pages_file = files
        .iter()
        .find(|path| has_prefix_and_extension(path, "ERIS", &["json", "txt"]))
        .cloned()
        .ok_or_else(|| JobError::IncompleteProject {
            project: id.clone(),
            missing: "ERIS pages file",
        })?;
    let ground_truth_file = files
        .iter()
        .find(|path| has_prefix_and_extension(path, "PCA", &["csv"]))
        .cloned()
        .ok_or_else(|| JobError::IncompleteProject {
            project: id.clone(),
            missing: "PCA ground truth CSV",
        })?;

    let ground_truth_count = match GroundTruth::load(&ground_truth_file, eval) {
        Ok(gt) => gt.count_for_sources(&eval.default_sources),
        Err(e) => {
            warn!(project = %id, error = %e, "Could not read ground truth");
            0
        }
    };

    Ok(Project {
        id,
        pages_file,
        ground_truth_file,
        ground_truth_count,
    })
}

fn sorted_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file())
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}

fn has_prefix_and_extension(path: &Path, prefix: &str, extensions: &[&str]) -> bool {
    let name_matches = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(prefix));
    let ext_matches = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)));
    name_matches && ext_matches
}
