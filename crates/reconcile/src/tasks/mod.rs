//! Task planning and task file output.
//!
//! Every unmatched Terraform resource becomes an ADD task; every match below
//! [`crate::REVIEW_THRESHOLD`] becomes a REVIEW task. Ids are assigned in one
//! pass, ADD tasks first, so the same inputs always produce the same files.

pub mod render;
pub mod scaffold;

pub use render::RenderContext;

use crate::error::{Error, Result};
use crate::types::{MatchResult, SourceResource, TargetResource};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Directory under the output root that holds task files.
pub const TASKS_DIR: &str = "tasks";

/// Names of files this tool generates: `001-add-vpc-main.md`.
static TASK_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-.+\.md$").expect("valid task file regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskAction {
    /// Terraform resource missing from CloudFormation
    Add,
    /// Low-confidence match to check for drift
    Review,
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "ADD"),
            Self::Review => write!(f, "REVIEW"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
        }
    }
}

/// One unit of follow-up work, borrowing from a [`MatchResult`].
#[derive(Debug, Clone, Copy)]
pub struct Task<'a> {
    /// 1-based sequence number
    pub id: usize,
    pub action: TaskAction,
    pub source: &'a SourceResource,
    /// Matched target, REVIEW tasks only
    pub target: Option<&'a TargetResource>,
    /// Match confidence, REVIEW tasks only
    pub confidence: Option<f64>,
}

impl Task<'_> {
    /// Zero-padded id, e.g. `007`.
    pub fn number(&self) -> String {
        format!("{:03}", self.id)
    }

    /// File name under the tasks directory.
    pub fn file_name(&self) -> String {
        match (self.action, self.target) {
            (TaskAction::Review, Some(target)) => {
                format!("{}-update-{}.md", self.number(), slug(&target.logical_id))
            }
            _ => format!(
                "{}-add-{}-{}.md",
                self.number(),
                slug(
                    self.source
                        .resource_type
                        .strip_prefix("aws_")
                        .unwrap_or(&self.source.resource_type)
                ),
                slug(&self.source.name)
            ),
        }
    }

    /// Services are what users notice first when missing.
    pub fn priority(&self) -> Priority {
        if self.source.resource_type.contains("ecs_service") {
            Priority::High
        } else {
            Priority::Medium
        }
    }
}

/// Assign task ids: ADD tasks sorted by Terraform type, then REVIEW tasks
/// sorted by ascending confidence. Both sorts are stable.
pub fn plan_tasks(result: &MatchResult) -> Vec<Task<'_>> {
    let mut adds: Vec<&SourceResource> = result
        .source_only
        .iter()
        .filter(|s| !s.target_type().is_skip())
        .collect();
    adds.sort_by(|a, b| a.resource_type.cmp(&b.resource_type));

    let mut reviews: Vec<_> = result.low_confidence().collect();
    reviews.sort_by(|a, b| a.confidence.total_cmp(&b.confidence));

    let add_tasks = adds.into_iter().map(|source| (TaskAction::Add, source, None, None));
    let review_tasks = reviews
        .into_iter()
        .map(|m| (TaskAction::Review, &m.source, Some(&m.target), Some(m.confidence)));

    add_tasks
        .chain(review_tasks)
        .enumerate()
        .map(|(i, (action, source, target, confidence))| Task {
            id: i + 1,
            action,
            source,
            target,
            confidence,
        })
        .collect()
}

/// Write one markdown file per task into `<output>/tasks`.
///
/// Task files left over from a previous run are removed first so the
/// directory only ever reflects the current run.
pub fn write_tasks(output: &Path, tasks: &[Task<'_>], ctx: &RenderContext) -> Result<Vec<PathBuf>> {
    let dir = output.join(TASKS_DIR);
    std::fs::create_dir_all(&dir).map_err(|source| Error::Write {
        path: dir.clone(),
        source,
    })?;

    let removed = remove_stale(&dir)?;
    if removed > 0 {
        log::debug!("Removed {removed} stale task files from {}", dir.display());
    }

    let mut written = Vec::with_capacity(tasks.len());
    for task in tasks {
        let path = dir.join(task.file_name());
        std::fs::write(&path, render::render(task, ctx)).map_err(|source| Error::Write {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }

    log::info!("Wrote {} task files to {}", written.len(), dir.display());
    Ok(written)
}

fn remove_stale(dir: &Path) -> Result<usize> {
    let entries = std::fs::read_dir(dir).map_err(|source| Error::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_task = path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| TASK_FILE.is_match(n));
        if is_task {
            std::fs::remove_file(&path).map_err(|source| Error::Write {
                path: path.clone(),
                source,
            })?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Keep file names portable.
fn slug(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
