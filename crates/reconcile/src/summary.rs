//! Run summary: `summary.md` for people, `summary.json` for tooling.

use crate::REVIEW_THRESHOLD;
use crate::error::{Error, Result};
use crate::mappings::{KnownGap, MappingConfig};
use crate::tasks::{Task, TaskAction};
use crate::types::MatchResult;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "summary.md";
pub const JSON_FILE: &str = "summary.json";

/// Bucket sizes for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub matched: usize,
    pub high_confidence: usize,
    pub low_confidence: usize,
    pub terraform_only: usize,
    pub cloudformation_only: usize,
    pub skipped_terraform: usize,
    pub skipped_cloudformation: usize,
}

impl Counts {
    pub fn new(result: &MatchResult) -> Self {
        Self {
            matched: result.matches.len(),
            high_confidence: result.high_confidence().count(),
            low_confidence: result.low_confidence().count(),
            terraform_only: result.source_only.len(),
            cloudformation_only: result.target_only.len(),
            skipped_terraform: result.skipped_source.len(),
            skipped_cloudformation: result.skipped_target.len(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TaskEntry<'a> {
    id: usize,
    action: TaskAction,
    file: String,
    address: String,
    #[serde(rename = "type")]
    resource_type: &'a str,
    logical_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
}

/// Machine-readable form of the summary.
#[derive(Debug, Serialize)]
struct Report<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    generated: Option<&'a str>,
    counts: Counts,
    tasks: Vec<TaskEntry<'a>>,
    known_gaps: &'a [KnownGap],
    unknown_types: Vec<&'a str>,
    cloudformation_only: Vec<&'a str>,
}

/// Render `summary.md`. `generated` adds a timestamp line when present.
pub fn render(
    result: &MatchResult,
    tasks: &[Task<'_>],
    config: &MappingConfig,
    generated: Option<&str>,
) -> String {
    let counts = Counts::new(result);
    let mut out = String::from("# Terraform to CloudFormation Sync Summary\n\n");
    if let Some(generated) = generated {
        out.push_str(&format!("Generated: {generated}\n\n"));
    }

    out.push_str("## Using This Report\n\n");
    out.push_str("1. **Terraform only**: check whether the resource exists in CloudFormation under another name\n");
    out.push_str("   - If it does: add an entry under `mappings` in the mappings file\n");
    out.push_str("   - If it is intentionally Terraform-only: add it to `skip_tf_patterns`\n");
    out.push_str("   - Otherwise: add it to a CloudFormation template\n");
    out.push_str("2. **Low-confidence matches**: confirm each pairing is correct\n");
    out.push_str("3. **After changes**: re-run the sync to confirm the gap closed\n\n");

    out.push_str("## Overview\n\n");
    out.push_str("| Category | Count | Action |\n");
    out.push_str("|----------|-------|--------|\n");
    out.push_str(&format!("| Matched | {} | Review low-confidence matches |\n", counts.matched));
    out.push_str(&format!(
        "| TF Only | {} | Add to CFN or mappings file |\n",
        counts.terraform_only
    ));
    out.push_str(&format!("| CFN Only | {} | May be CFN-specific |\n", counts.cloudformation_only));
    out.push_str(&format!(
        "| Skipped | {} | Intentionally different |\n",
        counts.skipped_terraform
    ));
    if counts.skipped_cloudformation > 0 {
        out.push_str(&format!(
            "| CFN Skipped | {} | Excluded by skip_cfn_patterns |\n",
            counts.skipped_cloudformation
        ));
    }
    out.push('\n');

    if !config.known_gaps.is_empty() {
        out.push_str("## Known Gaps (from mappings file)\n\n");
        for gap in &config.known_gaps {
            out.push_str(&format!(
                "- **{}**: {}\n",
                gap.pattern.as_deref().unwrap_or("unknown"),
                gap.description.as_deref().unwrap_or("")
            ));
            out.push_str(&format!(
                "  - Recommendation: {}\n",
                gap.recommendation.as_deref().unwrap_or("N/A")
            ));
            out.push_str(&format!(
                "  - Priority: {}\n",
                gap.priority.as_deref().unwrap_or("unknown")
            ));
        }
        out.push('\n');
    }

    task_checklist(&mut out, tasks);

    let unknown = result.unknown_types();
    if !unknown.is_empty() {
        out.push_str("## Unmapped Terraform Types\n\n");
        for resource_type in unknown {
            out.push_str(&format!("- `{resource_type}`\n"));
        }
        out.push('\n');
    }

    out.push_str("## Statistics\n\n");
    out.push_str(&format!(
        "- High-confidence matches (score >= {REVIEW_THRESHOLD}): {}\n",
        counts.high_confidence
    ));
    out.push_str(&format!(
        "- Low-confidence matches (score < {REVIEW_THRESHOLD}): {}\n",
        counts.low_confidence
    ));
    out.push_str(&format!("- Skipped Terraform resources: {}\n", counts.skipped_terraform));
    out.push_str(&format!(
        "- Skipped CloudFormation resources: {}\n",
        counts.skipped_cloudformation
    ));
    out
}

fn task_checklist(out: &mut String, tasks: &[Task<'_>]) {
    out.push_str("## Tasks Generated\n\n");
    if tasks.is_empty() {
        out.push_str("Nothing to do: every Terraform resource is matched or skipped.\n\n");
        return;
    }

    let (adds, reviews): (Vec<&Task<'_>>, Vec<&Task<'_>>) =
        tasks.iter().partition(|t| t.action == TaskAction::Add);

    if !adds.is_empty() {
        out.push_str("### Resources to Add\n\n");
        out.push_str("These Terraform resources have no matching CloudFormation resource. Either:\n");
        out.push_str("- Add them to CloudFormation templates\n");
        out.push_str("- Add a mapping if they exist under a different name\n");
        out.push_str("- Add them to `skip_tf_patterns` if intentionally Terraform-only\n\n");
        for task in adds {
            out.push_str(&format!(
                "- [ ] Task {}: ADD `{}` → `{}`\n",
                task.number(),
                task.source.match_address(),
                task.source.suggested_target_id()
            ));
        }
        out.push('\n');
    }

    if !reviews.is_empty() {
        out.push_str("### Resources to Review for Drift\n\n");
        out.push_str("These matches have low confidence scores. Verify they are correct:\n\n");
        for task in reviews {
            out.push_str(&format!(
                "- [ ] Task {}: REVIEW `{}` ↔ `{}` (score: {:.2})\n",
                task.number(),
                task.source.match_address(),
                task.target.map_or("", |t| t.logical_id.as_str()),
                task.confidence.unwrap_or_default()
            ));
        }
        out.push('\n');
    }
}

/// Serialize the JSON report.
pub fn to_json(
    result: &MatchResult,
    tasks: &[Task<'_>],
    config: &MappingConfig,
    generated: Option<&str>,
) -> Result<String> {
    let report = Report {
        generated,
        counts: Counts::new(result),
        tasks: tasks
            .iter()
            .map(|task| TaskEntry {
                id: task.id,
                action: task.action,
                file: task.file_name(),
                address: task.source.match_address(),
                resource_type: &task.source.resource_type,
                logical_id: task.target.map_or_else(
                    || task.source.suggested_target_id(),
                    |t| t.logical_id.clone(),
                ),
                confidence: task.confidence,
            })
            .collect(),
        known_gaps: &config.known_gaps,
        unknown_types: result.unknown_types(),
        cloudformation_only: result
            .target_only
            .iter()
            .map(|t| t.logical_id.as_str())
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Write `summary.md` (and `summary.json` when `json` is set) into `output`.
pub fn write(
    output: &Path,
    result: &MatchResult,
    tasks: &[Task<'_>],
    config: &MappingConfig,
    generated: Option<&str>,
    json: bool,
) -> Result<(PathBuf, Option<PathBuf>)> {
    let markdown = output.join(SUMMARY_FILE);
    write_file(&markdown, &render(result, tasks, config, generated))?;

    let report = if json {
        let path = output.join(JSON_FILE);
        write_file(&path, &to_json(result, tasks, config, generated)?)?;
        Some(path)
    } else {
        None
    };
    Ok((markdown, report))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::plan_tasks;
    use crate::types::Match;
    use crate::types::fixtures::{source, target};
    use tempfile::TempDir;

    fn sample() -> MatchResult {
        MatchResult {
            matches: vec![
                Match {
                    source: source("aws_ecs_service", "registry"),
                    target: target("RegistryService", "AWS::ECS::Service"),
                    confidence: 0.8,
                },
                Match {
                    source: source("aws_vpc", "main"),
                    target: target("VPC", "AWS::EC2::VPC"),
                    confidence: 1.0,
                },
            ],
            source_only: vec![source("aws_sqs_queue", "jobs")],
            target_only: vec![target("Bastion", "AWS::EC2::Instance")],
            skipped_source: vec![source("random_password", "db")],
            skipped_target: Vec::new(),
        }
    }

    #[test]
    fn test_counts() {
        let counts = Counts::new(&sample());
        assert_eq!(counts.matched, 2);
        assert_eq!(counts.high_confidence, 1);
        assert_eq!(counts.low_confidence, 1);
        assert_eq!(counts.terraform_only, 1);
        assert_eq!(counts.cloudformation_only, 1);
        assert_eq!(counts.skipped_terraform, 1);
    }

    #[test]
    fn test_render_markdown() {
        let result = sample();
        let tasks = plan_tasks(&result);
        let config = MappingConfig::from_yaml(
            "known_gaps:\n  - pattern: aws_wafv2_*\n    description: WAF lives elsewhere\n",
        )
        .unwrap();
        let md = render(&result, &tasks, &config, None);

        assert!(md.starts_with("# Terraform to CloudFormation Sync Summary\n\n## Using"));
        assert!(!md.contains("Generated:"));
        assert!(md.contains("| Matched | 2 |"));
        assert!(md.contains("| Skipped | 1 |"));
        assert!(!md.contains("CFN Skipped"));
        assert!(md.contains("- **aws_wafv2_***: WAF lives elsewhere\n  - Recommendation: N/A"));
        assert!(md.contains("- [ ] Task 001: ADD `aws_sqs_queue.jobs` → `Jobs`"));
        assert!(md.contains(
            "- [ ] Task 002: REVIEW `aws_ecs_service.registry` ↔ `RegistryService` (score: 0.80)"
        ));
        assert!(md.contains("## Unmapped Terraform Types\n\n- `aws_sqs_queue`"));
        assert!(md.contains("- High-confidence matches (score >= 0.9): 1"));
    }

    #[test]
    fn test_timestamp_line() {
        let result = MatchResult::default();
        let md = render(&result, &[], &MappingConfig::default(), Some("2026-01-01T00:00:00Z"));
        assert!(md.contains("Generated: 2026-01-01T00:00:00Z\n"));
        assert!(md.contains("Nothing to do"));
    }

    #[test]
    fn test_json_report() {
        let result = sample();
        let tasks = plan_tasks(&result);
        let json = to_json(&result, &tasks, &MappingConfig::default(), None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["counts"]["matched"], 2);
        assert_eq!(value["tasks"][0]["action"], "ADD");
        assert_eq!(value["tasks"][0]["file"], "001-add-sqs_queue-jobs.md");
        assert_eq!(value["tasks"][1]["logical_id"], "RegistryService");
        assert_eq!(value["tasks"][1]["confidence"], 0.8);
        assert_eq!(value["unknown_types"][0], "aws_sqs_queue");
        assert_eq!(value["cloudformation_only"][0], "Bastion");
        assert!(value.get("generated").is_none());
    }

    #[test]
    fn test_write_files() {
        let tmp = TempDir::new().unwrap();
        let result = sample();
        let tasks = plan_tasks(&result);

        let (md, json) =
            write(tmp.path(), &result, &tasks, &MappingConfig::default(), None, true).unwrap();
        assert!(md.ends_with(SUMMARY_FILE));
        assert!(json.unwrap().exists());

        let (_, json) =
            write(tmp.path(), &result, &tasks, &MappingConfig::default(), None, false).unwrap();
        assert!(json.is_none());
    }
}
