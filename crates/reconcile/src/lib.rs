//! # reconcile
//!
//! Reconciles Terraform infrastructure against CloudFormation templates that
//! are meant to describe the same resources.
//!
//! A run has three stages:
//! - **Extract** resources from Terraform (HCL tree or `terraform show -json`
//!   plan) and from CloudFormation YAML templates
//! - **Match** them in one greedy pass: skip rules, explicit mappings, then
//!   name similarity within the same CloudFormation type
//! - **Report** one markdown task per missing resource or doubtful match,
//!   plus a summary
//!
//! ## Example
//!
//! ```no_run
//! use reconcile::{MappingConfig, RenderContext, SourceInput};
//! use std::path::Path;
//!
//! let config = MappingConfig::load(Path::new("cloudformation/aws-ecs/tf-cfn-mappings.yaml"));
//! let result = reconcile::reconcile(
//!     SourceInput::Directory(Path::new("terraform/aws-ecs")),
//!     Path::new("cloudformation/aws-ecs"),
//!     &["single-stack".to_string()],
//!     &config,
//! )
//! .expect("extraction failed");
//!
//! let files = reconcile::write_report(
//!     Path::new("sync-tasks"),
//!     &result,
//!     &config,
//!     &reconcile::ReportOptions::default(),
//! )
//! .expect("write failed");
//! println!("{} tasks", files.tasks.len());
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod mappings;
pub mod matcher;
pub mod similarity;
pub mod source;
pub mod summary;
pub mod target;
pub mod tasks;
pub mod type_map;
pub mod types;

pub use error::{Error, Result};
pub use mappings::{KnownGap, MappingConfig};
pub use source::SourceInput;
pub use tasks::{RenderContext, Task, TaskAction};
pub use type_map::MappedType;
pub use types::{Match, MatchResult, SourceResource, TargetResource};

use std::path::{Path, PathBuf};

/// Matches below this confidence get a REVIEW task.
pub const REVIEW_THRESHOLD: f64 = 0.9;

/// Maximum characters of a raw block embedded in a task file.
pub const PREVIEW_LIMIT: usize = 2000;

/// Extract both sides and match them.
///
/// Fails only on fatal conditions (missing roots, a malformed plan);
/// per-file problems are logged and the file is left out.
pub fn reconcile(
    input: SourceInput<'_>,
    cfn_root: &Path,
    excludes: &[String],
    config: &MappingConfig,
) -> Result<MatchResult> {
    let sources = source::extract(input)?;
    log::info!("Found {} Terraform resources", sources.len());

    let targets = target::parse_dir(cfn_root, excludes)?;
    log::info!("Found {} CloudFormation resources", targets.len());

    Ok(matcher::match_resources(sources, targets, config))
}

/// Output settings for [`write_report`].
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub context: RenderContext,
    /// Timestamp for the summary; `None` keeps reruns byte-identical
    pub generated: Option<String>,
    /// Also write `summary.json`
    pub json: bool,
}

/// Files produced by [`write_report`].
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub tasks: Vec<PathBuf>,
    pub summary: PathBuf,
    pub json: Option<PathBuf>,
}

/// Plan tasks for `result` and write task files plus the summary.
pub fn write_report(
    output: &Path,
    result: &MatchResult,
    config: &MappingConfig,
    options: &ReportOptions,
) -> Result<ReportFiles> {
    std::fs::create_dir_all(output).map_err(|source| Error::Write {
        path: output.to_path_buf(),
        source,
    })?;

    let planned = tasks::plan_tasks(result);
    let task_files = tasks::write_tasks(output, &planned, &options.context)?;
    let (summary, json) = summary::write(
        output,
        result,
        &planned,
        config,
        options.generated.as_deref(),
        options.json,
    )?;

    Ok(ReportFiles {
        tasks: task_files,
        summary,
        json,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    const ROOT_TF: &str = r#"
resource "aws_ecs_service" "registry" {
  name          = "registry"
  desired_count = 2
}

resource "random_password" "db" {
  length = 32
}

resource "aws_sqs_queue" "jobs" {
  name = "jobs"
}

resource "aws_security_group" "alb" {
  description = "ALB ingress"
}
"#;

    const NET_TF: &str = r#"
resource "aws_vpc" "main" {
  cidr_block = "10.0.0.0/16"
}
"#;

    const COMPUTE: &str = "\
AWSTemplateFormatVersion: '2010-09-09'
Resources:
  RegistryService:
    Type: AWS::ECS::Service
    Properties:
      Cluster: !Ref Cluster
      DesiredCount: 2
";

    const NETWORK: &str = "\
Resources:
  VPC:
    Type: AWS::EC2::VPC
    Properties:
      CidrBlock: 10.0.0.0/16
  Bastion:
    Type: AWS::EC2::Instance
Outputs:
  VpcId:
    Value: !Ref VPC
";

    const LEGACY: &str = "\
Resources:
  VPC:
    Type: AWS::EC2::VPC
";

    const MAPPINGS: &str = "\
mappings:
  module.net.aws_vpc.main: VPC
known_gaps:
  - pattern: aws_wafv2_*
    description: WAF is managed outside the stacks
";

    struct Fixture {
        _tmp: TempDir,
        tf: PathBuf,
        cfn: PathBuf,
        output: PathBuf,
        mappings: PathBuf,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let tf = tmp.path().join("terraform");
        let cfn = tmp.path().join("cloudformation");
        fs::create_dir_all(tf.join("modules/net")).unwrap();
        fs::create_dir_all(tf.join(".terraform/modules/x")).unwrap();
        fs::create_dir_all(cfn.join("templates")).unwrap();

        fs::write(tf.join("main.tf"), ROOT_TF).unwrap();
        fs::write(tf.join("modules/net/main.tf"), NET_TF).unwrap();
        fs::write(tf.join(".terraform/modules/x/vendor.tf"), NET_TF).unwrap();
        fs::write(cfn.join("templates/compute-stack.yaml"), COMPUTE).unwrap();
        fs::write(cfn.join("templates/network-stack.yaml"), NETWORK).unwrap();
        fs::write(cfn.join("templates/single-stack.yaml"), LEGACY).unwrap();

        let mappings = cfn.join("tf-cfn-mappings.yaml");
        fs::write(&mappings, MAPPINGS).unwrap();

        Fixture {
            output: cfn.join("sync-tasks"),
            _tmp: tmp,
            tf,
            cfn,
            mappings,
        }
    }

    fn run(fx: &Fixture) -> (MatchResult, ReportFiles) {
        let config = MappingConfig::load(&fx.mappings);
        let result = reconcile(
            SourceInput::Directory(&fx.tf),
            &fx.cfn,
            &["single-stack".to_string()],
            &config,
        )
        .unwrap();
        let options = ReportOptions {
            json: true,
            ..ReportOptions::default()
        };
        let files = write_report(&fx.output, &result, &config, &options).unwrap();
        (result, files)
    }

    fn snapshot(dir: &Path) -> BTreeMap<String, String> {
        walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(dir).unwrap().to_string_lossy().into_owned();
                (rel, fs::read_to_string(e.path()).unwrap())
            })
            .collect()
    }

    #[test]
    fn test_pipeline_partitions() {
        let fx = fixture();
        let (result, _) = run(&fx);

        assert_eq!(result.source_total(), 5);
        assert_eq!(result.target_total(), 3);

        let matched: BTreeMap<&str, f64> = result
            .matches
            .iter()
            .map(|m| (m.target.logical_id.as_str(), m.confidence))
            .collect();
        assert_eq!(matched.get("VPC"), Some(&1.0));
        assert_eq!(matched.get("RegistryService"), Some(&0.8));

        let vpc = result
            .matches
            .iter()
            .find(|m| m.target.logical_id == "VPC")
            .unwrap();
        assert_eq!(vpc.source.address(), "module.net.aws_vpc.main");
        assert_eq!(vpc.target.file, "templates/network-stack.yaml");

        assert_eq!(result.skipped_source.len(), 1);
        assert_eq!(result.skipped_source[0].resource_type, "random_password");

        let mut source_only: Vec<&str> =
            result.source_only.iter().map(|s| s.name.as_str()).collect();
        source_only.sort_unstable();
        assert_eq!(source_only, vec!["alb", "jobs"]);

        assert_eq!(result.target_only.len(), 1);
        assert_eq!(result.target_only[0].logical_id, "Bastion");
    }

    #[test]
    fn test_pipeline_task_files() {
        let fx = fixture();
        let (_, files) = run(&fx);

        let names: Vec<String> = files
            .tasks
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "001-add-security_group-alb.md",
                "002-add-sqs_queue-jobs.md",
                "003-update-RegistryService.md",
            ]
        );

        let review = fs::read_to_string(&files.tasks[2]).unwrap();
        assert!(review.contains("**Confidence**: 0.80"));
        assert!(review.contains("desired_count = 2"));
        assert!(review.contains("Cluster: !Ref Cluster"));

        let summary = fs::read_to_string(&files.summary).unwrap();
        assert!(summary.contains("| Skipped | 1 |"));
        assert!(summary.contains("WAF is managed outside the stacks"));
        assert!(!summary.contains("random_password"));
        assert!(files.json.unwrap().exists());
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let fx = fixture();
        run(&fx);
        let first = snapshot(&fx.output);
        run(&fx);
        let second = snapshot(&fx.output);

        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn test_missing_templates_dir_is_fatal() {
        let fx = fixture();
        fs::remove_dir_all(fx.cfn.join("templates")).unwrap();
        let err = reconcile(
            SourceInput::Directory(&fx.tf),
            &fx.cfn,
            &[],
            &MappingConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::TemplatesMissing { .. }));
    }
}
