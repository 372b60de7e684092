//! Terraform resource extraction.
//!
//! Two mutually exclusive modes: static HCL parsing of a directory tree, or
//! ingestion of a resolved plan document.

pub mod tree;
pub mod plan;

use crate::error::Result;
use crate::types::SourceResource;
use std::path::Path;

/// Where Terraform resources are read from.
#[derive(Debug, Clone, Copy)]
pub enum SourceInput<'a> {
    /// Walk a Terraform tree and parse every `*.tf` file
    Directory(&'a Path),
    /// Read a resolved plan document, falling back to `fallback_dir` when
    /// the plan file does not exist
    Plan {
        plan: &'a Path,
        fallback_dir: &'a Path,
    },
}

/// Extract all Terraform resources for the selected mode.
pub fn extract(input: SourceInput<'_>) -> Result<Vec<SourceResource>> {
    match input {
        SourceInput::Directory(root) => {
            log::info!("Parsing Terraform HCL: {}", root.display());
            tree::parse_dir(root)
        }
        SourceInput::Plan {
            plan: path,
            fallback_dir,
        } if !path.exists() => {
            log::warn!(
                "Plan file {} not found, parsing HCL in {} instead",
                path.display(),
                fallback_dir.display()
            );
            tree::parse_dir(fallback_dir)
        }
        SourceInput::Plan { plan: path, .. } => {
            log::info!("Parsing Terraform plan JSON: {}", path.display());
            plan::parse_file(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    #[test]
    fn test_missing_plan_falls_back_to_hcl() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("main.tf"),
            "resource \"aws_vpc\" \"main\" {}\n",
        )
        .unwrap();

        let resources = extract(SourceInput::Plan {
            plan: &tmp.path().join("missing.json"),
            fallback_dir: tmp.path(),
        })
        .unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].file, "main.tf");
    }

    #[test]
    fn test_malformed_plan_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let plan = tmp.path().join("plan.json");
        std::fs::write(&plan, "not json").unwrap();

        let err = extract(SourceInput::Plan {
            plan: &plan,
            fallback_dir: tmp.path(),
        })
        .unwrap_err();
        assert!(matches!(err, Error::Plan { .. }));
    }
}
