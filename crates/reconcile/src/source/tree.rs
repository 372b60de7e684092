//! Static HCL parsing of a Terraform tree

use crate::error::{Error, Result};
use crate::types::{Properties, SourceResource};
use rayon::prelude::*;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories never descended into (provider/module caches).
const VENDOR_DIRS: &[&str] = &[".terraform", ".git"];

/// Directory whose immediate children are reusable modules.
const MODULES_DIR: &str = "modules";

/// Parse every `*.tf` file under `root`.
///
/// Files that fail to parse are logged and skipped. Output is ordered by
/// file path, then by declaration order within each file.
pub fn parse_dir(root: &Path) -> Result<Vec<SourceResource>> {
    if !root.is_dir() {
        return Err(Error::SourceRootMissing {
            path: root.to_path_buf(),
        });
    }

    let files = collect_tf_files(root);
    log::debug!("Found {} .tf files under {}", files.len(), root.display());

    let parsed: Vec<(PathBuf, Result<Vec<SourceResource>>)> = files
        .into_par_iter()
        .map(|path| {
            let result = parse_file(root, &path);
            (path, result)
        })
        .collect();

    let mut resources = Vec::new();
    for (path, result) in parsed {
        match result {
            Ok(found) => {
                log::debug!("{}: {} resources", path.display(), found.len());
                resources.extend(found);
            }
            Err(e) if e.is_per_file() => log::warn!("{e}"),
            Err(e) => return Err(e),
        }
    }

    log::info!("Parsed {} resources from HCL", resources.len());
    Ok(resources)
}

fn collect_tf_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_vendor_dir(e))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Cannot walk {}: {e}", root.display());
                None
            }
        })
        .filter(|e| e.file_type().is_file() && e.path().extension().is_some_and(|x| x == "tf"))
        .map(DirEntry::into_path)
        .collect()
}

fn is_vendor_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| VENDOR_DIRS.contains(&name))
}

/// Parse one file, recording paths relative to `root`.
pub fn parse_file(root: &Path, path: &Path) -> Result<Vec<SourceResource>> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let rel = path.strip_prefix(root).unwrap_or(path);
    let file = rel.to_string_lossy().replace('\\', "/");

    parse_source(&content, &file, &module_for(rel)).map_err(|e| Error::Hcl {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Extract resource blocks from HCL text.
pub fn parse_source(
    content: &str,
    file: &str,
    module: &str,
) -> std::result::Result<Vec<SourceResource>, hcl::Error> {
    let body = hcl::parse(content)?;

    let resources = body
        .blocks()
        .filter(|block| block.identifier() == "resource")
        .filter_map(|block| {
            let [resource_type, name] = block.labels() else {
                log::debug!("{file}: resource block without two labels");
                return None;
            };
            let (resource_type, name) = (resource_type.as_str(), name.as_str());

            Some(SourceResource {
                resource_type: resource_type.to_string(),
                name: name.to_string(),
                module: module.to_string(),
                file: file.to_string(),
                line: find_line_number(content, resource_type, name),
                properties: body_properties(block.body()),
                raw_block: extract_raw_block(content, resource_type, name),
            })
        })
        .collect();

    Ok(resources)
}

/// Module name from the directory layout: the first segment below `modules/`.
fn module_for(rel: &Path) -> String {
    let parts: Vec<&str> = rel
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();

    // The segment after `modules` must itself be a directory, not the file
    parts
        .iter()
        .position(|p| *p == MODULES_DIR)
        .filter(|&i| i + 2 < parts.len())
        .map(|i| parts[i + 1].to_string())
        .unwrap_or_default()
}

/// Attributes as JSON values; nested blocks become arrays of objects.
fn body_properties(body: &hcl::Body) -> Properties {
    let mut props = Properties::new();

    for attr in body.attributes() {
        let value = serde_json::to_value(attr.expr()).unwrap_or(Value::Null);
        props.insert(attr.key().to_string(), value);
    }

    for block in body.blocks() {
        let nested = Value::Object(body_properties(block.body()).into_iter().collect());
        let slot = props
            .entry(block.identifier().to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = slot {
            items.push(nested);
        }
    }

    props
}

fn declaration(resource_type: &str, name: &str) -> String {
    format!(
        r#"resource\s+"{}"\s+"{}""#,
        regex::escape(resource_type),
        regex::escape(name)
    )
}

/// 1-based line of the declaration, 0 if it cannot be found.
fn find_line_number(content: &str, resource_type: &str, name: &str) -> usize {
    let Ok(re) = Regex::new(&declaration(resource_type, name)) else {
        return 0;
    };
    content
        .lines()
        .position(|line| re.is_match(line))
        .map_or(0, |i| i + 1)
}

/// Verbatim block text from the declaration through its matching brace.
fn extract_raw_block(content: &str, resource_type: &str, name: &str) -> String {
    let Ok(re) = Regex::new(&format!(r"{}\s*\{{", declaration(resource_type, name))) else {
        return String::new();
    };
    let Some(m) = re.find(content) else {
        return String::new();
    };

    let mut depth = 0usize;
    for (offset, c) in content[m.end()..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return content[m.start()..m.end() + offset + 1].to_string(),
            '}' => depth -= 1,
            _ => {}
        }
    }

    // Unbalanced: keep everything to end of file
    content[m.start()..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MAIN_TF: &str = r#"
variable "name" {
  type = string
}

resource "aws_vpc" "main" {
  cidr_block = "10.0.0.0/16"

  tags = {
    Name = "${var.name}-vpc"
  }
}

resource "aws_ecs_service" "registry" {
  name          = "registry"
  desired_count = 2

  network_configuration {
    subnets = [aws_subnet.private.id]
  }
}
"#;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_parse_source_resources() {
        let resources = parse_source(MAIN_TF, "main.tf", "").unwrap();
        assert_eq!(resources.len(), 2);

        let vpc = &resources[0];
        assert_eq!(vpc.resource_type, "aws_vpc");
        assert_eq!(vpc.name, "main");
        assert_eq!(vpc.line, 6);
        assert_eq!(
            vpc.properties.get("cidr_block"),
            Some(&Value::String("10.0.0.0/16".to_string()))
        );

        let svc = &resources[1];
        assert_eq!(svc.line, 14);
        assert_eq!(svc.properties.get("desired_count"), Some(&Value::from(2)));
        assert!(svc.properties.get("network_configuration").is_some_and(Value::is_array));
    }

    #[test]
    fn test_raw_block_balances_nested_braces() {
        let block = extract_raw_block(MAIN_TF, "aws_vpc", "main");
        assert!(block.starts_with(r#"resource "aws_vpc" "main" {"#));
        assert!(block.ends_with("}\n}"));
        assert!(block.contains("Name = \"${var.name}-vpc\""));
        assert!(!block.contains("aws_ecs_service"));
    }

    #[test]
    fn test_missing_declaration() {
        assert_eq!(find_line_number(MAIN_TF, "aws_lb", "main"), 0);
        assert_eq!(extract_raw_block(MAIN_TF, "aws_lb", "main"), "");
    }

    #[test]
    fn test_module_for() {
        assert_eq!(module_for(Path::new("main.tf")), "");
        assert_eq!(module_for(Path::new("modules/mcp-gateway/ecs.tf")), "mcp-gateway");
        assert_eq!(module_for(Path::new("modules/a/nested/x.tf")), "a");
        assert_eq!(module_for(Path::new("modules/loose.tf")), "");
    }

    #[test]
    fn test_parse_dir_skips_vendor_and_bad_files() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "main.tf", MAIN_TF);
        write_file(
            tmp.path(),
            "modules/net/vpc.tf",
            "resource \"aws_subnet\" \"private\" {\n  cidr_block = \"10.0.1.0/24\"\n}\n",
        );
        write_file(
            tmp.path(),
            ".terraform/modules/x/main.tf",
            "resource \"aws_vpc\" \"vendored\" {}\n",
        );
        write_file(tmp.path(), "broken.tf", "resource \"aws_vpc\" \"bad\" {\n");

        let resources = parse_dir(tmp.path()).unwrap();
        let addresses: Vec<String> = resources.iter().map(SourceResource::address).collect();
        assert_eq!(
            addresses,
            vec![
                "aws_vpc.main",
                "aws_ecs_service.registry",
                "module.net.aws_subnet.private",
            ]
        );
        assert_eq!(resources[2].file, "modules/net/vpc.tf");
    }

    #[test]
    fn test_parse_dir_missing_root() {
        let err = parse_dir(Path::new("/nonexistent/terraform")).unwrap_err();
        assert!(matches!(err, Error::SourceRootMissing { .. }));
    }
}
