//! CloudFormation template extraction.
//!
//! Templates are read from the flat `templates/` directory. Intrinsic
//! function tags (`!Ref`, `!Sub`, ...) are kept as opaque single-key objects
//! (`{"!Ref": "Vpc"}`); any other tag makes the whole file unreadable.

use crate::error::{Error, Result};
use crate::types::{Properties, TargetResource};
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Subdirectory of the CloudFormation root holding the templates.
pub const TEMPLATES_DIR: &str = "templates";

/// File name fragments skipped by default (legacy single-stack layout).
pub const DEFAULT_EXCLUDES: &[&str] = &["single-stack"];

/// Intrinsic function short forms accepted in templates.
pub const INTRINSIC_TAGS: &[&str] = &[
    "Ref",
    "Sub",
    "GetAtt",
    "Join",
    "Select",
    "If",
    "Equals",
    "And",
    "Or",
    "Not",
    "Condition",
    "FindInMap",
    "Base64",
    "GetAZs",
    "ImportValue",
    "Transform",
    "Cidr",
    "Split",
];

/// Parse every template in `<cfn_root>/templates`.
///
/// `excludes` are file name fragments; a template whose name contains one is
/// ignored. Templates that fail to parse, or that redeclare a logical id seen
/// in an earlier template, are logged and skipped as a whole.
pub fn parse_dir(cfn_root: &Path, excludes: &[String]) -> Result<Vec<TargetResource>> {
    let templates_dir = cfn_root.join(TEMPLATES_DIR);
    if !templates_dir.is_dir() {
        return Err(Error::TemplatesMissing {
            path: templates_dir,
        });
    }

    let mut resources: Vec<TargetResource> = Vec::new();
    let mut declared: HashMap<String, String> = HashMap::new();

    for path in template_files(&templates_dir, excludes)? {
        let found = match parse_file(cfn_root, &path) {
            Ok(found) => found,
            Err(e) if e.is_per_file() => {
                log::warn!("{e}");
                continue;
            }
            Err(e) => return Err(e),
        };

        if let Some((res, first)) = found
            .iter()
            .find_map(|r| declared.get(&r.logical_id).map(|first| (r, first)))
        {
            let e = Error::DuplicateLogicalId {
                path: path.clone(),
                logical_id: res.logical_id.clone(),
                first: first.clone(),
            };
            log::warn!("{e}");
            continue;
        }

        log::debug!("{}: {} resources", path.display(), found.len());
        for res in &found {
            declared.insert(res.logical_id.clone(), res.file.clone());
        }
        resources.extend(found);
    }

    log::info!("Parsed {} CloudFormation resources", resources.len());
    Ok(resources)
}

fn template_files(dir: &Path, excludes: &[String]) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|source| Error::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "yaml" || e == "yml")
        })
        .filter(|path| {
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            let excluded = excludes.iter().any(|fragment| name.contains(fragment.as_str()));
            if excluded {
                log::debug!("Skipping excluded template {name}");
            }
            !excluded
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Parse one template, recording its path relative to `cfn_root`.
pub fn parse_file(cfn_root: &Path, path: &Path) -> Result<Vec<TargetResource>> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file = path
        .strip_prefix(cfn_root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");
    parse_template(&content, &file, path)
}

/// Extract resources from template text. `path` is only used in errors.
pub fn parse_template(content: &str, file: &str, path: &Path) -> Result<Vec<TargetResource>> {
    let yaml: YamlValue = serde_yaml::from_str(content).map_err(|source| Error::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = yaml_to_json(yaml).map_err(|tag| Error::UnknownTag {
        path: path.to_path_buf(),
        tag,
    })?;

    let Some(declared) = doc.get("Resources").and_then(JsonValue::as_object) else {
        return Ok(Vec::new());
    };

    let resources = declared
        .iter()
        .filter_map(|(logical_id, definition)| {
            let definition = definition.as_object()?;
            let resource_type = definition
                .get("Type")
                .and_then(JsonValue::as_str)
                .unwrap_or("UNKNOWN");
            let properties: Properties = definition
                .get("Properties")
                .and_then(JsonValue::as_object)
                .map(|props| props.clone().into_iter().collect())
                .unwrap_or_default();

            Some(TargetResource {
                logical_id: logical_id.clone(),
                resource_type: resource_type.to_string(),
                file: file.to_string(),
                properties,
                raw_block: extract_block(content, logical_id),
            })
        })
        .collect();

    Ok(resources)
}

/// Convert a YAML tree to JSON, wrapping known intrinsic tags.
///
/// Returns the offending tag for anything outside [`INTRINSIC_TAGS`].
fn yaml_to_json(value: YamlValue) -> std::result::Result<JsonValue, String> {
    Ok(match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                JsonValue::from(i)
            } else if let Some(u) = n.as_u64() {
                JsonValue::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(JsonValue::Null, JsonValue::Number)
            }
        }
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(items) => JsonValue::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<std::result::Result<_, _>>()?,
        ),
        YamlValue::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (key, value) in map {
                object.insert(key_string(&key), yaml_to_json(value)?);
            }
            JsonValue::Object(object)
        }
        YamlValue::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let name = tag.trim_start_matches('!');
            if !INTRINSIC_TAGS.contains(&name) {
                return Err(tag);
            }
            let mut wrapper = serde_json::Map::new();
            wrapper.insert(format!("!{name}"), yaml_to_json(tagged.value)?);
            JsonValue::Object(wrapper)
        }
    })
}

fn key_string(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Raw text of a resource: from its `LogicalId:` line under `Resources:` up
/// to the next line at the same or lower indentation.
fn extract_block(content: &str, logical_id: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let declaration = format!("{logical_id}:");

    let section_start = lines
        .iter()
        .position(|l| l.starts_with("Resources:"))
        .map_or(0, |i| i + 1);
    let section_end = lines[section_start..]
        .iter()
        .position(|l| indent_of(l) == 0 && is_content(l))
        .map_or(lines.len(), |offset| section_start + offset);

    let section = &lines[section_start..section_end];
    // Logical ids sit at the indent of the first entry under `Resources:`
    let Some(base_indent) = section
        .iter()
        .find(|l| is_content(l))
        .map(|l| indent_of(l))
        .filter(|indent| *indent > 0)
    else {
        return String::new();
    };

    let Some(start) = section
        .iter()
        .position(|l| {
            indent_of(l) == base_indent
                && l.trim_start().strip_prefix(&declaration).is_some_and(|after| {
                    after.is_empty() || after.starts_with(char::is_whitespace)
                })
        })
        .map(|offset| section_start + offset)
    else {
        return String::new();
    };

    let mut end = lines[start + 1..]
        .iter()
        .position(|l| is_content(l) && indent_of(l) <= base_indent)
        .map_or(lines.len(), |offset| start + 1 + offset);

    // Blank lines and comments before the next sibling belong to it
    while end > start + 1 && !is_content(lines[end - 1]) {
        end -= 1;
    }

    lines[start..end].join("\n")
}

fn is_content(line: &str) -> bool {
    let trimmed = line.trim_start();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NETWORK: &str = r#"AWSTemplateFormatVersion: "2010-09-09"
Description: Network stack

Parameters:
  EnvironmentName:
    Type: String

Resources:
  VPC:
    Type: AWS::EC2::VPC
    Properties:
      CidrBlock: 10.0.0.0/16
      Tags:
        - Key: Name
          Value: !Sub ${EnvironmentName}-vpc

  # Private subnets
  PrivateSubnet1:
    Type: AWS::EC2::Subnet
    Properties:
      VpcId: !Ref VPC
      AvailabilityZone: !Select [0, !GetAZs ""]
      CidrBlock: !Select [0, !Cidr [!GetAtt VPC.CidrBlock, 4, 8]]

Outputs:
  VpcId:
    Value: !Ref VPC
"#;

    fn write_template(dir: &Path, name: &str, content: &str) {
        let templates = dir.join(TEMPLATES_DIR);
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join(name), content).unwrap();
    }

    fn defaults() -> Vec<String> {
        DEFAULT_EXCLUDES.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_template_with_intrinsics() {
        let resources =
            parse_template(NETWORK, "templates/network-stack.yaml", Path::new("x")).unwrap();
        assert_eq!(resources.len(), 2);

        let subnet = resources
            .iter()
            .find(|r| r.logical_id == "PrivateSubnet1")
            .unwrap();
        assert_eq!(subnet.resource_type, "AWS::EC2::Subnet");
        assert_eq!(
            subnet.properties.get("VpcId"),
            Some(&serde_json::json!({"!Ref": "VPC"}))
        );
    }

    #[test]
    fn test_raw_block_stops_at_sibling() {
        let block = extract_block(NETWORK, "VPC");
        assert!(block.starts_with("  VPC:"));
        assert!(block.contains("!Sub ${EnvironmentName}-vpc"));
        assert!(!block.contains("PrivateSubnet1"));
        assert!(!block.contains("# Private subnets"));

        let last = extract_block(NETWORK, "PrivateSubnet1");
        assert!(last.ends_with("CidrBlock: !Select [0, !Cidr [!GetAtt VPC.CidrBlock, 4, 8]]"));
        assert!(!last.contains("Outputs"));
    }

    #[test]
    fn test_raw_block_missing_id() {
        assert_eq!(extract_block(NETWORK, "Nope"), "");
        // Output names are not resource declarations
        assert_eq!(extract_block(NETWORK, "VpcId"), "");
    }

    #[test]
    fn test_raw_block_ignores_property_with_same_name() {
        let content = "Resources:
  RegistryService:
    Type: AWS::ECS::Service
    Properties:
      Cluster: !Ref Cluster
      DesiredCount: 1
  Cluster:
    Type: AWS::ECS::Cluster
    Properties:
      ClusterName: main
";
        let block = extract_block(content, "Cluster");
        assert_eq!(
            block,
            "  Cluster:\n    Type: AWS::ECS::Cluster\n    Properties:\n      ClusterName: main"
        );
        assert_eq!(extract_block(content, "DesiredCount"), "");
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let content = "Resources:\n  Thing:\n    Type: AWS::S3::Bucket\n    Properties:\n      Name: !Custom x\n";
        let err = parse_template(content, "t.yaml", Path::new("t.yaml")).unwrap_err();
        assert!(matches!(err, Error::UnknownTag { ref tag, .. } if tag == "!Custom"));
    }

    #[test]
    fn test_template_without_resources() {
        let resources = parse_template("Description: empty\n", "t.yaml", Path::new("t")).unwrap();
        assert!(resources.is_empty());
    }

    #[test]
    fn test_parse_dir_excludes_and_recovers() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "network-stack.yaml", NETWORK);
        write_template(
            tmp.path(),
            "single-stack.yaml",
            "Resources:\n  Legacy:\n    Type: AWS::EC2::VPC\n",
        );
        write_template(tmp.path(), "broken.yaml", "Resources:\n  - [unclosed\n");
        write_template(tmp.path(), "notes.txt", "Resources: {}\n");

        let resources = parse_dir(tmp.path(), &defaults()).unwrap();
        let mut ids: Vec<&str> = resources.iter().map(|r| r.logical_id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["PrivateSubnet1", "VPC"]);
        assert!(resources.iter().all(|r| r.file == "templates/network-stack.yaml"));
    }

    #[test]
    fn test_duplicate_logical_id_skips_later_file() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "a-stack.yaml", NETWORK);
        write_template(
            tmp.path(),
            "b-stack.yaml",
            "Resources:\n  VPC:\n    Type: AWS::EC2::VPC\n  Extra:\n    Type: AWS::ECS::Cluster\n",
        );

        let resources = parse_dir(tmp.path(), &defaults()).unwrap();
        assert_eq!(resources.len(), 2);
        assert!(resources.iter().all(|r| r.file == "templates/a-stack.yaml"));
    }

    #[test]
    fn test_missing_templates_dir() {
        let tmp = TempDir::new().unwrap();
        let err = parse_dir(tmp.path(), &[]).unwrap_err();
        assert!(matches!(err, Error::TemplatesMissing { .. }));
    }
}
