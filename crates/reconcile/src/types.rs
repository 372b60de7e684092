//! Core resource and result types

use crate::type_map::MappedType;
use serde::Serialize;
use std::collections::BTreeMap;

/// Attribute name → literal or resolved value.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// `file` prefix marking resources that came from a resolved plan document.
pub const PLAN_MARKER: &str = "plan:";

/// A resource declared on the Terraform side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceResource {
    /// Terraform resource type, e.g. `aws_ecs_service`
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Local name within its module
    pub name: String,
    /// Module path (`mcp-gateway`, `a/b` for nested plan modules), empty for root
    pub module: String,
    /// Path relative to the Terraform root, or `plan:<address>`
    pub file: String,
    /// 1-based declaration line, 0 when unknown
    pub line: usize,
    #[serde(skip)]
    pub properties: Properties,
    #[serde(skip)]
    pub raw_block: String,
}

impl SourceResource {
    /// Module-qualified `type.name`.
    pub fn address(&self) -> String {
        if self.module.is_empty() {
            format!("{}.{}", self.resource_type, self.name)
        } else {
            format!("module.{}.{}.{}", self.module, self.resource_type, self.name)
        }
    }

    /// Address used for skip patterns and explicit mappings.
    ///
    /// Plan-derived resources carry their fully expanded address (including
    /// module instance keys and count/for_each indexes) in `file`.
    pub fn match_address(&self) -> String {
        match self.plan_address() {
            Some(address) => address.to_string(),
            None => self.address(),
        }
    }

    /// The plan address, when this resource came from a plan document.
    pub fn plan_address(&self) -> Option<&str> {
        self.file.strip_prefix(PLAN_MARKER)
    }

    /// CloudFormation type this resource maps to.
    pub fn target_type(&self) -> MappedType {
        MappedType::lookup(&self.resource_type)
    }

    /// CamelCase logical id derived from the name.
    pub fn suggested_target_id(&self) -> String {
        camel_case(&self.name)
    }
}

/// A resource declared in a CloudFormation template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetResource {
    pub logical_id: String,
    /// CloudFormation type, e.g. `AWS::ECS::Service`
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Path relative to the CloudFormation root
    pub file: String,
    #[serde(skip)]
    pub properties: Properties,
    #[serde(skip)]
    pub raw_block: String,
}

/// A matched pair with its confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub source: SourceResource,
    pub target: TargetResource,
    pub confidence: f64,
}

/// Partition of all extracted resources.
///
/// Every source resource lands in exactly one of `matches`, `source_only`
/// or `skipped_source`; every target resource in exactly one of `matches`,
/// `target_only` or `skipped_target`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    pub matches: Vec<Match>,
    pub source_only: Vec<SourceResource>,
    pub target_only: Vec<TargetResource>,
    pub skipped_source: Vec<SourceResource>,
    pub skipped_target: Vec<TargetResource>,
}

impl MatchResult {
    /// Matches at or above the review threshold.
    pub fn high_confidence(&self) -> impl Iterator<Item = &Match> {
        self.matches
            .iter()
            .filter(|m| m.confidence >= crate::REVIEW_THRESHOLD)
    }

    /// Matches below the review threshold.
    pub fn low_confidence(&self) -> impl Iterator<Item = &Match> {
        self.matches
            .iter()
            .filter(|m| m.confidence < crate::REVIEW_THRESHOLD)
    }

    pub fn source_total(&self) -> usize {
        self.matches.len() + self.source_only.len() + self.skipped_source.len()
    }

    pub fn target_total(&self) -> usize {
        self.matches.len() + self.target_only.len() + self.skipped_target.len()
    }

    /// Terraform types with no type table entry, sorted and deduplicated.
    pub fn unknown_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self
            .source_only
            .iter()
            .filter(|s| s.target_type().is_unknown())
            .map(|s| s.resource_type.as_str())
            .collect();
        types.sort_unstable();
        types.dedup();
        types
    }
}

/// Split on `-`/`_` and capitalize each segment: `db-proxy_main` → `DbProxyMain`.
pub fn camel_case(name: &str) -> String {
    name.split(['-', '_'])
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect()
}
