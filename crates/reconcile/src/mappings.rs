//! Operator overrides: explicit mappings, skip patterns and known gaps.
//!
//! The mappings file is optional. A missing or unreadable file yields an
//! empty [`MappingConfig`] and a warning; it never aborts a run.
//!
//! ```yaml
//! mappings:
//!   module.net.aws_vpc.main: VPC
//!   module.mcp_gateway.aws_ecs_service.*: McpGatewayService
//! skip_tf_patterns:
//!   - aws_cloudwatch_log_group.*
//! skip_cfn_patterns:
//!   - Bootstrap*
//! known_gaps:
//!   - pattern: aws_wafv2_*
//!     description: WAF is managed outside the stacks
//!     recommendation: Leave as is
//!     priority: low
//! ```

use regex::Regex;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// An address pattern where `*` matches any substring.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(raw: &str) -> Result<Self, regex::Error> {
        let body = raw
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        Ok(Self {
            raw: raw.to_string(),
            regex: Regex::new(&format!("^{body}$"))?,
        })
    }

    /// Whether the whole `address` matches.
    pub fn matches(&self, address: &str) -> bool {
        self.regex.is_match(address)
    }

    pub fn is_wildcard(&self) -> bool {
        self.raw.contains('*')
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(de::Error::custom)
    }
}

/// One `pattern → logical id` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingRule {
    pub pattern: Pattern,
    pub logical_id: String,
}

/// Mapping rules in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingRules(Vec<MappingRule>);

impl MappingRules {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappingRule> {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for MappingRules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RulesVisitor;

        impl<'de> Visitor<'de> for RulesVisitor {
            type Value = MappingRules;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of Terraform address patterns to logical ids")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(MappingRules::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut rules = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((pattern, logical_id)) = map.next_entry::<String, String>()? {
                    rules.push(MappingRule {
                        pattern: Pattern::new(&pattern).map_err(de::Error::custom)?,
                        logical_id,
                    });
                }
                Ok(MappingRules(rules))
            }
        }

        deserializer.deserialize_any(RulesVisitor)
    }
}

/// An acknowledged mismatch reported in the summary but never turned into a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnownGap {
    pub pattern: Option<String>,
    pub description: Option<String>,
    pub recommendation: Option<String>,
    pub priority: Option<String>,
}

/// Operator overrides, loaded once per run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub mappings: MappingRules,
    #[serde(alias = "skip_source_patterns")]
    pub skip_tf_patterns: Vec<Pattern>,
    #[serde(alias = "skip_target_patterns")]
    pub skip_cfn_patterns: Vec<Pattern>,
    pub known_gaps: Vec<KnownGap>,
}

impl MappingConfig {
    /// Load overrides from `path`, degrading to an empty config.
    ///
    /// The format follows the extension: `.toml`, `.json`, anything else YAML.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::warn!("No mappings file found at {}", path.display());
            return Self::default();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Could not read mappings file {}: {e}", path.display());
                return Self::default();
            }
        };

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let parsed = match extension {
            "toml" => toml::from_str::<Self>(&content).map_err(|e| e.to_string()),
            "json" => serde_json::from_str::<Self>(&content).map_err(|e| e.to_string()),
            _ => Self::from_yaml(&content).map_err(|e| e.to_string()),
        };

        match parsed {
            Ok(config) => {
                log::info!(
                    "Loaded {} mappings, {} skip patterns, {} known gaps",
                    config.mappings.len(),
                    config.skip_tf_patterns.len() + config.skip_cfn_patterns.len(),
                    config.known_gaps.len()
                );
                config
            }
            Err(e) => {
                log::warn!("Invalid mappings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Parse a YAML document; an empty document is an empty config.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        let parsed: Option<Self> = serde_yaml::from_str(content)?;
        Ok(parsed.unwrap_or_default())
    }

    /// Whether a Terraform address matches any skip pattern.
    pub fn skips_source(&self, address: &str) -> bool {
        self.skip_tf_patterns.iter().any(|p| p.matches(address))
    }

    /// Whether a CloudFormation logical id matches any skip pattern.
    pub fn skips_target(&self, logical_id: &str) -> bool {
        self.skip_cfn_patterns.iter().any(|p| p.matches(logical_id))
    }

    /// Explicit logical id for an address: exact key first, then wildcard
    /// patterns in declaration order.
    pub fn find_mapping(&self, address: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|rule| rule.pattern.as_str() == address)
            .or_else(|| {
                self.mappings
                    .iter()
                    .find(|rule| rule.pattern.is_wildcard() && rule.pattern.matches(address))
            })
            .map(|rule| rule.logical_id.as_str())
    }
}
