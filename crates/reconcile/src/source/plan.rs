//! Resolved-plan ingestion (`terraform show -json plan.tfplan`).
//!
//! Modules, `count` and `for_each` are already expanded in the plan, and
//! attribute values are resolved, so this is more accurate than parsing HCL.

use crate::error::{Error, Result};
use crate::types::{PLAN_MARKER, Properties, SourceResource};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
struct PlanDocument {
    #[serde(default)]
    planned_values: PlannedValues,
}

#[derive(Debug, Default, Deserialize)]
struct PlannedValues {
    #[serde(default)]
    root_module: PlanModule,
}

#[derive(Debug, Default, Deserialize)]
struct PlanModule {
    #[serde(default)]
    address: String,
    #[serde(default)]
    resources: Vec<PlanResource>,
    #[serde(default)]
    child_modules: Vec<PlanModule>,
}

#[derive(Debug, Deserialize)]
struct PlanResource {
    address: String,
    #[serde(default)]
    mode: String,
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    values: Option<Value>,
}

/// Parse a plan document from disk. Any read or parse failure is fatal.
pub fn parse_file(path: &Path) -> Result<Vec<SourceResource>> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let resources = parse_str(&content).map_err(|source| Error::Plan {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Parsed {} resources from plan JSON", resources.len());
    Ok(resources)
}

/// Parse plan JSON text into managed resources (data sources are dropped).
pub fn parse_str(content: &str) -> serde_json::Result<Vec<SourceResource>> {
    let plan: PlanDocument = serde_json::from_str(content)?;
    let mut resources = Vec::new();
    collect(&plan.planned_values.root_module, "", &mut resources);
    Ok(resources)
}

fn collect(module: &PlanModule, module_path: &str, out: &mut Vec<SourceResource>) {
    for res in module.resources.iter().filter(|r| r.mode != "data") {
        let values = res.values.clone().unwrap_or(Value::Null);
        let raw_block = serde_json::to_string_pretty(&values).unwrap_or_default();
        let properties: Properties = match values {
            Value::Object(map) => map.into_iter().collect(),
            _ => Properties::new(),
        };

        out.push(SourceResource {
            resource_type: res.resource_type.clone(),
            name: res.name.clone(),
            module: module_path.to_string(),
            file: format!("{PLAN_MARKER}{}", res.address),
            line: 0,
            properties,
            raw_block,
        });
    }

    for child in &module.child_modules {
        collect(child, &module_path_for(&child.address), out);
    }
}

/// `module.mcp_gateway.module.ecs_service` → `mcp_gateway/ecs_service`
fn module_path_for(address: &str) -> String {
    address.replace("module.", "").replace('.', "/")
}
