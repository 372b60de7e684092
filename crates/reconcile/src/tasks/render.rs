//! Markdown rendering for task files

use super::{Task, TaskAction, scaffold};
use crate::PREVIEW_LIMIT;
use crate::types::{SourceResource, TargetResource};

/// Location of the type table, named in tasks for unmapped Terraform types.
const TYPE_TABLE_PATH: &str = "crates/reconcile/src/type_map.rs";

/// How paths are displayed in task files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    /// Terraform root as the user refers to it
    pub source_root: String,
    /// CloudFormation root as the user refers to it
    pub target_root: String,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            source_root: "terraform/aws-ecs".to_string(),
            target_root: "cloudformation/aws-ecs".to_string(),
        }
    }
}

/// Render one task file.
pub fn render(task: &Task<'_>, ctx: &RenderContext) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Task {}: {} Resource\n\n", task.number(), task.action));
    out.push_str(&format!("**Action**: {}\n", task.action));
    out.push_str(&format!("**Priority**: {}\n", task.priority()));
    if let Some(confidence) = task.confidence {
        out.push_str(&format!("**Confidence**: {confidence:.2}\n"));
    }
    out.push('\n');

    source_section(&mut out, task.source, ctx);
    if let Some(target) = task.target {
        target_section(&mut out, target, ctx);
    }

    match task.action {
        TaskAction::Add => add_section(&mut out, task.source, ctx),
        TaskAction::Review => review_section(&mut out),
    }
    out
}

fn source_section(out: &mut String, source: &SourceResource, ctx: &RenderContext) {
    out.push_str("## Terraform Source\n\n");
    let language = match source.plan_address() {
        Some(address) => {
            out.push_str(&format!("- **Plan address**: `{address}`\n"));
            "json"
        }
        None => {
            out.push_str(&format!("- **File**: `{}/{}`\n", ctx.source_root, source.file));
            out.push_str(&format!("- **Line**: {}\n", source.line));
            "hcl"
        }
    };
    out.push_str(&format!("- **Address**: `{}`\n", source.address()));
    out.push_str(&format!(
        "- **Type**: `{}` → `{}`\n\n",
        source.resource_type,
        source.target_type()
    ));
    code_block(out, "Terraform Block", language, &source.raw_block);
}

fn target_section(out: &mut String, target: &TargetResource, ctx: &RenderContext) {
    out.push_str("## CloudFormation Target\n\n");
    out.push_str(&format!("- **File**: `{}/{}`\n", ctx.target_root, target.file));
    out.push_str(&format!("- **Logical ID**: `{}`\n", target.logical_id));
    out.push_str(&format!("- **Type**: `{}`\n\n", target.resource_type));
    code_block(out, "CloudFormation Block", "yaml", &target.raw_block);
}

fn add_section(out: &mut String, source: &SourceResource, ctx: &RenderContext) {
    match scaffold::snippet(source) {
        Some(snippet) => {
            out.push_str("## Suggested CloudFormation\n\n");
            out.push_str(&format!(
                "Add to: `{}/templates/{}`\n\n",
                ctx.target_root,
                scaffold::suggest_template(&source.resource_type)
            ));
            out.push_str(&format!("```yaml\n{snippet}\n```\n\n"));
        }
        None => {
            out.push_str("## Unknown CloudFormation Type\n\n");
            out.push_str(&format!(
                "The Terraform type `{}` has no entry in the type table.\n\n",
                source.resource_type
            ));
            out.push_str("**Action required**:\n");
            out.push_str(&format!(
                "1. Find the AWS::* CloudFormation type equivalent to `{}`\n",
                source.resource_type
            ));
            out.push_str(&format!("2. Add it to the type table in `{TYPE_TABLE_PATH}`\n"));
            out.push_str("3. Re-run `stacksync sync`\n\n");
        }
    }

    out.push_str("## Instructions\n\n");
    out.push_str(&format!(
        "1. Add the resource `{}` to the appropriate CloudFormation template\n",
        source.suggested_target_id()
    ));
    out.push_str("2. Replace `TODO` placeholders and `!Ref` guesses with real resource references\n");
    out.push_str("3. Add Outputs if other stacks need the resource\n");
}

fn review_section(out: &mut String) {
    out.push_str("## Instructions\n\n");
    out.push_str("1. Confirm the Terraform and CloudFormation resources are the same resource\n");
    out.push_str("2. Compare the two blocks for configuration drift\n");
    out.push_str("3. Update the CloudFormation template to match Terraform\n");
    out.push_str("4. If the pairing is wrong, add an explicit mapping to the mappings file\n");
}

fn code_block(out: &mut String, title: &str, language: &str, body: &str) {
    out.push_str(&format!("### {title}\n\n"));
    let body = if body.is_empty() {
        "# Could not extract block"
    } else {
        preview(body, PREVIEW_LIMIT)
    };
    out.push_str(&format!("```{language}\n{body}\n```\n\n"));
}

/// At most `limit` characters of `s`, cut on a char boundary.
fn preview(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}
