use anyhow::{Context as _, Result};
use reconcile::{MappingConfig, MatchResult, RenderContext, ReportFiles, ReportOptions, SourceInput};
use std::path::Path;

use crate::Context;
use crate::cli::SyncArgs;
use crate::paths;
use crate::ui;

pub fn run(ctx: &Context, args: SyncArgs) -> Result<()> {
    let tf_dir = paths::expand(&args.tf_dir);
    let cfn_dir = paths::expand(&args.cfn_dir);
    let output = paths::expand(&args.output);
    let mappings = paths::expand(&args.mappings);
    let tf_plan = args.tf_plan_path();

    if !ctx.quiet {
        ui::header("Terraform → CloudFormation Sync");
        ui::kv("Terraform", &tf_dir.display().to_string());
        if let Some(plan) = &tf_plan {
            ui::kv("Plan", &plan.display().to_string());
        }
        ui::kv("CloudFormation", &cfn_dir.display().to_string());
        ui::kv("Mappings", &mappings.display().to_string());
    }

    let config = MappingConfig::load(&mappings);
    let input = match &tf_plan {
        Some(plan) => SourceInput::Plan {
            plan,
            fallback_dir: &tf_dir,
        },
        None => SourceInput::Directory(&tf_dir),
    };

    let result = reconcile::reconcile(input, &cfn_dir, &args.exclude_templates, &config)
        .context("Failed to extract resources")?;

    let options = ReportOptions {
        context: RenderContext {
            source_root: args.tf_dir.trim_end_matches('/').to_string(),
            target_root: args.cfn_dir.trim_end_matches('/').to_string(),
        },
        generated: args
            .timestamp
            .then(|| chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false)),
        json: args.json,
    };
    let files = reconcile::write_report(&output, &result, &config, &options)
        .with_context(|| format!("Failed to write tasks to {}", output.display()))?;

    if !ctx.quiet {
        print_results(ctx, &result, &files, &output);
    }
    Ok(())
}

fn print_results(ctx: &Context, result: &MatchResult, files: &ReportFiles, output: &Path) {
    ui::section("Results");
    ui::kv("Matched", &result.matches.len().to_string());
    ui::kv("Terraform only", &result.source_only.len().to_string());
    ui::kv("CloudFormation only", &result.target_only.len().to_string());
    ui::kv("Skipped", &result.skipped_source.len().to_string());
    if !result.skipped_target.is_empty() {
        ui::kv(
            "Skipped (CloudFormation)",
            &result.skipped_target.len().to_string(),
        );
    }

    if ctx.verbose > 0 && !result.matches.is_empty() {
        ui::section("Matches");
        for m in &result.matches {
            ui::dim(&format!(
                "{} ↔ {} ({})",
                m.source.match_address(),
                m.target.logical_id,
                ui::confidence(m.confidence)
            ));
        }
    }

    let unknown = result.unknown_types();
    if !unknown.is_empty() {
        println!();
        ui::warn(&format!(
            "{} without a CloudFormation mapping:",
            ui::count(unknown.len(), "Terraform type")
        ));
        for resource_type in unknown {
            ui::dim(resource_type);
        }
    }

    println!();
    ui::success(&format!(
        "Generated {} in {}",
        ui::count(files.tasks.len(), "task file"),
        output.display()
    ));
    ui::info(&format!("See {} for an overview", files.summary.display()));
    if let Some(json) = &files.json {
        ui::info(&format!("JSON report: {}", json.display()));
    }
}
