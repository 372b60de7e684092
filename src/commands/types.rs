use anyhow::{Result, bail};
use colored::Colorize;
use reconcile::MappedType;
use reconcile::type_map;

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, source_type: Option<&str>) -> Result<()> {
    match source_type {
        Some(source_type) => lookup(source_type),
        None => {
            list(ctx);
            Ok(())
        }
    }
}

fn lookup(source_type: &str) -> Result<()> {
    match MappedType::lookup(source_type) {
        MappedType::Target(target) => println!("{source_type} → {target}"),
        MappedType::Skip => println!("{source_type} → {}", "SKIP".dimmed()),
        MappedType::Unknown(_) => bail!(
            "No CloudFormation type for {source_type}; add one to the table in crates/reconcile/src/type_map.rs"
        ),
    }
    Ok(())
}

fn list(ctx: &Context) {
    let entries: Vec<_> = type_map::entries().collect();
    if !ctx.quiet {
        ui::header(&format!("Type Mappings ({} entries)", entries.len()));
    }

    let width = entries.iter().map(|(s, _)| s.len()).max().unwrap_or(0);
    for (source, mapped) in entries {
        let target = match &mapped {
            MappedType::Skip => "SKIP".dimmed().to_string(),
            other => other.to_string(),
        };
        println!("  {source:<width$}  {target}");
    }
}
