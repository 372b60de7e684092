use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stacksync")]
#[command(version)]
#[command(
    about = "Reconcile Terraform resources against CloudFormation templates",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Match Terraform against CloudFormation and write task files
    Sync(SyncArgs),

    /// Show the Terraform → CloudFormation type table
    Types {
        /// Look up a single Terraform type
        source_type: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct SyncArgs {
    /// Terraform root directory
    #[arg(long, env = "STACKSYNC_TF_DIR", default_value = "terraform/aws-ecs")]
    pub tf_dir: String,

    /// CloudFormation root directory (containing `templates/`)
    #[arg(long, env = "STACKSYNC_CFN_DIR", default_value = "cloudformation/aws-ecs")]
    pub cfn_dir: String,

    /// Output directory for task files and the summary
    #[arg(
        short,
        long,
        env = "STACKSYNC_OUTPUT",
        default_value = "cloudformation/aws-ecs/sync-tasks"
    )]
    pub output: String,

    /// Resolved plan JSON (`terraform show -json`), used instead of parsing HCL
    #[arg(long)]
    pub tf_plan: Option<String>,

    /// Mappings file (.yaml, .toml or .json)
    #[arg(
        long,
        env = "STACKSYNC_MAPPINGS",
        default_value = "cloudformation/aws-ecs/tf-cfn-mappings.yaml"
    )]
    pub mappings: String,

    /// Skip templates whose file name contains this text
    #[arg(long = "exclude-template", value_name = "TEXT", default_values_t = default_excludes())]
    pub exclude_templates: Vec<String>,

    /// Also write summary.json
    #[arg(long)]
    pub json: bool,

    /// Stamp the summary with the generation time
    #[arg(long)]
    pub timestamp: bool,
}

fn default_excludes() -> Vec<String> {
    reconcile::target::DEFAULT_EXCLUDES
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl SyncArgs {
    pub fn tf_plan_path(&self) -> Option<PathBuf> {
        self.tf_plan.as_deref().map(crate::paths::expand)
    }
}
