use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cmsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Keep Contentful content types, entries and webhooks in their declared state", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manifest declaring the desired resources [default: cmsync.toml]
    #[arg(long, global = true, env = "CMSYNC_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// File recording what has been applied [default: cmsync.state.json]
    #[arg(long, global = true, env = "CMSYNC_STATE")]
    pub state: Option<PathBuf>,

    /// Content Management API token
    #[arg(long, global = true, env = "CONTENTFUL_MANAGEMENT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Management API endpoint
    #[arg(long, global = true, env = "CONTENTFUL_BASE_URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would do for each manifest address
    Plan,

    /// Create, update and delete resources until the space matches the manifest
    Apply(ApplyArgs),

    /// Re-read every recorded resource and forget the ones that are gone
    Refresh,

    /// Delete every recorded resource
    Destroy(DestroyArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Command Arguments
// ============================================================================

#[derive(Parser)]
pub struct ApplyArgs {
    /// Dry run - show the plan without calling the API
    #[arg(short, long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser)]
pub struct DestroyArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}
