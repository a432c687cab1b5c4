//! Clap derive structures for the `cvptool` CLI.
//!
//! Flag spellings (`--tarFile`, `--objNames`, `--skipVersionCheck`) match the
//! appliance's own tooling so existing scripts keep working; kebab-case
//! aliases are accepted as well.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// cvptool -- back up, restore and reset CloudVision Portal inventories
#[derive(Debug, Parser)]
#[command(
    name = "cvptool",
    version,
    about = "Back up, restore and reset CloudVision Portal inventories",
    long_about = "Captures a controller's configlets, containers, devices, images,\n\
        image bundles and roles into a tar archive, replays such an archive onto\n\
        a controller, or wipes those objects from a controller.",
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(flatten)]
    pub action: ActionArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

// ── Connection & Output Options ──────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Hostname or IP address of the controller (overrides profile)
    #[arg(long, env = "CVPKIT_HOST")]
    pub host: Option<String>,

    /// Controller username (overrides profile)
    #[arg(long, env = "CVPKIT_USER")]
    pub user: Option<String>,

    /// Password for the user; prompted for when absent
    #[arg(long)]
    pub password: Option<String>,

    /// Controller web-server port
    #[arg(long)]
    pub port: Option<u16>,

    /// Connect via HTTPS
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub ssl: Option<bool>,

    /// Profile from the config file
    #[arg(long, short = 'p', env = "CVPKIT_PROFILE")]
    pub profile: Option<String>,

    /// Cluster file; the primary node's address is used when --host is absent
    #[arg(long, value_name = "FILE")]
    pub cluster_config: Option<PathBuf>,

    /// Report format
    #[arg(long, short = 'o', env = "CVPKIT_OUTPUT", default_value = "table")]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto")]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Skip confirmation prompts
    #[arg(long, short = 'y')]
    pub yes: bool,
}

// ── Action Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ActionArgs {
    /// Action to perform on the controller
    #[arg(long, default_value = "backup", ignore_case = true)]
    pub action: Action,

    /// Archive to write (backup) or read (restore)
    #[arg(long = "tarFile", alias = "tar-file", value_name = "PATH")]
    pub tar_file: Option<PathBuf>,

    /// Object types to act on (default: all)
    #[arg(
        long,
        num_args = 1..,
        value_delimiter = ',',
        ignore_case = true,
        value_name = "TYPE"
    )]
    pub objects: Vec<ObjectType>,

    /// Restrict configlets to these names (case-insensitive)
    #[arg(
        long = "objNames",
        alias = "obj-names",
        num_args = 1..,
        value_delimiter = ',',
        value_name = "NAME"
    )]
    pub obj_names: Vec<String>,

    /// Execute the tasks a restore produces
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub tasks: Option<bool>,

    /// Bypass controller and snapshot version checks
    #[arg(long = "skipVersionCheck", alias = "skip-version-check")]
    pub skip_version_check: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Capture the controller into an archive
    Backup,
    /// Replay an archive onto the controller
    Restore,
    /// Delete objects from the controller
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum ObjectType {
    Configlets,
    Containers,
    Devices,
    Images,
    #[value(alias = "image-bundles")]
    Imagebundles,
    Roles,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Subcommands ──────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
