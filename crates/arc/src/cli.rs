//! Clap derive structures for the `arc` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// arc -- inspect and edit ARC App records from the command line
#[derive(Debug, Parser)]
#[command(
    name = "arc",
    version,
    about = "Inspect and edit ARC App records from the command line",
    long_about = "Loads tutors, learners, bookings, matchings, requests and request\n\
        submissions from the ARC App script endpoint (or an in-memory mock),\n\
        and writes changes back through the same client cache the app uses.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "ARC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Script endpoint URL (overrides profile)
    #[arg(long, short = 'u', env = "ARC_URL", global = true)]
    pub url: Option<String>,

    /// Use the in-memory mock server instead of the script endpoint
    #[arg(long, env = "ARC_MOCK", global = true, conflicts_with = "url")]
    pub mock: bool,

    /// Per-call timeout in milliseconds
    #[arg(long, env = "ARC_TIMEOUT_MS", global = true)]
    pub timeout_ms: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ARC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every record of a resource
    #[command(alias = "ls")]
    List(ResourceArgs),

    /// Show one record
    Get(RecordArgs),

    /// Create a record (id and date are assigned by the server)
    Create(CreateArgs),

    /// Change fields of an existing record
    Update(UpdateArgs),

    /// Delete a record
    #[command(alias = "rm")]
    Delete(RecordArgs),

    /// Re-fetch one resource, or all of them
    Refresh(RefreshArgs),

    /// Render display labels for records
    Label(LabelArgs),

    /// Validate every loaded record and cross-check id references
    Check,

    /// Show the load state of every resource
    Debug,

    /// Apply a change notification (`[op, resource, record|id]`) to the cache
    Notify(NotifyArgs),

    /// Reserved server commands
    Server(ServerArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Record commands ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ResourceArgs {
    /// Resource name (tutors, learners, bookings, matchings, requests, requestSubmissions)
    pub resource: String,
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Resource name
    pub resource: String,

    /// Record id
    pub id: i64,
}

/// Where a record payload comes from.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct PayloadArgs {
    /// Inline JSON object of fields
    #[arg(long, short = 'd')]
    pub data: Option<String>,

    /// Read the JSON object of fields from a file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Resource name
    pub resource: String,

    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Resource name
    pub resource: String,

    /// Record id
    pub id: i64,

    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Debug, Args)]
pub struct RefreshArgs {
    /// Resource name (default: every resource)
    pub resource: Option<String>,
}

#[derive(Debug, Args)]
pub struct LabelArgs {
    /// Resource name
    pub resource: String,

    /// Record ids
    #[arg(required = true)]
    pub ids: Vec<i64>,

    /// Fields joined into the label (default: "<Title> #<id>")
    #[arg(long, short = 'f', value_delimiter = ',')]
    pub fields: Vec<String>,
}

#[derive(Debug, Args)]
pub struct NotifyArgs {
    /// Notification as JSON, e.g. '["delete","tutors",5]'
    pub message: String,
}

// ── Server ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServerArgs {
    #[command(subcommand)]
    pub command: ServerCommand,
}

#[derive(Debug, Subcommand)]
pub enum ServerCommand {
    /// Re-import request submissions from the intake form
    RefreshSubmissions,

    /// Dump server-side state
    Debug,

    /// Run a named server command
    Command {
        /// Command name
        name: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// Create or extend the config file with guided setup
    Init,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store the access token for a profile in the system keyring
    SetToken {
        /// Profile name (default: the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
