//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand, ValueHint};

use crate::domain::{clean_list, PackageOptions};

/// Manage systems registered with a Katello server: packages, subscriptions, groups and custom info
#[derive(Parser, Debug)]
#[command(name = "katello-system")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log to stderr (-d info, -dd debug, -ddd trace)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Verbose output: one record per block, all columns
    #[arg(short, long, global = true, conflicts_with = "grep")]
    pub verbose: bool,

    /// Grep-friendly output: no header, tab-separated rows
    #[arg(short, long, global = true)]
    pub grep: bool,

    /// Config file (default: platform config dir)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Server API url, e.g. https://katello.example.com/katello/api
    #[arg(long, global = true, value_hint = ValueHint::Url)]
    pub url: Option<String>,

    #[arg(short = 'u', long, global = true)]
    pub username: Option<String>,

    #[arg(short = 'p', long, global = true)]
    pub password: Option<String>,

    /// Give up waiting for remote tasks after SECS seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub task_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Organization; falls back to `defaults.org` from config.
#[derive(Args, Debug, Clone, Default)]
pub struct OrgArg {
    /// Organization name
    #[arg(short, long)]
    pub org: Option<String>,
}

/// Mutually exclusive system reference, one of them required.
#[derive(Args, Debug, Clone, Default)]
#[group(id = "system", required = true, multiple = false)]
pub struct SystemArgs {
    /// System name
    #[arg(long)]
    pub name: Option<String>,

    /// System uuid
    #[arg(long)]
    pub uuid: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PackageActionArgs {
    /// Packages to install, comma separated
    #[arg(long, value_delimiter = ',', value_name = "PACKAGES")]
    pub install: Option<Vec<String>>,

    /// Packages to remove, comma separated
    #[arg(long, value_delimiter = ',', value_name = "PACKAGES")]
    pub remove: Option<Vec<String>>,

    /// Packages to update, comma separated; give no names with --all to update everything
    #[arg(long, value_delimiter = ',', num_args = 0..=1, value_name = "PACKAGES")]
    pub update: Option<Vec<String>>,

    /// Update all packages
    #[arg(long, requires = "update")]
    pub all: bool,

    /// Package groups to install, comma separated
    #[arg(long = "install_groups", value_delimiter = ',', value_name = "GROUPS")]
    pub install_groups: Option<Vec<String>>,

    /// Package groups to remove, comma separated
    #[arg(long = "remove_groups", value_delimiter = ',', value_name = "GROUPS")]
    pub remove_groups: Option<Vec<String>>,
}

impl From<PackageActionArgs> for PackageOptions {
    fn from(args: PackageActionArgs) -> Self {
        PackageOptions {
            install: args.install,
            remove: args.remove,
            update: args.update,
            update_all: args.all,
            install_groups: args.install_groups,
            remove_groups: args.remove_groups,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List systems within an organization
    List {
        #[command(flatten)]
        org: OrgArg,
        /// Environment name
        #[arg(short, long)]
        environment: Option<String>,
        /// Pool id to filter systems by subscription
        #[arg(long = "pool")]
        pool_id: Option<String>,
    },

    /// Display a system
    Info {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        #[arg(short, long, conflicts_with = "uuid")]
        environment: Option<String>,
    },

    /// List installed packages or run a remote package action
    Packages {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        #[arg(short, long, conflicts_with = "uuid")]
        environment: Option<String>,
        #[command(flatten)]
        actions: PackageActionArgs,
    },

    /// List remote tasks of a system
    Tasks {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        #[arg(short, long, conflicts_with = "uuid")]
        environment: Option<String>,
    },

    /// Display a remote task
    #[command(name = "task_info")]
    TaskInfo {
        /// Task uuid
        #[arg(long)]
        id: String,
    },

    /// List releases available for a system or an environment
    #[command(group = ArgGroup::new("source").required(true).multiple(false))]
    Releases {
        #[command(flatten)]
        org: OrgArg,
        /// System name
        #[arg(long, group = "source")]
        name: Option<String>,
        /// System uuid
        #[arg(long, group = "source")]
        uuid: Option<String>,
        /// List all releases of this environment
        #[arg(short, long, group = "source")]
        environment: Option<String>,
    },

    /// Display the hardware facts of a system
    Facts {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        #[arg(short, long, conflicts_with = "uuid")]
        environment: Option<String>,
    },

    /// Register a system
    Register {
        /// System name
        #[arg(long)]
        name: String,
        #[command(flatten)]
        org: OrgArg,
        #[arg(short, long, conflicts_with = "activationkey")]
        environment: Option<String>,
        /// Service level agreement
        #[arg(long)]
        servicelevel: Option<String>,
        /// Activation keys, comma separated
        #[arg(long, value_delimiter = ',')]
        activationkey: Vec<String>,
        /// Value of $releasever for the system
        #[arg(long)]
        release: Option<String>,
        /// System fact, repeatable
        #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"], action = ArgAction::Append)]
        fact: Vec<String>,
    },

    /// Unregister a system
    Unregister {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        #[arg(short, long, conflicts_with = "uuid")]
        environment: Option<String>,
    },

    /// Remove the deletion record of a hypervisor
    #[command(name = "remove_deletion")]
    RemoveDeletion {
        /// Hypervisor uuid
        #[arg(long)]
        uuid: String,
    },

    /// Subscribe a system to a pool
    Subscribe {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        /// Pool id
        #[arg(long)]
        pool: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },

    /// List current or available subscriptions of a system
    Subscriptions {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        /// Show available pools instead of consumed entitlements
        #[arg(long)]
        available: bool,
        /// Only pools matching the system
        #[arg(long = "match_system", requires = "available")]
        match_system: bool,
        /// Only pools matching installed software
        #[arg(long = "match_installed", requires = "available")]
        match_installed: bool,
        /// Only pools not overlapping current subscriptions
        #[arg(long = "no_overlap", requires = "available")]
        no_overlap: bool,
    },

    /// Unsubscribe a system
    #[command(group = ArgGroup::new("target").required(true).multiple(false))]
    Unsubscribe {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        /// Entitlement id
        #[arg(long, group = "target")]
        entitlement: Option<String>,
        /// Certificate serial id
        #[arg(long, group = "target")]
        serial: Option<String>,
        /// All current entitlements
        #[arg(long, group = "target")]
        all: bool,
    },

    /// Update a system
    Update {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        #[arg(short, long, conflicts_with = "uuid")]
        environment: Option<String>,
        #[arg(long = "new_name")]
        new_name: Option<String>,
        #[arg(long = "new_environment")]
        new_environment: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        release: Option<String>,
        #[arg(long)]
        servicelevel: Option<String>,
    },

    /// Systems report
    Report {
        #[command(flatten)]
        org: OrgArg,
        #[arg(short, long)]
        environment: Option<String>,
        /// text (default), html, csv or pdf
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Add a system to system groups
    #[command(name = "add_system_groups")]
    AddSystemGroups {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        /// Group names, comma separated
        #[arg(long = "system_groups", value_delimiter = ',', required = true)]
        system_groups: Vec<String>,
    },

    /// Remove a system from system groups
    #[command(name = "remove_system_groups")]
    RemoveSystemGroups {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        /// Group names, comma separated
        #[arg(long = "system_groups", value_delimiter = ',', required = true)]
        system_groups: Vec<String>,
    },

    /// Add custom info to a system
    #[command(name = "add_custom_info")]
    AddCustomInfo {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        #[arg(short, long, conflicts_with = "uuid")]
        environment: Option<String>,
        #[arg(long)]
        keyname: String,
        #[arg(long)]
        value: String,
    },

    /// View custom info of a system
    #[command(name = "view_custom_info")]
    ViewCustomInfo {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        #[arg(short, long, conflicts_with = "uuid")]
        environment: Option<String>,
        #[arg(long)]
        keyname: Option<String>,
    },

    /// Replace one custom info value of a system
    #[command(name = "update_custom_info")]
    UpdateCustomInfo {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        #[arg(short, long, conflicts_with = "uuid")]
        environment: Option<String>,
        #[arg(long)]
        keyname: String,
        #[arg(long = "current-value")]
        current_value: String,
        #[arg(long = "new-value")]
        new_value: String,
    },

    /// Remove custom info from a system
    #[command(name = "remove_custom_info")]
    RemoveCustomInfo {
        #[command(flatten)]
        org: OrgArg,
        #[command(flatten)]
        system: SystemArgs,
        #[arg(short, long, conflicts_with = "uuid")]
        environment: Option<String>,
        #[arg(long)]
        keyname: String,
        /// Remove only this value
        #[arg(long)]
        value: Option<String>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config (password masked)
    Show,

    /// Create config template
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}

/// Pair up `--fact KEY VALUE` occurrences.
pub fn fact_pairs(values: &[String]) -> Vec<(String, String)> {
    values
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}

/// Comma list as given, trimmed and without empty entries.
pub fn group_names(values: &[String]) -> Vec<String> {
    clean_list(values.to_vec())
}
