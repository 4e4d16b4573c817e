//! `aotledger` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration and start optional file logging.
//! - Dispatch one ledger verb and print its JSON outcome on stdout.
//!
//! # Invariants
//! - stdout carries exactly one JSON document per invocation.
//! - Exit code 0 means success, pass, ready or valid; anything else is 1.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::{Config, StoreFormat};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "aotledger")]
#[command(about = "Atom-of-thought ledger: dependency DAG, OR-groups, bindings and checklists")]
#[command(version)]
struct Cli {
    /// Ledger file (Markdown with YAML frontmatter, or SQLite with --store sqlite)
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    #[arg(long, global = true, value_enum)]
    store: Option<StoreFormat>,

    /// TOML config file (default: $AOTLEDGER_CONFIG, then ./aotledger.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enables file logging into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new ledger with an objective
    #[command(display_order = 1)]
    Init {
        #[arg(long)]
        goal: String,
        #[arg(long, default_value = "")]
        background_intent: String,
        /// Comma-separated deliverables
        #[arg(long, default_value = "")]
        deliverables: String,
        #[arg(long, default_value = "")]
        definition_of_done: String,
        /// YAML file holding the base case (`checklist: [...]` or a single check)
        #[arg(long, conflicts_with = "check_command")]
        base_case: Option<PathBuf>,
        /// Shorthand for a single `command` base case
        #[arg(long)]
        check_command: Option<String>,
    },

    /// Add a pending atom
    #[command(display_order = 2)]
    AddAtom {
        atom_id: String,
        #[arg(long)]
        description: String,
        /// Comma-separated dependency IDs
        #[arg(long, default_value = "")]
        depends_on: String,
        #[arg(long)]
        or_group: Option<String>,
    },

    /// Split an atom into children inheriting its dependencies
    #[command(display_order = 3)]
    Decompose {
        parent_id: String,
        /// Comma-separated child IDs
        #[arg(long)]
        children: String,
        /// Child descriptions separated by `|||`
        #[arg(long)]
        descriptions: String,
        #[arg(long)]
        reason: String,
    },

    /// Change the selected branch of an OR-group
    #[command(display_order = 4)]
    SwitchBranch {
        group_name: String,
        new_selection: String,
        #[arg(long)]
        reason: String,
    },

    /// Record completion evidence for an atom
    #[command(display_order = 5)]
    Bind {
        atom_id: String,
        #[arg(long)]
        summary: String,
        /// Comma-separated artifact paths
        #[arg(long, default_value = "")]
        artifacts: String,
    },

    /// Set an atom's status (pending, in_progress, resolved)
    #[command(display_order = 6)]
    UpdateAtom { atom_id: String, status: String },

    /// Set the loop status (pending, running, stopped, completed)
    #[command(display_order = 7)]
    SetStatus {
        status: String,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Print the full ledger snapshot
    #[command(display_order = 8)]
    Read,

    /// Check structural integrity
    #[command(display_order = 9)]
    Validate,

    /// Check loop-entry preconditions
    #[command(display_order = 10)]
    Gate,

    /// Evaluate the objective's base-case checklist
    #[command(display_order = 11)]
    Verify {
        /// Per-command timeout in seconds (default from config)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Run one command check
    #[command(display_order = 12)]
    VerifyCommand {
        command: String,
        /// Pass when the command exits non-zero
        #[arg(long)]
        expect_fail: bool,
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Run one file check (globs supported)
    #[command(display_order = 13)]
    VerifyFile {
        path: String,
        /// Pass when nothing matches
        #[arg(long)]
        expect_missing: bool,
    },

    /// Copy the ledger into another store
    #[command(display_order = 14)]
    Export {
        /// Destination ledger path
        #[arg(long)]
        to: PathBuf,
        #[arg(long, value_enum)]
        to_store: StoreFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            commands::print_failure(&format!("{err:#}"), "invalid");
            return ExitCode::FAILURE;
        }
    };

    if let Some(log_dir) = &config.log_dir {
        let level = config
            .log_level
            .as_deref()
            .unwrap_or_else(|| aotledger_core::default_log_level());
        if let Err(err) = aotledger_core::init_logging(level, log_dir) {
            eprintln!("aotledger: logging disabled: {err}");
        }
    }

    if commands::run(cli.command, &config) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = &cli.state_file {
        config.state_file = path.clone();
    }
    if let Some(store) = cli.store {
        config.store = store;
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = Some(level.clone());
    }
    Ok(config)
}
