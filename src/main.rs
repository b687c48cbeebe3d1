//! `tcds-guard` CLI entry point.
//!
//! Operator tool over the guard: inspect the persisted state, run the gate
//! check, or report an event.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use tcds_guard::config::GuardConfig;
use tcds_guard::{logging, Guard};

/// Escalating usage guard for the TCDS mode.
#[derive(Parser)]
#[command(name = "tcds-guard", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Logical caller context shared by all subcommands.
#[derive(Args)]
struct ContextArgs {
    /// Origin label of the caller.
    #[arg(long)]
    origin: Option<String>,
    /// Region label of the caller.
    #[arg(long)]
    region: Option<String>,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Print a summary of the current guard state.
    Status {
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Run the gate check. Exits non-zero when protected use is refused.
    Check {
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Report a security event and print the resulting state.
    Event {
        /// Severity: info, yellow, or red. Anything else is audited only.
        #[arg(long)]
        severity: String,
        /// Free-text reason recorded in the audit log.
        #[arg(long)]
        reason: String,
        #[command(flatten)]
        context: ContextArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = GuardConfig::load().context("failed to load configuration")?;
    let _logging_guard = match &config.logging.logs_dir {
        Some(dir) => Some(logging::init_production(dir, &config.logging.level)?),
        None => {
            logging::init_cli(&config.logging.level);
            None
        }
    };
    debug!(
        state_file = %config.paths.state_file.display(),
        audit_log = %config.paths.audit_log.display(),
        "configuration loaded"
    );

    match cli.command {
        Command::Status { context } => {
            let guard = build_guard(&config, &context);
            println!("{}", guard.explain_state());
        }
        Command::Check { context } => {
            let guard = build_guard(&config, &context);
            guard.guard_usage()?;
            println!("allowed");
        }
        Command::Event {
            severity,
            reason,
            context,
        } => {
            let mut guard = build_guard(&config, &context);
            guard.register_event(&severity, &reason);
            println!("{}", guard.explain_state());
        }
    }

    Ok(())
}

fn build_guard(config: &GuardConfig, context: &ContextArgs) -> Guard {
    Guard::from_config(
        config,
        context.origin.as_deref(),
        context.region.as_deref(),
    )
}
