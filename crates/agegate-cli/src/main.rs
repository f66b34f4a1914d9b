//! agegate CLI - evaluate submissions against the moderation engine
//!
//! Works on JSON files with an in-memory store:
//! - `check` runs the full gate for one user and prints the decision
//! - `scan` reports the first restricted term in a submission
//! - `age` computes whole years of age

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use agegate_engine::{Submission, UserId, UserModerationState};
use commands::CheckArgs;
use config::CliConfig;

/// agegate CLI
#[derive(Parser)]
#[command(name = "agegate")]
#[command(about = "Progressive content moderation and age gating", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "AGEGATE_CONFIG", global = true)]
    config: Option<String>,

    /// Log level (overrides the configuration file)
    #[arg(long, env = "AGEGATE_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a submission for a user
    Check {
        /// User moderation state (JSON)
        #[arg(long)]
        state: PathBuf,

        /// Submission body (JSON object)
        #[arg(long)]
        submission: PathBuf,

        /// Submitting user, defaults to the state's user
        #[arg(long, conflicts_with = "anonymous")]
        user_id: Option<String>,

        /// Submit without an authenticated user
        #[arg(long)]
        anonymous: bool,

        /// Evaluation instant (RFC 3339), defaults to now
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Report the first restricted term in a submission
    Scan {
        /// Submission body (JSON object)
        #[arg(long)]
        submission: PathBuf,
    },

    /// Compute whole years of age
    Age {
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: NaiveDate,

        /// Reference date, defaults to today (UTC)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref())?;

    // Initialize tracing on stderr; stdout carries the report
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    if cli.json || config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let moderation = &config.moderation;

    match cli.command {
        Commands::Check {
            state,
            submission,
            user_id,
            anonymous,
            now,
        } => {
            let state: UserModerationState = commands::read_json(&state)?;
            let submission: Submission = commands::read_json(&submission)?;
            let report = commands::check(CheckArgs {
                state,
                submission,
                user_id: user_id.map(UserId::new),
                anonymous,
                now,
                config: moderation,
            })
            .await?;
            print_json(&report)
        }
        Commands::Scan { submission } => {
            let submission: Submission = commands::read_json(&submission)?;
            print_json(&commands::scan(&submission, moderation))
        }
        Commands::Age { dob, as_of } => print_json(&commands::age(dob, as_of, moderation)),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_check_arguments() {
        let cli = Cli::parse_from([
            "agegate",
            "check",
            "--state",
            "user.json",
            "--submission",
            "post.json",
            "--now",
            "2026-10-16T12:00:00Z",
            "--json",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Check { state, now, anonymous, .. } => {
                assert_eq!(state, PathBuf::from("user.json"));
                assert!(now.is_some());
                assert!(!anonymous);
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn user_id_conflicts_with_anonymous() {
        let result = Cli::try_parse_from([
            "agegate",
            "check",
            "--state",
            "u.json",
            "--submission",
            "s.json",
            "--user-id",
            "u1",
            "--anonymous",
        ]);
        assert!(result.is_err());
    }
}
