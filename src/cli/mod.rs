//! Command-line interface.
//!
//! Parses arguments and dispatches to the command modules.

mod commands;
mod helpers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::analysis::RubricPolicy;

#[derive(Parser)]
#[command(name = "compass")]
#[command(about = "Security policy analysis and remediation ticketing")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// User id to act as
    #[arg(long, global = true, env = "COMPASS_USER")]
    user: Option<String>,

    /// Identity token issued by the authentication provider
    #[arg(long, global = true, env = "COMPASS_ID_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

fn parse_rubric(value: &str) -> Result<RubricPolicy, String> {
    RubricPolicy::parse(value).ok_or_else(|| format!("unknown rubric '{}' (strict, baseline)", value))
}

fn parse_param(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), val.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", value)),
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the PDF tools and services are available
    Check,

    /// Extract text and metadata from a PDF
    Extract {
        /// PDF file to extract
        file: PathBuf,
        /// MIME type to declare for the upload
        #[arg(long)]
        mime: Option<String>,
        /// Print the extraction as JSON
        #[arg(long)]
        json: bool,
        /// Write the first-page preview PNG here
        #[arg(long)]
        preview: Option<PathBuf>,
    },

    /// Analyze a policy document
    Analyze {
        /// PDF file, or a plain-text file with --text
        file: PathBuf,
        /// Treat the input as already-extracted text
        #[arg(long)]
        text: bool,
        /// Analysis variant (compliance, summary)
        #[arg(long)]
        variant: Option<String>,
        /// Scoring rubric (strict, baseline); overrides config
        #[arg(long, value_parser = parse_rubric)]
        rubric: Option<RubricPolicy>,
        /// Extra context for the engine, e.g. --param framework="ISO 27001"
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Write an HTML report here
        #[arg(long)]
        html: Option<PathBuf>,
        /// Create tickets for the action items
        #[arg(long)]
        tickets: bool,
    },

    /// Create tickets from a saved analysis (JSON from `analyze --json`)
    Tickets {
        /// Saved analysis, or a bare list of action items
        file: PathBuf,
        /// Print the dispatch report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration (secrets redacted)
    Config {
        /// Print as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = helpers::load_config(cli.config.as_deref()).await?;
    let identity = helpers::resolve_identity(cli.user.as_deref(), cli.token.as_deref());

    match cli.command {
        Commands::Check => commands::check::cmd_check(&config).await,
        Commands::Extract {
            file,
            mime,
            json,
            preview,
        } => {
            commands::extract::cmd_extract(
                &config,
                &file,
                mime.as_deref(),
                json,
                preview.as_deref(),
            )
            .await
        }
        Commands::Analyze {
            file,
            text,
            variant,
            rubric,
            params,
            json,
            html,
            tickets,
        } => {
            let options = commands::analyze::AnalyzeOptions {
                as_text: text,
                variant,
                rubric,
                params: params.into_iter().collect(),
                json,
                html,
                tickets,
            };
            commands::analyze::cmd_analyze(config, identity, &file, options).await
        }
        Commands::Tickets { file, json } => {
            commands::tickets::cmd_tickets(&config, identity, &file, json).await
        }
        Commands::Config { json } => commands::config_cmd::cmd_config_show(&config, json),
    }
}
