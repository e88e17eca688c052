mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    Text,
    Json,
    /// Tabular export; commands without a table fall back to text
    Csv,
}

/// Study configuration migration and comparison.
#[derive(Parser)]
#[command(
    name = "studyconf",
    version,
    about = "Study configuration migration and comparison"
)]
struct Cli {
    /// Output format (text, json or csv) [default: text]
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Configuration file (default: ./studyconf.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `studyconf_engine=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate a document to the current configuration version
    Migrate {
        /// Path to the study configuration JSON document
        document: PathBuf,
        /// Write the migrated document to this path
        #[arg(long)]
        write: Option<PathBuf>,
    },

    /// Compare two documents at the same configuration version
    Diff {
        /// The document the differences lead to
        target: PathBuf,
        /// The baseline document
        source: PathBuf,
        /// List differences without attributing them to renames and deletions
        #[arg(long)]
        raw: bool,
    },

    /// Revive a document and report its size and version
    Check {
        /// Path to the study configuration JSON document
        document: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            let output = cli.output.unwrap_or(OutputFormat::Text);
            report_error(&e, output, cli.quiet);
            process::exit(2);
        }
    };
    init_logging(cli.log_level.as_deref(), &config);
    let output = cli
        .output
        .or(config.output.format)
        .unwrap_or(OutputFormat::Text);

    match cli.command {
        Commands::Migrate { document, write } => {
            commands::migrate::cmd_migrate(&document, write.as_deref(), output, cli.quiet);
        }
        Commands::Diff {
            target,
            source,
            raw,
        } => {
            commands::diff::cmd_diff(&target, &source, raw, &config, output, cli.quiet);
        }
        Commands::Check { document } => {
            commands::check::cmd_check(&document, output, cli.quiet);
        }
    }
}

/// Logs go to stderr. The filter comes from `--log-level`, then the config
/// file, then `RUST_LOG`, and defaults to `warn`.
fn init_logging(flag: Option<&str>, config: &Config) {
    let filter = match flag.or(config.log.level.as_deref()) {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text | OutputFormat::Csv => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
