//! Implementor index CLI.
//!
//! Loads generated implementor artifacts the way the documentation UI does,
//! through a registry gateway, and prints what the index would receive. Also
//! converts artifacts between the script and JSON forms.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use impl_index::ArtifactFormat;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "impl-index")]
#[command(about = "Inspect and render generated trait implementor indexes")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load artifacts from one or more documentation roots and summarize,
    /// per trait, the index each trait's consumer receives
    Inspect {
        /// Directories containing `.js` or `.json` artifacts, loaded in order
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        /// Print the delivered registries as JSON, keyed by trait path
        #[arg(long)]
        json: bool,

        /// Merge pending payloads per library instead of keeping only the newest
        #[arg(long)]
        merge_pending: bool,

        /// Gateway config file (JSON); `--merge-pending` takes precedence
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Convert a single artifact between formats
    Render {
        /// Artifact to read
        input: PathBuf,

        /// Where to write the result (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: script or json
        #[arg(short, long, default_value = "script")]
        format: ArtifactFormat,
    },

    /// List the implementations recorded for a fully-qualified type path
    Find {
        /// Directory containing artifacts
        dir: PathBuf,

        /// Type path, e.g. `libA::Foo`
        type_path: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays parseable
    let log_level = if args.debug { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    debug!("Parsed arguments: {:?}", args);

    let mut stdout = std::io::stdout().lock();
    match args.command {
        Command::Inspect {
            dirs,
            json,
            merge_pending,
            config,
        } => {
            let config = commands::gateway_config(config.as_deref(), merge_pending)?;
            commands::inspect(&dirs, json, &config, &mut stdout)
        }
        Command::Render {
            input,
            output,
            format,
        } => commands::render(&input, output.as_deref(), format, &mut stdout),
        Command::Find { dir, type_path } => commands::find(&dir, &type_path, &mut stdout),
    }
}
