//! `datapath` command line
//!
//! Indexes JSON data files and answers completion, hover, definition and consistency
//! queries for template directives such as `{{%= Hero.title %}}`. Every command prints one
//! JSON response on stdout; logs go to stderr.

mod command;
mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use command::{
    CommandContext, CommandHandler, CommandRequest, CommandResponse, CursorPayload,
    DEFAULT_LIMIT,
};
use config::LoadedConfig;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "datapath", version, about = "Navigate JSON data from template directives")]
struct Cli {
    /// Config file (defaults to ./datapath.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Extra data files, indexed after the configured ones
    #[arg(long = "data", global = true)]
    data: Vec<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Pretty-print the JSON response
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the path index and print statistics
    Index {
        /// Include every indexed path in the output
        #[arg(long)]
        paths: bool,
    },
    /// Completion candidates for the directive being typed
    Complete(CursorArgs),
    /// Value and declaration site of the directive path under the cursor
    Hover(CursorArgs),
    /// Declaration site of the directive path under the cursor
    Definition(CursorArgs),
    /// Report directives whose paths are missing from the index (exit code 1 if any)
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Fuzzy search over indexed paths
    Find {
        query: String,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
}

#[derive(Args)]
struct CursorArgs {
    /// Template file
    file: PathBuf,
    /// 0-based line
    #[arg(long)]
    line: usize,
    /// 0-based character column
    #[arg(long)]
    column: usize,
}

impl From<CursorArgs> for CursorPayload {
    fn from(args: CursorArgs) -> Self {
        Self {
            file: args.file,
            line: args.line,
            column: args.column,
        }
    }
}

impl From<Command> for CommandRequest {
    fn from(command: Command) -> Self {
        match command {
            Command::Index { paths } => Self::Index {
                include_paths: paths,
            },
            Command::Complete(args) => Self::Complete(args.into()),
            Command::Hover(args) => Self::Hover(args.into()),
            Command::Definition(args) => Self::Definition(args.into()),
            Command::Check { files } => Self::Check { files },
            Command::Find { query, limit } => Self::Find { query, limit },
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();
}

async fn run(cli: Cli) -> Result<CommandResponse> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let loaded = LoadedConfig::load(cli.config.as_deref(), &cwd)?;
    let data_files = loaded.data_paths(&cwd, &cli.data)?;
    log::debug!("Indexing {} data files", data_files.len());

    let handler = CommandHandler::new(CommandContext::new(loaded, cwd, data_files));
    handler.execute(cli.command.into()).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let pretty = cli.pretty;

    let response = match run(cli).await {
        Ok(response) => response,
        Err(err) => {
            log::error!("{err:#}");
            CommandResponse::error(format!("{err:#}"))
        }
    };

    let rendered = if pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    };
    match rendered {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to serialize response: {err}");
            return ExitCode::from(2);
        }
    }
    ExitCode::from(response.exit_code)
}
