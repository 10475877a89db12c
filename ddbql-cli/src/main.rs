use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use ddbql_core::{ConnectionArgs, ConnectionConfig, Prompt, Session, ShellConfig, StorageAccess};
use ddbql_dynamodb::DynamoStorage;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod console;
mod shell;
mod table;

use console::{ConsoleReporter, OutputFormat};

#[derive(Parser)]
#[command(name = "ddbql")]
#[command(about = "Interactive PartiQL shell for Amazon DynamoDB", version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Output format for query results
    #[arg(short = 'F', long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Log complemented statements and requests
    #[arg(short, long)]
    verbose: bool,

    /// Keep running a script after a failed command
    #[arg(long)]
    no_stop: bool,

    /// Script file to run instead of the interactive prompt
    script: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn connect(config: &ConnectionConfig) -> ddbql_core::Result<Box<dyn StorageAccess>> {
    Ok(Box::new(DynamoStorage::connect(config)?))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ShellConfig::new()
        .with_connection(ConnectionConfig::from(&cli.connection))
        .with_no_stop(cli.no_stop);
    debug!(format = ?cli.format, no_stop = cli.no_stop, "starting ddbql");

    let mut session = Session::new(
        config,
        Box::new(connect),
        Box::new(ConsoleReporter::new(cli.format)),
    )
    .context("Failed to connect")?;

    match cli.script {
        Some(path) => {
            session.load_script(&path)?;
            // the failing command has already been reported
            if session.run(None).is_err() {
                std::process::exit(1);
            }
        }
        None => {
            let mut shell = shell::Shell::new()?;
            println!(
                "{} {}",
                "ddbql".cyan().bold(),
                "- type !? for help, exit to quit".dimmed()
            );
            session.run(Some(&mut shell as &mut dyn Prompt))?;
            shell.save_history()?;
        }
    }

    Ok(())
}
