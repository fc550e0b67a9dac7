use anyhow::{Context, Result, anyhow};
use clap::Parser;
use foldersort::cli::{App, OrganizeCommand, run_command};
use foldersort::config::Config;
use foldersort::output::OutputFormatter;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Sort the files of a folder into Images, Videos, Music, Documents,
/// Programs, Archives and Other, with a log and undo.
#[derive(Debug, Parser)]
#[command(name = "foldersort", version, about)]
struct Args {
    /// Folder to organize. Defaults to the folder chosen last time.
    folder: Option<PathBuf>,

    /// Undo the last sort of the folder and exit.
    #[arg(long)]
    undo: bool,

    /// Configuration file. Defaults to ~/.config/foldersort/config.toml.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print diagnostic logs to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::load(args.config.as_deref()).context("Error loading configuration")?;

    if args.undo {
        let folder = args
            .folder
            .or_else(|| config.folder.clone())
            .ok_or_else(|| anyhow!("--undo needs a folder"))?;
        run_command(OrganizeCommand::Undo, &folder, args.config.as_deref())?;
        return Ok(());
    }

    let config_path = args.config.clone().or_else(Config::default_path);
    let mut app = App::new(config, config_path)?;

    match args.folder {
        // An explicit folder must be valid.
        Some(folder) => app.select_folder(&folder)?,
        None => {
            if let Some(folder) = app.remembered_folder().map(PathBuf::from)
                && let Err(e) = app.select_folder(&folder)
            {
                OutputFormatter::warning(&format!(
                    "The saved folder can no longer be used ({}). Choose a new one.",
                    e
                ));
            }
        }
    }

    app.run_menu(io::stdin().lock())
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::prelude::*;

    let default_filter = if verbose { "foldersort=debug" } else { "foldersort=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}
