use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ConfigLoader;

pub mod commands;

use self::commands::{ListArgs, ViewArgs};

#[derive(Parser, Debug)]
#[command(
    name = "notelist",
    version,
    about = "Keyboard-first, grouped note lists in the terminal"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over NOTELIST_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over NOTELIST_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui(ViewArgs),
    /// Print a view's grouped items and exit
    List(ListArgs),
}

enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("NOTELIST_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("NOTELIST_DATA", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Tui(ViewArgs::default()));

    let log_file = loader.paths().log_dir.join("notelist.log");
    let target = match command {
        // the alternate screen owns the terminal, so the TUI logs to a file
        Commands::Tui(_) => LogTarget::File(&log_file),
        Commands::List(_) => LogTarget::Stderr,
    };
    init_tracing(&cli.log_level, target)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;

    let mut config = loader.load_or_init()?;
    match command {
        Commands::Tui(args) => {
            if let Some(view) = args.view {
                config.default_view = view;
            }
            commands::run_tui(Arc::new(config), &args)
        }
        Commands::List(args) => commands::list_view(Arc::new(config), &args),
    }
}

fn init_tracing(level: &str, target: LogTarget<'_>) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match target {
            LogTarget::Stderr => fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init(),
            LogTarget::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
        }
        Ok::<(), anyhow::Error>(())
    })
    .map(|_| ())
}
