mod describe;
mod keymap;
mod runner;
mod state_machine;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use gitpop_core::config::Config;
use gitpop_core::policy::PrefixArg;
use gitpop_core::store::FileStore;
use runner::{Outcome, Runner};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

#[derive(Parser)]
#[command(name = "gitpop", about = "Keyboard-driven argument popups for git")]
struct Cli {
    /// Popup to open
    #[arg(default_value = "dispatch")]
    popup: String,
    /// Prefix argument, as a number of C-u presses
    #[arg(short = 'u', long = "prefix", default_value_t = 0)]
    prefix: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging().context("initialising logging")?;

    info!(popup = %cli.popup, prefix = cli.prefix, "gitpop starting");

    let config = Config::load().context("loading config")?;
    let registry = config.load_registry().context("loading popups")?;
    let store = FileStore::open(config.store_path()).context("opening argument store")?;

    let mut runner = Runner::new(&registry, &config, store);
    match runner.run(&cli.popup, PrefixArg::from_presses(cli.prefix))? {
        Outcome::Quit => Ok(()),
        Outcome::Command { argv, context } => {
            let code = runner::spawn(&argv, &context)?;
            info!(code, "command finished");
            std::process::exit(code);
        }
    }
}

/// The popup owns the terminal, so logs go to a file.
fn init_logging() -> Result<()> {
    let path = log_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("gitpop=info".parse()?))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn log_path() -> PathBuf {
    if let Ok(path) = std::env::var("GITPOP_LOG") {
        return PathBuf::from(path);
    }
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("gitpop")
        .join("gitpop.log")
}
