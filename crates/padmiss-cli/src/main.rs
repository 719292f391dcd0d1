//! `padmiss-config`: inspect and edit the Padmiss configuration file.
//!
//! # Usage
//!
//! ```text
//! padmiss-config [OPTIONS] <COMMAND>
//!
//! Commands:
//!   path    Print the resolved config file path
//!   show    Print the configuration, creating the defaults on first run
//!   init    Create the config directory and default document if missing
//!   check   Validate the existing file without creating anything
//!   get     Print one setting
//!   set     Change one setting and save
//!   device  List, add or remove score-input devices
//!
//! Options:
//!   --config <FILE>     Use this config file [env: PADMISS_CONFIG]
//!   --config-dir <DIR>  Use this Padmiss base directory [env: PADMISS_CONFIG_DIR]
//! ```
//!
//! Logs go to stderr; the level is controlled by `RUST_LOG` and defaults to
//! `warn` so that command output on stdout stays machine-readable.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use padmiss_core::ConfigManager;

mod commands;

use commands::Command;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Inspect and edit the Padmiss configuration file.
#[derive(Debug, Parser)]
#[command(name = "padmiss-config", version)]
struct Cli {
    /// Config file to use instead of the per-user default.
    ///
    /// Nothing is bootstrapped for an explicit file: loading fails if it does
    /// not exist (except for `init`, which writes the defaults there).
    #[arg(long, global = true, env = "PADMISS_CONFIG", conflicts_with = "config_dir")]
    config: Option<PathBuf>,

    /// Padmiss base directory to use instead of `~/.padmiss` (`%APPDATA%\Padmiss`
    /// on Windows).  `config.json` and `backups/` live inside it.
    #[arg(long, global = true, env = "PADMISS_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Builds the [`ConfigManager`] selected by `--config` / `--config-dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither option is given and the platform base
    /// directory cannot be determined.
    fn manager(&self) -> anyhow::Result<ConfigManager> {
        let manager = match (&self.config, &self.config_dir) {
            (Some(file), _) => ConfigManager::with_config_file(file),
            (None, Some(dir)) => ConfigManager::with_base_dir(dir),
            (None, None) => {
                ConfigManager::new(None).context("cannot locate the Padmiss config directory")?
            }
        };
        Ok(manager)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let manager = cli.manager()?;

    let path = manager.config_path();
    manager.on_change(move || info!("configuration written to {}", path.display()));

    let stdout = std::io::stdout();
    commands::run(&manager, cli.command, &mut stdout.lock())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
