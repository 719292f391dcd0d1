//! Subcommand definitions and their execution against a [`ConfigManager`].
//!
//! Every command writes its result to the `out` writer it is given, which is
//! stdout in production and a buffer in tests.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, bail};
use clap::builder::PossibleValuesParser;
use clap::Subcommand;

use padmiss_core::domain::settings::{apply_setting, get_setting, SETTING_KEYS};
use padmiss_core::{ConfigManager, Configuration, DeviceConfig, DeviceKind, ScannerConfig};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the resolved config file path.
    Path,
    /// Print the configuration, creating the defaults on first run.
    Show,
    /// Create the config directory and default document if missing.
    Init,
    /// Validate the existing file without creating anything.
    Check,
    /// Print one setting.
    Get {
        #[arg(value_parser = PossibleValuesParser::new(SETTING_KEYS))]
        key: String,
    },
    /// Change one setting and save.
    Set {
        #[arg(value_parser = PossibleValuesParser::new(SETTING_KEYS))]
        key: String,
        value: String,
    },
    /// List, add or remove score-input devices.
    #[command(subcommand)]
    Device(DeviceCommand),
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// List configured devices with their index.
    List,
    /// Add a USB scanner.
    AddScanner {
        /// Device path or identifier.
        #[arg(long)]
        path: String,
        /// USB vendor ID (hex).
        #[arg(long)]
        id_vendor: String,
        /// USB product ID (hex).
        #[arg(long)]
        id_product: String,
        /// Hub port, to tell identical scanners apart.
        #[arg(long)]
        port_number: Option<u32>,
        /// USB bus number.
        #[arg(long)]
        bus: Option<u32>,
    },
    /// Add a device fed from a named pipe.
    AddFifo {
        /// Device path or identifier.
        #[arg(long)]
        path: String,
        /// Named pipe to read scores from.
        #[arg(long)]
        fifo_path: PathBuf,
    },
    /// Remove the device at INDEX (see `device list`).
    Remove { index: usize },
}

/// Executes `command`.
///
/// # Errors
///
/// Propagates load/save failures from the manager and rejects invalid edits.
pub fn run(manager: &ConfigManager, command: Command, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::Path => writeln!(out, "{}", manager.config_path().display())?,
        Command::Show => {
            let config = manager.load_config()?;
            out.write_all(config.to_pretty_json()?.as_bytes())?;
        }
        Command::Init => {
            let existed = manager.has_valid_config();
            if manager.is_explicit_path() && !existed {
                manager.save_config(&manager.default_config())?;
            }
            manager.load_config()?;
            let status = if existed { "already present" } else { "created" };
            writeln!(out, "{status}: {}", manager.config_path().display())?;
        }
        Command::Check => {
            let config = manager.read_config()?;
            writeln!(
                out,
                "ok: {} ({} device(s))",
                manager.config_path().display(),
                config.devices.len()
            )?;
        }
        Command::Get { key } => {
            let config = manager.load_config()?;
            let value = get_setting(&config, &key).map_err(|v| anyhow!("{v}"))?;
            writeln!(out, "{value}")?;
        }
        Command::Set { key, value } => {
            let mut config = manager.load_config()?;
            apply_setting(&mut config, &key, &value).map_err(|v| anyhow!("{v}"))?;
            manager.save_config(&config)?;
            let saved = get_setting(&config, &key).map_err(|v| anyhow!("{v}"))?;
            writeln!(out, "{key} = {saved}")?;
        }
        Command::Device(command) => run_device(manager, command, out)?,
    }
    Ok(())
}

fn run_device(
    manager: &ConfigManager,
    command: DeviceCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut config = manager.load_config()?;

    let report = match command {
        DeviceCommand::List => {
            for (index, device) in config.devices.iter().enumerate() {
                writeln!(out, "{index}: {}", describe(device))?;
            }
            return Ok(());
        }
        DeviceCommand::AddScanner {
            path,
            id_vendor,
            id_product,
            port_number,
            bus,
        } => {
            let scanner = ScannerConfig {
                id_vendor,
                id_product,
                port_number,
                bus,
            };
            push_device(&mut config, DeviceConfig::scanner(path, scanner))
        }
        DeviceCommand::AddFifo { path, fifo_path } => {
            push_device(&mut config, DeviceConfig::fifo(path, fifo_path))
        }
        DeviceCommand::Remove { index } => {
            if index >= config.devices.len() {
                bail!(
                    "no device at index {index} ({} configured)",
                    config.devices.len()
                );
            }
            let removed = config.devices.remove(index);
            format!("removed {index}: {}", describe(&removed))
        }
    };

    // Only report the change once it is on disk.
    manager.save_config(&config)?;
    writeln!(out, "{report}")?;
    Ok(())
}

/// Appends `device` and returns the line announcing it.
fn push_device(config: &mut Configuration, device: DeviceConfig) -> String {
    let report = format!("added {}: {}", config.devices.len(), describe(&device));
    config.devices.push(device);
    report
}

fn describe(device: &DeviceConfig) -> String {
    let detail = match (device.kind(), &device.config, &device.fifo_config) {
        (DeviceKind::Scanner, Some(scanner), _) => {
            let mut text = format!("usb {}:{}", scanner.id_vendor, scanner.id_product);
            if let Some(bus) = scanner.bus {
                text.push_str(&format!(" bus {bus}"));
            }
            if let Some(port) = scanner.port_number {
                text.push_str(&format!(" port {port}"));
            }
            text
        }
        (DeviceKind::Fifo, _, Some(fifo)) => format!("pipe {}", fifo.path.display()),
        _ => device
            .inconsistency()
            .unwrap_or_else(|| "no settings".to_string()),
    };
    format!("{} [{}] {detail}", device.path, device.device_type)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
