//! Command-line interface for the `diana` binary.

use clap::{Parser, Subcommand};

use diana_domain::config::Config;

/// Diana — a medical-triage chat bot gateway.
#[derive(Debug, Parser)]
#[command(name = "diana", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any issues.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Load the config named by `DIANA_CONFIG` (default `config.toml`).
/// A missing file yields the built-in defaults.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("DIANA_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        Config::default()
    };

    Ok((config, config_path))
}

/// Parse and validate the config, printing any warnings.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let warnings = config.validate();

    if warnings.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    for warning in &warnings {
        println!("{warning}");
    }
    println!("\n{} warning(s) in {config_path}", warnings.len());

    false
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) {
    match toml::to_string_pretty(config) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Failed to serialize config: {e}");
            std::process::exit(1);
        }
    }
}
