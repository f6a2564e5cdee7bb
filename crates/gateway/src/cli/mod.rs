pub mod config;

use clap::{Parser, Subcommand};

/// Nomi: a multiplayer chatroom with an AI participant.
#[derive(Debug, Parser)]
#[command(name = "nomi", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the chat gateway (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `NOMI_CONFIG` (or
/// `config.toml` by default).  A missing file yields the defaults.
/// Returns the parsed [`Config`](nomi_domain::config::Config) and the path
/// that was used.
pub fn load_config() -> anyhow::Result<(nomi_domain::config::Config, String)> {
    let config_path = std::env::var("NOMI_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

pub fn load_config_from(config_path: &str) -> anyhow::Result<nomi_domain::config::Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(nomi_domain::config::Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = load_config_from("/nonexistent/nomi-config.toml").unwrap();
        assert_eq!(cfg.server.port, 3001);
        assert_eq!(cfg.room.ai_name, "Nomi");
    }

    #[test]
    fn bare_invocation_has_no_subcommand() {
        let cli = Cli::try_parse_from(["nomi"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_config_validate() {
        let cli = Cli::try_parse_from(["nomi", "config", "validate"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config(ConfigCommand::Validate))
        ));
    }
}
