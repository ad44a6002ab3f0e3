//! CLI argument definitions for the SmartOps server.
//!
//! Uses `clap` with derive macros for argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

const CONFIG_ENV: &str = "SMARTOPS_CONFIG";
const PORT_ENV: &str = "SMARTOPS_PORT";
const DEFAULT_PORT: u16 = 8000;

/// SmartOps: natural-language operations with human approval.
#[derive(Parser, Debug)]
#[command(name = "smartops", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Data directory for the SQLite operation log.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SMARTOPS_CONFIG env var > ~/.smartops/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.config_path_from(std::env::var(CONFIG_ENV).ok())
    }

    fn config_path_from(&self, env: Option<String>) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        match env {
            Some(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => default_config_path(),
        }
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > SMARTOPS_PORT env var > config file value > 8000.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        self.port_from(std::env::var(PORT_ENV).ok(), config_port)
    }

    fn port_from(&self, env: Option<String>, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Some(p) = env.and_then(|val| val.trim().parse::<u16>().ok()) {
            return p;
        }
        if config_port != 0 {
            return config_port;
        }
        DEFAULT_PORT
    }

    /// Resolve the data directory path.
    ///
    /// Returns `None` if not overridden (use the config value).
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log level.
    ///
    /// Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Default config file path: `~/.smartops/config.toml`.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".smartops").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.ok().map(PathBuf::from)
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path
        .strip_prefix("~/")
        .or_else(|| path.strip_prefix("~\\"))
    {
        Some(rest) => home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("smartops").chain(argv.iter().copied()))
    }

    #[test]
    fn test_port_priority() {
        let cli = args(&["--port", "9000"]);
        assert_eq!(cli.port_from(Some("9100".into()), 9200), 9000);

        let cli = args(&[]);
        assert_eq!(cli.port_from(Some("9100".into()), 9200), 9100);
        assert_eq!(cli.port_from(Some("not-a-port".into()), 9200), 9200);
        assert_eq!(cli.port_from(None, 9200), 9200);
        assert_eq!(cli.port_from(None, 0), DEFAULT_PORT);
    }

    #[test]
    fn test_config_path_priority() {
        let cli = args(&["-c", "/etc/smartops.toml"]);
        assert_eq!(
            cli.config_path_from(Some("/tmp/other.toml".into())),
            PathBuf::from("/etc/smartops.toml")
        );

        let cli = args(&[]);
        assert_eq!(
            cli.config_path_from(Some("/tmp/other.toml".into())),
            PathBuf::from("/tmp/other.toml")
        );
        assert!(cli
            .config_path_from(None)
            .ends_with(PathBuf::from(".smartops").join("config.toml")));
    }

    #[test]
    fn test_overrides() {
        let cli = args(&["--data-dir", "/var/lib/smartops", "--log-level", "debug"]);
        assert_eq!(cli.resolve_data_dir().as_deref(), Some("/var/lib/smartops"));
        assert_eq!(cli.resolve_log_level().as_deref(), Some("debug"));

        let cli = args(&[]);
        assert!(cli.resolve_data_dir().is_none());
        assert!(cli.resolve_log_level().is_none());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_home("relative"), PathBuf::from("relative"));
        assert!(expand_home("~/.smartops/data").ends_with(".smartops/data"));
    }
}
