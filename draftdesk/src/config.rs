//! Command-line flags and the on-disk config file.
//!
//! Precedence, highest first: CLI flag, environment variable (via clap's `env`),
//! `config.toml`, built-in default. Config errors are soft: a missing or broken
//! file is logged and the defaults apply.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_THEME: &str = "catppuccin-mocha";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Parser)]
#[command(name = "draftdesk", version, about = "Annotate and regenerate AI-drafted posts")]
pub struct Cli {
    /// Base URL of the generation service proxy
    #[arg(long, env = "DRAFTDESK_API_URL")]
    pub api_url: Option<String>,

    /// Prefill the username field of the request form
    #[arg(long)]
    pub username: Option<String>,

    /// Color theme (`dark` or `catppuccin-mocha`)
    #[arg(long)]
    pub theme: Option<String>,

    /// Path to config.toml
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for draftdesk.log
    #[arg(long, env = "DRAFTDESK_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub theme: Option<String>,
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub username: Option<String>,
    pub history_db: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

/// Effective settings after merging flags, file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub theme: String,
    pub api_url: String,
    pub timeout: Duration,
    pub username: String,
    pub history_db: PathBuf,
    pub log_dir: PathBuf,
}

impl Settings {
    pub fn merge(cli: Cli, file: FileConfig) -> Self {
        let state = state_dir();
        Self {
            theme: cli
                .theme
                .or(file.theme)
                .unwrap_or_else(|| DEFAULT_THEME.to_owned()),
            api_url: cli
                .api_url
                .or(file.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
            timeout: Duration::from_secs(
                cli.timeout_secs
                    .or(file.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS)
                    .max(1),
            ),
            username: cli.username.or(file.username).unwrap_or_default(),
            history_db: file
                .history_db
                .unwrap_or_else(|| state.join("history.db")),
            log_dir: cli.log_dir.or(file.log_dir).unwrap_or(state),
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// `$XDG_CONFIG_HOME/draftdesk/config.toml`, falling back to
/// `~/.config/draftdesk/config.toml`.
pub fn config_path() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("draftdesk").join("config.toml")
}

/// `$XDG_STATE_HOME/draftdesk`, falling back to `~/.local/state/draftdesk`.
pub fn state_dir() -> PathBuf {
    let base = std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|h| h.join(".local").join("state")))
        .unwrap_or_else(|| PathBuf::from(".draftdesk"));
    base.join("draftdesk")
}

/// Outcome of reading the config file. Kept separate from logging because the
/// file is read before the subscriber exists.
#[derive(Debug)]
pub enum Loaded {
    Parsed(FileConfig),
    Missing,
    Invalid(String),
}

pub fn load_file(path: &Path) -> Loaded {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Loaded::Missing,
    };
    parse(&raw)
}

fn parse(raw: &str) -> Loaded {
    match toml::from_str::<FileConfig>(raw) {
        Ok(config) => Loaded::Parsed(config),
        Err(err) => Loaded::Invalid(err.to_string()),
    }
}

impl Loaded {
    pub fn into_config(self) -> FileConfig {
        match self {
            Loaded::Parsed(config) => config,
            Loaded::Missing | Loaded::Invalid(_) => FileConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("draftdesk").chain(args.iter().copied()))
    }

    #[test]
    fn partial_file_parses() {
        let Loaded::Parsed(config) = parse("theme = \"dark\"\ntimeout_secs = 60\n") else {
            panic!("expected a parsed config");
        };
        assert_eq!(config.theme.as_deref(), Some("dark"));
        assert_eq!(config.timeout_secs, Some(60));
        assert!(config.api_url.is_none());
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let loaded = parse("theme = [");
        assert!(matches!(loaded, Loaded::Invalid(_)));
        assert_eq!(loaded.into_config(), FileConfig::default());
    }

    #[test]
    fn flags_win_over_file() {
        let file = FileConfig {
            theme: Some("dark".into()),
            api_url: Some("http://file:1".into()),
            username: Some("from_file".into()),
            ..Default::default()
        };
        let settings = Settings::merge(cli(&["--api-url", "http://flag:2", "--timeout-secs", "0"]), file);
        assert_eq!(settings.api_url, "http://flag:2");
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.username, "from_file");
        assert_eq!(settings.timeout, Duration::from_secs(1));
    }

    #[test]
    fn defaults_apply_without_flags_or_file() {
        let settings = Settings::merge(cli(&[]), FileConfig::default());
        assert_eq!(settings.theme, DEFAULT_THEME);
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(settings.history_db.ends_with("history.db"));
    }
}
