//! CLI argument definitions for the Sleuth binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::{Path, PathBuf};

use sleuth_core::config::SleuthConfig;
use sleuth_core::error::SleuthError;

/// Where the effective configuration came from. Logged once tracing is up,
/// since the subscriber's level depends on the loaded config.
#[derive(Debug)]
pub enum ConfigSource {
    File,
    /// No file at the resolved path.
    Defaults,
    /// The file exists but could not be read or parsed.
    Invalid(SleuthError),
}

/// Sleuth: ask questions about a username in plain language.
#[derive(Parser, Debug)]
#[command(name = "sleuth", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Base URL of the account discovery service.
    #[arg(long = "discovery-url")]
    pub discovery_url: Option<String>,

    /// Chat in the terminal instead of starting the HTTP server.
    #[arg(short = 'i', long = "interactive")]
    pub interactive: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SLEUTH_CONFIG env var > ~/.sleuth/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SLEUTH_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > SLEUTH_PORT env var > config file value > 3030.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("SLEUTH_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        3030
    }

    /// Load the config file at `path` and apply the command-line overrides.
    pub fn load_config(&self, path: &Path) -> (SleuthConfig, ConfigSource) {
        let (mut config, source) = if !path.exists() {
            (SleuthConfig::default(), ConfigSource::Defaults)
        } else {
            match SleuthConfig::load(path) {
                Ok(config) => (config, ConfigSource::File),
                Err(e) => (SleuthConfig::default(), ConfigSource::Invalid(e)),
            }
        };
        self.apply(&mut config);
        (config, source)
    }

    /// Fold the command-line overrides into a loaded configuration.
    pub fn apply(&self, config: &mut SleuthConfig) {
        config.server.port = self.resolve_port(config.server.port);
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ref url) = self.discovery_url {
            config.discovery.base_url = url.clone();
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".sleuth").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".sleuth").join("config.toml");
    }
    PathBuf::from("config.toml")
}
