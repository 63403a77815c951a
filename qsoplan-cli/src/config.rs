//! CLI Configuration
//!
//! Configuration management for the qsoplan command line client.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server connection
    pub server: ServerConfig,

    /// Defaults applied when logging contacts
    pub defaults: DefaultsConfig,

    /// Storage paths
    pub paths: PathConfig,
}

/// Server connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the QSO Plan server
    #[serde(default = "default_server_url")]
    pub url: String,
}

/// Defaults for the log command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Band assumed when logging by channel number
    #[serde(default = "default_band")]
    pub band: String,

    /// Mode used when none is given
    #[serde(default = "default_mode")]
    pub mode: String,
}

/// Storage paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Configuration directory
    pub config_dir: PathBuf,

    /// Data directory (session file)
    pub data_dir: PathBuf,
}

fn default_server_url() -> String {
    qsoplan_client::DEFAULT_SERVER_URL.to_string()
}

fn default_band() -> String {
    "CB".to_string()
}

fn default_mode() -> String {
    "SSB".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            band: default_band(),
            mode: default_mode(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("qsoplan");

        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join("qsoplan");

        Self {
            server: ServerConfig::default(),
            defaults: DefaultsConfig::default(),
            paths: PathConfig {
                config_dir,
                data_dir,
            },
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if not found
    pub fn load() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("qsoplan");

        let config_path = config_dir.join("config.toml");

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            Ok(config)
        } else {
            // Create default config
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        // Ensure config directory exists
        fs::create_dir_all(&self.paths.config_dir)
            .context("Failed to create config directory")?;

        let config_path = self.paths.config_dir.join("config.toml");
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.paths.config_dir)
            .context("Failed to create config directory")?;
        fs::create_dir_all(&self.paths.data_dir)
            .context("Failed to create data directory")?;
        Ok(())
    }

    /// Get the session file path
    pub fn session_path(&self) -> PathBuf {
        self.paths.data_dir.join("session.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.url, "http://localhost:8000");
        assert_eq!(config.defaults.band, "CB");
        assert_eq!(config.defaults.mode, "SSB");
        assert!(config.session_path().ends_with("session.json"));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.server.url, config.server.url);
        assert_eq!(parsed.defaults.band, config.defaults.band);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [server]
            url = "https://qso.example.org"

            [defaults]

            [paths]
            config_dir = "/tmp/qsoplan-config"
            data_dir = "/tmp/qsoplan-data"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.server.url, "https://qso.example.org");
        assert_eq!(parsed.defaults.mode, "SSB");
    }
}
