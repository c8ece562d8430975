//! Configuration file parser for ~/.config/update-feed/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::model::ChannelStatus;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid channel in config file: {0:?}")]
    InvalidChannel(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Settings for resolving the installed product's update information.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Product code to look up in the feed (e.g. "IU").
    pub product_code: Option<String>,

    /// Display name used when synthesizing a feed from a GitHub release.
    pub product_name: Option<String>,

    /// Selected update channel: "eap", "milestone", "beta" or "release".
    pub channel: String,

    /// Repository web URL used for GitHub release links.
    pub repository_url: Option<String>,

    /// Default feed location (file path or http(s) URL).
    pub feed_url: Option<String>,

    /// Largest feed document accepted over HTTP, in megabytes.
    pub max_feed_size_mb: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            product_code: None,
            product_name: None,
            channel: ChannelStatus::Release.code().to_string(),
            repository_url: None,
            feed_url: None,
            max_feed_size_mb: 10,
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "product_code",
        "product_name",
        "channel",
        "repository_url",
        "feed_url",
        "max_feed_size_mb",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown channel → `Err(ConfigError::InvalidChannel)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.channel_status()?;
        tracing::info!(
            path = %path.display(),
            channel = %config.channel,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// The configured channel as a [`ChannelStatus`].
    pub fn channel_status(&self) -> Result<ChannelStatus, ConfigError> {
        self.channel
            .parse()
            .map_err(|_| ConfigError::InvalidChannel(self.channel.clone()))
    }

    pub fn max_feed_size_bytes(&self) -> usize {
        usize::try_from(self.max_feed_size_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_config(name: &str, content: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("update_feed_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.product_code.is_none());
        assert_eq!(config.channel, "release");
        assert_eq!(config.channel_status().unwrap(), ChannelStatus::Release);
        assert_eq!(config.max_feed_size_mb, 10);
        assert_eq!(config.max_feed_size_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/update_feed_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.channel, "release");
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let (dir, path) = write_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.channel, "release");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let (dir, path) = write_config(
            "full",
            r#"
product_code = "IU"
product_name = "IntelliJ IDEA Ultimate"
channel = "eap"
repository_url = "https://github.com/example/idea"
feed_url = "https://example.com/updates.xml"
max_feed_size_mb = 2
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.product_code.as_deref(), Some("IU"));
        assert_eq!(config.product_name.as_deref(), Some("IntelliJ IDEA Ultimate"));
        assert_eq!(config.channel_status().unwrap(), ChannelStatus::Eap);
        assert_eq!(
            config.repository_url.as_deref(),
            Some("https://github.com/example/idea")
        );
        assert_eq!(
            config.feed_url.as_deref(),
            Some("https://example.com/updates.xml")
        );
        assert_eq!(config.max_feed_size_bytes(), 2 * 1024 * 1024);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (dir, path) = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_channel_rejected() {
        let (dir, path) = write_config("bad_channel", "channel = \"nightly\"\n");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidChannel(ref c) if c == "nightly"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let (dir, path) = write_config("unknown", "product_code = \"IC\"\ntotally_fake_key = 1\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.product_code.as_deref(), Some("IC"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let (dir, path) = write_config("wrongtype", "max_feed_size_mb = \"big\"\n");
        assert!(Config::load(&path).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    // SEC-014: File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
