//! Application configuration.
//!
//! Sources, later overriding earlier:
//! 1. Bundled defaults (`tandem.toml` shipped with the crate)
//! 2. `--config` / `TANDEM_CONFIG` file, or `./tandem.toml` if present
//! 3. `TANDEM__SECTION__KEY` environment variables
//!
//! `OPENAI_API_KEY`, `GEMINI_API_KEY` and `DATABASE_URL` fill in values the
//! sources above leave unset.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tandem_error::{ConfigError, TandemResult};

const DEFAULT_CONFIG: &str = include_str!("../tandem.toml");

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener
    pub server: ServerSettings,
    /// Result database
    #[serde(default)]
    pub database: DatabaseSettings,
    /// Upstream providers
    pub providers: ProvidersSettings,
    /// Relay tuning
    #[serde(default)]
    pub relay: RelaySettings,
    /// Log output
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// The single browser origin allowed by CORS
    pub cors_origin: String,
}

/// Result database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL URL; runs are kept in memory when unset
    #[serde(default)]
    pub url: Option<String>,
    /// Pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Where provider output comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    /// Canned word-by-word streams, no network
    Drip,
    /// Real upstream APIs
    Live,
}

/// Both providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersSettings {
    /// Drip or live
    pub mode: ProviderMode,
    /// OpenAI branch
    #[serde(default)]
    pub openai: ProviderSettings,
    /// Gemini branch
    #[serde(default)]
    pub gemini: ProviderSettings,
}

/// One provider. Unset fields fall back to the provider's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Model identifier
    #[serde(default)]
    pub model: Option<String>,
    /// API base URL
    #[serde(default)]
    pub base_url: Option<String>,
    /// API key (live mode)
    #[serde(default)]
    pub api_key: Option<String>,
    /// USD per 1000 tokens
    #[serde(default)]
    pub price_per_1k: Option<f64>,
    /// Milliseconds between words (drip mode)
    #[serde(default)]
    pub drip_cadence_ms: Option<u64>,
}

/// Relay tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Outbound event buffer per run
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Fail a branch that is silent for this many milliseconds
    #[serde(default)]
    pub branch_idle_timeout_ms: Option<u64>,
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            branch_idle_timeout_ms: None,
        }
    }
}

impl RelaySettings {
    /// Idle timeout as a duration, if enabled.
    pub fn branch_idle_timeout(&self) -> Option<Duration> {
        self.branch_idle_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// Reads `.env` first, so its variables count as environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a source cannot be parsed or the
    /// result is invalid (see [`validate`](Self::validate)).
    pub fn load(path: Option<&Path>) -> TandemResult<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_sources(path, None)?;
        config.apply_fallbacks(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Merge the bundled defaults, an optional file and environment overrides.
    ///
    /// `env` replaces the process environment when given.
    pub fn from_sources(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> TandemResult<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("tandem").required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix("TANDEM")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)).into())
    }

    /// Fill unset keys and URLs from well-known variables.
    pub fn apply_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if self.providers.openai.api_key.is_none() {
            self.providers.openai.api_key = non_empty("OPENAI_API_KEY");
        }
        if self.providers.gemini.api_key.is_none() {
            self.providers.gemini.api_key = non_empty("GEMINI_API_KEY");
        }
        if self.database.url.is_none() {
            self.database.url = non_empty("DATABASE_URL");
        }
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Live mode without an API key for either provider is an error.
    pub fn validate(&self) -> TandemResult<()> {
        if self.providers.mode == ProviderMode::Live {
            let missing: Vec<&str> = [
                ("openai", &self.providers.openai),
                ("gemini", &self.providers.gemini),
            ]
            .into_iter()
            .filter(|(_, p)| p.api_key.as_deref().is_none_or(|k| k.trim().is_empty()))
            .map(|(name, _)| name)
            .collect();
            if !missing.is_empty() {
                return Err(ConfigError::new(format!(
                    "Live mode requires API keys; missing for: {}",
                    missing.join(", ")
                ))
                .into());
            }
        }
        if self.server.cors_origin.trim().is_empty() {
            return Err(ConfigError::new("server.cors_origin must not be empty").into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_bundled_defaults() {
        let config = AppConfig::from_sources(None, Some(HashMap::new())).expect("defaults load");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.cors_origin, "http://localhost:3000");
        assert_eq!(config.providers.mode, ProviderMode::Drip);
        assert_eq!(config.providers.openai.drip_cadence_ms, Some(55));
        assert_eq!(config.providers.gemini.drip_cadence_ms, Some(70));
        assert_eq!(config.relay.channel_capacity, 64);
        assert_eq!(config.relay.branch_idle_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_overrides() {
        let config = AppConfig::from_sources(
            None,
            Some(env(&[
                ("TANDEM__SERVER__PORT", "8080"),
                ("TANDEM__PROVIDERS__MODE", "live"),
                ("TANDEM__RELAY__BRANCH_IDLE_TIMEOUT_MS", "1500"),
            ])),
        )
        .expect("overrides load");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.providers.mode, ProviderMode::Live);
        assert_eq!(
            config.relay.branch_idle_timeout(),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn test_live_mode_requires_keys() {
        let mut config = AppConfig::from_sources(
            None,
            Some(env(&[("TANDEM__PROVIDERS__MODE", "live")])),
        )
        .expect("loads");
        assert!(config.validate().is_err());

        config.apply_fallbacks(|name| match name {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "GEMINI_API_KEY" => Some("gm-test".to_string()),
            _ => None,
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fallbacks_do_not_override() {
        let mut config = AppConfig::from_sources(None, Some(HashMap::new())).expect("loads");
        config.providers.openai.api_key = Some("from-file".to_string());
        config.apply_fallbacks(|_| Some("from-env".to_string()));
        assert_eq!(config.providers.openai.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.database.url.as_deref(), Some("from-env"));
    }
}
