//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use fabula::{RoomConfig, ScoringRule, constants};
use std::{net::SocketAddr, path::PathBuf};

const DEFAULT_BIND: ([u8; 4], u16) = ([127, 0, 0, 1], 6969);

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// JSON card catalog; the numbered built-in pool is used when unset
    pub catalog: Option<PathBuf>,
    /// Prometheus scrape address; metrics are off when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Settings every new room starts with
    pub room_defaults: RoomConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `catalog_override` - Optional catalog path override (from CLI args)
    /// * `metrics_override` - Optional metrics address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but can't be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        catalog_override: Option<PathBuf>,
        metrics_override: Option<SocketAddr>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(addr) => addr,
            None => parse_env("SERVER_BIND")?.unwrap_or_else(|| SocketAddr::from(DEFAULT_BIND)),
        };

        let catalog = catalog_override.or_else(|| std::env::var("CARD_CATALOG").ok().map(PathBuf::from));

        let metrics_bind = match metrics_override {
            Some(addr) => Some(addr),
            None => parse_env("METRICS_BIND")?,
        };

        let scoring_rule = match std::env::var("ROOM_SCORING_RULE") {
            Ok(value) => value
                .parse::<ScoringRule>()
                .map_err(|reason| ConfigError::Invalid {
                    var: "ROOM_SCORING_RULE".to_string(),
                    reason,
                })?,
            Err(_) => ScoringRule::default(),
        };

        let room_defaults = RoomConfig {
            hand_size: parse_env_or("ROOM_HAND_SIZE", constants::HAND_SIZE),
            winning_score: parse_env_or("ROOM_WINNING_SCORE", constants::WINNING_SCORE),
            min_players: parse_env_or("ROOM_MIN_PLAYERS", constants::MIN_PLAYERS),
            max_players: parse_env_or("ROOM_MAX_PLAYERS", constants::DEFAULT_MAX_PLAYERS),
            scoring_rule,
            ..RoomConfig::default()
        };

        Ok(ServerConfig {
            bind,
            catalog,
            metrics_bind,
            room_defaults,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(metrics) = self.metrics_bind
            && metrics == self.bind
        {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        if let Some(path) = &self.catalog
            && !path.is_file()
        {
            return Err(ConfigError::Invalid {
                var: "CARD_CATALOG".to_string(),
                reason: format!("{} is not a readable file", path.display()),
            });
        }

        self.room_defaults
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "ROOM_*".to_string(),
                reason,
            })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(DEFAULT_BIND),
            catalog: None,
            metrics_bind: None,
            room_defaults: RoomConfig::default(),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like [`parse_env_or`], but a value that is present and malformed is an error.
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            var: key.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "ROOM_SCORING_RULE".to_string(),
            reason: "unknown scoring rule 'fast'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ROOM_SCORING_RULE"));
        assert!(msg.contains("fast"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_room_defaults() {
        let config = ServerConfig {
            room_defaults: RoomConfig {
                min_players: 5,
                max_players: 4, // Invalid: below min players
                ..RoomConfig::default()
            },
            ..ServerConfig::default()
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_config_validation_metrics_on_server_port() {
        let config = ServerConfig {
            metrics_bind: Some(SocketAddr::from(DEFAULT_BIND)),
            ..ServerConfig::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("METRICS_BIND"));
    }

    #[test]
    fn test_config_validation_missing_catalog() {
        let config = ServerConfig {
            catalog: Some(PathBuf::from("/nonexistent/cards.json")),
            ..ServerConfig::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_win() {
        let bind: SocketAddr = "0.0.0.0:7000".parse().unwrap();
        let config = ServerConfig::from_env(Some(bind), None, None).unwrap();
        assert_eq!(config.bind, bind);
    }
}
