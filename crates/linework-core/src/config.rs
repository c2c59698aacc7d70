//! Network tuning parameters, loadable from TOML or RON.
//!
//! Every field has a default, so a config file only needs to name the
//! values it changes. The format is picked from the file extension.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::geometry::{DEFAULT_DIAGONAL_MULTIPLIER, MAX_DIAGONAL_MULTIPLIER, MIN_DIAGONAL_MULTIPLIER};

/// Errors that can occur while loading a [`NetworkConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported config format: {file}")]
    UnsupportedFormat { file: PathBuf },

    #[error("parse error: {detail}")]
    Parse { detail: String },

    #[error("invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Length of a diagonal tile in 1/512 of a straight tile.
    pub diagonal_multiplier: u16,
    /// Board updates a cached departure list stays valid for.
    pub departure_refresh: i32,
    /// Rows kept per direction on a departure board.
    pub max_departure_listings: usize,
    pub ticks_per_month: u64,
    /// Dwell time at a stop before departing.
    pub loading_ticks: u32,
    /// Capacity of the network's event log.
    pub event_capacity: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            diagonal_multiplier: DEFAULT_DIAGONAL_MULTIPLIER,
            departure_refresh: 5,
            max_departure_listings: 12,
            ticks_per_month: 8192,
            loading_ticks: 256,
            event_capacity: 256,
        }
    }
}

impl NetworkConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: NetworkConfig = toml::from_str(s).map_err(|e| ConfigError::Parse {
            detail: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: NetworkConfig = ron::from_str(s).map_err(|e| ConfigError::Parse {
            detail: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read a config file, choosing the parser by extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str());
        if !matches!(ext, Some("toml") | Some("ron")) {
            return Err(ConfigError::UnsupportedFormat {
                file: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let cfg = match ext {
            Some("toml") => Self::from_toml_str(&content)?,
            _ => Self::from_ron_str(&content)?,
        };
        tracing::debug!(path = %path.display(), ?cfg, "loaded network config");
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_DIAGONAL_MULTIPLIER..=MAX_DIAGONAL_MULTIPLIER).contains(&self.diagonal_multiplier) {
            return Err(ConfigError::Invalid {
                field: "diagonal_multiplier",
                reason: format!(
                    "{} is outside {MIN_DIAGONAL_MULTIPLIER}..={MAX_DIAGONAL_MULTIPLIER}",
                    self.diagonal_multiplier
                ),
            });
        }
        if self.ticks_per_month == 0 {
            return Err(ConfigError::Invalid {
                field: "ticks_per_month",
                reason: "must be non-zero".into(),
            });
        }
        if self.max_departure_listings == 0 {
            return Err(ConfigError::Invalid {
                field: "max_departure_listings",
                reason: "must be non-zero".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = NetworkConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, NetworkConfig::default());
    }

    #[test]
    fn toml_overrides_named_fields() {
        let cfg = NetworkConfig::from_toml_str("diagonal_multiplier = 600\nloading_ticks = 10\n").unwrap();
        assert_eq!(cfg.diagonal_multiplier, 600);
        assert_eq!(cfg.loading_ticks, 10);
        assert_eq!(cfg.departure_refresh, 5);
    }

    #[test]
    fn ron_parses() {
        let cfg = NetworkConfig::from_ron_str("(ticks_per_month: 100, max_departure_listings: 3)").unwrap();
        assert_eq!(cfg.ticks_per_month, 100);
        assert_eq!(cfg.max_departure_listings, 3);
    }

    #[test]
    fn out_of_range_multiplier_rejected() {
        let err = NetworkConfig::from_toml_str("diagonal_multiplier = 400").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "diagonal_multiplier", .. }));
    }

    #[test]
    fn zero_month_rejected() {
        let err = NetworkConfig::from_toml_str("ticks_per_month = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "ticks_per_month", .. }));
    }

    #[test]
    fn unknown_extension_rejected() {
        let err = NetworkConfig::load(Path::new("network.json")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = NetworkConfig::from_toml_str("diagonal_multiplier = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
