//! # Escrow Configuration
//!
//! Deployment-time parameters for the state machine, deserialized from
//! YAML. Every field has a default, so an empty document is a valid
//! configuration.
//!
//! ```yaml
//! response_window_secs: 86400
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timeout::{TimeoutPolicy, DEFAULT_RESPONSE_WINDOW_SECS};

/// Errors loading or validating an [`EscrowConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document is not valid YAML for this schema.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A field holds an unusable value.
    #[error("invalid config field {field}: {reason}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// State machine parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EscrowConfig {
    /// Seconds the talent has to accept a brief before the customer may
    /// reclaim the deposit.
    pub response_window_secs: u64,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            response_window_secs: DEFAULT_RESPONSE_WINDOW_SECS,
        }
    }
}

impl EscrowConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document for a struct; treat it as defaults.
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.response_window_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "response_window_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if i64::try_from(self.response_window_secs).is_err() {
            return Err(ConfigError::Invalid {
                field: "response_window_secs",
                reason: format!("{} exceeds i64::MAX", self.response_window_secs),
            });
        }
        Ok(())
    }

    /// The timeout policy these parameters describe.
    pub fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::new(self.response_window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = EscrowConfig::from_yaml_str("").unwrap();
        assert_eq!(config, EscrowConfig::default());
        assert_eq!(config.response_window_secs, 86_400);
    }

    #[test]
    fn parses_window() {
        let config = EscrowConfig::from_yaml_str("response_window_secs: 3600\n").unwrap();
        assert_eq!(config.timeout_policy(), TimeoutPolicy::new(3_600));
    }

    #[test]
    fn rejects_zero_window() {
        let err = EscrowConfig::from_yaml_str("response_window_secs: 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "response_window_secs",
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = EscrowConfig::from_yaml_str("respons_window: 10").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
