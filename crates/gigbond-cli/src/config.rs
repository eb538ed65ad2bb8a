//! # CLI Configuration
//!
//! Optional YAML file passed with `--config`. Every field has a default,
//! so an absent file and an empty file behave the same.
//!
//! ```yaml
//! state_file: .gigbond/state.json
//! custodian: escrow-custodian
//! escrow:
//!   response_window_secs: 86400
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use gigbond_core::AccountId;
use gigbond_escrow::EscrowConfig;

/// Default location of the session state file.
pub const DEFAULT_STATE_FILE: &str = ".gigbond/state.json";

/// Default custodian account holding escrowed value.
pub const DEFAULT_CUSTODIAN: &str = "escrow-custodian";

/// Settings for a CLI session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Where the ledger and contract state are persisted.
    pub state_file: PathBuf,
    /// The simulated host's custody account.
    pub custodian: String,
    /// Contract parameters.
    pub escrow: EscrowConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            custodian: DEFAULT_CUSTODIAN.to_string(),
            escrow: EscrowConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("invalid config file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.escrow.validate()?;
        config.custodian_account()?;
        Ok(config)
    }

    /// The custodian as a validated account identifier.
    pub fn custodian_account(&self) -> Result<AccountId> {
        AccountId::new(self.custodian.as_str())
            .with_context(|| format!("invalid custodian account: {:?}", self.custodian))
    }
}
