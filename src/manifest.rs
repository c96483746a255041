//! Declared rules
//!
//! A YAML document mapping local addresses to rule configurations:
//!
//! ```yaml
//! rules:
//!   phone_numbers:
//!     workspace_id: 0f3c...
//!     rule_type: CUSTOM
//!     name: phone_numbers
//!     secrecy_level_id: 1a2b...
//!     method: REGULAR
//! ```

use crate::dataarts::RuleConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

impl Manifest {
    /// Load and validate a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid rules file {}", path.display()))
    }

    /// Parse and validate manifest text
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_yaml::from_str(content).context("Failed to parse YAML")?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        for (address, rule) in &self.rules {
            if !valid_address(address) {
                bail!("invalid rule address {:?}: use letters, digits, '_' and '-'", address);
            }
            rule.validate()
                .with_context(|| format!("rule {}", address))?;
        }
        Ok(())
    }
}

/// Addresses are used as state keys and on the command line
pub(crate) fn valid_address(address: &str) -> bool {
    !address.is_empty()
        && address
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
