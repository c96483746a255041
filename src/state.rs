//! State Management
//!
//! Tracked rule state, persisted as JSON between runs.

use crate::dataarts::RuleState;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const STATE_VERSION: u32 = 1;

/// Default state file name, relative to the working directory
pub const DEFAULT_STATE_FILE: &str = "dataarts-rule.state.json";

/// On-disk state document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateFile {
    pub version: u32,
    #[serde(default)]
    pub resources: BTreeMap<String, RuleState>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: BTreeMap::new(),
        }
    }
}

/// State file bound to its path
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: StateFile,
}

impl StateStore {
    /// Load state from disk
    /// A missing file yields empty state
    pub fn load(path: &Path) -> Result<Self> {
        let state = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read state file {}", path.display()))?;
            let state: StateFile = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse state file {}", path.display()))?;
            if state.version != STATE_VERSION {
                bail!(
                    "Unsupported state file version {} in {} (expected {})",
                    state.version,
                    path.display(),
                    STATE_VERSION
                );
            }
            state
        } else {
            StateFile::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    /// Save state to disk, replacing the previous file atomically
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(&self.state)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)
            .with_context(|| format!("Failed to write state file {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace state file {}", self.path.display()))?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, address: &str) -> Option<&RuleState> {
        self.state.resources.get(address)
    }

    pub fn insert(&mut self, address: &str, rule: RuleState) {
        self.state.resources.insert(address.to_string(), rule);
    }

    pub fn remove(&mut self, address: &str) -> Option<RuleState> {
        self.state.resources.remove(address)
    }

    /// Tracked addresses in sorted order
    pub fn addresses(&self) -> Vec<String> {
        self.state.resources.keys().cloned().collect()
    }

    pub fn resources(&self) -> &BTreeMap<String, RuleState> {
        &self.state.resources
    }
}
