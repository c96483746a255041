//! Configuration Management
//!
//! Provider settings (region, project, endpoints, credentials) for
//! dataarts-rule. Loaded from a JSON file, then overridden by environment
//! variables and finally by command line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default cloud domain used to derive regional endpoints
pub const DEFAULT_CLOUD: &str = "myhuaweicloud.com";

pub const ENV_REGION: &str = "HW_REGION_NAME";
pub const ENV_PROJECT_ID: &str = "HW_PROJECT_ID";
pub const ENV_AUTH_TOKEN: &str = "HW_AUTH_TOKEN";
pub const ENV_CLOUD: &str = "HW_CLOUD";
pub const ENV_DATAARTS_ENDPOINT: &str = "HW_DATAARTS_ENDPOINT";

/// Provider configuration, passed explicitly to every operation
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Default region for rules that do not declare one
    #[serde(default)]
    pub region: Option<String>,
    /// Project ID used when no per-region entry exists
    #[serde(default)]
    pub project_id: Option<String>,
    /// Per-region project IDs
    #[serde(default)]
    pub projects: HashMap<String, String>,
    /// Cloud domain, e.g. `myhuaweicloud.com`
    #[serde(default)]
    pub cloud: Option<String>,
    /// Per-product endpoint overrides
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
    /// Pre-issued IAM token sent as `X-Auth-Token`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl ProviderConfig {
    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dataarts-rule").join("config.json"))
    }

    /// Load configuration from the default location
    /// A missing file yields the default configuration
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(region) = get(ENV_REGION) {
            self.region = Some(region);
        }
        if let Some(project_id) = get(ENV_PROJECT_ID) {
            self.project_id = Some(project_id);
        }
        if let Some(token) = get(ENV_AUTH_TOKEN) {
            self.auth_token = Some(token);
        }
        if let Some(cloud) = get(ENV_CLOUD) {
            self.cloud = Some(cloud);
        }
        if let Some(endpoint) = get(ENV_DATAARTS_ENDPOINT) {
            self.endpoints.insert("dataarts".to_string(), endpoint);
        }
    }

    /// Default region, if any
    pub fn default_region(&self) -> Option<&str> {
        self.region.as_deref().filter(|r| !r.is_empty())
    }

    /// Resolve the region of a resource (declared > provider default)
    pub fn region_for<'a>(&'a self, declared: Option<&'a str>) -> Option<&'a str> {
        declared.filter(|r| !r.is_empty()).or_else(|| self.default_region())
    }

    /// Project ID for a region (per-region entry > global project ID)
    pub fn project_for_region(&self, region: &str) -> Option<&str> {
        self.projects
            .get(region)
            .map(String::as_str)
            .or(self.project_id.as_deref())
            .filter(|p| !p.is_empty())
    }

    /// Effective cloud domain
    pub fn cloud(&self) -> &str {
        self.cloud
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CLOUD)
    }

    /// Endpoint override for a product
    pub fn endpoint_override(&self, product: &str) -> Option<&str> {
        self.endpoints
            .get(product)
            .map(String::as_str)
            .filter(|e| !e.is_empty())
    }
}
