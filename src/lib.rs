//! Declarative lifecycle management for DataArts Studio security data
//! recognition rules.
//!
//! # Module Structure
//!
//! - [`config`] - Provider configuration (region, project, endpoints, token)
//! - [`cloud`] - Region-scoped service client and HTTP plumbing
//! - [`dataarts`] - Recognition rule model and lifecycle controller
//! - [`manifest`] - Declared rules loaded from YAML
//! - [`state`] - Tracked rule state persisted as JSON
//! - [`plan`] - Diff between declared rules and tracked state
//! - [`reconcile`] - Refresh / apply / destroy / import driver

pub mod cloud;
pub mod config;
pub mod dataarts;
pub mod manifest;
pub mod plan;
pub mod reconcile;
pub mod state;

pub use config::ProviderConfig;
pub use dataarts::{RuleConfig, RuleError, RuleLocator, RuleResource, RuleState};
