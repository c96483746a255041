//! Security data recognition rule resource
//!
//! Create, read, update, delete and import of DataArts Studio recognition
//! rules. Every operation resolves its own region-scoped client from the
//! provider configuration and sends the `workspace` routing header.
//!
//! API: DataArtsStudio POST   /v1/{project_id}/security/data-classification/rule
//! API: DataArtsStudio GET    /v1/{project_id}/security/data-classification/rule/{id}
//! API: DataArtsStudio PUT    /v1/{project_id}/security/data-classification/rule/{id}
//! API: DataArtsStudio DELETE /v1/{project_id}/security/data-classification/rule/{id}

use super::error::{RuleAction, RuleError};
use super::rule::{RuleConfig, RuleLocator, RuleState};
use crate::cloud::client::{ClientInitError, ServiceClient};
use crate::cloud::http::{ApiError, HttpClient};
use crate::cloud::import::split_import_id;
use crate::config::ProviderConfig;
use reqwest::StatusCode;
use serde_json::Value;

/// API product the rule belongs to
pub const PRODUCT: &str = "dataarts";

/// Error code the API answers with when a rule ID is unknown
pub const RULE_NOT_FOUND_CODE: &str = "DLS.4106";

const WORKSPACE_HEADER: &str = "workspace";
const RULES_PATH: &str = "v1/{project_id}/security/data-classification/rule";
const RULE_PATH: &str = "v1/{project_id}/security/data-classification/rule/{id}";

/// Controller for recognition rules
pub struct RuleResource<'a> {
    config: &'a ProviderConfig,
    http: HttpClient,
}

impl<'a> RuleResource<'a> {
    pub fn new(config: &'a ProviderConfig) -> Result<Self, RuleError> {
        let http = HttpClient::new(config.auth_token.clone()).map_err(ClientInitError::from)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ProviderConfig {
        self.config
    }

    fn client(&self, region: &str) -> Result<ServiceClient, RuleError> {
        Ok(ServiceClient::new(
            self.config,
            PRODUCT,
            region,
            self.http.clone(),
        )?)
    }

    fn region_of(&self, rule: &RuleConfig) -> Result<String, RuleError> {
        self.config
            .region_for(rule.region.as_deref())
            .map(str::to_string)
            .ok_or(RuleError::ClientInit(ClientInitError::MissingRegion))
    }

    /// Create a rule and return its hydrated state
    pub async fn create(&self, rule: &RuleConfig) -> Result<RuleState, RuleError> {
        rule.validate()?;
        let region = self.region_of(rule)?;
        let client = self.client(&region)?;

        let url = client.resource_url(RULES_PATH, &[]);
        let response = client
            .post(&url, &[(WORKSPACE_HEADER, rule.workspace_id.as_str())], &rule.request_body())
            .await
            .map_err(|source| RuleError::Request {
                action: RuleAction::Creating,
                source,
            })?;

        let id = response
            .get("uuid")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or(RuleError::MissingIdentifier)?;

        tracing::info!("Created recognition rule {} ({}) in workspace {}", rule.name, id, rule.workspace_id);

        let locator = RuleLocator {
            region,
            workspace_id: rule.workspace_id.clone(),
            id: id.to_string(),
        };
        let state = self.read(&locator).await?;
        Ok(state.with_declared(rule))
    }

    /// Read the current state of a rule
    ///
    /// A rule the API reports as unknown yields [`RuleError::NotFound`].
    pub async fn read(&self, locator: &RuleLocator) -> Result<RuleState, RuleError> {
        let client = self.client(&locator.region)?;

        let url = client.resource_url(RULE_PATH, &[("id", locator.id.as_str())]);
        let response = client
            .get(&url, &[(WORKSPACE_HEADER, locator.workspace_id.as_str())])
            .await
            .map_err(|source| classify_read_error(&locator.id, source))?;

        RuleState::from_response(locator, &response).map_err(RuleError::FieldAssignment)
    }

    /// Replace the mutable fields of a rule and return its refreshed state
    ///
    /// The full body is always sent, never a partial diff.
    pub async fn update(&self, locator: &RuleLocator, rule: &RuleConfig) -> Result<RuleState, RuleError> {
        rule.validate()?;
        let client = self.client(&locator.region)?;

        let url = client.resource_url(RULE_PATH, &[("id", locator.id.as_str())]);
        client
            .put(&url, &[(WORKSPACE_HEADER, locator.workspace_id.as_str())], &rule.request_body())
            .await
            .map_err(|source| RuleError::Request {
                action: RuleAction::Updating,
                source,
            })?;

        tracing::info!("Updated recognition rule {}", locator.id);

        let state = self.read(locator).await?;
        Ok(state.with_declared(rule))
    }

    /// Delete a rule
    pub async fn delete(&self, locator: &RuleLocator) -> Result<(), RuleError> {
        let client = self.client(&locator.region)?;

        let url = client.resource_url(RULE_PATH, &[("id", locator.id.as_str())]);
        client
            .delete(&url, &[(WORKSPACE_HEADER, locator.workspace_id.as_str())])
            .await
            .map_err(|source| RuleError::Request {
                action: RuleAction::Deleting,
                source,
            })?;

        tracing::info!("Deleted recognition rule {}", locator.id);
        Ok(())
    }

    /// Turn an import ID of the form `<workspace_id>/<id>` into a locator
    /// in the provider's default region
    pub fn import(&self, external_id: &str) -> Result<RuleLocator, RuleError> {
        let region = self
            .config
            .default_region()
            .ok_or(RuleError::ClientInit(ClientInitError::MissingRegion))?;
        parse_import_id(external_id, region)
    }
}

/// Split `<workspace_id>/<id>` into a locator for `region`
pub fn parse_import_id(external_id: &str, region: &str) -> Result<RuleLocator, RuleError> {
    let parts = split_import_id(external_id, &["workspace_id", "id"])?;
    Ok(RuleLocator {
        region: region.to_string(),
        workspace_id: parts[0].to_string(),
        id: parts[1].to_string(),
    })
}

/// Map a read failure, e.g. `{"error_code": "DLS.4106","error_msg": "Rule is not exist."}`
/// on a 400, to [`RuleError::NotFound`]
fn classify_read_error(id: &str, source: ApiError) -> RuleError {
    let missing = source.status() == Some(StatusCode::BAD_REQUEST)
        && source.error_code().as_deref() == Some(RULE_NOT_FOUND_CODE);

    if missing {
        RuleError::NotFound {
            id: id.to_string(),
            source,
        }
    } else {
        RuleError::Request {
            action: RuleAction::Retrieving,
            source,
        }
    }
}
