//! Service Client
//!
//! Region-scoped client for one API product, combining the resolved endpoint,
//! the project ID of the region and the shared HTTP client.

use super::http::{ApiError, HttpClient};
use crate::config::ProviderConfig;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Endpoint host prefix per API product
const SERVICE_HOSTS: &[(&str, &str)] = &[("dataarts", "dayu")];

/// Failure to build a region-scoped service client
#[derive(Debug, Error)]
pub enum ClientInitError {
    #[error("region is not configured, set HW_REGION_NAME or --region")]
    MissingRegion,

    #[error("invalid region name: {0:?}")]
    InvalidRegion(String),

    #[error("unknown service product {0:?} and no endpoint override configured")]
    UnknownProduct(String),

    #[error("no project ID configured for region {0}")]
    MissingProject(String),

    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("failed to create HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Region names are used as endpoint host labels
fn validate_region(region: &str) -> bool {
    !region.is_empty()
        && !region.starts_with('-')
        && !region.ends_with('-')
        && region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Region-scoped client for one API product
#[derive(Clone)]
pub struct ServiceClient {
    pub http: HttpClient,
    /// Base endpoint, always ending with `/`
    pub endpoint: String,
    pub project_id: String,
    pub region: String,
}

impl ServiceClient {
    /// Create a client for `product` in `region`, reusing `http`
    pub fn new(
        config: &ProviderConfig,
        product: &str,
        region: &str,
        http: HttpClient,
    ) -> Result<Self, ClientInitError> {
        if region.is_empty() {
            return Err(ClientInitError::MissingRegion);
        }
        if !validate_region(region) {
            return Err(ClientInitError::InvalidRegion(region.to_string()));
        }

        let endpoint = resolve_endpoint(config, product, region)?;
        let project_id = config
            .project_for_region(region)
            .ok_or_else(|| ClientInitError::MissingProject(region.to_string()))?
            .to_string();

        tracing::debug!("{} client for {}: {}", product, region, endpoint);

        Ok(Self {
            http,
            endpoint,
            project_id,
            region: region.to_string(),
        })
    }

    /// Build a request URL from a path template
    ///
    /// `{project_id}` is always substituted; every `(name, value)` pair replaces
    /// `{name}` with the URL-encoded value.
    pub fn resource_url(&self, template: &str, params: &[(&str, &str)]) -> String {
        let mut path = template
            .trim_start_matches('/')
            .replace("{project_id}", &urlencoding::encode(&self.project_id));
        for (name, value) in params {
            path = path.replace(&format!("{{{}}}", name), &urlencoding::encode(value));
        }
        format!("{}{}", self.endpoint, path)
    }

    pub async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.http.get(url, headers).await
    }

    pub async fn post<B>(&self, url: &str, headers: &[(&str, &str)], body: &B) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.http.post(url, headers, body).await
    }

    pub async fn put<B>(&self, url: &str, headers: &[(&str, &str)], body: &B) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.http.put(url, headers, body).await
    }

    pub async fn delete(&self, url: &str, headers: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.http.delete(url, headers).await
    }
}

/// Endpoint for a product: explicit override, else `https://{host}.{region}.{cloud}/`
fn resolve_endpoint(config: &ProviderConfig, product: &str, region: &str) -> Result<String, ClientInitError> {
    let raw = match config.endpoint_override(product) {
        Some(endpoint) => endpoint.to_string(),
        None => {
            let host = SERVICE_HOSTS
                .iter()
                .find(|(name, _)| *name == product)
                .map(|(_, host)| *host)
                .ok_or_else(|| ClientInitError::UnknownProduct(product.to_string()))?;
            format!("https://{}.{}.{}/", host, region, config.cloud())
        }
    };

    let parsed = Url::parse(&raw).map_err(|e| ClientInitError::InvalidEndpoint {
        endpoint: raw.clone(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ClientInitError::InvalidEndpoint {
            endpoint: raw,
            reason: "expected an absolute http(s) URL".to_string(),
        });
    }

    let mut endpoint = parsed.to_string();
    if !endpoint.ends_with('/') {
        endpoint.push('/');
    }
    Ok(endpoint)
}
