//! Cloud API plumbing
//!
//! Everything a resource controller needs to talk to a regional management
//! endpoint: the region-aware client factory, the HTTP wrapper and its error
//! type, plus the small helpers shared between resources.
//!
//! # Module Structure
//!
//! - [`client`] - Region-scoped service client (endpoint + project id)
//! - [`http`] - HTTP utilities for REST API calls
//! - [`import`] - Composite import identifier splitting
//! - [`timestamp`] - Epoch to RFC3339 conversion
//!
//! # Example
//!
//! ```ignore
//! use crate::cloud::client::ServiceClient;
//!
//! fn example(config: &ProviderConfig, http: HttpClient) -> Result<(), ClientInitError> {
//!     let client = ServiceClient::new(config, "dataarts", "cn-north-4", http)?;
//!     let url = client.resource_url("v1/{project_id}/security/data-classification/rule", &[]);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;
pub mod import;
pub mod timestamp;
