//! DataArts Studio resources
//!
//! - [`rule`] - Recognition rule configuration, request body and state
//! - [`resource`] - Lifecycle controller for recognition rules
//! - [`error`] - Rule error taxonomy

pub mod error;
pub mod resource;
pub mod rule;

pub use error::{FieldError, FieldErrors, RuleAction, RuleError};
pub use resource::{parse_import_id, RuleResource, RULE_NOT_FOUND_CODE};
pub use rule::{RuleConfig, RuleLocator, RuleRequestBody, RuleState};
