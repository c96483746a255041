use crate::cloud::client::ClientInitError;
use crate::cloud::http::ApiError;
use crate::cloud::import::ImportIdError;
use std::fmt;
use thiserror::Error;

/// Lifecycle step a request failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    Creating,
    Retrieving,
    Updating,
    Deleting,
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            RuleAction::Creating => "creating",
            RuleAction::Retrieving => "retrieving",
            RuleAction::Updating => "updating",
            RuleAction::Deleting => "deleting",
        };
        f.write_str(verb)
    }
}

/// One response field that could not be projected onto the rule state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

/// Every projection failure of a single read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.0.len() == 1 { "error" } else { "errors" };
        write!(f, "{} {} occurred:", self.0.len(), noun)?;
        for err in &self.0 {
            write!(f, "\n\t* {}: {}", err.field, err.reason)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("error creating DataArts Studio V1 client")]
    ClientInit(#[from] ClientInitError),

    #[error("error {action} DataArts Security data recognition rule")]
    Request {
        action: RuleAction,
        #[source]
        source: ApiError,
    },

    #[error("DataArts Security data recognition rule {id} no longer exists")]
    NotFound {
        id: String,
        #[source]
        source: ApiError,
    },

    #[error("error creating DataArts Security data recognition rule: ID is not found in API response")]
    MissingIdentifier,

    #[error("error setting DataArts Security data recognition rule fields: {0}")]
    FieldAssignment(FieldErrors),

    #[error("invalid rule configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    InvalidImportId(#[from] ImportIdError),
}

impl RuleError {
    /// Whether the orchestrator should drop the rule from state
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuleError::NotFound { .. })
    }
}
