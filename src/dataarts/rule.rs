//! Recognition rule model
//!
//! The declared configuration, the outgoing request body and the state
//! projected back from the API.

use super::error::{FieldError, FieldErrors, RuleError};
use crate::cloud::timestamp::format_millis_rfc3339;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared configuration of a recognition rule
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Region of the rule, defaults to the provider region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub workspace_id: String,
    pub rule_type: String,
    pub name: String,
    pub secrecy_level_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin_rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    /// Matching method; the server picks one when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Treat `Some("")` the same as `None`
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl RuleConfig {
    /// Check the fields the API requires
    pub fn validate(&self) -> Result<(), RuleError> {
        let required = [
            ("workspace_id", &self.workspace_id),
            ("rule_type", &self.rule_type),
            ("name", &self.name),
            ("secrecy_level_id", &self.secrecy_level_id),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RuleError::InvalidConfig(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }

    /// Body shared by create and update: the complete field set, empty
    /// optional values omitted
    pub fn request_body(&self) -> RuleRequestBody<'_> {
        RuleRequestBody {
            rule_type: &self.rule_type,
            secrecy_level_id: &self.secrecy_level_id,
            name: &self.name,
            method: non_empty(&self.method),
            content_expression: non_empty(&self.content_expression),
            column_expression: non_empty(&self.column_expression),
            comment_expression: non_empty(&self.comment_expression),
            builtin_rule_id: non_empty(&self.builtin_rule_id),
            description: non_empty(&self.description),
            category_id: non_empty(&self.category_id),
        }
    }
}

/// JSON body of `POST` and `PUT` requests
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RuleRequestBody<'a> {
    pub rule_type: &'a str,
    pub secrecy_level_id: &'a str,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_expression: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_expression: Option<&'a str>,
    #[serde(rename = "commit_expression", skip_serializing_if = "Option::is_none")]
    pub comment_expression: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builtin_rule_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<&'a str>,
}

/// Address of one rule on the API: region, workspace and rule ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleLocator {
    pub region: String,
    pub workspace_id: String,
    pub id: String,
}

/// Observed state of a recognition rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleState {
    pub id: String,
    pub region: String,
    pub workspace_id: String,
    pub rule_type: String,
    pub name: String,
    pub builtin_rule_id: String,
    pub secrecy_level_id: String,
    pub content_expression: String,
    pub column_expression: String,
    pub comment_expression: String,
    pub description: String,
    pub category_id: String,
    pub method: String,
    pub secrecy_level: String,
    pub secrecy_level_num: i64,
    pub enable: bool,
    pub created_at: String,
    pub created_by: String,
    pub updated_at: String,
    pub updated_by: String,
}

impl RuleState {
    pub fn locator(&self) -> RuleLocator {
        RuleLocator {
            region: self.region.clone(),
            workspace_id: self.workspace_id.clone(),
            id: self.id.clone(),
        }
    }

    /// Project a `GET` response onto the state
    ///
    /// Every field is attempted; all failures are returned together.
    pub fn from_response(locator: &RuleLocator, body: &Value) -> Result<Self, FieldErrors> {
        let mut p = Projection::new(body);

        let state = Self {
            id: locator.id.clone(),
            region: locator.region.clone(),
            workspace_id: locator.workspace_id.clone(),
            rule_type: p.string("rule_type", "rule_type"),
            name: p.string("name", "name"),
            builtin_rule_id: p.string("builtin_rule_id", "builtin_rule_id"),
            secrecy_level_id: p.string("secrecy_level_id", "secrecy_level_id"),
            content_expression: p.string("content_expression", "content_expression"),
            column_expression: p.string("column_expression", "column_expression"),
            comment_expression: p.string("comment_expression", "commit_expression"),
            description: p.string("description", "description"),
            category_id: p.string("category_id", "category_id"),
            method: p.string("method", "method"),
            secrecy_level: p.string("secrecy_level", "secrecy_level"),
            secrecy_level_num: p.integer("secrecy_level_num", "secrecy_level_num"),
            enable: p.boolean("enable", "enable"),
            created_at: p.timestamp("created_at", "created_at"),
            created_by: p.string("created_by", "created_by"),
            updated_at: p.timestamp("updated_at", "updated_at"),
            updated_by: p.string("updated_by", "updated_by"),
        };

        p.finish().map(|_| state)
    }

    /// Keep declared values the read response does not echo back
    pub fn with_declared(mut self, declared: &RuleConfig) -> Self {
        if self.secrecy_level_id.is_empty() {
            self.secrecy_level_id = declared.secrecy_level_id.clone();
        }
        self
    }
}

/// Field-by-field typed decoding that accumulates failures
struct Projection<'a> {
    body: &'a Value,
    errors: Vec<FieldError>,
}

impl<'a> Projection<'a> {
    fn new(body: &'a Value) -> Self {
        let mut errors = Vec::new();
        if !body.is_object() {
            errors.push(FieldError {
                field: "response",
                reason: format!("expected object, found {}", kind(body)),
            });
        }
        Self { body, errors }
    }

    /// Absent and `null` values both mean "unset"
    fn lookup(&self, key: &str) -> Option<&'a Value> {
        self.body.get(key).filter(|v| !v.is_null())
    }

    fn fail(&mut self, field: &'static str, reason: String) {
        self.errors.push(FieldError { field, reason });
    }

    fn string(&mut self, field: &'static str, key: &str) -> String {
        match self.lookup(key) {
            None => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                self.fail(field, format!("expected string, found {}", kind(other)));
                String::new()
            }
        }
    }

    fn integer(&mut self, field: &'static str, key: &str) -> i64 {
        match self.lookup(key) {
            None => 0,
            Some(value) => match as_whole_number(value) {
                Some(n) => n,
                None => {
                    self.fail(field, format!("expected integer, found {}", kind(value)));
                    0
                }
            },
        }
    }

    fn boolean(&mut self, field: &'static str, key: &str) -> bool {
        match self.lookup(key) {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                self.fail(field, format!("expected boolean, found {}", kind(other)));
                false
            }
        }
    }

    /// Millisecond epoch number to RFC3339
    fn timestamp(&mut self, field: &'static str, key: &str) -> String {
        let Some(value) = self.lookup(key) else {
            return String::new();
        };

        let millis = match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            _ => None,
        };

        match millis.and_then(format_millis_rfc3339) {
            Some(formatted) => formatted,
            None if millis.is_some() => {
                self.fail(field, format!("timestamp {} is out of range", value));
                String::new()
            }
            None => {
                self.fail(field, format!("expected epoch milliseconds, found {}", kind(value)));
                String::new()
            }
        }
    }

    fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(FieldErrors(self.errors))
        }
    }
}

/// Integral JSON numbers, including `3.0`
fn as_whole_number(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
