//! Import identifier parsing
//!
//! Resources scoped by more than their own ID are imported with a composite
//! identifier such as `<workspace_id>/<id>`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid format specified for import ID {id:?}, must be {format}")]
pub struct ImportIdError {
    pub id: String,
    pub format: String,
}

/// Split a composite import ID into exactly `fields.len()` non-empty parts
///
/// `fields` names the parts and is only used for the error message.
pub fn split_import_id<'a>(id: &'a str, fields: &[&str]) -> Result<Vec<&'a str>, ImportIdError> {
    let parts: Vec<&str> = id.trim().split('/').collect();

    if parts.len() != fields.len() || parts.iter().any(|p| p.is_empty()) {
        let format = fields
            .iter()
            .map(|f| format!("<{}>", f))
            .collect::<Vec<_>>()
            .join("/");
        return Err(ImportIdError {
            id: id.to_string(),
            format,
        });
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_two_parts() {
        let parts = split_import_id("ws-1/rule-9", &["workspace_id", "id"]).unwrap();
        assert_eq!(parts, vec!["ws-1", "rule-9"]);
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let parts = split_import_id(" ws-1/rule-9\n", &["workspace_id", "id"]).unwrap();
        assert_eq!(parts, vec!["ws-1", "rule-9"]);
    }

    #[test]
    fn test_wrong_part_count_rejected() {
        let err = split_import_id("rule-9", &["workspace_id", "id"]).unwrap_err();
        assert_eq!(err.format, "<workspace_id>/<id>");

        assert!(split_import_id("a/b/c", &["workspace_id", "id"]).is_err());
    }

    #[test]
    fn test_empty_part_rejected() {
        assert!(split_import_id("/rule-9", &["workspace_id", "id"]).is_err());
        assert!(split_import_id("ws-1/", &["workspace_id", "id"]).is_err());
    }
}
