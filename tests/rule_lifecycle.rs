//! Integration tests for the recognition rule controller using wiremock
//!
//! These tests run every lifecycle operation against a mocked DataArts Studio
//! endpoint and check paths, headers, bodies and error classification.

use dataarts_rule::dataarts::{RuleAction, RuleConfig, RuleError, RuleLocator, RuleResource};
use dataarts_rule::ProviderConfig;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RULES_PATH: &str = "/v1/proj-1/security/data-classification/rule";
const RULE_PATH: &str = "/v1/proj-1/security/data-classification/rule/rule-1";

fn provider(server: &MockServer) -> ProviderConfig {
    let mut config = ProviderConfig {
        region: Some("cn-north-4".to_string()),
        project_id: Some("proj-1".to_string()),
        ..Default::default()
    };
    config
        .endpoints
        .insert("dataarts".to_string(), server.uri());
    config
}

fn declared() -> RuleConfig {
    RuleConfig {
        workspace_id: "ws-1".to_string(),
        rule_type: "CUSTOM".to_string(),
        name: "phone_numbers".to_string(),
        secrecy_level_id: "level-1".to_string(),
        content_expression: Some("^1[3-9]\\d{9}$".to_string()),
        comment_expression: Some("mobile".to_string()),
        description: Some(String::new()),
        ..Default::default()
    }
}

fn locator() -> RuleLocator {
    RuleLocator {
        region: "cn-north-4".to_string(),
        workspace_id: "ws-1".to_string(),
        id: "rule-1".to_string(),
    }
}

fn rule_body() -> Value {
    json!({
        "uuid": "rule-1",
        "rule_type": "CUSTOM",
        "name": "phone_numbers",
        "secrecy_level_id": "level-1",
        "secrecy_level": "Sensitive",
        "secrecy_level_num": 2,
        "enable": true,
        "method": "REGULAR",
        "content_expression": "^1[3-9]\\d{9}$",
        "column_expression": null,
        "commit_expression": "mobile",
        "builtin_rule_id": null,
        "category_id": null,
        "description": null,
        "created_at": 1700000000000_i64,
        "created_by": "alice",
        "updated_at": 1700000000000_i64,
        "updated_by": "alice"
    })
}

fn not_found_body() -> Value {
    json!({"error_code": "DLS.4106", "error_msg": "Rule is not exist."})
}

mod create_tests {
    use super::*;

    /// Create posts the typed body with the workspace header, then hydrates via GET
    #[tokio::test]
    async fn test_create_then_read_back() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(RULES_PATH))
            .and(header("workspace", "ws-1"))
            .and(body_json(json!({
                "rule_type": "CUSTOM",
                "secrecy_level_id": "level-1",
                "name": "phone_numbers",
                "content_expression": "^1[3-9]\\d{9}$",
                "commit_expression": "mobile"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uuid": "rule-1"})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(RULE_PATH))
            .and(header("workspace", "ws-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rule_body()))
            .expect(1)
            .mount(&server)
            .await;

        let config = provider(&server);
        let resource = RuleResource::new(&config).unwrap();
        let state = resource.create(&declared()).await.expect("create should succeed");

        assert_eq!(state.id, "rule-1");
        assert_eq!(state.name, "phone_numbers");
        assert_eq!(state.rule_type, "CUSTOM");
        assert_eq!(state.secrecy_level_id, "level-1");
        assert_eq!(state.secrecy_level, "Sensitive");
        assert!(state.enable);
        assert_eq!(state.created_at, "2023-11-14T22:13:20Z");
        assert_eq!(state.comment_expression, "mobile");
        assert_eq!(state.region, "cn-north-4");
        assert_eq!(state.workspace_id, "ws-1");
    }

    /// A response without `uuid` fails and never triggers a read
    #[tokio::test]
    async fn test_create_without_uuid_is_missing_identifier() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(RULES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "phone_numbers"})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rule_body()))
            .expect(0)
            .mount(&server)
            .await;

        let config = provider(&server);
        let resource = RuleResource::new(&config).unwrap();
        let err = resource.create(&declared()).await.unwrap_err();

        assert!(matches!(err, RuleError::MissingIdentifier));
    }

    /// A failing POST is a request error naming the create step
    #[tokio::test]
    async fn test_create_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(RULES_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error_code": "DLS.1001",
                "error_msg": "Rule name already exists."
            })))
            .mount(&server)
            .await;

        let config = provider(&server);
        let resource = RuleResource::new(&config).unwrap();
        let err = resource.create(&declared()).await.unwrap_err();

        assert!(matches!(
            err,
            RuleError::Request {
                action: RuleAction::Creating,
                ..
            }
        ));
        assert!(err.to_string().starts_with("error creating DataArts Security data recognition rule"));
    }

    /// Missing required fields are rejected before any request
    #[tokio::test]
    async fn test_create_invalid_config_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = provider(&server);
        let resource = RuleResource::new(&config).unwrap();
        let mut rule = declared();
        rule.secrecy_level_id = String::new();

        let err = resource.create(&rule).await.unwrap_err();
        assert!(matches!(err, RuleError::InvalidConfig(_)));
    }

    /// Without a region no client can be built
    #[tokio::test]
    async fn test_create_without_region_is_client_init_error() {
        let server = MockServer::start().await;
        let mut config = provider(&server);
        config.region = None;

        let resource = RuleResource::new(&config).unwrap();
        let err = resource.create(&declared()).await.unwrap_err();
        assert!(matches!(err, RuleError::ClientInit(_)));
    }

    /// The configured token is sent on every request
    #[tokio::test]
    async fn test_auth_token_header() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(RULES_PATH))
            .and(header("X-Auth-Token", "secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uuid": "rule-1"})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(RULE_PATH))
            .and(header("X-Auth-Token", "secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rule_body()))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = provider(&server);
        config.auth_token = Some("secret-token".to_string());
        let resource = RuleResource::new(&config).unwrap();
        resource.create(&declared()).await.expect("create should succeed");
    }
}

mod read_tests {
    use super::*;

    /// 400 with DLS.4106 means the rule is gone
    #[tokio::test]
    async fn test_read_rule_missing_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(RULE_PATH))
            .and(header("workspace", "ws-1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(not_found_body()))
            .mount(&server)
            .await;

        let config = provider(&server);
        let resource = RuleResource::new(&config).unwrap();
        let err = resource.read(&locator()).await.unwrap_err();

        assert!(err.is_not_found());
    }

    /// Any other error code on a 400 stays fatal
    #[tokio::test]
    async fn test_read_other_code_is_request_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(RULE_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error_code": "DLS.0002",
                "error_msg": "Workspace is not exist."
            })))
            .mount(&server)
            .await;

        let config = provider(&server);
        let resource = RuleResource::new(&config).unwrap();
        let err = resource.read(&locator()).await.unwrap_err();

        assert!(matches!(
            err,
            RuleError::Request {
                action: RuleAction::Retrieving,
                ..
            }
        ));
    }

    /// The rule-missing code on another status stays fatal
    #[tokio::test]
    async fn test_read_rule_missing_code_on_500_is_request_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(RULE_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_json(not_found_body()))
            .mount(&server)
            .await;

        let config = provider(&server);
        let resource = RuleResource::new(&config).unwrap();
        let err = resource.read(&locator()).await.unwrap_err();

        assert!(!err.is_not_found());
        assert!(matches!(err, RuleError::Request { .. }));
    }

    /// Every malformed field is reported in one error
    #[tokio::test]
    async fn test_read_collects_field_errors() {
        let server = MockServer::start().await;

        let mut body = rule_body();
        body["enable"] = json!("true");
        body["secrecy_level_num"] = json!("2");
        body["updated_at"] = json!("2023-11-14");

        Mock::given(method("GET"))
            .and(path(RULE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let config = provider(&server);
        let resource = RuleResource::new(&config).unwrap();
        let err = resource.read(&locator()).await.unwrap_err();

        match err {
            RuleError::FieldAssignment(errors) => assert_eq!(
                errors.fields().collect::<Vec<_>>(),
                vec!["secrecy_level_num", "enable", "updated_at"]
            ),
            other => panic!("expected field assignment error, got {other:?}"),
        }
    }
}

mod update_tests {
    use super::*;

    /// Update sends the complete projection even when one field changed
    #[tokio::test]
    async fn test_update_sends_full_body() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(RULE_PATH))
            .and(header("workspace", "ws-1"))
            .and(body_json(json!({
                "rule_type": "CUSTOM",
                "secrecy_level_id": "level-1",
                "name": "phone_numbers",
                "content_expression": "^1[3-9]\\d{9}$",
                "commit_expression": "mobile",
                "category_id": "cat-9"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut refreshed = rule_body();
        refreshed["category_id"] = json!("cat-9");
        Mock::given(method("GET"))
            .and(path(RULE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(refreshed))
            .expect(1)
            .mount(&server)
            .await;

        let config = provider(&server);
        let resource = RuleResource::new(&config).unwrap();
        let mut rule = declared();
        rule.category_id = Some("cat-9".to_string());

        let state = resource.update(&locator(), &rule).await.expect("update should succeed");
        assert_eq!(state.category_id, "cat-9");
        assert_eq!(state.id, "rule-1");
    }

    /// A failing PUT does not read back
    #[tokio::test]
    async fn test_update_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(RULE_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error_code": "DLS.0003",
                "error_msg": "Forbidden."
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rule_body()))
            .expect(0)
            .mount(&server)
            .await;

        let config = provider(&server);
        let resource = RuleResource::new(&config).unwrap();
        let err = resource.update(&locator(), &declared()).await.unwrap_err();
        assert!(matches!(
            err,
            RuleError::Request {
                action: RuleAction::Updating,
                ..
            }
        ));
    }
}

mod delete_tests {
    use super::*;

    /// Delete issues DELETE with the workspace header
    #[tokio::test]
    async fn test_delete_success() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path(RULE_PATH))
            .and(header("workspace", "ws-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let config = provider(&server);
        let resource = RuleResource::new(&config).unwrap();
        resource.delete(&locator()).await.expect("delete should succeed");
    }

    /// Delete does not treat the rule-missing code as success
    #[tokio::test]
    async fn test_delete_rule_missing_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path(RULE_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(not_found_body()))
            .mount(&server)
            .await;

        let config = provider(&server);
        let resource = RuleResource::new(&config).unwrap();
        let err = resource.delete(&locator()).await.unwrap_err();

        assert!(!err.is_not_found());
        assert!(matches!(
            err,
            RuleError::Request {
                action: RuleAction::Deleting,
                ..
            }
        ));
    }
}

mod import_tests {
    use super::*;

    /// An imported ID drives a read in the default region
    #[tokio::test]
    async fn test_import_then_read() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(RULE_PATH))
            .and(header("workspace", "ws-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rule_body()))
            .expect(1)
            .mount(&server)
            .await;

        let config = provider(&server);
        let resource = RuleResource::new(&config).unwrap();
        let locator = resource.import("ws-1/rule-1").unwrap();
        assert_eq!(locator, super::locator());

        let state = resource.read(&locator).await.unwrap();
        assert_eq!(state.name, "phone_numbers");
    }
}
