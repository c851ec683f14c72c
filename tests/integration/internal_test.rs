//! Integration tests for the internal API.

use http::StatusCode;
use serde_json::json;

use deviceadm_entity::AuthSetStatus;

use crate::helpers::{INTERNAL, MANAGEMENT, PUBLIC_KEY, TestApp, tenant_token};

#[tokio::test]
async fn test_submit_stores_pending_record() {
    let app = TestApp::new();

    let response = app
        .request(
            "PUT",
            &format!("{INTERNAL}/devices/a1"),
            Some(json!({
                "device_id": "d1",
                "device_identity": r#"{"mac":"00:11","sku":"x1"}"#,
                "key": PUBLIC_KEY,
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let stored = app.stored(None, "a1").await.unwrap();
    assert_eq!(stored.status, AuthSetStatus::Pending);
    assert_eq!(stored.device_id.as_str(), "d1");
    assert_eq!(stored.attributes.len(), 2);
    assert!(stored.request_time.is_some());
}

#[tokio::test]
async fn test_submit_is_idempotent() {
    let app = TestApp::new();
    let body = json!({
        "device_id": "d1",
        "device_identity": r#"{"mac":"00:11"}"#,
        "key": PUBLIC_KEY,
    });

    for _ in 0..2 {
        let response = app
            .request("PUT", &format!("{INTERNAL}/devices/a1"), Some(body.clone()), None)
            .await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);
    }

    let listed = app
        .request("GET", &format!("{MANAGEMENT}/devices"), None, None)
        .await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_submit_validation() {
    let app = TestApp::new();

    let response = app
        .request(
            "PUT",
            &format!("{INTERNAL}/devices/a1"),
            Some(json!({"device_id": "d1", "key": PUBLIC_KEY})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "'device_identity' field required");

    let response = app
        .request(
            "PUT",
            &format!("{INTERNAL}/devices/a1"),
            Some(json!({"device_id": "d1", "device_identity": "[1,2]", "key": PUBLIC_KEY})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.stored(None, "a1").await.is_none());
}

#[tokio::test]
async fn test_accept_preauthorized() {
    let app = TestApp::new();
    let created = app
        .request(
            "POST",
            &format!("{MANAGEMENT}/devices"),
            Some(json!({"device_identity": r#"{"mac":"00:11"}"#, "key": PUBLIC_KEY})),
            None,
        )
        .await;
    let location = created.headers["location"].to_str().unwrap();
    let id = location
        .strip_prefix(&format!("{MANAGEMENT}/devices/"))
        .unwrap()
        .to_string();

    let response = app
        .request(
            "PUT",
            &format!("{INTERNAL}/devices/{id}/status"),
            Some(json!({"status": "accepted"})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(
        app.stored(None, &id).await.unwrap().status,
        AuthSetStatus::Accepted
    );
}

#[tokio::test]
async fn test_accept_preauthorized_guards() {
    let app = TestApp::new();
    app.seed(None, "a1", "d1", "00:11").await;

    let response = app
        .request(
            "PUT",
            &format!("{INTERNAL}/devices/a1/status"),
            Some(json!({"status": "accepted"})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(
        response.body["error"],
        "auth set must be in 'preauthorized' state"
    );
    assert_eq!(
        app.stored(None, "a1").await.unwrap().status,
        AuthSetStatus::Pending
    );

    let response = app
        .request(
            "PUT",
            &format!("{INTERNAL}/devices/a1/status"),
            Some(json!({"status": "rejected"})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "PUT",
            &format!("{INTERNAL}/devices/missing/status"),
            Some(json!({"status": "accepted"})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "auth set not found");
}

#[tokio::test]
async fn test_provision_tenant() {
    let app = TestApp::new();

    for _ in 0..2 {
        let response = app
            .request(
                "POST",
                &format!("{INTERNAL}/tenants"),
                Some(json!({"tenant_id": "foobar"})),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let response = app
        .request(
            "GET",
            &format!("{MANAGEMENT}/devices"),
            None,
            Some(&tenant_token("foobar")),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!([]));
}

#[tokio::test]
async fn test_provision_tenant_validation() {
    let app = TestApp::new();

    for body in [json!({"tenant_id": ""}), json!({}), json!({"tenant_id": "bad/tenant"})] {
        let response = app
            .request("POST", &format!("{INTERNAL}/tenants"), Some(body.clone()), None)
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "body {body}");
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let response = app
        .request("GET", &format!("{INTERNAL}/health"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}
