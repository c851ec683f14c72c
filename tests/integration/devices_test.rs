//! Integration tests for the management API.

use http::StatusCode;
use serde_json::json;

use deviceadm_client::DevAuthCall;
use deviceadm_core::AppError;
use deviceadm_entity::AuthSetStatus;

use crate::helpers::{MANAGEMENT, PUBLIC_KEY, TestApp, tenant_token};

#[tokio::test]
async fn test_list_devices_paginates_with_links() {
    let app = TestApp::new();
    for i in 0..5 {
        app.seed(None, &format!("a{i}"), &format!("d{i}"), &format!("00:0{i}"))
            .await;
    }

    let response = app
        .request("GET", &format!("{MANAGEMENT}/devices?page=2&per_page=2"), None, None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let ids: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["a2", "a3"]);

    let base = format!("http://localhost{MANAGEMENT}/devices");
    assert_eq!(
        response.links(),
        [
            format!("<{base}?page=1&per_page=2>; rel=\"prev\""),
            format!("<{base}?page=3&per_page=2>; rel=\"next\""),
            format!("<{base}?page=1&per_page=2>; rel=\"first\""),
        ]
    );

    let last = app
        .request("GET", &format!("{MANAGEMENT}/devices?page=3&per_page=2"), None, None)
        .await;
    assert_eq!(last.body.as_array().unwrap().len(), 1);
    assert!(!last.links().iter().any(|l| l.ends_with("rel=\"next\"")));
}

#[tokio::test]
async fn test_list_devices_filters_by_status() {
    let app = TestApp::new();
    app.seed(None, "a1", "d1", "00:01").await;
    app.seed(None, "a2", "d2", "00:02").await;
    app.request(
        "PUT",
        &format!("{MANAGEMENT}/devices/a2/status"),
        Some(json!({"status": "accepted"})),
        None,
    )
    .await;

    let response = app
        .request("GET", &format!("{MANAGEMENT}/devices?status=accepted"), None, None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let devices = response.body.as_array().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0]["id"], "a2");
    assert!(response.links()[0].contains("status=accepted"));
}

#[tokio::test]
async fn test_list_devices_rejects_bad_query() {
    let app = TestApp::new();

    for (query, message) in [
        ("page=foo", "invalid page query: \"foo\""),
        (
            "per_page=0",
            "invalid page query: value must be a non-zero, positive number",
        ),
        (
            "status=bogus",
            "status must be one of: pending, accepted, rejected, preauthorized",
        ),
    ] {
        let response = app
            .request("GET", &format!("{MANAGEMENT}/devices?{query}"), None, None)
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "query {query}");
        assert_eq!(response.body["error"], message);
        assert!(response.body["request_id"].is_string());
    }
}

#[tokio::test]
async fn test_get_device_and_status() {
    let app = TestApp::new();
    app.seed(None, "a1", "d1", "00:11").await;

    let response = app
        .request("GET", &format!("{MANAGEMENT}/devices/a1"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["device_id"], "d1");
    assert_eq!(response.body["status"], "pending");
    assert_eq!(response.body["attributes"]["mac"], "00:11");

    let response = app
        .request("GET", &format!("{MANAGEMENT}/devices/a1/status"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"status": "pending"}));

    let response = app
        .request("GET", &format!("{MANAGEMENT}/devices/missing"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_accept_notifies_then_persists() {
    let app = TestApp::new();
    app.seed(None, "a1", "d1", "00:11").await;

    let response = app
        .request(
            "PUT",
            &format!("{MANAGEMENT}/devices/a1/status"),
            Some(json!({"status": "accepted"})),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"status": "accepted"}));
    let stored = app.stored(None, "a1").await.unwrap();
    assert_eq!(stored.status, AuthSetStatus::Accepted);
    assert_eq!(stored.key, PUBLIC_KEY);

    assert!(matches!(
        app.devauth.calls().as_slice(),
        [DevAuthCall::UpdateStatus { status: AuthSetStatus::Accepted, .. }]
    ));
}

#[tokio::test]
async fn test_decided_status_is_not_reversible() {
    let app = TestApp::new();
    app.seed(None, "a1", "d1", "00:11").await;

    for (status, expected) in [
        ("accepted", StatusCode::OK),
        ("accepted", StatusCode::OK),
        ("rejected", StatusCode::CONFLICT),
    ] {
        let response = app
            .request(
                "PUT",
                &format!("{MANAGEMENT}/devices/a1/status"),
                Some(json!({"status": status})),
                None,
            )
            .await;
        assert_eq!(response.status, expected, "status {status}");
    }

    assert_eq!(app.devauth.calls().len(), 1);
    assert_eq!(
        app.stored(None, "a1").await.unwrap().status,
        AuthSetStatus::Accepted
    );
}

#[tokio::test]
async fn test_usage_error_keeps_status_pending() {
    let app = TestApp::new();
    app.seed(None, "a1", "d1", "00:11").await;
    app.devauth
        .push_response(Err(AppError::unprocessable("max dev count limit reached")));

    let response = app
        .request(
            "PUT",
            &format!("{MANAGEMENT}/devices/a1/status"),
            Some(json!({"status": "accepted"})),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"], "max dev count limit reached");
    assert_eq!(
        app.stored(None, "a1").await.unwrap().status,
        AuthSetStatus::Pending
    );
}

#[tokio::test]
async fn test_transport_error_is_internal() {
    let app = TestApp::new();
    app.seed(None, "a1", "d1", "00:11").await;
    app.devauth
        .push_response(Err(AppError::external_service("request timed out")));

    let response = app
        .request(
            "PUT",
            &format!("{MANAGEMENT}/devices/a1/status"),
            Some(json!({"status": "rejected"})),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "internal error");
    assert_eq!(
        app.stored(None, "a1").await.unwrap().status,
        AuthSetStatus::Pending
    );
}

#[tokio::test]
async fn test_status_update_rejects_other_statuses() {
    let app = TestApp::new();
    app.seed(None, "a1", "d1", "00:11").await;

    for status in ["pending", "preauthorized", "foo"] {
        let response = app
            .request(
                "PUT",
                &format!("{MANAGEMENT}/devices/a1/status"),
                Some(json!({"status": status})),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "status {status}");
        assert_eq!(response.body["error"], "incorrect device status");
    }
    assert!(app.devauth.calls().is_empty());

    let response = app
        .request(
            "PUT",
            &format!("{MANAGEMENT}/devices/missing/status"),
            Some(json!({"status": "accepted"})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_preauthorize_creates_record_and_calls_devauth() {
    let app = TestApp::new();
    let token = tenant_token("acme");

    let response = app
        .request(
            "POST",
            &format!("{MANAGEMENT}/devices"),
            Some(json!({
                "device_identity": r#"{"mac":"00:11:22"}"#,
                "key": PUBLIC_KEY,
            })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let location = response.headers["location"].to_str().unwrap();
    let id = location
        .strip_prefix(&format!("{MANAGEMENT}/devices/"))
        .unwrap();

    let stored = app.stored(Some("acme"), id).await.unwrap();
    assert_eq!(stored.status, AuthSetStatus::Preauthorized);
    assert_eq!(stored.attributes.get("mac").unwrap(), "00:11:22");
    assert!(app.stored(None, id).await.is_none());

    match app.devauth.calls().as_slice() {
        [DevAuthCall::Preauthorize {
            tenant,
            request,
            authorization,
        }] => {
            assert_eq!(tenant.as_deref(), Some("acme"));
            assert_eq!(request.auth_set_id.as_str(), id);
            assert_eq!(authorization.as_deref(), Some(format!("Bearer {token}").as_str()));
        }
        calls => panic!("unexpected calls {calls:?}"),
    }
}

#[tokio::test]
async fn test_preauthorize_validation() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            &format!("{MANAGEMENT}/devices"),
            Some(json!({"device_identity": r#"{"mac":"00:11"}"#, "key": "dummy_key"})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "cannot decode public key");

    let response = app
        .request(
            "POST",
            &format!("{MANAGEMENT}/devices"),
            Some(json!({"device_identity": "not json", "key": PUBLIC_KEY})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "POST",
            &format!("{MANAGEMENT}/devices"),
            Some(json!({"key": PUBLIC_KEY})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    assert!(app.devauth.calls().is_empty());
}

#[tokio::test]
async fn test_preauthorize_conflict_skips_devauth() {
    let app = TestApp::new();
    let body = json!({"device_identity": r#"{"mac":"00:11"}"#, "key": PUBLIC_KEY});

    let first = app
        .request("POST", &format!("{MANAGEMENT}/devices"), Some(body.clone()), None)
        .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app
        .request("POST", &format!("{MANAGEMENT}/devices"), Some(body), None)
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(app.devauth.calls().len(), 1);
}

#[tokio::test]
async fn test_preauthorize_rolls_back_on_devauth_conflict() {
    let app = TestApp::new();
    app.devauth
        .push_response(Err(AppError::conflict("device already exists")));

    let response = app
        .request(
            "POST",
            &format!("{MANAGEMENT}/devices"),
            Some(json!({"device_identity": r#"{"mac":"00:11"}"#, "key": PUBLIC_KEY})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "device already exists");

    let listed = app
        .request("GET", &format!("{MANAGEMENT}/devices"), None, None)
        .await;
    assert_eq!(listed.body, json!([]));
}

#[tokio::test]
async fn test_delete_device() {
    let app = TestApp::new();
    app.seed(None, "a1", "d1", "00:01").await;
    app.seed(None, "a2", "d2", "00:02").await;

    let response = app
        .request("DELETE", &format!("{MANAGEMENT}/devices/a1"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(app.stored(None, "a1").await.is_none());
    assert!(app.stored(None, "a2").await.is_some());

    let response = app
        .request("DELETE", &format!("{MANAGEMENT}/devices/a1"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_device_data() {
    let app = TestApp::new();
    app.seed(None, "a1", "d1", "00:01").await;
    app.seed(None, "a2", "d1", "00:02").await;
    app.seed(None, "a3", "d2", "00:03").await;

    let response = app
        .request("DELETE", &format!("{MANAGEMENT}/devices?device_id=d1"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(app.stored(None, "a1").await.is_none());
    assert!(app.stored(None, "a2").await.is_none());
    assert!(app.stored(None, "a3").await.is_some());

    let response = app
        .request("DELETE", &format!("{MANAGEMENT}/devices?device_id=d1"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app
        .request("DELETE", &format!("{MANAGEMENT}/devices"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let app = TestApp::new();
    app.seed(Some("acme"), "a1", "d1", "00:01").await;

    let response = app
        .request("GET", &format!("{MANAGEMENT}/devices/a1"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request(
            "GET",
            &format!("{MANAGEMENT}/devices/a1"),
            None,
            Some(&tenant_token("acme")),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(
            "GET",
            &format!("{MANAGEMENT}/devices"),
            None,
            Some(&tenant_token("other")),
        )
        .await;
    assert_eq!(response.body, json!([]));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::new();

    let response = app
        .request("GET", &format!("{MANAGEMENT}/devices/missing"), None, None)
        .await;

    let header = response.headers["x-request-id"].to_str().unwrap();
    assert!(!header.is_empty());
    assert_eq!(response.body["request_id"], header);
}
