//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use deviceadm_api::AppState;
use deviceadm_client::MockDevAuthClient;
use deviceadm_core::RequestContext;
use deviceadm_core::config::AppConfig;
use deviceadm_core::types::{AuthId, DeviceId};
use deviceadm_database::{AuthSetStore, MemoryAuthSetStore};
use deviceadm_entity::{AuthSet, AuthSetStatus, AuthSetUpdate};
use deviceadm_service::AdmissionService;

pub const MANAGEMENT: &str = "/api/management/v1/admission";
pub const INTERNAL: &str = "/api/internal/v1/admission";

/// A valid PEM public key in canonical form.
pub const PUBLIC_KEY: &str = "-----BEGIN PUBLIC KEY-----
MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQDN7TdMgVloaOPKxtdMHaFxJ7SV
p4T4ql2mpSUtZRPJSbUVeNEQX/ioiSYJgtwhUdhT7kGn1II1J9312ENliueINCLc
SeDdzmj/zjCaQzM4hZfjHnKXZzcAB0kqd25sBlJxbqjtd+9KACw6pyc3s8P3gIJ3
QEnDjFGmY3EMI/O3awIDAQAB
-----END PUBLIC KEY-----
";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Store behind the router, for seeding and inspection
    pub store: Arc<MemoryAuthSetStore>,
    /// Scripted device authentication client
    pub devauth: Arc<MockDevAuthClient>,
}

impl TestApp {
    /// Create a new test application over an empty in-memory store
    pub fn new() -> Self {
        let store = Arc::new(MemoryAuthSetStore::new());
        let devauth = Arc::new(MockDevAuthClient::new());
        let admission = AdmissionService::new(store.clone(), devauth.clone());
        let router = deviceadm_api::build_app(AppState::new(AppConfig::default(), admission));

        Self {
            router,
            store,
            devauth,
        }
    }

    /// Store a pending auth set directly, bypassing the API
    pub async fn seed(&self, tenant: Option<&str>, id: &str, device_id: &str, mac: &str) -> AuthSet {
        let identity = format!(r#"{{"mac":"{mac}"}}"#);
        let auth = AuthSet {
            id: AuthId::new(id),
            device_id: DeviceId::new(device_id),
            device_identity: identity,
            key: PUBLIC_KEY.to_string(),
            status: AuthSetStatus::Pending,
            attributes: [("mac".to_string(), mac.to_string())].into_iter().collect(),
            request_time: None,
        };
        self.store
            .put(&context(tenant), &AuthSetUpdate::from(auth.clone()))
            .await
            .expect("Failed to seed auth set");
        auth
    }

    /// Read an auth set directly from the store
    pub async fn stored(&self, tenant: Option<&str>, id: &str) -> Option<AuthSet> {
        self.store.get(&context(tenant), &AuthId::new(id)).await.ok()
    }

    /// Make a request to the router
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Host", "localhost")
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// All `Link` header values, in order
    pub fn links(&self) -> Vec<String> {
        self.headers
            .get_all("link")
            .iter()
            .map(|v| v.to_str().expect("non-ascii link").to_string())
            .collect()
    }
}

/// An unsigned identity token carrying `tenant`
pub fn tenant_token(tenant: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"user-1","tenant":"{tenant}"}}"#));
    format!("{header}.{claims}.signature")
}

/// Request context for direct store access
pub fn context(tenant: Option<&str>) -> RequestContext {
    let ctx = RequestContext::new("test");
    match tenant {
        Some(tenant) => ctx.with_tenant(tenant),
        None => ctx,
    }
}
