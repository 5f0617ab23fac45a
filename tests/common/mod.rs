use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use quote_api::{
    auth::{AuthConfig, CredentialVerifier, JwtIssuer, JwtVerifier},
    build_router,
    config::AppConfig,
    db, AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Helper harness for spinning up the application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.api_default_page_size = 25;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let auth_cfg = AuthConfig::from(&cfg);
        let token = JwtIssuer::new(&auth_cfg)
            .issue(
                "api",
                Some("Quote app"),
                Some("dynamic"),
                chrono::Duration::hours(1),
            )
            .expect("issue test token")
            .token;
        let verifier: Arc<dyn CredentialVerifier> = Arc::new(JwtVerifier::new(&auth_cfg));

        let state = AppState::new(Arc::new(pool), cfg);
        let router = build_router(state.clone(), verifier);

        Self {
            router,
            state,
            token,
        }
    }

    /// Access the bearer token minted for the test client.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Mint a token with a custom lifetime, negative for an already expired one.
    pub fn token_with_ttl(&self, ttl: chrono::Duration) -> String {
        JwtIssuer::new(&AuthConfig::from(&self.state.config))
            .issue("api", None, None, ttl)
            .expect("issue custom token")
            .token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Authenticated request that returns the status with the decoded JSON body.
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request_authenticated(method, uri, body).await;
        let status = response.status();
        (status, response_json(response).await)
    }

    /// Creates a submission from `payload` and returns its body, asserting 201.
    pub async fn create_submission(&self, payload: Value) -> Value {
        let (status, body) = self
            .call(Method::POST, "/api/client/quote_submissions", Some(payload))
            .await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", body);
        body
    }
}

/// Reads the whole body as JSON; an empty body decodes to `null`.
pub async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("response body is json")
}

/// A complete payload with two shipment items, wrapped the way form clients send it.
#[allow(dead_code)]
pub fn full_payload() -> Value {
    json!({
        "quote_submission": {
            "contact_attributes": {
                "name": "Joean",
                "email": "joeann@gmail.com",
                "phone_number": "0972223334"
            },
            "pickup_address_attributes": {
                "name": "Wat Phnom",
                "lat": "11.5659647",
                "lon": "104.9150842"
            },
            "delivery_address_attributes": {
                "name": "Sen Monorom",
                "lat": 12.4589157,
                "lon": 106.9775092
            },
            "shipment_items_attributes": [
                {"width": 40, "length": 20, "height": 35, "weight": 30, "weight_unit": "kg", "dimension_unit": "cm", "number_of_item": 1},
                {"width": "10.5", "length": "5", "height": "2", "weight": "1.25"}
            ]
        }
    })
}
