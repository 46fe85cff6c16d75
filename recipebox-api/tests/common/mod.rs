//! Common test utilities for API tests
//!
//! Builds the full router over a [`MemoryStore`], so these tests run without
//! a database. Requests go through the router in-process.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use recipebox_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig},
};
use recipebox_shared::{
    models::user::{CreateUser, User},
    store::{memory::MemoryStore, Store},
};
use serde_json::Value;
use std::sync::Arc;
use tower::Service as _;

/// Response pieces tests assert on
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// A registered user with a valid token
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }
}

/// Test context containing the router and its store
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: Router,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), test_config());

        Self {
            store,
            app: build_router(state),
        }
    }

    /// Creates a user directly in the store and issues a token for it
    ///
    /// The stored password hash is a placeholder; tests that log in with a
    /// password register through the API instead.
    pub async fn user(&self, email: &str) -> TestUser {
        let user = self
            .store
            .create_user(CreateUser {
                email: email.to_string(),
                name: "Test User".to_string(),
                password_hash: "unused".to_string(),
            })
            .await
            .unwrap();
        let (_, token) = self.store.create_token(user.id).await.unwrap();

        TestUser { user, token }
    }

    /// Sends a request, optionally with a token and a JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&TestUser>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = auth {
            builder = builder.header(header::AUTHORIZATION, user.auth_header());
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.call(request).await
    }

    /// Sends a prepared request
    pub async fn call(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, auth: &TestUser) -> TestResponse {
        self.send(Method::GET, uri, Some(auth), None).await
    }

    pub async fn post(&self, uri: &str, auth: &TestUser, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(auth), Some(body)).await
    }

    /// Creates a recipe through the API and returns its ID
    pub async fn create_recipe(&self, auth: &TestUser, body: Value) -> i64 {
        let response = self.post("/api/recipe/recipes", auth, body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_i64().unwrap()
    }
}

/// Minimal valid recipe body
pub fn recipe_body(title: &str) -> Value {
    serde_json::json!({
        "title": title,
        "time_minutes": 10,
        "price": "5.00",
    })
}
