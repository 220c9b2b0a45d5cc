//! End-to-end test harness for the Platter API.
//!
//! Drives the real router in-process with `tower::ServiceExt::oneshot`
//! against a [`MemoryStore`], with scripted stand-ins for the payment
//! processor and Google. No database or network is needed:
//!
//! ```bash
//! cargo test -p platter-integration-tests
//! ```
//!
//! # Test Suites
//!
//! - `catalog` - Restaurants, menus, ratings, cascade delete
//! - `cart_orders` - Cart merge, checkout, direct submission, cancellation
//! - `payments` - Charge amounts and processor outcomes
//! - `access` - Bearer token gate and account routes

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use platter_api::db::{MemoryStore, UserStore};
use platter_api::models::NewUser;
use platter_api::services::auth::{TokenSigner, hash_password};
use platter_api::services::google::{GoogleIdentity, IdentityError, IdentityVerifier};
use platter_api::services::stripe::{
    ChargeRequest, GatewayError, PaymentGateway, PaymentIntent, PaymentIntentStatus,
};
use platter_api::state::AppState;
use platter_core::Email;

pub use platter_api::db::FailPoint;

const TEST_SECRET: &str = "k7#Qz!p2Vw9@Lm4$Rt8^Xy1&Bn6*Cd3%";

/// What the scripted payment processor answers.
#[derive(Debug, Clone)]
pub enum ChargeScript {
    /// An intent in the given status, with an optional client secret.
    Status(PaymentIntentStatus, Option<String>),
    /// A processor-side refusal with this message.
    Decline(String),
}

/// Payment processor stand-in that records every charge.
#[derive(Debug)]
pub struct ScriptedGateway {
    script: Mutex<ChargeScript>,
    charges: Mutex<Vec<ChargeRequest>>,
}

impl ScriptedGateway {
    fn new() -> Self {
        Self {
            script: Mutex::new(ChargeScript::Status(PaymentIntentStatus::Succeeded, None)),
            charges: Mutex::new(Vec::new()),
        }
    }

    /// Answer every following charge with `script`.
    pub fn respond_with(&self, script: ChargeScript) {
        *self.script.lock().unwrap() = script;
    }

    /// Every charge received so far.
    pub fn charges(&self) -> Vec<ChargeRequest> {
        self.charges.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_and_confirm(
        &self,
        charge: ChargeRequest,
    ) -> Result<PaymentIntent, GatewayError> {
        self.charges.lock().unwrap().push(charge);
        let script = self.script.lock().unwrap().clone();
        match script {
            ChargeScript::Status(status, client_secret) => Ok(PaymentIntent {
                id: "pi_test".to_owned(),
                status,
                client_secret,
            }),
            ChargeScript::Decline(message) => Err(GatewayError::Api {
                status: 402,
                message,
            }),
        }
    }
}

/// Google stand-in: the token `valid:<email>` verifies as that email.
#[derive(Debug, Default)]
pub struct FakeGoogle;

#[async_trait]
impl IdentityVerifier for FakeGoogle {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, IdentityError> {
        let email = id_token
            .strip_prefix("valid:")
            .ok_or(IdentityError::AudienceMismatch)?;
        Ok(GoogleIdentity {
            email: email.to_owned(),
            name: Some("Google User".to_owned()),
            picture: Some("https://lh3.example.com/photo.jpg".to_owned()),
        })
    }
}

/// A parsed HTTP response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// The `message` field of the body.
    #[must_use]
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

/// One isolated API instance.
pub struct TestContext {
    pub store: MemoryStore,
    pub gateway: Arc<ScriptedGateway>,
    pub tokens: TokenSigner,
    app: Router,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Fresh store, fresh router.
    #[must_use]
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let gateway = Arc::new(ScriptedGateway::new());
        let tokens = TokenSigner::new(SecretString::from(TEST_SECRET), Duration::from_secs(3600));

        let state = AppState::new(
            Arc::new(store.clone()),
            tokens.clone(),
            gateway.clone(),
            Arc::new(FakeGoogle),
            "usd",
        );

        Self {
            store,
            gateway,
            tokens,
            app: platter_api::app(state),
        }
    }

    /// Send a request. `body` is sent as JSON when present.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::PUT, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, path, token, None).await
    }

    /// Register through the API and return the bearer token.
    pub async fn register(&self, name: &str, email: &str) -> String {
        let response = self
            .post(
                "/api/users/register",
                None,
                json!({ "name": name, "email": email, "password": "correct horse battery" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["token"].as_str().unwrap().to_owned()
    }

    /// Create an administrator directly in the store and return a token.
    pub async fn admin(&self) -> String {
        let user = self
            .store
            .create_user(NewUser {
                name: "Admin".to_owned(),
                email: Email::parse("admin@platter.test").unwrap(),
                password_hash: hash_password("admin password 123").unwrap(),
                address: None,
                phone: None,
                profile_picture: None,
                is_admin: true,
            })
            .await
            .unwrap();
        self.tokens.issue(user.id).unwrap()
    }

    /// Create a restaurant as `admin` and return its id.
    pub async fn restaurant(&self, admin: &str, name: &str) -> i64 {
        let response = self
            .post(
                "/api/restaurants",
                Some(admin),
                json!({
                    "name": name,
                    "cuisine": "Fusion",
                    "image": "https://cdn.platter.test/r.jpg",
                    "location": "1 Market St",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_i64().unwrap()
    }

    /// Create a menu item as `admin` and return its id.
    pub async fn menu_item(&self, admin: &str, restaurant: i64, name: &str, price: f64) -> i64 {
        let response = self
            .post(
                &format!("/api/restaurants/{restaurant}/menu"),
                Some(admin),
                json!({
                    "name": name,
                    "description": "House special",
                    "price": price,
                    "image": "https://cdn.platter.test/m.jpg",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_i64().unwrap()
    }

    /// Add `quantity` of `item` to the cart behind `token`.
    pub async fn add_to_cart(&self, token: &str, item: i64, quantity: i64) -> TestResponse {
        self.post(
            "/api/cart",
            Some(token),
            json!({ "menuItemId": item, "quantity": quantity }),
        )
        .await
    }
}
