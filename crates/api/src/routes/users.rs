//! Account route handlers: registration, login, Google sign-in, profile.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::CurrentUser;
use crate::models::User;
use crate::services::auth::{AuthService, AuthSession, Registration};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    address: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    token_id: Option<String>,
}

/// `POST /users/register`
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthSession>)> {
    let session = AuthService::new(state.store(), state.tokens())
        .register(Registration {
            name: body.name,
            email: body.email,
            password: body.password,
            address: body.address,
            phone: body.phone,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// `POST /users/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<AuthSession>> {
    let session = AuthService::new(state.store(), state.tokens())
        .login(body.email, body.password)
        .await?;

    Ok(Json(session))
}

/// `POST /users/google-login`
#[instrument(skip_all)]
pub async fn google_login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GoogleLoginRequest>,
) -> Result<Json<AuthSession>> {
    let session = AuthService::new(state.store(), state.tokens())
        .google_login(state.identity(), body.token_id.as_deref())
        .await?;

    Ok(Json(session))
}

/// `GET /users/me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
