/// User account endpoints
///
/// # Endpoints
///
/// - `POST /api/user/create` - Register a new user (public)
/// - `POST /api/user/token` - Exchange credentials for a token (public)
/// - `GET /api/user/me` - The caller's profile
/// - `PUT /api/user/me` - Replace the caller's profile
/// - `PATCH /api/user/me` - Partially update the caller's profile

use super::trim_field;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use recipebox_shared::{
    auth::{context::AuthContext, password},
    models::user::{CreateUser, UpdateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

const BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials";

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,

    /// Write-only
    #[validate(length(min = 5, message = "Ensure this field has at least 5 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 255, message = "Ensure this field has 1 to 255 characters"))]
    pub name: String,
}

/// Profile update request
///
/// Every field is optional here; [`update_me`] enforces the fields a full
/// update needs.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,

    #[validate(length(min = 5, message = "Ensure this field has at least 5 characters"))]
    pub password: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Ensure this field has 1 to 255 characters"))]
    pub name: Option<String>,
}

/// Token request
#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "This field may not be blank"))]
    pub email: String,

    #[validate(length(min = 1, message = "This field may not be blank"))]
    pub password: String,
}

/// Token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Public view of a user
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/user/create
/// Content-Type: application/json
///
/// { "email": "cook@example.com", "password": "secret", "name": "Cook" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed or email already registered
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(mut req): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    trim_field(&mut req.name);
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .store
        .create_user(CreateUser {
            email: req.email,
            name: req.name,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Exchange email and password for an API token
///
/// Each call issues a fresh token; earlier tokens stay valid.
///
/// # Errors
///
/// - `400 Bad Request`: blank fields, unknown email, wrong password or
///   inactive account (all reported the same way)
pub async fn create_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let user = state
        .store
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::field("non_field_errors", BAD_CREDENTIALS))?;

    if !password::verify_password(&req.password, &user.password_hash)? || !user.is_active {
        tracing::debug!(user_id = user.id, "Token request rejected");
        return Err(ApiError::field("non_field_errors", BAD_CREDENTIALS));
    }

    let (token, plaintext) = state.store.create_token(user.id).await?;

    tracing::info!(
        user_id = user.id,
        token_prefix = %token.token_prefix,
        "Token issued"
    );

    Ok(Json(TokenResponse { token: plaintext }))
}

/// The authenticated caller's profile
pub async fn retrieve_me(Extension(auth): Extension<AuthContext>) -> Json<UserResponse> {
    Json(auth.user.into())
}

/// Full profile update; `email` and `name` are required
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let missing: Vec<&str> = [("email", req.email.is_none()), ("name", req.name.is_none())]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::required(&missing));
    }

    apply_update(&state, &auth, req).await
}

/// Partial profile update
pub async fn partial_update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    apply_update(&state, &auth, req).await
}

async fn apply_update(
    state: &AppState,
    auth: &AuthContext,
    mut req: UpdateUserRequest,
) -> ApiResult<Json<UserResponse>> {
    if let Some(name) = req.name.as_mut() {
        trim_field(name);
    }
    req.validate()?;

    let password_hash = req
        .password
        .as_deref()
        .map(password::hash_password)
        .transpose()?;
    let password_changed = password_hash.is_some();

    let user = state
        .store
        .update_user(
            auth.user_id(),
            UpdateUser {
                email: req.email,
                name: req.name,
                password_hash,
                is_active: None,
            },
        )
        .await?
        .ok_or_else(ApiError::not_found)?;

    tracing::info!(user_id = user.id, password_changed, "Profile updated");

    Ok(Json(user.into()))
}
