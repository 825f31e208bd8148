//! Bearer-token authentication: signup/login handlers, JWT issuance and
//! verification, and role-gated extractors.
//!
//! The audit actor identity always comes from the verified token claims.
//! Client-supplied headers (`x-forwarded-for`, `x-session-id`) are recorded
//! on audit entries as annotation only and never influence authorization.

use crate::{
    api::AppState,
    config::settings::Settings,
    core::{
        audit::AuditActor,
        user::{self, ROLE_ADMIN, ROLE_RESIDENT},
    },
    entities::user::Model as UserModel,
    errors::{Error, Result},
};
use axum::{
    Json, async_trait,
    extract::{FromRequestParts, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::IntoResponse,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Claims carried in every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: i64,
    /// Username at login time
    pub username: String,
    /// `"resident"` or `"admin"`
    pub role: String,
    /// Expiry as a unix timestamp
    pub exp: i64,
}

/// Signs a token for an authenticated account.
pub fn issue_token(settings: &Settings, account: &UserModel) -> Result<String> {
    let claims = Claims {
        sub: account.id,
        username: account.username.clone(),
        role: account.role.clone(),
        exp: chrono::Utc::now().timestamp() + settings.token_expiry_secs,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(Into::into)
}

/// Verifies a token's signature and expiry, returning its claims.
pub fn verify_token(settings: &Settings, token: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(Into::into)
}

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(Error::Unauthorized)?;
    let token = header.strip_prefix("Bearer ").ok_or(Error::Unauthorized)?;
    verify_token(&state.settings, token)
}

fn header_annotation(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

/// An authenticated resident account.
pub struct ResidentUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for ResidentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let claims = bearer_claims(parts, state)?;
        if claims.role != ROLE_RESIDENT {
            return Err(Error::Forbidden {
                message: "Resident access required".to_string(),
            });
        }
        Ok(ResidentUser(claims))
    }
}

/// An authenticated admin account, carrying the audit actor for the request.
pub struct AdminUser {
    /// Verified token claims
    pub claims: Claims,
    /// Audit actor derived from the claims plus request annotations
    pub actor: AuditActor,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let claims = bearer_claims(parts, state)?;
        if claims.role != ROLE_ADMIN {
            return Err(Error::Forbidden {
                message: "Admin access required".to_string(),
            });
        }

        let actor = AuditActor {
            admin_id: claims.sub,
            ip_address: header_annotation(parts, "x-forwarded-for"),
            session_id: header_annotation(parts, "x-session-id"),
        };

        Ok(AdminUser { claims, actor })
    }
}

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupPayload {
    /// Account email, must be unique
    pub email: String,
    /// Account username, must be unique
    pub username: String,
    /// Plaintext password, hashed before storage
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    /// Account username
    pub username: String,
    /// Plaintext password
    pub password: String,
}

/// `POST /api/auth/signup` - creates a resident account.
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupPayload>,
) -> Result<impl IntoResponse> {
    let account = user::create_user(
        &state.db,
        payload.email,
        payload.username,
        &payload.password,
        ROLE_RESIDENT.to_string(),
        0.0,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Signup successful", "user": account })),
    ))
}

/// `POST /api/auth/login` - verifies credentials and issues a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    let account = user::authenticate(&state.db, &payload.username, &payload.password).await?;
    let token = issue_token(&state.settings, &account)?;

    Ok(Json(json!({ "token": token, "user": account })))
}
