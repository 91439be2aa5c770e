use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    guard::AuthState,
    models::{Role, User},
    repository::RepositoryState,
};

/// Cookie carrying the access token for browser navigations, which cannot set headers.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Local-only header that authenticates as an existing user id.
pub const DEV_USER_HEADER: &str = "x-user-id";

/// Claims
///
/// Payload of the HS256 access token issued by the external auth provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the profile id looked up in the repository.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// Why a request could not be tied to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No Authorization header and no access-token cookie.
    MissingCredentials,
    /// Token present but malformed, badly signed, or expired.
    InvalidToken,
    /// Token valid, but its subject has no profile (yet).
    UnknownUser,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Rejects with 401 on any failure.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub user: User,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id(),
            role: user.role(),
            user,
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    if let Some(value) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        return value.strip_prefix("Bearer ").map(str::to_string);
    }
    CookieJar::from_headers(&parts.headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

fn dev_user_id(parts: &Parts) -> Option<Uuid> {
    parts
        .headers
        .get(DEV_USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|id| Uuid::parse_str(id).ok())
}

/// Decodes and validates a token against `secret`, returning its subject.
pub fn decode_subject(token: &str, secret: &str) -> Result<Uuid, AuthFailure> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims.sub),
        Err(e) => {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                other => tracing::debug!(kind = ?other, "rejected token"),
            }
            Err(AuthFailure::InvalidToken)
        }
    }
}

/// resolve_user
///
/// 1. Local bypass via `x-user-id` (only honoured in `Env::Local`, user must exist).
/// 2. Bearer header, falling back to the access-token cookie.
/// 3. Repository lookup of the token subject.
pub async fn resolve_user(
    parts: &Parts,
    repo: &RepositoryState,
    config: &AppConfig,
) -> Result<User, AuthFailure> {
    if config.env == Env::Local {
        if let Some(user_id) = dev_user_id(parts) {
            if let Some(user) = repo.get_user(user_id).await {
                return Ok(user);
            }
        }
    }
    // Production, or the bypass did not resolve: standard token flow.

    let token = bearer_token(parts).ok_or(AuthFailure::MissingCredentials)?;
    let user_id = decode_subject(&token, &config.jwt_secret)?;

    repo.get_user(user_id).await.ok_or(AuthFailure::UnknownUser)
}

/// resolve_subject
///
/// The id a request claims, without requiring a profile behind it. The local
/// `x-user-id` header is taken at face value; otherwise the token must validate.
pub fn resolve_subject(parts: &Parts, config: &AppConfig) -> Result<Uuid, AuthFailure> {
    if config.env == Env::Local {
        if let Some(user_id) = dev_user_id(parts) {
            return Ok(user_id);
        }
    }

    let token = bearer_token(parts).ok_or(AuthFailure::MissingCredentials)?;
    decode_subject(&token, &config.jwt_secret)
}

/// resolve_auth_state
///
/// The request-side view of the session for the route guard. A request is never
/// `Loading`: the lookup has completed by the time this returns.
pub async fn resolve_auth_state(parts: &Parts, repo: &RepositoryState, config: &AppConfig) -> AuthState {
    match resolve_user(parts, repo, config).await {
        Ok(user) => AuthState::Authenticated(Some(user)),
        Err(AuthFailure::UnknownUser) => AuthState::Authenticated(None),
        Err(AuthFailure::MissingCredentials | AuthFailure::InvalidToken) => {
            AuthState::Unauthenticated
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        resolve_user(parts, &repo, &config)
            .await
            .map(AuthUser::from)
            .map_err(|_| StatusCode::UNAUTHORIZED)
    }
}

/// TokenSubject
///
/// A validated token subject that may not have a profile yet. Rejects with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSubject(pub Uuid);

impl<S> FromRequestParts<S> for TokenSubject
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        resolve_subject(parts, &config)
            .map(TokenSubject)
            .map_err(|_| StatusCode::UNAUTHORIZED)
    }
}
