mod common;

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, Method, Request, StatusCode, Uri, header, request::Parts},
};
use common::{
    INSTRUCTOR_ID, STUDENT_ID, TEST_JWT_SECRET, create_app_state, create_token, seeded_users,
};
use course_portal::{
    AppState, InMemoryRepository,
    auth::{
        ACCESS_TOKEN_COOKIE, AuthFailure, AuthUser, DEV_USER_HEADER, TokenSubject, decode_subject,
        resolve_auth_state,
    },
    config::Env,
    guard::AuthState,
    models::Role,
};
use std::path::Path;
use uuid::Uuid;

fn app_state(env: Env) -> AppState {
    create_app_state(
        env,
        InMemoryRepository::with_users(seeded_users()),
        Path::new("dist/public"),
    )
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn parts_with_bearer(token: &str) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    parts
}

// --- AuthUser extractor ---

#[tokio::test]
async fn valid_jwt_resolves_the_user() {
    let state = app_state(Env::Production);
    let mut parts = parts_with_bearer(&create_token(STUDENT_ID, 3600));

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(auth_user.id, STUDENT_ID);
    assert_eq!(auth_user.role, Role::Student);
    assert_eq!(auth_user.user.email(), "student@example.com");
}

#[tokio::test]
async fn access_token_cookie_is_accepted() {
    let state = app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/dashboard".parse().unwrap());
    let cookie = format!("{ACCESS_TOKEN_COOKIE}={}", create_token(INSTRUCTOR_ID, 3600));
    parts
        .headers
        .insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(auth_user.role, Role::Instructor);
}

#[tokio::test]
async fn missing_credentials_are_rejected() {
    let state = app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let result = AuthUser::from_request_parts(&mut parts, &state).await;

    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_bearer_authorization_is_rejected() {
    let state = app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts
        .headers
        .insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));

    let result = AuthUser::from_request_parts(&mut parts, &state).await;

    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_jwt_is_rejected() {
    let state = app_state(Env::Production);
    // Well past the default validation leeway.
    let mut parts = parts_with_bearer(&create_token(STUDENT_ID, -3600));

    let result = AuthUser::from_request_parts(&mut parts, &state).await;

    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_unknown_user_is_rejected() {
    let state = app_state(Env::Production);
    let mut parts = parts_with_bearer(&create_token(Uuid::new_v4(), 3600));

    let result = AuthUser::from_request_parts(&mut parts, &state).await;

    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn local_bypass_success() {
    let state = app_state(Env::Local);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        DEV_USER_HEADER,
        HeaderValue::from_str(&INSTRUCTOR_ID.to_string()).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(auth_user.id, INSTRUCTOR_ID);
    assert_eq!(auth_user.role, Role::Instructor);
}

#[tokio::test]
async fn local_bypass_disabled_in_prod() {
    let state = app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        DEV_USER_HEADER,
        HeaderValue::from_str(&INSTRUCTOR_ID.to_string()).unwrap(),
    );

    let result = AuthUser::from_request_parts(&mut parts, &state).await;

    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

// --- Token decoding ---

#[test]
fn decode_subject_rejects_a_foreign_secret() {
    let token = create_token(STUDENT_ID, 3600);

    assert_eq!(decode_subject(&token, TEST_JWT_SECRET), Ok(STUDENT_ID));
    assert_eq!(
        decode_subject(&token, "some-other-secret"),
        Err(AuthFailure::InvalidToken)
    );
    assert_eq!(
        decode_subject("not-a-jwt", TEST_JWT_SECRET),
        Err(AuthFailure::InvalidToken)
    );
}

// --- AuthState resolution for the page guard ---

#[tokio::test]
async fn auth_state_without_credentials_is_unauthenticated() {
    let state = app_state(Env::Production);
    let parts = get_request_parts(Method::GET, "/dashboard".parse().unwrap());

    let auth = resolve_auth_state(&parts, &state.repo, &state.config).await;

    assert_eq!(auth, AuthState::Unauthenticated);
}

#[tokio::test]
async fn auth_state_with_bad_token_is_unauthenticated() {
    let state = app_state(Env::Production);
    let parts = parts_with_bearer("garbage");

    let auth = resolve_auth_state(&parts, &state.repo, &state.config).await;

    assert_eq!(auth, AuthState::Unauthenticated);
}

#[tokio::test]
async fn auth_state_for_unprovisioned_user_has_no_user() {
    let state = app_state(Env::Production);
    let parts = parts_with_bearer(&create_token(Uuid::new_v4(), 3600));

    let auth = resolve_auth_state(&parts, &state.repo, &state.config).await;

    assert_eq!(auth, AuthState::Authenticated(None));
}

#[tokio::test]
async fn auth_state_for_known_user_carries_the_user() {
    let state = app_state(Env::Production);
    let parts = parts_with_bearer(&create_token(STUDENT_ID, 3600));

    let auth = resolve_auth_state(&parts, &state.repo, &state.config).await;

    assert_eq!(auth.user().map(|u| u.id()), Some(STUDENT_ID));
}

// --- TokenSubject extractor ---

#[tokio::test]
async fn token_subject_does_not_need_a_profile() {
    let state = app_state(Env::Production);
    let new_id = Uuid::new_v4();
    let mut parts = parts_with_bearer(&create_token(new_id, 3600));

    let subject = TokenSubject::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(subject, TokenSubject(new_id));
}

#[tokio::test]
async fn token_subject_rejects_expired_tokens() {
    let state = app_state(Env::Production);
    let mut parts = parts_with_bearer(&create_token(Uuid::new_v4(), -3600));

    let result = TokenSubject::from_request_parts(&mut parts, &state).await;

    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_subject_dev_header_is_local_only() {
    let new_id = Uuid::new_v4();
    let header_value = HeaderValue::from_str(&new_id.to_string()).unwrap();

    let mut local = get_request_parts(Method::POST, "/api/me/profile".parse().unwrap());
    local.headers.insert(DEV_USER_HEADER, header_value.clone());
    let subject = TokenSubject::from_request_parts(&mut local, &app_state(Env::Local))
        .await
        .unwrap();
    assert_eq!(subject, TokenSubject(new_id));

    let mut prod = get_request_parts(Method::POST, "/api/me/profile".parse().unwrap());
    prod.headers.insert(DEV_USER_HEADER, header_value);
    let result = TokenSubject::from_request_parts(&mut prod, &app_state(Env::Production)).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}
