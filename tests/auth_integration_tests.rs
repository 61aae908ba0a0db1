use axum::{
    extract::FromRequestParts,
    http::{Request, header, request::Parts},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use learning_log::{
    AppState, InMemoryRepository,
    auth::{AuthUser, Claims, Requester, SESSION_COOKIE},
    config::{AppConfig, Env},
    error::AppError,
    models::User,
    repository::RepositoryState,
};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::test;
use uuid::Uuid;

// --- Helpers ---

const KNOWN_USER: Uuid = Uuid::from_u128(42);

async fn state_with(env: Env) -> AppState {
    let repo = Arc::new(InMemoryRepository::new());
    repo.insert_user(User {
        id: KNOWN_USER,
        username: "ada".to_string(),
    })
    .await;

    AppState {
        repo: repo as RepositoryState,
        config: AppConfig {
            env,
            ..AppConfig::default()
        },
    }
}

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

fn token_for(sub: Uuid, exp: usize, secret: &str) -> String {
    let claims = Claims {
        sub,
        exp,
        iat: now(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn valid_token(state: &AppState, sub: Uuid) -> String {
    token_for(sub, now() + 3600, &state.config.jwt_secret)
}

fn parts(uri: &str, headers: &[(header::HeaderName, String)]) -> Parts {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    builder.body(()).unwrap().into_parts().0
}

// --- AuthUser ---

#[test]
async fn test_bearer_token_authenticates() {
    let state = state_with(Env::Production).await;
    let token = valid_token(&state, KNOWN_USER);
    let mut parts = parts(
        "/topics/new",
        &[(header::AUTHORIZATION, format!("Bearer {token}"))],
    );

    let user = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert_eq!(user.id, KNOWN_USER);
    assert_eq!(user.username, "ada");
}

#[test]
async fn test_session_cookie_authenticates() {
    let state = state_with(Env::Production).await;
    let token = valid_token(&state, KNOWN_USER);
    let mut parts = parts(
        "/topics/new",
        &[(
            header::COOKIE,
            format!("theme=dark; {SESSION_COOKIE}={token}; lang=en"),
        )],
    );

    let user = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert_eq!(user.id, KNOWN_USER);
}

#[test]
async fn test_missing_session_redirects_with_next() {
    let state = state_with(Env::Production).await;
    let mut parts = parts("/topics/3/edit", &[]);

    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    match result {
        Err(AppError::Unauthenticated { login_url }) => {
            assert_eq!(login_url, "/users/login?next=/topics/3/edit");
        }
        other => panic!("expected a login redirect, got {other:?}"),
    }
}

#[test]
async fn test_expired_token_rejected() {
    let state = state_with(Env::Production).await;
    // Well past the default validation leeway.
    let token = token_for(KNOWN_USER, now() - 3600, &state.config.jwt_secret);
    let mut parts = parts(
        "/topics/new",
        &[(header::AUTHORIZATION, format!("Bearer {token}"))],
    );

    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(AppError::Unauthenticated { .. })));
}

#[test]
async fn test_token_signed_with_other_secret_rejected() {
    let state = state_with(Env::Production).await;
    let token = token_for(KNOWN_USER, now() + 3600, "not-the-server-secret");
    let mut parts = parts(
        "/topics/new",
        &[(header::AUTHORIZATION, format!("Bearer {token}"))],
    );

    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(AppError::Unauthenticated { .. })));
}

#[test]
async fn test_token_for_unknown_user_rejected() {
    let state = state_with(Env::Production).await;
    let token = valid_token(&state, Uuid::from_u128(7));
    let mut parts = parts(
        "/topics/new",
        &[(header::AUTHORIZATION, format!("Bearer {token}"))],
    );

    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(AppError::Unauthenticated { .. })));
}

// --- Local Bypass ---

#[test]
async fn test_user_id_header_accepted_locally() {
    let state = state_with(Env::Local).await;
    let mut parts = parts(
        "/topics/new",
        &[(
            header::HeaderName::from_static("x-user-id"),
            KNOWN_USER.to_string(),
        )],
    );

    let user = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert_eq!(user.id, KNOWN_USER);
}

#[test]
async fn test_user_id_header_ignored_in_production() {
    let state = state_with(Env::Production).await;
    let mut parts = parts(
        "/topics/new",
        &[(
            header::HeaderName::from_static("x-user-id"),
            KNOWN_USER.to_string(),
        )],
    );

    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(AppError::Unauthenticated { .. })));
}

// --- Requester ---

#[test]
async fn test_requester_is_anonymous_without_session() {
    let state = state_with(Env::Production).await;
    let mut parts = parts("/topics", &[]);

    let requester = Requester::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert_eq!(requester, Requester::anonymous());
    assert_eq!(requester.user_id(), None);
}

#[test]
async fn test_requester_ignores_bad_token() {
    let state = state_with(Env::Production).await;
    let mut parts = parts(
        "/topics",
        &[(header::AUTHORIZATION, "Bearer garbage".to_string())],
    );

    let requester = Requester::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert_eq!(requester.user_id(), None);
}

#[test]
async fn test_requester_carries_signed_in_user() {
    let state = state_with(Env::Production).await;
    let token = valid_token(&state, KNOWN_USER);
    let mut parts = parts(
        "/topics",
        &[(header::AUTHORIZATION, format!("Bearer {token}"))],
    );

    let requester = Requester::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert_eq!(requester.user_id(), Some(KNOWN_USER));
}
