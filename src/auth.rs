use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::AppError,
    repository::RepositoryState,
};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Claims
///
/// Payload of the session token issued by the identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's UUID, looked up in the `users` table.
    pub sub: Uuid,
    /// Expiration Time (exp): tokens past this instant are rejected.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// AuthUser
///
/// A signed-in requester. Using it as a handler argument makes the page
/// login-only: without a valid session the extractor rejects with
/// `AppError::Unauthenticated`, which redirects to the login page and carries
/// the requested path as `next`.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Requester
///
/// The identity behind a request that anonymous visitors may also make.
/// Never rejects for a missing or bad session; it just yields `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Requester(pub Option<AuthUser>);

impl Requester {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.id)
    }
}

impl From<AuthUser> for Requester {
    fn from(user: AuthUser) -> Self {
        Self(Some(user))
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        match resolve_identity(parts, state).await? {
            Some(user) => Ok(user),
            None => Err(AppError::Unauthenticated {
                login_url: format!("{}?next={}", config.login_url, parts.uri.path()),
            }),
        }
    }
}

impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Requester(resolve_identity(parts, state).await?))
    }
}

/// resolve_identity
///
/// Works out who is making the request:
/// 1. In `Env::Local`, an `x-user-id` header naming an existing user wins.
/// 2. Otherwise a session token from `Authorization: Bearer` or the session cookie
///    is decoded (signature and expiry checked).
/// 3. The token subject must still exist in the `users` table.
///
/// `Ok(None)` means anonymous. Only a repository failure is an error.
async fn resolve_identity<S>(parts: &Parts, state: &S) -> Result<Option<AuthUser>, AppError>
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    let repo = RepositoryState::from_ref(state);
    let config = AppConfig::from_ref(state);

    if config.env == Env::Local {
        let bypass_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw).ok());

        if let Some(user_id) = bypass_id {
            if let Some(user) = repo.get_user(user_id).await? {
                return Ok(Some(AuthUser {
                    id: user.id,
                    username: user.username,
                }));
            }
        }
    }

    let Some(token) = session_token(parts) else {
        return Ok(None);
    };

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let claims = match decode::<Claims>(&token, &decoding_key, &validation) {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected session token");
            return Ok(None);
        }
    };

    // A valid token for a deleted account is treated as anonymous.
    let user = repo.get_user(claims.sub).await?;
    Ok(user.map(|user| AuthUser {
        id: user.id,
        username: user.username,
    }))
}

/// Bearer header first, then the session cookie.
fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    let cookie_prefix = format!("{SESSION_COOKIE}=");
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| pair.trim().strip_prefix(cookie_prefix.as_str()))
        .map(str::to_string)
}
