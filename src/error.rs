use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::render::{Page, redirect};

/// RepositoryError
///
/// Failure at the persistence boundary. Only the Postgres backend produces these.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience alias for repository return values.
pub type RepoResult<T> = Result<T, RepositoryError>;

/// AppError
///
/// Every way a request can end short of a render or a redirect it chose itself.
/// A rejected form submission is not an error: the handler re-renders the form.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The resource does not exist, or exists but the requester may not see it.
    /// Both cases produce the same response so private topics stay invisible.
    #[error("Not found")]
    NotFound,

    /// A login-only page was requested without a valid session.
    /// `login_url` already carries the `next` parameter.
    #[error("Login required")]
    Unauthenticated { login_url: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Page::new("404.html", json!({}))).into_response()
            }
            AppError::Unauthenticated { login_url } => redirect(login_url),
            AppError::Repository(err) => {
                tracing::error!(error = %err, "Repository failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Page::new("500.html", json!({})),
                )
                    .into_response()
            }
        }
    }
}
