use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Page
///
/// A render directive: which template to draw and the context to draw it with.
/// Template rendering happens outside this service; the directive is sent as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub template: String,
    pub context: T,
}

impl<T> Page<T> {
    pub fn new(template: &str, context: T) -> Self {
        Self {
            template: template.to_string(),
            context,
        }
    }
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// redirect
///
/// `302 Found` to `location`, the status browsers expect after a form post.
pub fn redirect(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}
