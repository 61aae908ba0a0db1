use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read-only pages that anonymous visitors may open. Private topics are still
/// hidden: `handlers::topic` answers 404 unless the requester owns the topic.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Static landing page.
        .route("/", get(handlers::index))
        // GET /topics
        // The requester's own topics plus other users' public topics.
        .route("/topics", get(handlers::topics))
        // GET /topics/{id}
        // One topic with its entries, newest first.
        .route("/topics/{id}", get(handlers::topic))
}
