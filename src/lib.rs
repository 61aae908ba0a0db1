use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod render;
pub mod repository;

// Public pages and login-only pages.
pub mod routes;
use auth::AuthUser;
use error::AppError;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI description of the page routes, served at `/api-docs/openapi.json`
/// and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::index, handlers::topics, handlers::topic,
        handlers::new_topic_form, handlers::new_topic,
        handlers::edit_topic_form, handlers::edit_topic,
        handlers::delete_topic_confirm, handlers::delete_topic,
        handlers::new_entry_form, handlers::new_entry,
        handlers::edit_entry_form, handlers::edit_entry,
        handlers::delete_entry_confirm, handlers::delete_entry,
    ),
    components(
        schemas(
            models::Topic, models::Entry, models::TopicsContext, models::TopicContext,
            forms::TopicForm, forms::EntryForm,
        )
    ),
    tags(
        (name = "learning-log", description = "Learning Log pages")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a handler may need, cloned per request. Holds no mutable state
/// of its own; all writes go through the repository.
#[derive(Clone)]
pub struct AppState {
    /// Persistence behind the `Repository` trait (Postgres in production).
    pub repo: RepositoryState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the login-only router. Extracting `AuthUser` is the whole check:
/// when it fails, its rejection (a redirect to the login page) is returned
/// and the handler never runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routes, middleware and shared state.
pub fn create_router(state: AppState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .fallback(|| async { AppError::NotFound })
        .with_state(state);

    // Request id first, so the trace span can record it.
    base_router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Span for one request, tagged with method, uri and the `x-request-id` value
/// so all of its log lines can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
