use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every create/edit/delete page. GET shows the form or confirmation, POST
/// submits it. Ownership is checked per handler; a request for someone else's
/// topic or entry gets the same 404 as a missing one.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Topics ---
        // GET,POST /topics/new
        .route(
            "/topics/new",
            get(handlers::new_topic_form).post(handlers::new_topic),
        )
        // GET,POST /topics/{id}/edit
        .route(
            "/topics/{id}/edit",
            get(handlers::edit_topic_form).post(handlers::edit_topic),
        )
        // GET,POST /topics/{id}/delete
        // The lookup is filtered by owner; POST also removes the topic's entries.
        .route(
            "/topics/{id}/delete",
            get(handlers::delete_topic_confirm).post(handlers::delete_topic),
        )
        // --- Entries ---
        // GET,POST /topics/{id}/entries/new
        .route(
            "/topics/{id}/entries/new",
            get(handlers::new_entry_form).post(handlers::new_entry),
        )
        // GET,POST /entries/{id}/edit
        .route(
            "/entries/{id}/edit",
            get(handlers::edit_entry_form).post(handlers::edit_entry),
        )
        // GET,POST /entries/{id}/delete
        .route(
            "/entries/{id}/delete",
            get(handlers::delete_entry_confirm).post(handlers::delete_entry),
        )
}
