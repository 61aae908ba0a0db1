//! Page handlers.
//!
//! Each form page is a GET handler (show the form) and a POST handler
//! (validate, then persist and redirect, or re-render with errors). Lookups
//! that fail an ownership or visibility check return `AppError::NotFound`,
//! the same as a missing row.

use crate::{
    AppState, access,
    auth::{AuthUser, Requester},
    error::{AppError, AppResult},
    forms::{BoundForm, EntryForm, TopicForm},
    models::{
        DeleteEntryContext, DeleteTopicContext, EditEntryContext, EditTopicContext, Entry,
        NewEntryContext, NewTopicContext, Topic, TopicContext, TopicsContext,
    },
    render::{Page, redirect},
};
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde_json::json;

pub const INDEX_TEMPLATE: &str = "learning_logs/index.html";
pub const TOPICS_TEMPLATE: &str = "learning_logs/topics.html";
pub const TOPIC_TEMPLATE: &str = "learning_logs/topic.html";
pub const NEW_TOPIC_TEMPLATE: &str = "learning_logs/new_topic.html";
pub const NEW_ENTRY_TEMPLATE: &str = "learning_logs/new_entry.html";
pub const EDIT_TOPIC_TEMPLATE: &str = "learning_logs/edit_topic.html";
pub const EDIT_ENTRY_TEMPLATE: &str = "learning_logs/edit_entry.html";
pub const DELETE_TOPIC_TEMPLATE: &str = "learning_logs/delete_topic.html";
pub const DELETE_ENTRY_TEMPLATE: &str = "learning_logs/delete_entry.html";

fn topic_url(topic_id: i64) -> String {
    format!("/topics/{topic_id}")
}

// --- Lookups ---

/// Loads a topic the user may change. Missing and not-owned look the same.
async fn load_editable_topic(state: &AppState, topic_id: i64, user: &AuthUser) -> AppResult<Topic> {
    let topic = state
        .repo
        .get_topic(topic_id)
        .await?
        .ok_or(AppError::NotFound)?;
    access::ensure_can_edit(&topic, Some(user.id))?;
    Ok(topic)
}

/// Loads an entry together with its parent topic, checking ownership on the topic.
async fn load_editable_entry(
    state: &AppState,
    entry_id: i64,
    user: &AuthUser,
) -> AppResult<(Entry, Topic)> {
    let entry = state
        .repo
        .get_entry(entry_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let topic = load_editable_topic(state, entry.topic_id, user).await?;
    Ok((entry, topic))
}

// --- Read-only pages ---

/// index
///
/// [Public Route] Static landing page.
#[utoipa::path(get, path = "/", responses((status = 200, description = "Landing page")))]
pub async fn index() -> Page<serde_json::Value> {
    Page::new(INDEX_TEMPLATE, json!({}))
}

/// topics
///
/// [Public Route] The requester's own topics, then everyone else's public topics.
/// Anonymous visitors only get the public list.
#[utoipa::path(
    get,
    path = "/topics",
    responses((status = 200, description = "Topic list", body = TopicsContext))
)]
pub async fn topics(
    requester: Requester,
    State(state): State<AppState>,
) -> AppResult<Page<TopicsContext>> {
    let context = match requester.user_id() {
        Some(user_id) => TopicsContext {
            topics: Some(state.repo.get_owned_topics(user_id).await?),
            public_topics: state.repo.get_public_topics(Some(user_id)).await?,
        },
        None => TopicsContext {
            topics: None,
            public_topics: state.repo.get_public_topics(None).await?,
        },
    };

    Ok(Page::new(TOPICS_TEMPLATE, context))
}

/// topic
///
/// [Public Route] One topic and its entries, newest first. Private topics are
/// only visible to their owner; everyone else gets a 404.
#[utoipa::path(
    get,
    path = "/topics/{id}",
    params(("id" = i64, Path, description = "Topic ID")),
    responses(
        (status = 200, description = "Topic page", body = TopicContext),
        (status = 404, description = "Missing, or private and not yours")
    )
)]
pub async fn topic(
    requester: Requester,
    State(state): State<AppState>,
    Path(topic_id): Path<i64>,
) -> AppResult<Page<TopicContext>> {
    let topic = state
        .repo
        .get_topic(topic_id)
        .await?
        .ok_or(AppError::NotFound)?;
    access::ensure_can_view(&topic, requester.user_id())?;

    let entries = state.repo.get_entries(topic.id).await?;
    let is_owner = access::can_edit(&topic, requester.user_id());

    Ok(Page::new(
        TOPIC_TEMPLATE,
        TopicContext {
            topic,
            entries,
            is_owner,
        },
    ))
}

// --- Topic forms ---

/// new_topic_form
///
/// [Authenticated Route] Empty form for a new topic.
#[utoipa::path(
    get,
    path = "/topics/new",
    responses(
        (status = 200, description = "Empty topic form"),
        (status = 302, description = "Redirect to login")
    )
)]
pub async fn new_topic_form(_user: AuthUser) -> Page<NewTopicContext> {
    Page::new(NEW_TOPIC_TEMPLATE, NewTopicContext::default())
}

/// new_topic
///
/// [Authenticated Route] Creates a topic owned by the requester. New topics are
/// private unless the `public` box was ticked.
#[utoipa::path(
    post,
    path = "/topics/new",
    request_body(content = TopicForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Created; redirect to /topics"),
        (status = 200, description = "Form re-rendered with errors")
    )
)]
pub async fn new_topic(
    user: AuthUser,
    State(state): State<AppState>,
    Form(form): Form<TopicForm>,
) -> AppResult<Response> {
    let input = match form.validate_input() {
        Ok(input) => input,
        Err(errors) => {
            let context = NewTopicContext {
                form: BoundForm::rejected(form, errors),
            };
            return Ok(Page::new(NEW_TOPIC_TEMPLATE, context).into_response());
        }
    };

    let topic = state.repo.create_topic(user.id, input).await?;
    tracing::info!(topic_id = topic.id, owner = %user.id, "Topic created");

    Ok(redirect("/topics"))
}

/// edit_topic_form
///
/// [Authenticated Route] Topic form prefilled with the current values.
#[utoipa::path(
    get,
    path = "/topics/{id}/edit",
    params(("id" = i64, Path, description = "Topic ID")),
    responses(
        (status = 200, description = "Prefilled topic form"),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn edit_topic_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path(topic_id): Path<i64>,
) -> AppResult<Page<EditTopicContext>> {
    let topic = load_editable_topic(&state, topic_id, &user).await?;
    let form = BoundForm::unbound(TopicForm::from_topic(&topic));

    Ok(Page::new(EDIT_TOPIC_TEMPLATE, EditTopicContext { topic, form }))
}

/// edit_topic
///
/// [Authenticated Route] Updates the topic's text and visibility in place.
#[utoipa::path(
    post,
    path = "/topics/{id}/edit",
    params(("id" = i64, Path, description = "Topic ID")),
    request_body(content = TopicForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Saved; redirect to the topic"),
        (status = 200, description = "Form re-rendered with errors"),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn edit_topic(
    user: AuthUser,
    State(state): State<AppState>,
    Path(topic_id): Path<i64>,
    Form(form): Form<TopicForm>,
) -> AppResult<Response> {
    let topic = load_editable_topic(&state, topic_id, &user).await?;

    let input = match form.validate_input() {
        Ok(input) => input,
        Err(errors) => {
            let context = EditTopicContext {
                topic,
                form: BoundForm::rejected(form, errors),
            };
            return Ok(Page::new(EDIT_TOPIC_TEMPLATE, context).into_response());
        }
    };

    let updated = state
        .repo
        .update_topic(topic.id, user.id, input)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(topic_id = updated.id, "Topic updated");

    Ok(redirect(topic_url(updated.id)))
}

/// delete_topic_confirm
///
/// [Authenticated Route] Confirmation page. The lookup itself is filtered by
/// owner, so a non-owner never sees the record.
#[utoipa::path(
    get,
    path = "/topics/{id}/delete",
    params(("id" = i64, Path, description = "Topic ID")),
    responses(
        (status = 200, description = "Confirmation page"),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn delete_topic_confirm(
    user: AuthUser,
    State(state): State<AppState>,
    Path(topic_id): Path<i64>,
) -> AppResult<Page<DeleteTopicContext>> {
    let topic = state
        .repo
        .get_owned_topic(topic_id, user.id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Page::new(DELETE_TOPIC_TEMPLATE, DeleteTopicContext { topic }))
}

/// delete_topic
///
/// [Authenticated Route] Deletes the topic and every entry under it.
#[utoipa::path(
    post,
    path = "/topics/{id}/delete",
    params(("id" = i64, Path, description = "Topic ID")),
    responses(
        (status = 302, description = "Deleted; redirect to /topics"),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn delete_topic(
    user: AuthUser,
    State(state): State<AppState>,
    Path(topic_id): Path<i64>,
) -> AppResult<Response> {
    let topic = state
        .repo
        .get_owned_topic(topic_id, user.id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !state.repo.delete_topic(topic.id, user.id).await? {
        // Removed by a concurrent request between the lookup and the delete.
        return Err(AppError::NotFound);
    }
    tracing::info!(topic_id = topic.id, owner = %user.id, "Topic deleted with its entries");

    Ok(redirect("/topics"))
}

// --- Entry forms ---

/// new_entry_form
///
/// [Authenticated Route] Empty entry form under a topic the requester owns.
#[utoipa::path(
    get,
    path = "/topics/{id}/entries/new",
    params(("id" = i64, Path, description = "Topic ID")),
    responses(
        (status = 200, description = "Empty entry form"),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn new_entry_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path(topic_id): Path<i64>,
) -> AppResult<Page<NewEntryContext>> {
    let topic = load_editable_topic(&state, topic_id, &user).await?;

    Ok(Page::new(
        NEW_ENTRY_TEMPLATE,
        NewEntryContext {
            topic,
            form: BoundForm::default(),
        },
    ))
}

/// new_entry
///
/// [Authenticated Route] Adds an entry to the topic named in the path.
#[utoipa::path(
    post,
    path = "/topics/{id}/entries/new",
    params(("id" = i64, Path, description = "Topic ID")),
    request_body(content = EntryForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Created; redirect to the topic"),
        (status = 200, description = "Form re-rendered with errors"),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn new_entry(
    user: AuthUser,
    State(state): State<AppState>,
    Path(topic_id): Path<i64>,
    Form(form): Form<EntryForm>,
) -> AppResult<Response> {
    let topic = load_editable_topic(&state, topic_id, &user).await?;

    let input = match form.validate_input() {
        Ok(input) => input,
        Err(errors) => {
            let context = NewEntryContext {
                topic,
                form: BoundForm::rejected(form, errors),
            };
            return Ok(Page::new(NEW_ENTRY_TEMPLATE, context).into_response());
        }
    };

    let entry = state
        .repo
        .create_entry(topic.id, user.id, input)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(entry_id = entry.id, topic_id = topic.id, "Entry created");

    Ok(redirect(topic_url(topic.id)))
}

/// edit_entry_form
///
/// [Authenticated Route] Entry form prefilled with the current text.
#[utoipa::path(
    get,
    path = "/entries/{id}/edit",
    params(("id" = i64, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Prefilled entry form"),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn edit_entry_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path(entry_id): Path<i64>,
) -> AppResult<Page<EditEntryContext>> {
    let (entry, topic) = load_editable_entry(&state, entry_id, &user).await?;
    let form = BoundForm::unbound(EntryForm::from_entry(&entry));

    Ok(Page::new(
        EDIT_ENTRY_TEMPLATE,
        EditEntryContext { entry, topic, form },
    ))
}

/// edit_entry
///
/// [Authenticated Route] Replaces the entry text; the parent topic is unchanged.
#[utoipa::path(
    post,
    path = "/entries/{id}/edit",
    params(("id" = i64, Path, description = "Entry ID")),
    request_body(content = EntryForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Saved; redirect to the parent topic"),
        (status = 200, description = "Form re-rendered with errors"),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn edit_entry(
    user: AuthUser,
    State(state): State<AppState>,
    Path(entry_id): Path<i64>,
    Form(form): Form<EntryForm>,
) -> AppResult<Response> {
    let (entry, topic) = load_editable_entry(&state, entry_id, &user).await?;

    let input = match form.validate_input() {
        Ok(input) => input,
        Err(errors) => {
            let context = EditEntryContext {
                entry,
                topic,
                form: BoundForm::rejected(form, errors),
            };
            return Ok(Page::new(EDIT_ENTRY_TEMPLATE, context).into_response());
        }
    };

    state
        .repo
        .update_entry(entry.id, user.id, input)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(entry_id = entry.id, "Entry updated");

    Ok(redirect(topic_url(topic.id)))
}

/// delete_entry_confirm
///
/// [Authenticated Route] Confirmation page for removing one entry.
#[utoipa::path(
    get,
    path = "/entries/{id}/delete",
    params(("id" = i64, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Confirmation page"),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn delete_entry_confirm(
    user: AuthUser,
    State(state): State<AppState>,
    Path(entry_id): Path<i64>,
) -> AppResult<Page<DeleteEntryContext>> {
    let (entry, topic) = load_editable_entry(&state, entry_id, &user).await?;

    Ok(Page::new(
        DELETE_ENTRY_TEMPLATE,
        DeleteEntryContext { topic, entry },
    ))
}

/// delete_entry
///
/// [Authenticated Route] Deletes the entry only; the topic and its other entries stay.
#[utoipa::path(
    post,
    path = "/entries/{id}/delete",
    params(("id" = i64, Path, description = "Entry ID")),
    responses(
        (status = 302, description = "Deleted; redirect to the parent topic"),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn delete_entry(
    user: AuthUser,
    State(state): State<AppState>,
    Path(entry_id): Path<i64>,
) -> AppResult<Response> {
    let (entry, topic) = load_editable_entry(&state, entry_id, &user).await?;

    if !state.repo.delete_entry(entry.id, user.id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(entry_id = entry.id, topic_id = topic.id, "Entry deleted");

    Ok(redirect(topic_url(topic.id)))
}
