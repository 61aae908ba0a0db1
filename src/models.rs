use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::forms::{BoundForm, EntryForm, TopicForm};

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Mirror of an account issued by the identity provider, stored in the `users` table.
/// Only read here, to confirm that an authenticated id still belongs to a live account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub username: String,
}

/// Topic
///
/// A subject owned by one user, grouping zero or more entries.
/// `public` topics are readable by anyone but still only mutable by their owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Topic {
    pub id: i64,
    pub text: String,
    pub date_added: DateTime<Utc>,

    /// Maps SQL column "owner_id". Set once at creation; ownership never transfers.
    #[sqlx(rename = "owner_id")]
    pub owner: Uuid,

    pub public: bool,
}

/// Entry
///
/// A timestamped text item belonging to exactly one topic.
/// There is no ownership column: the parent topic's owner owns the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Entry {
    pub id: i64,
    pub topic_id: i64,
    pub text: String,
    pub date_added: DateTime<Utc>,
}

// --- Page Contexts (Render Output) ---

/// TopicsContext
///
/// Context for `learning_logs/topics.html`. `topics` is `None` for anonymous visitors.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct TopicsContext {
    pub topics: Option<Vec<Topic>>,
    pub public_topics: Vec<Topic>,
}

/// TopicContext
///
/// Context for `learning_logs/topic.html`. Entries are newest first.
/// `is_owner` drives the new/edit/delete links in the template.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct TopicContext {
    pub topic: Topic,
    pub entries: Vec<Entry>,
    pub is_owner: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewTopicContext {
    pub form: BoundForm<TopicForm>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewEntryContext {
    pub topic: Topic,
    pub form: BoundForm<EntryForm>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EditTopicContext {
    pub topic: Topic,
    pub form: BoundForm<TopicForm>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EditEntryContext {
    pub entry: Entry,
    pub topic: Topic,
    pub form: BoundForm<EntryForm>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeleteTopicContext {
    pub topic: Topic,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeleteEntryContext {
    pub topic: Topic,
    pub entry: Entry,
}
