use crate::{
    error::RepoResult,
    forms::{EntryInput, TopicInput},
    models::{Entry, Topic, User},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository Trait
///
/// Persistence contract for users, topics and entries. Handlers only see this
/// trait, so the Postgres backend and the in-memory backend are interchangeable.
///
/// Every mutation is scoped by owner at this layer as well: a write that names
/// someone else's topic (or an entry under it) touches nothing and reports
/// `None`/`false`, exactly as if the row did not exist.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- User/Auth ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;

    // --- Topic Retrieval ---
    // Ordered by date_added ascending.
    async fn get_owned_topics(&self, owner: Uuid) -> RepoResult<Vec<Topic>>;
    // Public topics, minus those owned by `exclude_owner`. Ordered by date_added ascending.
    async fn get_public_topics(&self, exclude_owner: Option<Uuid>) -> RepoResult<Vec<Topic>>;
    async fn get_topic(&self, id: i64) -> RepoResult<Option<Topic>>;
    // Lookup filtered by owner: a non-owner gets `None` even if the topic exists.
    async fn get_owned_topic(&self, id: i64, owner: Uuid) -> RepoResult<Option<Topic>>;

    // --- Topic Actions ---
    async fn create_topic(&self, owner: Uuid, input: TopicInput) -> RepoResult<Topic>;
    // Changes text and visibility only; id, owner and date_added stay put.
    async fn update_topic(&self, id: i64, owner: Uuid, input: TopicInput)
    -> RepoResult<Option<Topic>>;
    // Removes the topic and all of its entries.
    async fn delete_topic(&self, id: i64, owner: Uuid) -> RepoResult<bool>;

    // --- Entries ---
    // Ordered by date_added descending.
    async fn get_entries(&self, topic_id: i64) -> RepoResult<Vec<Entry>>;
    async fn get_entry(&self, id: i64) -> RepoResult<Option<Entry>>;
    async fn create_entry(
        &self,
        topic_id: i64,
        owner: Uuid,
        input: EntryInput,
    ) -> RepoResult<Option<Entry>>;
    async fn update_entry(&self, id: i64, owner: Uuid, input: EntryInput)
    -> RepoResult<Option<Entry>>;
    async fn delete_entry(&self, id: i64, owner: Uuid) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const TOPIC_COLUMNS: &str = "id, text, date_added, owner_id, public";

/// PostgresRepository
///
/// The production implementation of `Repository`, backed by PostgreSQL.
/// Cascade on topic deletion is enforced by the `entries.topic_id` foreign key.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_owned_topics(&self, owner: Uuid) -> RepoResult<Vec<Topic>> {
        let query = format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE owner_id = $1 ORDER BY date_added ASC, id ASC"
        );
        let topics = sqlx::query_as::<_, Topic>(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(topics)
    }

    /// get_public_topics
    ///
    /// `$1` is NULL for anonymous visitors, in which case nothing is excluded.
    async fn get_public_topics(&self, exclude_owner: Option<Uuid>) -> RepoResult<Vec<Topic>> {
        let query = format!(
            r#"
            SELECT {TOPIC_COLUMNS}
            FROM topics
            WHERE public = true AND ($1::uuid IS NULL OR owner_id <> $1)
            ORDER BY date_added ASC, id ASC
            "#
        );
        let topics = sqlx::query_as::<_, Topic>(&query)
            .bind(exclude_owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(topics)
    }

    async fn get_topic(&self, id: i64) -> RepoResult<Option<Topic>> {
        let query = format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE id = $1");
        let topic = sqlx::query_as::<_, Topic>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(topic)
    }

    async fn get_owned_topic(&self, id: i64, owner: Uuid) -> RepoResult<Option<Topic>> {
        let query = format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE id = $1 AND owner_id = $2");
        let topic = sqlx::query_as::<_, Topic>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(topic)
    }

    async fn create_topic(&self, owner: Uuid, input: TopicInput) -> RepoResult<Topic> {
        let query = format!(
            r#"
            INSERT INTO topics (text, owner_id, public, date_added)
            VALUES ($1, $2, $3, NOW())
            RETURNING {TOPIC_COLUMNS}
            "#
        );
        let topic = sqlx::query_as::<_, Topic>(&query)
            .bind(input.text)
            .bind(owner)
            .bind(input.public)
            .fetch_one(&self.pool)
            .await?;
        Ok(topic)
    }

    async fn update_topic(
        &self,
        id: i64,
        owner: Uuid,
        input: TopicInput,
    ) -> RepoResult<Option<Topic>> {
        let query = format!(
            r#"
            UPDATE topics
            SET text = $3, public = $4
            WHERE id = $1 AND owner_id = $2
            RETURNING {TOPIC_COLUMNS}
            "#
        );
        let topic = sqlx::query_as::<_, Topic>(&query)
            .bind(id)
            .bind(owner)
            .bind(input.text)
            .bind(input.public)
            .fetch_optional(&self.pool)
            .await?;
        Ok(topic)
    }

    async fn delete_topic(&self, id: i64, owner: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM topics WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_entries(&self, topic_id: i64) -> RepoResult<Vec<Entry>> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, topic_id, text, date_added
            FROM entries
            WHERE topic_id = $1
            ORDER BY date_added DESC, id DESC
            "#,
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn get_entry(&self, id: i64) -> RepoResult<Option<Entry>> {
        let entry = sqlx::query_as::<_, Entry>(
            "SELECT id, topic_id, text, date_added FROM entries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    /// create_entry
    ///
    /// Inserts through a SELECT on the parent topic so the row only appears when
    /// `owner` really owns it.
    async fn create_entry(
        &self,
        topic_id: i64,
        owner: Uuid,
        input: EntryInput,
    ) -> RepoResult<Option<Entry>> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (topic_id, text, date_added)
            SELECT t.id, $3, NOW() FROM topics t WHERE t.id = $1 AND t.owner_id = $2
            RETURNING id, topic_id, text, date_added
            "#,
        )
        .bind(topic_id)
        .bind(owner)
        .bind(input.text)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn update_entry(
        &self,
        id: i64,
        owner: Uuid,
        input: EntryInput,
    ) -> RepoResult<Option<Entry>> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            UPDATE entries e
            SET text = $3
            FROM topics t
            WHERE e.id = $1 AND e.topic_id = t.id AND t.owner_id = $2
            RETURNING e.id, e.topic_id, e.text, e.date_added
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(input.text)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn delete_entry(&self, id: i64, owner: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM entries e
            USING topics t
            WHERE e.id = $1 AND e.topic_id = t.id AND t.owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

// --- In-Memory Backend ---

#[derive(Default)]
struct MemoryStore {
    users: HashMap<Uuid, User>,
    topics: BTreeMap<i64, Topic>,
    entries: BTreeMap<i64, Entry>,
    last_topic_id: i64,
    last_entry_id: i64,
}

impl MemoryStore {
    fn owns(&self, topic_id: i64, owner: Uuid) -> bool {
        self.topics
            .get(&topic_id)
            .is_some_and(|t| t.owner == owner)
    }
}

/// InMemoryRepository
///
/// A process-local `Repository` with the same ordering, owner scoping and cascade
/// rules as the Postgres backend. Used by the test suites and for running the
/// router without a database.
#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<MemoryStore>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.store.write().await.users.insert(user.id, user);
    }

    /// Stores a topic exactly as given (id and timestamp included).
    pub async fn insert_topic(&self, topic: Topic) -> Topic {
        let mut store = self.store.write().await;
        store.last_topic_id = store.last_topic_id.max(topic.id);
        store.topics.insert(topic.id, topic.clone());
        topic
    }

    /// Stores an entry exactly as given. The parent topic is not checked.
    pub async fn insert_entry(&self, entry: Entry) -> Entry {
        let mut store = self.store.write().await;
        store.last_entry_id = store.last_entry_id.max(entry.id);
        store.entries.insert(entry.id, entry.clone());
        entry
    }
}

fn sort_ascending(topics: &mut [Topic]) {
    topics.sort_by(|a, b| (a.date_added, a.id).cmp(&(b.date_added, b.id)));
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.store.read().await.users.get(&id).cloned())
    }

    async fn get_owned_topics(&self, owner: Uuid) -> RepoResult<Vec<Topic>> {
        let store = self.store.read().await;
        let mut topics: Vec<Topic> = store
            .topics
            .values()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect();
        sort_ascending(&mut topics);
        Ok(topics)
    }

    async fn get_public_topics(&self, exclude_owner: Option<Uuid>) -> RepoResult<Vec<Topic>> {
        let store = self.store.read().await;
        let mut topics: Vec<Topic> = store
            .topics
            .values()
            .filter(|t| t.public && Some(t.owner) != exclude_owner)
            .cloned()
            .collect();
        sort_ascending(&mut topics);
        Ok(topics)
    }

    async fn get_topic(&self, id: i64) -> RepoResult<Option<Topic>> {
        Ok(self.store.read().await.topics.get(&id).cloned())
    }

    async fn get_owned_topic(&self, id: i64, owner: Uuid) -> RepoResult<Option<Topic>> {
        let store = self.store.read().await;
        Ok(store.topics.get(&id).filter(|t| t.owner == owner).cloned())
    }

    async fn create_topic(&self, owner: Uuid, input: TopicInput) -> RepoResult<Topic> {
        let mut store = self.store.write().await;
        store.last_topic_id += 1;
        let topic = Topic {
            id: store.last_topic_id,
            text: input.text,
            date_added: Utc::now(),
            owner,
            public: input.public,
        };
        store.topics.insert(topic.id, topic.clone());
        Ok(topic)
    }

    async fn update_topic(
        &self,
        id: i64,
        owner: Uuid,
        input: TopicInput,
    ) -> RepoResult<Option<Topic>> {
        let mut store = self.store.write().await;
        let Some(topic) = store.topics.get_mut(&id).filter(|t| t.owner == owner) else {
            return Ok(None);
        };
        topic.text = input.text;
        topic.public = input.public;
        Ok(Some(topic.clone()))
    }

    async fn delete_topic(&self, id: i64, owner: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        if !store.owns(id, owner) {
            return Ok(false);
        }
        store.topics.remove(&id);
        store.entries.retain(|_, e| e.topic_id != id);
        Ok(true)
    }

    async fn get_entries(&self, topic_id: i64) -> RepoResult<Vec<Entry>> {
        let store = self.store.read().await;
        let mut entries: Vec<Entry> = store
            .entries
            .values()
            .filter(|e| e.topic_id == topic_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| (b.date_added, b.id).cmp(&(a.date_added, a.id)));
        Ok(entries)
    }

    async fn get_entry(&self, id: i64) -> RepoResult<Option<Entry>> {
        Ok(self.store.read().await.entries.get(&id).cloned())
    }

    async fn create_entry(
        &self,
        topic_id: i64,
        owner: Uuid,
        input: EntryInput,
    ) -> RepoResult<Option<Entry>> {
        let mut store = self.store.write().await;
        if !store.owns(topic_id, owner) {
            return Ok(None);
        }
        store.last_entry_id += 1;
        let entry = Entry {
            id: store.last_entry_id,
            topic_id,
            text: input.text,
            date_added: Utc::now(),
        };
        store.entries.insert(entry.id, entry.clone());
        Ok(Some(entry))
    }

    async fn update_entry(
        &self,
        id: i64,
        owner: Uuid,
        input: EntryInput,
    ) -> RepoResult<Option<Entry>> {
        let mut store = self.store.write().await;
        let topic_id = match store.entries.get(&id) {
            Some(entry) => entry.topic_id,
            None => return Ok(None),
        };
        if !store.owns(topic_id, owner) {
            return Ok(None);
        }
        let Some(entry) = store.entries.get_mut(&id) else {
            return Ok(None);
        };
        entry.text = input.text;
        Ok(Some(entry.clone()))
    }

    async fn delete_entry(&self, id: i64, owner: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        let owned = store
            .entries
            .get(&id)
            .is_some_and(|e| store.owns(e.topic_id, owner));
        if owned {
            store.entries.remove(&id);
        }
        Ok(owned)
    }
}
