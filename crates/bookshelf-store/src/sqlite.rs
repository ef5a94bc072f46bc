// ABOUTME: SQLite-backed StoryStore holding every story in a single table.
// ABOUTME: Serializes writes through one connection and keeps created_at monotonic across inserts.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bookshelf_core::{Story, StoryDraft};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, Row, params};
use ulid::Ulid;

use crate::store::{PersistenceError, StoryStore};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS stories (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL CHECK (length(trim(title, char(32, 9, 10, 13))) > 0),
        content TEXT NOT NULL CHECK (length(trim(content, char(32, 9, 10, 13))) > 0),
        image_url TEXT,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS stories_created_at ON stories (created_at DESC, seq DESC);";

struct Inner {
    conn: Option<Connection>,
    last_created_at: Option<DateTime<Utc>>,
}

/// A story store on top of one SQLite connection.
///
/// Timestamps are written as fixed-width RFC 3339 with microsecond precision,
/// so ordering the text column orders by time.
#[derive(Clone)]
pub struct SqliteStoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl SqliteStoryStore {
    /// Open or create a story database at the given path, creating parent
    /// directories and the schema as needed.
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::init(conn)
    }

    /// Open a private in-memory database. Contents vanish when the store is dropped.
    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute_batch(SCHEMA)?;

        let last: Option<String> =
            conn.query_row("SELECT MAX(created_at) FROM stories", [], |row| row.get(0))?;
        let last_created_at = last.as_deref().map(parse_timestamp).transpose()?;

        tracing::debug!(?last_created_at, "story store opened");

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                conn: Some(conn),
                last_created_at,
            })),
        })
    }

    async fn with_inner<T, F>(&self, f: F) -> Result<T, PersistenceError>
    where
        F: FnOnce(&mut Inner) -> Result<T, PersistenceError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut guard = inner.lock().map_err(|_| PersistenceError::Poisoned)?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| PersistenceError::Task(e.to_string()))?
    }
}

#[async_trait]
impl StoryStore for SqliteStoryStore {
    async fn list(&self) -> Result<Vec<Story>, PersistenceError> {
        self.with_inner(|inner| {
            let conn = inner.conn.as_ref().ok_or(PersistenceError::Closed)?;
            let mut stmt = conn.prepare(
                "SELECT id, title, content, image_url, created_at
                 FROM stories ORDER BY created_at DESC, seq DESC",
            )?;

            let rows = stmt.query_map([], read_row)?;

            let mut stories = Vec::new();
            for row in rows {
                stories.push(into_story(row?)?);
            }
            Ok(stories)
        })
        .await
    }

    async fn create(&self, draft: StoryDraft) -> Result<Story, PersistenceError> {
        draft.validate()?;

        self.with_inner(move |inner| {
            let conn = inner.conn.as_ref().ok_or(PersistenceError::Closed)?;

            let now = Utc::now().trunc_subsecs(6);
            let created_at = match inner.last_created_at {
                Some(last) if last > now => last,
                _ => now,
            };
            let story = Story::from_draft(draft, created_at);

            conn.execute(
                "INSERT INTO stories (id, title, content, image_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    story.id.to_string(),
                    story.title,
                    story.content,
                    story.image_url,
                    format_timestamp(&story.created_at),
                ],
            )?;

            inner.last_created_at = Some(created_at);
            tracing::debug!(story_id = %story.id, "story persisted");
            Ok(story)
        })
        .await
    }

    async fn close(&self) -> Result<(), PersistenceError> {
        self.with_inner(|inner| match inner.conn.take() {
            Some(conn) => conn.close().map_err(|(_, e)| PersistenceError::Sqlite(e)),
            None => Ok(()),
        })
        .await
    }
}

struct StoryRow {
    id: String,
    title: String,
    content: String,
    image_url: Option<String>,
    created_at: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<StoryRow> {
    Ok(StoryRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        image_url: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn into_story(row: StoryRow) -> Result<Story, PersistenceError> {
    let id = Ulid::from_string(&row.id)
        .map_err(|e| PersistenceError::Corrupt(format!("invalid id {:?}: {}", row.id, e)))?;
    Ok(Story {
        id,
        title: row.title,
        content: row.content,
        image_url: row.image_url,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, PersistenceError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| PersistenceError::Corrupt(format!("invalid created_at {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_core::ValidationError;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let store = SqliteStoryStore::open_in_memory().unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_returns_input_fields_and_generated_ones() {
        let store = SqliteStoryStore::open_in_memory().unwrap();
        let before = Utc::now().trunc_subsecs(6);

        let story = store
            .create(StoryDraft::new("Hello", "World").with_image_url("/uploads/a.png"))
            .await
            .unwrap();

        assert_eq!(story.title, "Hello");
        assert_eq!(story.content, "World");
        assert_eq!(story.image_url.as_deref(), Some("/uploads/a.png"));
        assert!(!story.id.to_string().is_empty());
        assert!(story.created_at >= before);

        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec![story]);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_repeatable() {
        let store = SqliteStoryStore::open_in_memory().unwrap();
        let first = store.create(StoryDraft::new("first", "1")).await.unwrap();
        let second = store.create(StoryDraft::new("second", "2")).await.unwrap();
        let third = store.create(StoryDraft::new("third", "3")).await.unwrap();

        let listed = store.list().await.unwrap();
        let ids: Vec<Ulid> = listed.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);

        // No intervening create: identical result.
        assert_eq!(store.list().await.unwrap(), listed);
    }

    #[tokio::test]
    async fn created_at_never_decreases() {
        let store = SqliteStoryStore::open_in_memory().unwrap();
        let mut previous = None;
        for i in 0..20 {
            let story = store
                .create(StoryDraft::new(format!("t{i}"), "c"))
                .await
                .unwrap();
            if let Some(prev) = previous {
                assert!(story.created_at >= prev);
            }
            previous = Some(story.created_at);
        }
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let store = SqliteStoryStore::open_in_memory().unwrap();

        let tasks = (0..32).map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .create(StoryDraft::new(format!("story {i}"), "body"))
                    .await
                    .unwrap()
            })
        });
        let created: Vec<Story> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let ids: HashSet<Ulid> = created.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), 32);

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 32);
        for pair in listed.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn blank_title_is_rejected_without_partial_write() {
        let store = SqliteStoryStore::open_in_memory().unwrap();

        let result = store.create(StoryDraft::new(" \n", "content")).await;
        assert!(matches!(
            result,
            Err(PersistenceError::Invalid(ValidationError::EmptyTitle))
        ));

        let result = store.create(StoryDraft::new("title", "\t")).await;
        assert!(matches!(
            result,
            Err(PersistenceError::Invalid(ValidationError::EmptyContent))
        ));

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unicode_whitespace_counts_as_blank() {
        let store = SqliteStoryStore::open_in_memory().unwrap();

        for (title, content) in [("\u{3000}", "body"), ("title", "\u{a0}\u{2003}")] {
            let result = store.create(StoryDraft::new(title, content)).await;
            assert!(
                matches!(result, Err(PersistenceError::Invalid(_))),
                "{title:?} / {content:?}: {result:?}"
            );
        }
        assert!(store.list().await.unwrap().is_empty());
    }

    #[test]
    fn schema_checks_refuse_blank_rows_written_directly() {
        let store = SqliteStoryStore::open_in_memory().unwrap();
        let inner = store.inner.lock().unwrap();
        let conn = inner.conn.as_ref().unwrap();

        let result = conn.execute(
            "INSERT INTO stories (id, title, content, image_url, created_at)
             VALUES (?1, ' ', 'body', NULL, '2024-01-01T00:00:00.000000Z')",
            params![Ulid::new().to_string()],
        );
        assert!(result.is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM stories", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn stories_survive_reopen_and_ordering_continues() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("nested").join("stories.db");

        let first = {
            let store = SqliteStoryStore::open(&db_path).unwrap();
            let story = store.create(StoryDraft::new("kept", "on disk")).await.unwrap();
            store.close().await.unwrap();
            story
        };

        let store = SqliteStoryStore::open(&db_path).unwrap();
        let second = store.create(StoryDraft::new("later", "after reopen")).await.unwrap();
        assert!(second.created_at >= first.created_at);

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1], first);
    }

    #[tokio::test]
    async fn closed_store_refuses_operations() {
        let store = SqliteStoryStore::open_in_memory().unwrap();
        store.close().await.unwrap();

        assert!(matches!(store.list().await, Err(PersistenceError::Closed)));
        assert!(matches!(
            store.create(StoryDraft::new("a", "b")).await,
            Err(PersistenceError::Closed)
        ));
        // Closing twice is harmless.
        store.close().await.unwrap();
    }

    #[test]
    fn timestamps_round_trip_at_fixed_width() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T09:30:00.5+02:00")
            .unwrap()
            .with_timezone(&Utc);
        let formatted = format_timestamp(&ts);
        assert_eq!(formatted, "2024-05-01T07:30:00.500000Z");
        assert_eq!(parse_timestamp(&formatted).unwrap(), ts);
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(PersistenceError::Corrupt(_))
        ));
    }
}
