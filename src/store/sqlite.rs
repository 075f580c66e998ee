use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::debug;

use super::{Collection, RecordStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{Booking, BookingDetails, BookingId, Event, EventDetails, EventId};
use crate::utils;

const EVENT_COLUMNS: &str = "id, payload, created_at, updated_at";
const BOOKING_COLUMNS: &str = "id, event_id, email, created_at, updated_at";

/// SQLite-backed store. Event fields live in a JSON payload beside the
/// indexed `slug` column; bookings are plain columns.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        utils::ensure_parent(path);
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened sqlite store");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn call<T, F>(&self, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("sqlite connection mutex poisoned".into()))?;
            work(&guard)
        })
        .await
        .map_err(|err| StoreError::Unavailable(err.to_string()))?
    }
}

fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS events(
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS bookings(
            id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL,
            email TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_bookings_event_id ON bookings(event_id);",
    )?;
    Ok(())
}

fn slug_conflict(err: rusqlite::Error, slug: &str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict {
                collection: Collection::Events,
                field: "slug",
                value: slug.to_string(),
            }
        }
        other => StoreError::Database(other),
    }
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    let payload: String = row.get(1)?;
    let details: EventDetails = serde_json::from_str(&payload).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            payload.len(),
            rusqlite::types::Type::Text,
            Box::new(err),
        )
    })?;
    Ok(Event {
        id: EventId(row.get(0)?),
        details,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn booking_from_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: BookingId(row.get(0)?),
        details: BookingDetails {
            event_id: EventId(row.get(1)?),
            email: row.get(2)?,
        },
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn load_event(conn: &Connection, id: &str) -> StoreResult<Option<Event>> {
    let event = conn
        .query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
            params![id],
            event_from_row,
        )
        .optional()?;
    Ok(event)
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert_event(&self, details: EventDetails) -> StoreResult<Event> {
        let payload = serde_json::to_string(&details)?;
        let now: DateTime<Utc> = Utc::now();
        let event = Event {
            id: EventId::new(),
            details,
            created_at: now,
            updated_at: now,
        };
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO events (id, slug, payload, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![event.id.as_str(), event.details.slug, payload, now],
            )
            .map_err(|err| slug_conflict(err, &event.details.slug))?;
            Ok(event)
        })
        .await
    }

    async fn update_event(&self, id: &EventId, details: EventDetails) -> StoreResult<Event> {
        let payload = serde_json::to_string(&details)?;
        let id = id.clone();
        self.call(move |conn| {
            let now: DateTime<Utc> = Utc::now();
            let changed = conn
                .execute(
                    "UPDATE events SET slug = ?2, payload = ?3, updated_at = ?4 WHERE id = ?1",
                    params![id.as_str(), details.slug, payload, now],
                )
                .map_err(|err| slug_conflict(err, &details.slug))?;
            if changed == 0 {
                return Err(StoreError::NotFound {
                    collection: Collection::Events,
                    id: id.to_string(),
                });
            }
            load_event(conn, id.as_str())?.ok_or_else(|| StoreError::NotFound {
                collection: Collection::Events,
                id: id.to_string(),
            })
        })
        .await
    }

    async fn find_event(&self, id: &EventId) -> StoreResult<Option<Event>> {
        let id = id.clone();
        self.call(move |conn| load_event(conn, id.as_str())).await
    }

    async fn find_event_by_slug(&self, slug: &str) -> StoreResult<Option<Event>> {
        let slug = slug.to_string();
        self.call(move |conn| {
            let event = conn
                .query_row(
                    &format!("SELECT {EVENT_COLUMNS} FROM events WHERE slug = ?1"),
                    params![slug],
                    event_from_row,
                )
                .optional()?;
            Ok(event)
        })
        .await
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        self.call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at, rowid"
            ))?;
            let rows = stmt.query_map([], event_from_row)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
    }

    async fn count_events(&self) -> StoreResult<u64> {
        self.call(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn event_exists(&self, id: &EventId) -> StoreResult<bool> {
        let id = id.clone();
        self.call(move |conn| {
            let found: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM events WHERE id = ?1)",
                params![id.as_str()],
                |row| row.get(0),
            )?;
            Ok(found)
        })
        .await
    }

    async fn insert_booking(&self, details: BookingDetails) -> StoreResult<Booking> {
        let now: DateTime<Utc> = Utc::now();
        let booking = Booking {
            id: BookingId::new(),
            details,
            created_at: now,
            updated_at: now,
        };
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO bookings (id, event_id, email, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![
                    booking.id.as_str(),
                    booking.details.event_id.as_str(),
                    booking.details.email,
                    now
                ],
            )?;
            Ok(booking)
        })
        .await
    }

    async fn bookings_for_event(&self, event_id: &EventId) -> StoreResult<Vec<Booking>> {
        let event_id = event_id.clone();
        self.call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE event_id = ?1 ORDER BY created_at, rowid"
            ))?;
            let rows = stmt.query_map(params![event_id.as_str()], booking_from_row)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{build_event, tests::sample_draft};

    fn details(title: &str) -> EventDetails {
        build_event(&sample_draft(title), chrono_tz::UTC).expect("valid draft")
    }

    #[tokio::test]
    async fn round_trips_events() {
        let store = SqliteStore::open_in_memory().unwrap();
        let created = store.insert_event(details("Round Trip")).await.unwrap();

        let by_id = store.find_event(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.details, created.details);
        assert_eq!(by_id.created_at, created.created_at);

        let by_slug = store.find_event_by_slug("round-trip").await.unwrap().unwrap();
        assert_eq!(by_slug.id, created.id);
        assert!(store.event_exists(&created.id).await.unwrap());
        assert!(!store.event_exists(&EventId::from("missing")).await.unwrap());
        assert_eq!(store.count_events().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unique_slug_index_rejects_duplicates() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_event(details("Same Title")).await.unwrap();
        let err = store.insert_event(details("Same   Title!")).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict { collection: Collection::Events, field: "slug", .. }
        ));
        assert_eq!(store.count_events().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_rejects_slug_taken_by_another_event() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_event(details("First")).await.unwrap();
        let second = store.insert_event(details("Second")).await.unwrap();

        let mut renamed = second.details.clone();
        renamed.title = "First".into();
        renamed.slug = "first".into();
        let err = store.update_event(&second.id, renamed).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn update_of_unknown_event_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .update_event(&EventId::from("nope"), details("Ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn bookings_are_listed_per_event() {
        let store = SqliteStore::open_in_memory().unwrap();
        let event = store.insert_event(details("Booked")).await.unwrap();
        let other = store.insert_event(details("Other")).await.unwrap();
        for email in ["a@example.com", "b@example.com"] {
            store
                .insert_booking(BookingDetails {
                    event_id: event.id.clone(),
                    email: email.to_string(),
                })
                .await
                .unwrap();
        }

        let bookings = store.bookings_for_event(&event.id).await.unwrap();
        let emails: Vec<_> = bookings.iter().map(|b| b.details.email.as_str()).collect();
        assert_eq!(emails, vec!["a@example.com", "b@example.com"]);
        assert!(store.bookings_for_event(&other.id).await.unwrap().is_empty());
    }
}
