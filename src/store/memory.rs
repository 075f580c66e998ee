use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{Collection, RecordStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{Booking, BookingDetails, BookingId, Event, EventDetails, EventId};

#[derive(Debug, Default)]
struct Tables {
    events: Vec<Event>,
    bookings: Vec<Booking>,
}

/// Process-local store backed by vectors behind a mutex.
///
/// Enforces the same unique slug index as the SQLite adapter.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))
    }
}

fn slug_taken(tables: &Tables, slug: &str, except: Option<&EventId>) -> bool {
    tables
        .events
        .iter()
        .any(|event| event.details.slug == slug && Some(&event.id) != except)
}

fn conflict(slug: &str) -> StoreError {
    StoreError::Conflict {
        collection: Collection::Events,
        field: "slug",
        value: slug.to_string(),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_event(&self, details: EventDetails) -> StoreResult<Event> {
        let mut tables = self.lock()?;
        if slug_taken(&tables, &details.slug, None) {
            return Err(conflict(&details.slug));
        }
        let now = Utc::now();
        let event = Event {
            id: EventId::new(),
            details,
            created_at: now,
            updated_at: now,
        };
        tables.events.push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, id: &EventId, details: EventDetails) -> StoreResult<Event> {
        let mut tables = self.lock()?;
        if slug_taken(&tables, &details.slug, Some(id)) {
            return Err(conflict(&details.slug));
        }
        let event = tables
            .events
            .iter_mut()
            .find(|event| &event.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: Collection::Events,
                id: id.to_string(),
            })?;
        event.details = details;
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    async fn find_event(&self, id: &EventId) -> StoreResult<Option<Event>> {
        let tables = self.lock()?;
        Ok(tables.events.iter().find(|event| &event.id == id).cloned())
    }

    async fn find_event_by_slug(&self, slug: &str) -> StoreResult<Option<Event>> {
        let tables = self.lock()?;
        Ok(tables
            .events
            .iter()
            .find(|event| event.details.slug == slug)
            .cloned())
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        Ok(self.lock()?.events.clone())
    }

    async fn count_events(&self) -> StoreResult<u64> {
        Ok(self.lock()?.events.len() as u64)
    }

    async fn event_exists(&self, id: &EventId) -> StoreResult<bool> {
        Ok(self.lock()?.events.iter().any(|event| &event.id == id))
    }

    async fn insert_booking(&self, details: BookingDetails) -> StoreResult<Booking> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let booking = Booking {
            id: BookingId::new(),
            details,
            created_at: now,
            updated_at: now,
        };
        tables.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn bookings_for_event(&self, event_id: &EventId) -> StoreResult<Vec<Booking>> {
        let tables = self.lock()?;
        Ok(tables
            .bookings
            .iter()
            .filter(|booking| &booking.details.event_id == event_id)
            .cloned()
            .collect())
    }
}
