pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{Booking, BookingDetails, Event, EventDetails, EventId};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Events,
    Bookings,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Events => "events",
            Collection::Bookings => "bookings",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new event. A taken slug yields `StoreError::Conflict`.
    async fn insert_event(&self, details: EventDetails) -> StoreResult<Event>;

    /// Replace an event's fields and bump `updated_at`.
    async fn update_event(&self, id: &EventId, details: EventDetails) -> StoreResult<Event>;

    async fn find_event(&self, id: &EventId) -> StoreResult<Option<Event>>;

    async fn find_event_by_slug(&self, slug: &str) -> StoreResult<Option<Event>>;

    /// All events, oldest first.
    async fn list_events(&self) -> StoreResult<Vec<Event>>;

    async fn count_events(&self) -> StoreResult<u64>;

    async fn event_exists(&self, id: &EventId) -> StoreResult<bool>;

    async fn insert_booking(&self, details: BookingDetails) -> StoreResult<Booking>;

    async fn bookings_for_event(&self, event_id: &EventId) -> StoreResult<Vec<Booking>>;
}
