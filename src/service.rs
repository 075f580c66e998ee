use std::sync::Arc;

use chrono_tz::Tz;
use tracing::{debug, info, instrument, warn};

use crate::booking::{build_booking, check_event_reference};
use crate::error::{RecordResult, StoreError};
use crate::event::{apply_patch, build_event};
use crate::models::{Booking, BookingDraft, Event, EventDraft, EventId, EventPatch};
use crate::samples::sample_events;
use crate::store::{Collection, RecordStore};

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn RecordStore>,
    timezone: Tz,
}

impl EventService {
    pub fn new(store: Arc<dyn RecordStore>, timezone: Tz) -> Self {
        Self { store, timezone }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    #[instrument(skip_all, fields(title = %draft.title))]
    pub async fn create_event(&self, draft: EventDraft) -> RecordResult<Event> {
        let details = build_event(&draft, self.timezone)?;
        let event = self.store.insert_event(details).await?;
        info!(id = %event.id, slug = %event.slug(), "event created");
        Ok(event)
    }

    #[instrument(skip_all, fields(id = %id))]
    pub async fn update_event(&self, id: &EventId, patch: EventPatch) -> RecordResult<Event> {
        let current = self
            .store
            .find_event(id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: Collection::Events,
                id: id.to_string(),
            })?;
        let details = apply_patch(&current.details, &patch, self.timezone)?;
        if details == current.details {
            debug!("no field changed");
            return Ok(current);
        }
        let event = self.store.update_event(id, details).await?;
        info!(slug = %event.slug(), "event updated");
        Ok(event)
    }

    pub async fn event_by_slug(&self, slug: &str) -> RecordResult<Option<Event>> {
        Ok(self.store.find_event_by_slug(slug).await?)
    }

    pub async fn list_events(&self) -> RecordResult<Vec<Event>> {
        Ok(self.store.list_events().await?)
    }

    /// Validate, confirm the event exists, then persist, in that order.
    #[instrument(skip_all, fields(event_id = %draft.event_id))]
    pub async fn create_booking(&self, draft: BookingDraft) -> RecordResult<Booking> {
        let details = build_booking(&draft)?;
        if let Err(err) = check_event_reference(self.store.as_ref(), &details.event_id).await {
            warn!(%err, "booking rejected");
            return Err(err);
        }
        let booking = self.store.insert_booking(details).await?;
        info!(id = %booking.id, "booking created");
        Ok(booking)
    }

    pub async fn bookings_for_event(&self, event_id: &EventId) -> RecordResult<Vec<Booking>> {
        Ok(self.store.bookings_for_event(event_id).await?)
    }

    /// Insert the built-in sample events when the store holds no events.
    pub async fn seed_samples(&self) -> RecordResult<usize> {
        if self.store.count_events().await? > 0 {
            debug!("store already has events, skipping seed");
            return Ok(0);
        }
        let mut inserted = 0;
        for draft in sample_events() {
            match self.create_event(draft).await {
                Ok(_) => inserted += 1,
                Err(err) if err.is_conflict() => {
                    warn!(%err, "sample already present");
                }
                Err(err) => return Err(err),
            }
        }
        info!(inserted, "seeded sample events");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use crate::event::tests::sample_draft;
    use crate::store::{MemoryStore, SqliteStore};

    fn memory_service() -> EventService {
        EventService::new(Arc::new(MemoryStore::new()), chrono_tz::UTC)
    }

    fn sqlite_service() -> EventService {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        EventService::new(Arc::new(store), chrono_tz::UTC)
    }

    #[tokio::test]
    async fn creating_an_event_derives_its_slug() {
        let service = memory_service();
        let event = service.create_event(sample_draft("My Talk!")).await.unwrap();
        assert_eq!(event.slug(), "my-talk");
        assert_eq!(event.details.time, "19:00");
        assert_eq!(event.created_at, event.updated_at);
    }

    #[tokio::test]
    async fn resaving_without_title_change_keeps_slug() {
        for service in [memory_service(), sqlite_service()] {
            let event = service.create_event(sample_draft("My Talk!")).await.unwrap();
            let patch = EventPatch {
                overview: Some("A new overview".into()),
                time: Some("21:30".into()),
                ..Default::default()
            };
            let updated = service.update_event(&event.id, patch).await.unwrap();
            assert_eq!(updated.slug(), "my-talk");
            assert_eq!(updated.details.overview, "A new overview");
            assert_eq!(updated.details.time, "21:30");
            assert!(updated.updated_at >= event.updated_at);
        }
    }

    #[tokio::test]
    async fn retitling_moves_the_slug() {
        let service = sqlite_service();
        let event = service.create_event(sample_draft("Old Name")).await.unwrap();
        let patch = EventPatch {
            title: Some("New Name".into()),
            ..Default::default()
        };
        service.update_event(&event.id, patch).await.unwrap();
        assert!(service.event_by_slug("old-name").await.unwrap().is_none());
        let found = service.event_by_slug("new-name").await.unwrap().unwrap();
        assert_eq!(found.id, event.id);
    }

    #[tokio::test]
    async fn colliding_slugs_are_a_storage_conflict() {
        for service in [memory_service(), sqlite_service()] {
            service.create_event(sample_draft("Rust Night")).await.unwrap();
            let err = service
                .create_event(sample_draft("rust   night!!"))
                .await
                .unwrap_err();
            assert!(err.is_conflict(), "{err}");
            assert_eq!(service.list_events().await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn retitling_onto_another_events_slug_conflicts() {
        for service in [memory_service(), sqlite_service()] {
            service.create_event(sample_draft("First")).await.unwrap();
            let second = service.create_event(sample_draft("Second")).await.unwrap();

            let err = service
                .update_event(
                    &second.id,
                    EventPatch {
                        title: Some("First".into()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err();
            assert!(err.is_conflict(), "{err}");
            let still = service.event_by_slug("second").await.unwrap().unwrap();
            assert_eq!(still.id, second.id);
            assert_eq!(still.details.title, "Second");

            // Keeping its own slug under a new spelling is not a conflict.
            let respelled = service
                .update_event(
                    &second.id,
                    EventPatch {
                        title: Some("SECOND".into()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            assert_eq!(respelled.slug(), "second");
            assert_eq!(respelled.details.title, "SECOND");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_creates_with_one_slug_leave_one_event() {
        let service = sqlite_service();
        let spawn_create = |title: &'static str| {
            let service = service.clone();
            tokio::spawn(async move { service.create_event(sample_draft(title)).await })
        };
        let first = spawn_create("Launch Party");
        let second = spawn_create("launch party!");
        let results = [
            first.await.expect("task joined"),
            second.await.expect("task joined"),
        ];

        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        let conflicts = results
            .iter()
            .filter(|result| matches!(result, Err(err) if err.is_conflict()))
            .count();
        assert_eq!(conflicts, 1);
        let events = service.list_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].slug(), "launch-party");
    }

    #[tokio::test]
    async fn invalid_events_are_not_persisted() {
        let service = sqlite_service();
        let mut draft = sample_draft("No Tags");
        draft.tags.clear();
        let err = service.create_event(draft).await.unwrap_err();
        assert_eq!(err.field(), Some("tags"));

        let mut draft = sample_draft("Bad Date");
        draft.date = "not-a-date".into();
        let err = service.create_event(draft).await.unwrap_err();
        assert!(matches!(err, RecordError::Format { field: "date", .. }));

        assert!(service.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn updating_a_missing_event_is_not_found() {
        let service = memory_service();
        let err = service
            .update_event(&EventId::from("missing"), EventPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::Store(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn booking_requires_an_existing_event() {
        for service in [memory_service(), sqlite_service()] {
            let missing = EventId::new();
            let err = service
                .create_booking(BookingDraft {
                    event_id: missing.to_string(),
                    email: "fan@example.com".into(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, RecordError::ReferentialIntegrity { .. }));
            assert!(service.bookings_for_event(&missing).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn booking_normalizes_email() {
        let service = sqlite_service();
        let event = service.create_event(sample_draft("Booked Out")).await.unwrap();
        let booking = service
            .create_booking(BookingDraft {
                event_id: event.id.to_string(),
                email: "  Fan@Example.COM ".into(),
            })
            .await
            .unwrap();
        assert_eq!(booking.details.email, "fan@example.com");
        assert_eq!(booking.details.event_id, event.id);

        let stored = service.bookings_for_event(&event.id).await.unwrap();
        assert_eq!(stored, vec![booking]);
    }

    #[tokio::test]
    async fn malformed_email_is_rejected_before_the_lookup() {
        let service = memory_service();
        let err = service
            .create_booking(BookingDraft {
                event_id: "whatever".into(),
                email: "not-an-email".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("email"));
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let service = sqlite_service();
        let first = service.seed_samples().await.unwrap();
        assert_eq!(first, sample_events().len());
        assert_eq!(service.seed_samples().await.unwrap(), 0);
        assert_eq!(service.list_events().await.unwrap().len(), first);
    }
}
