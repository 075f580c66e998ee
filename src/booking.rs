use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{RecordError, RecordResult};
use crate::models::{BookingDetails, BookingDraft, EventId};
use crate::store::RecordStore;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Trim and lower-case an address, then check the `local@domain.tld` shape.
pub fn normalize_email(input: &str) -> RecordResult<String> {
    let email = input.trim().to_lowercase();
    if email.is_empty() {
        return Err(RecordError::validation("email", "must not be empty"));
    }
    if !EMAIL_RE.is_match(&email) {
        return Err(RecordError::validation("email", "is not a valid address"));
    }
    Ok(email)
}

/// Field-level checks that need no store access.
pub fn build_booking(draft: &BookingDraft) -> RecordResult<BookingDetails> {
    let event_id = draft.event_id.trim();
    if event_id.is_empty() {
        return Err(RecordError::validation("event_id", "is required"));
    }
    Ok(BookingDetails {
        event_id: EventId::from(event_id),
        email: normalize_email(&draft.email)?,
    })
}

/// Confirm the referenced event exists right now.
///
/// This is a read before the write, not a foreign key: an event deleted
/// between this check and the insert leaves a dangling booking.
pub async fn check_event_reference(
    store: &dyn RecordStore,
    event_id: &EventId,
) -> RecordResult<()> {
    if store.event_exists(event_id).await? {
        Ok(())
    } else {
        Err(RecordError::ReferentialIntegrity {
            event_id: event_id.to_string(),
        })
    }
}
