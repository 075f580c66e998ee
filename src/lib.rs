pub mod booking;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod event;
pub mod models;
pub mod samples;
pub mod service;
pub mod slug;
pub mod store;
pub mod telemetry;
pub mod temporal;
mod utils;

pub use error::{RecordError, RecordResult, StoreError, StoreResult};
pub use models::{
    Booking, BookingDetails, BookingDraft, BookingId, Event, EventDetails, EventDraft, EventId,
    EventPatch,
};
pub use service::EventService;
pub use slug::slugify;
pub use store::{Collection, MemoryStore, RecordStore, SqliteStore};
pub use temporal::{normalize_date, normalize_date_in, normalize_time};
