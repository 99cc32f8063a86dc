//! Core data model.
//!
//! A tracking event is one occurrence reported by a client: what happened,
//! to whom, from where, and when. It is validated once at construction and
//! never mutated afterwards.

pub mod event;

pub use event::{Event, EventId, METADATA_LIMIT, NewEvent};
