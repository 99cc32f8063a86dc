//! In-process event store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Event, EventId};

use super::{Ack, EventStore};

/// Event store held in memory. Same idempotency contract as the Postgres
/// store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: Mutex<HashMap<EventId, Event>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: EventId) -> Option<Event> {
        self.events().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes happen as one insert under the lock, so the map stays
    /// consistent even if a holder panicked.
    fn events(&self) -> MutexGuard<'_, HashMap<EventId, Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn persist(&self, event: &Event) -> Result<Ack> {
        let mut events = self.events();
        if events.contains_key(&event.id()) {
            return Ok(Ack::Duplicate);
        }
        events.insert(event.id(), event.clone());
        Ok(Ack::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::model::NewEvent;

    #[tokio::test]
    async fn poisoned_lock_still_reports_contents() {
        let store = MemoryStore::new();
        let event = Event::construct(NewEvent::new("click", "u1", "web"), &SystemClock).unwrap();
        store.persist(&event).await.unwrap();

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.events.lock().unwrap();
            panic!("holder panicked");
        }));
        assert!(poisoned.is_err());
        assert!(store.events.is_poisoned());

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(event.id()), Some(event.clone()));
        assert_eq!(store.persist(&event).await.unwrap(), Ack::Duplicate);
    }
}
