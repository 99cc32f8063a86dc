//! The tracking event entity.

use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{Error, Result};

/// Upper bound on the serialized metadata payload (32 KiB).
pub const METADATA_LIMIT: usize = 32 * 1024;

/// Newtype for event IDs. Doubles as the storage primary key and the
/// idempotency key for redelivered tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One tracked occurrence.
///
/// Fields are private: the only way to obtain an `Event` is
/// [`Event::construct`] or decoding one that was constructed earlier.
/// Decoding re-checks the construction rules.
///
/// Timestamps carry microsecond precision, the resolution of `TIMESTAMPTZ`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EventWire")]
pub struct Event {
    id: EventId,
    name: String,
    user_id: String,
    source: String,
    metadata: serde_json::Value,
    occurred_at: DateTime<Utc>,
    received_at: DateTime<Utc>,
}

impl Event {
    /// Validate caller input and build a new event.
    ///
    /// The clock is read once; that instant becomes `received_at` and, when
    /// the caller supplied no occurrence time, `occurred_at` as well.
    pub fn construct(new: NewEvent, clock: &dyn Clock) -> Result<Self> {
        check_required(&new.name, &new.user_id, &new.source)?;
        let metadata = normalize_metadata(new.metadata);
        check_metadata_size(&metadata)?;

        let now = clock.now().trunc_subsecs(6);

        Ok(Self {
            id: EventId::new(),
            name: new.name,
            user_id: new.user_id,
            source: new.source,
            metadata,
            occurred_at: new.occurred_at.map_or(now, |at| at.trunc_subsecs(6)),
            received_at: now,
        })
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Opaque caller payload. Never `null`.
    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// System ingestion time, independent of the claimed occurrence time.
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

fn normalize_metadata(metadata: Option<serde_json::Value>) -> serde_json::Value {
    match metadata {
        None | Some(serde_json::Value::Null) => serde_json::json!({}),
        Some(value) => value,
    }
}

fn check_required(name: &str, user_id: &str, source: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("name is required".to_string()));
    }
    if user_id.is_empty() {
        return Err(Error::Validation("user_id is required".to_string()));
    }
    if source.is_empty() {
        return Err(Error::Validation("source is required".to_string()));
    }
    Ok(())
}

fn check_metadata_size(metadata: &serde_json::Value) -> Result<()> {
    let size = serde_json::to_vec(metadata)
        .map_err(|e| Error::Validation(format!("metadata is not serializable: {e}")))?
        .len();
    if size > METADATA_LIMIT {
        return Err(Error::Validation(format!(
            "metadata must be <= {METADATA_LIMIT} bytes (got {size})"
        )));
    }
    Ok(())
}

/// Serialized shape of an [`Event`], before its rules are re-checked.
#[derive(Deserialize)]
struct EventWire {
    id: EventId,
    name: String,
    user_id: String,
    source: String,
    metadata: serde_json::Value,
    occurred_at: DateTime<Utc>,
    received_at: DateTime<Utc>,
}

impl TryFrom<EventWire> for Event {
    type Error = Error;

    fn try_from(wire: EventWire) -> Result<Self> {
        check_required(&wire.name, &wire.user_id, &wire.source)?;
        if wire.metadata.is_null() {
            return Err(Error::Validation("metadata must not be null".to_string()));
        }
        check_metadata_size(&wire.metadata)?;

        Ok(Self {
            id: wire.id,
            name: wire.name,
            user_id: wire.user_id,
            source: wire.source,
            metadata: wire.metadata,
            occurred_at: wire.occurred_at,
            received_at: wire.received_at,
        })
    }
}

/// Builder for caller-supplied event fields.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub(crate) name: String,
    pub(crate) user_id: String,
    pub(crate) source: String,
    pub(crate) metadata: Option<serde_json::Value>,
    pub(crate) occurred_at: Option<DateTime<Utc>>,
}

impl NewEvent {
    pub fn new(
        name: impl Into<String>,
        user_id: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            user_id: user_id.into(),
            source: source.into(),
            metadata: None,
            occurred_at: None,
        }
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Claimed occurrence time, in any offset. Stored as UTC.
    pub fn occurred_at<Tz: TimeZone>(mut self, at: DateTime<Tz>) -> Self {
        self.occurred_at = Some(at.with_timezone(&Utc));
        self
    }
}
