//! Event document writes.

use crate::error::Result;
use crate::model::Event;

impl super::Db {
    /// Insert an event keyed by its id. Returns `false` when a document with
    /// that id already exists; the existing row is left untouched.
    pub async fn insert_event(&self, event: &Event) -> Result<bool> {
        let rows_affected = sqlx::query(
            "INSERT INTO tracking_events (id, name, user_id, source, metadata, occurred_at, received_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(event.id().0)
        .bind(event.name())
        .bind(event.user_id())
        .bind(event.source())
        .bind(event.metadata())
        .bind(event.occurred_at())
        .bind(event.received_at())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected == 1)
    }
}
