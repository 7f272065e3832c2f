use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::Result;
use crate::schema::outbox_events;

use super::outbox_model::{EventStatus, NewOutboxEvent, OutboxEvent};
use super::outbox_traits::OutboxRepositoryTrait;

/// Inserts an event as part of an enclosing transaction.
///
/// The `(event_type, aggregate_id)` unique index makes re-emission of the
/// same fact a no-op, which is what keeps certificate minting single-shot.
pub(crate) fn enqueue(conn: &mut SqliteConnection, event: &NewOutboxEvent) -> QueryResult<usize> {
    diesel::insert_into(outbox_events::table)
        .values(event)
        .on_conflict_do_nothing()
        .execute(conn)
}

/// Repository for outbox delivery bookkeeping
pub struct OutboxRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl OutboxRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        OutboxRepository { pool, writer }
    }
}

#[async_trait]
impl OutboxRepositoryTrait for OutboxRepository {
    fn due(&self, limit: i64) -> Result<Vec<OutboxEvent>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(outbox_events::table
            .filter(outbox_events::status.eq(EventStatus::Pending.as_str()))
            .order(outbox_events::created_at.asc())
            .limit(limit)
            .load::<OutboxEvent>(&mut conn)?)
    }

    async fn mark_processed(&self, event_id: &str) -> Result<()> {
        let id = event_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(outbox_events::table.find(&id))
                    .set((
                        outbox_events::status.eq(EventStatus::Processed.as_str()),
                        outbox_events::processed_at.eq(Some(chrono::Utc::now().naive_utc())),
                    ))
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn mark_skipped(&self, event_id: &str, reason: &str) -> Result<()> {
        let id = event_id.to_string();
        let reason = reason.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(outbox_events::table.find(&id))
                    .set((
                        outbox_events::status.eq(EventStatus::Skipped.as_str()),
                        outbox_events::last_error.eq(Some(reason)),
                        outbox_events::processed_at.eq(Some(chrono::Utc::now().naive_utc())),
                    ))
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn record_failure(&self, event_id: &str, error: &str, exhausted: bool) -> Result<()> {
        let id = event_id.to_string();
        let error = error.to_string();
        self.writer
            .exec(move |conn| {
                let status = if exhausted {
                    EventStatus::Failed
                } else {
                    EventStatus::Pending
                };
                diesel::update(outbox_events::table.find(&id))
                    .set((
                        outbox_events::status.eq(status.as_str()),
                        outbox_events::attempts.eq(outbox_events::attempts + 1),
                        outbox_events::last_error.eq(Some(error)),
                    ))
                    .execute(conn)?;
                Ok(())
            })
            .await
    }
}
