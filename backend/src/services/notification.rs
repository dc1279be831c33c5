//! Notification service
//!
//! Two delivery layers: a durable notification record written for every
//! event (the source of truth, read back by the listing endpoint), and an
//! at-most-once live push through the connection registry for recipients
//! that happen to be connected.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::realtime::{ConnectionRegistry, LiveEvent};
use shared::{EventKind, Notification};

/// Notification service for durable records and live delivery
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
    registry: ConnectionRegistry,
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    event: String,
    message: String,
    request_id: Option<Uuid>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let event = row
            .event
            .parse::<EventKind>()
            .map_err(|_| AppError::Internal(format!("Unknown event kind: {}", row.event)))?;
        Ok(Notification {
            id: row.id,
            user_id: row.user_id,
            event,
            message: row.message,
            request_id: row.request_id,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

impl NotificationService {
    pub fn new(db: PgPool, registry: ConnectionRegistry) -> Self {
        Self { db, registry }
    }

    /// Persist a durable notification record.
    pub async fn record(
        &self,
        user_id: Uuid,
        event: EventKind,
        message: &str,
        request_id: Option<Uuid>,
    ) -> AppResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (user_id, event, message, request_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, event, message, request_id, is_read, created_at
            "#,
        )
        .bind(user_id)
        .bind(event.as_str())
        .bind(message)
        .bind(request_id)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// Best-effort live push; a missing handle is the normal offline branch.
    pub fn push_live(&self, user_id: Uuid, event: LiveEvent) {
        if !self.registry.send(user_id, event) {
            tracing::debug!("No live connection for {}, relying on durable record", user_id);
        }
    }

    /// Write the durable record, then attempt the live push.
    pub async fn notify(&self, user_id: Uuid, live: LiveEvent) -> AppResult<()> {
        self.record(user_id, live.event, &live.message, live.request_id)
            .await?;
        self.push_live(user_id, live);
        Ok(())
    }

    /// Durable notifications for a user, newest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, event, message, request_id, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
