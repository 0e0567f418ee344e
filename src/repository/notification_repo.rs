use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::Notification;

pub async fn list_for_user(pool: &PgPool, tenant_id: Uuid, recipient_user_id: Uuid, unread_only: bool) -> AppResult<Vec<Notification>> {
    let rows: Vec<Notification> = if unread_only {
        sqlx::query_as(
            "SELECT * FROM notifications
              WHERE tenant_id = $1 AND recipient_user_id = $2 AND read_at IS NULL
              ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .bind(recipient_user_id)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as(
            "SELECT * FROM notifications
              WHERE tenant_id = $1 AND recipient_user_id = $2
              ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .bind(recipient_user_id)
        .fetch_all(pool)
        .await?
    };
    Ok(rows)
}

pub async fn mark_read(pool: &PgPool, tenant_id: Uuid, notification_id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE notifications SET read_at = now() WHERE id = $1 AND tenant_id = $2 AND read_at IS NULL")
        .bind(notification_id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
    Ok(())
}
