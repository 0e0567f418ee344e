use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::models::Notification;
use crate::proto::notification::notification_service_server::NotificationService;
use crate::proto::notification::{
    ListNotificationsRequest, ListNotificationsResponse, MarkReadRequest, MarkReadResponse,
};
use crate::repository::notification_repo;
use crate::services::common::{authenticated_user, parse_uuid, scoped_tenant};

pub struct NotificationServiceImpl {
    pool: PgPool,
}

impl NotificationServiceImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_proto(notification: Notification) -> crate::proto::notification::Notification {
    crate::proto::notification::Notification {
        id: notification.id.to_string(),
        kind: notification.kind,
        priority: notification.priority,
        payload_json: notification.payload.to_string(),
        created_at: notification.created_at.to_rfc3339(),
        read_at: notification.read_at.map(|t| t.to_rfc3339()),
    }
}

#[tonic::async_trait]
impl NotificationService for NotificationServiceImpl {
    async fn list_notifications(
        &self,
        request: Request<ListNotificationsRequest>,
    ) -> Result<Response<ListNotificationsResponse>, Status> {
        let user = authenticated_user(&request)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();

        let notifications =
            notification_repo::list_for_user(&self.pool, tenant_id, user.user_id, req.unread_only).await?;

        Ok(Response::new(ListNotificationsResponse {
            notifications: notifications.into_iter().map(to_proto).collect(),
        }))
    }

    async fn mark_read(&self, request: Request<MarkReadRequest>) -> Result<Response<MarkReadResponse>, Status> {
        let user = authenticated_user(&request)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let notification_id = parse_uuid(&req.notification_id, "notification_id")?;

        notification_repo::mark_read(&self.pool, tenant_id, notification_id).await?;
        Ok(Response::new(MarkReadResponse {}))
    }
}
