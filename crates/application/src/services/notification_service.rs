use std::sync::Arc;

use domain::{Notification, UserId};

use crate::{error::ApplicationError, repository::NotificationRepository};

/// 通知列表只返回最新的若干条
pub const NOTIFICATION_PAGE_SIZE: u32 = 50;

pub struct NotificationService {
    notification_repository: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(notification_repository: Arc<dyn NotificationRepository>) -> Self {
        Self {
            notification_repository,
        }
    }

    pub async fn list(&self, user_id: UserId) -> Result<Vec<Notification>, ApplicationError> {
        Ok(self
            .notification_repository
            .list_for_user(user_id, NOTIFICATION_PAGE_SIZE)
            .await?)
    }

    pub async fn clear(&self, user_id: UserId) -> Result<u64, ApplicationError> {
        let removed = self.notification_repository.clear(user_id).await?;
        tracing::debug!(user_id = %user_id, removed, "清空通知");
        Ok(removed)
    }

    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, ApplicationError> {
        Ok(self.notification_repository.mark_all_read(user_id).await?)
    }
}
