//! 实时事件分发
//!
//! 应用其他部分通过这里把业务记录转换成事件写入用户队列：
//! 私信与通知定向推送，登录与举报广播给管理员。

use std::sync::Arc;
use std::time::Duration;

use domain::{DirectMessage, EventKind, Notification, Report, UserId};
use serde::Serialize;
use thiserror::Error;

use crate::dto::{LoginBroadcast, MessageDto};
use crate::event_queue::EventQueueService;
use crate::subscription::EventSubscription;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to encode {kind} payload: {source}")]
    Encode {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

pub struct RealtimeDispatcher {
    queues: Arc<EventQueueService>,
}

impl RealtimeDispatcher {
    pub fn new(queues: Arc<EventQueueService>) -> Self {
        Self { queues }
    }

    pub fn queues(&self) -> &Arc<EventQueueService> {
        &self.queues
    }

    fn encode<T: Serialize>(kind: EventKind, value: &T) -> Result<serde_json::Value, DispatchError> {
        serde_json::to_value(value).map_err(|source| DispatchError::Encode { kind, source })
    }

    /// 新私信推送给收件人和发件人（发件人的其他标签页也能同步）
    pub fn on_message(
        &self,
        message: &DirectMessage,
        recipient_id: UserId,
        sender_id: UserId,
    ) -> Result<(), DispatchError> {
        let payload = Self::encode(EventKind::MessageNew, &MessageDto::from(message))?;
        if recipient_id == sender_id {
            // 给自己发消息时只推一次
            self.queues.push(recipient_id, EventKind::MessageNew, payload);
        } else {
            self.queues
                .push(recipient_id, EventKind::MessageNew, payload.clone());
            self.queues.push(sender_id, EventKind::MessageNew, payload);
        }
        Ok(())
    }

    pub fn on_notification(
        &self,
        notification: &Notification,
        user_id: UserId,
    ) -> Result<(), DispatchError> {
        let payload = Self::encode(EventKind::NotificationNew, notification)?;
        self.queues
            .push(user_id, EventKind::NotificationNew, payload);
        Ok(())
    }

    pub fn on_login_event(&self, login: &LoginBroadcast) -> Result<(), DispatchError> {
        let payload = Self::encode(EventKind::LoginEvent, login)?;
        let reached = self.queues.push_admin(EventKind::LoginEvent, payload);
        tracing::trace!(reached, action = ?login.action, "广播登录事件");
        Ok(())
    }

    pub fn on_report(&self, report: &Report) -> Result<(), DispatchError> {
        let payload = Self::encode(EventKind::ReportNew, report)?;
        let reached = self.queues.push_admin(EventKind::ReportNew, payload);
        tracing::trace!(reached, report_id = %report.id, "广播新举报");
        Ok(())
    }

    /// 为一条长连接创建订阅，同时确保该用户的队列存在
    pub fn subscribe(
        &self,
        user_id: UserId,
        is_admin: bool,
        keepalive_interval: Duration,
    ) -> EventSubscription {
        EventSubscription::new(
            Arc::clone(&self.queues),
            user_id,
            is_admin,
            keepalive_interval,
        )
    }
}
