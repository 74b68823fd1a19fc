//! 通知实体定义

use serde::{Deserialize, Serialize};

use crate::value_objects::{NotificationId, Timestamp, UserId};

/// 通知实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// 通知ID
    pub id: NotificationId,
    /// 接收者
    pub user_id: UserId,
    /// 通知类型，见 [`notification_kinds`]
    pub kind: String,
    /// 展示用图标
    pub icon: String,
    /// 通知标题
    pub title: String,
    /// 通知内容
    pub content: String,
    /// 点击后跳转的链接
    pub link: String,
    /// 是否已读
    pub read: bool,
    /// 创建时间
    pub created_at: Timestamp,
}

/// 创建通知所需的字段，ID 与时间由存储层生成
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: UserId,
    pub kind: String,
    pub icon: String,
    pub title: String,
    pub content: String,
    pub link: String,
}

/// 通知类型常量
pub mod notification_kinds {
    pub const MESSAGE: &str = "message";
    pub const MODERATION: &str = "moderation";
}

impl Notification {
    pub fn from_new(id: NotificationId, new: NewNotification, created_at: Timestamp) -> Self {
        Self {
            id,
            user_id: new.user_id,
            kind: new.kind,
            icon: new.icon,
            title: new.title,
            content: new.content,
            link: new.link,
            read: false,
            created_at,
        }
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }
}
