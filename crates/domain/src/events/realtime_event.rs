//! 推送给在线客户端的实时事件
//!
//! 事件只存在于内存中的用户队列里，被消费一次后即消失。

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 事件类型，序列化名即 SSE 的 `event:` 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    MessageNew,
    NotificationNew,
    LoginEvent,
    ReportNew,
    Ready,
    Keepalive,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::MessageNew => "message_new",
            EventKind::NotificationNew => "notification_new",
            EventKind::LoginEvent => "login_event",
            EventKind::ReportNew => "report_new",
            EventKind::Ready => "ready",
            EventKind::Keepalive => "keepalive",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub kind: EventKind,
    pub payload: JsonValue,
    /// 仅管理员连接可见，其余连接会直接丢弃
    pub admin_only: bool,
}

impl RealtimeEvent {
    pub fn new(kind: EventKind, payload: JsonValue) -> Self {
        Self {
            kind,
            payload,
            admin_only: false,
        }
    }

    pub fn admin(kind: EventKind, payload: JsonValue) -> Self {
        Self {
            kind,
            payload,
            admin_only: true,
        }
    }

    pub fn ready() -> Self {
        Self::new(EventKind::Ready, empty_payload())
    }

    pub fn keepalive() -> Self {
        Self::new(EventKind::Keepalive, empty_payload())
    }

    /// 连接是否有权看到该事件
    pub fn visible_to(&self, is_admin: bool) -> bool {
        !self.admin_only || is_admin
    }
}

fn empty_payload() -> JsonValue {
    JsonValue::Object(serde_json::Map::new())
}
