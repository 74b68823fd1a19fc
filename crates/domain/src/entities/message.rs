use serde::{Deserialize, Serialize};

use crate::value_objects::{MessageId, MessageText, Timestamp, UserId};

/// 一对一私信，持久化后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub text: MessageText,
    pub created_at: Timestamp,
}

impl DirectMessage {
    pub fn new(
        id: MessageId,
        sender_id: UserId,
        recipient_id: UserId,
        text: MessageText,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            sender_id,
            recipient_id,
            text,
            created_at,
        }
    }

    /// 消息是否属于 `a` 与 `b` 之间的会话（不区分方向）
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.sender_id == a && self.recipient_id == b)
            || (self.sender_id == b && self.recipient_id == a)
    }

    /// 对 `user_id` 来说的会话对方
    pub fn counterpart_of(&self, user_id: UserId) -> Option<UserId> {
        if self.sender_id == user_id {
            Some(self.recipient_id)
        } else if self.recipient_id == user_id {
            Some(self.sender_id)
        } else {
            None
        }
    }
}
