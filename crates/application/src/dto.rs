use domain::{DirectMessage, Timestamp, User, UserPublic};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub text: String,
    pub created_at: Timestamp,
}

impl From<&DirectMessage> for MessageDto {
    fn from(message: &DirectMessage) -> Self {
        Self {
            id: Uuid::from(message.id),
            sender_id: Uuid::from(message.sender_id),
            recipient_id: Uuid::from(message.recipient_id),
            text: message.text.as_str().to_owned(),
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactDto {
    #[serde(flatten)]
    pub user: UserPublic,
    pub name: String,
    /// 是否上报过任意页面
    pub online: bool,
}

/// 管理员待确认的警告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningDto {
    pub pending: bool,
    pub message: Option<String>,
}

impl From<&User> for WarningDto {
    fn from(user: &User) -> Self {
        Self {
            pending: user.warning_message.is_some(),
            message: user.warning_message.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginAction {
    Signup,
    Login,
    AdminLogin,
    Logout,
}

/// `login_event` 的推送内容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginBroadcast {
    pub action: LoginAction,
    pub user: UserPublic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSummaryDto {
    pub users: u64,
    pub reports_pending: u64,
}
