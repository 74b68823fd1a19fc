use serde::{Deserialize, Serialize};

use crate::value_objects::{LoginEventId, Timestamp, UserId};

/// 一次登录尝试的审计记录，成功与失败都会记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginEvent {
    pub id: LoginEventId,
    pub user_id: Option<UserId>,
    pub email: String,
    pub success: bool,
    pub ip: String,
    pub user_agent: String,
    pub created_at: Timestamp,
}

/// 请求来源信息，由 Web 层提取
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: String,
}
