use serde::{Deserialize, Serialize};

use crate::value_objects::{FullName, PasswordHash, Timestamp, UserEmail, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: FullName,
    pub email: UserEmail,
    #[serde(skip_serializing)] // 密码字段不暴露给客户端
    pub password: PasswordHash,
    pub is_admin: bool,
    pub is_banned: bool,
    pub suspended_until: Option<Timestamp>,
    /// 管理员发出、尚未被用户确认的警告
    pub warning_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// 可以返回给其他用户的公开资料。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: Timestamp,
}

impl User {
    pub fn register(
        id: UserId,
        full_name: FullName,
        email: UserEmail,
        password: PasswordHash,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            full_name,
            email,
            password,
            is_admin: false,
            is_banned: false,
            suspended_until: None,
            warning_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn promote_to_admin(&mut self, now: Timestamp) {
        self.is_admin = true;
        self.updated_at = now;
    }

    /// 停用期仍未结束时返回截止时间
    pub fn active_suspension(&self, now: Timestamp) -> Option<Timestamp> {
        self.suspended_until.filter(|until| *until > now)
    }

    pub fn suspend_until(&mut self, until: Timestamp, now: Timestamp) {
        self.suspended_until = Some(until);
        self.updated_at = now;
    }

    pub fn ban(&mut self, now: Timestamp) {
        self.is_banned = true;
        self.updated_at = now;
    }

    pub fn set_warning(&mut self, message: impl Into<String>, now: Timestamp) {
        self.warning_message = Some(message.into());
        self.updated_at = now;
    }

    pub fn acknowledge_warning(&mut self, now: Timestamp) {
        self.warning_message = None;
        self.updated_at = now;
    }

    pub fn public(&self) -> UserPublic {
        UserPublic {
            id: self.id,
            full_name: self.full_name.as_str().to_owned(),
            email: self.email.as_str().to_owned(),
            is_admin: self.is_admin,
            created_at: self.created_at,
        }
    }
}
