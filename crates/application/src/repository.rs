//! 数据访问抽象
//!
//! 应用层只依赖这些接口；PostgreSQL 与内存实现分别位于 infrastructure 与 [`crate::memory`]。

use async_trait::async_trait;
use domain::{
    DirectMessage, LoginEvent, NewNotification, Notification, Report, ReportId, ReportStatus,
    RepositoryError, Session, SessionToken, User, UserEmail, UserId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 邮箱重复时返回 [`RepositoryError::Conflict`]
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn update(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<User>, RepositoryError>;
    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError>;
    async fn count(&self) -> Result<u64, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    // 单行插入，持久化成功即视为消息已送出
    async fn create(&self, message: DirectMessage) -> Result<DirectMessage, RepositoryError>;

    // 两人之间的会话，按时间正序
    async fn list_thread(
        &self,
        user_a: UserId,
        user_b: UserId,
        limit: u32,
    ) -> Result<Vec<DirectMessage>, RepositoryError>;

    // 与该用户有过私信往来的用户，最近联系的在前
    async fn list_contact_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RepositoryError>;

    /// 删除该用户收发的全部私信
    async fn delete_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: NewNotification) -> Result<Notification, RepositoryError>;

    /// 最新的在前
    async fn list_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<Notification>, RepositoryError>;

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepositoryError>;
    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, report: Report) -> Result<Report, RepositoryError>;
    async fn update(&self, report: Report) -> Result<Report, RepositoryError>;
    async fn find_by_id(&self, id: ReportId) -> Result<Option<Report>, RepositoryError>;
    /// 最新的在前
    async fn list_recent(&self, limit: u32) -> Result<Vec<Report>, RepositoryError>;
    async fn count_by_status(&self, status: ReportStatus) -> Result<u64, RepositoryError>;
    /// 删除该用户发起的和针对该用户的举报
    async fn delete_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginEventRepository: Send + Sync {
    async fn record(&self, event: LoginEvent) -> Result<LoginEvent, RepositoryError>;
    /// 最新的在前
    async fn list_recent(&self, limit: u32) -> Result<Vec<LoginEvent>, RepositoryError>;
    /// 记录保留，只断开与用户的关联
    async fn detach_user(&self, user_id: UserId) -> Result<u64, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: Session) -> Result<Session, RepositoryError>;
    async fn find(&self, token: &SessionToken) -> Result<Option<Session>, RepositoryError>;
    async fn delete(&self, token: &SessionToken) -> Result<(), RepositoryError>;
    async fn delete_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError>;
}
