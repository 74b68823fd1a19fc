//! 内存实现的仓储（用于测试和单进程开发模式）

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use domain::{
    DirectMessage, LoginEvent, NewNotification, Notification, NotificationId, Report, ReportId,
    ReportStatus, RepositoryError, Session, SessionToken, User, UserEmail, UserId,
};
use tokio::sync::RwLock;

use crate::repository::{
    LoginEventRepository, MessageRepository, NotificationRepository, ReportRepository,
    SessionRepository, UserRepository,
};

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|existing| existing.id == user.id || existing.email == user.email)
        {
            return Err(RepositoryError::Conflict);
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        let slot = users
            .iter_mut()
            .find(|existing| existing.id == user.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| &user.email == email).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.users.read().await.clone())
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|user| user.id != id);
        Ok(users.len() != before)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.users.read().await.len() as u64)
    }
}

#[derive(Default)]
pub struct MemoryMessageRepository {
    messages: RwLock<Vec<DirectMessage>>,
}

impl MemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn create(&self, message: DirectMessage) -> Result<DirectMessage, RepositoryError> {
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn list_thread(
        &self,
        user_a: UserId,
        user_b: UserId,
        limit: u32,
    ) -> Result<Vec<DirectMessage>, RepositoryError> {
        let messages = self.messages.read().await;
        let thread: Vec<DirectMessage> = messages
            .iter()
            .filter(|message| message.is_between(user_a, user_b))
            .cloned()
            .collect();
        // 保留最近的 limit 条，仍按时间正序返回
        let skip = thread.len().saturating_sub(limit as usize);
        Ok(thread.into_iter().skip(skip).collect())
    }

    async fn list_contact_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RepositoryError> {
        let messages = self.messages.read().await;
        let mut contacts = Vec::new();
        for message in messages.iter().rev() {
            if let Some(other) = message.counterpart_of(user_id) {
                if !contacts.contains(&other) {
                    contacts.push(other);
                }
            }
        }
        Ok(contacts)
    }

    async fn delete_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|message| message.counterpart_of(user_id).is_none());
        Ok((before - messages.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryNotificationRepository {
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 测试辅助：某用户的全部通知数量
    pub async fn count_for_user(&self, user_id: UserId) -> usize {
        self.notifications
            .read()
            .await
            .iter()
            .filter(|notification| notification.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn create(&self, notification: NewNotification) -> Result<Notification, RepositoryError> {
        let stored = Notification::from_new(NotificationId::generate(), notification, Utc::now());
        self.notifications.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let notifications = self.notifications.read().await;
        Ok(notifications
            .iter()
            .rev()
            .filter(|notification| notification.user_id == user_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut notifications = self.notifications.write().await;
        let mut updated = 0;
        for notification in notifications
            .iter_mut()
            .filter(|notification| notification.user_id == user_id && !notification.read)
        {
            notification.mark_read();
            updated += 1;
        }
        Ok(updated)
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|notification| notification.user_id != user_id);
        Ok((before - notifications.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryReportRepository {
    reports: RwLock<Vec<Report>>,
}

impl MemoryReportRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportRepository for MemoryReportRepository {
    async fn create(&self, report: Report) -> Result<Report, RepositoryError> {
        self.reports.write().await.push(report.clone());
        Ok(report)
    }

    async fn update(&self, report: Report) -> Result<Report, RepositoryError> {
        let mut reports = self.reports.write().await;
        let slot = reports
            .iter_mut()
            .find(|existing| existing.id == report.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = report.clone();
        Ok(report)
    }

    async fn find_by_id(&self, id: ReportId) -> Result<Option<Report>, RepositoryError> {
        let reports = self.reports.read().await;
        Ok(reports.iter().find(|report| report.id == id).cloned())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Report>, RepositoryError> {
        let reports = self.reports.read().await;
        Ok(reports.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn count_by_status(&self, status: ReportStatus) -> Result<u64, RepositoryError> {
        let reports = self.reports.read().await;
        Ok(reports.iter().filter(|report| report.status == status).count() as u64)
    }

    async fn delete_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut reports = self.reports.write().await;
        let before = reports.len();
        reports.retain(|report| report.reporter_id != user_id && report.target_user_id != user_id);
        Ok((before - reports.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryLoginEventRepository {
    events: RwLock<Vec<LoginEvent>>,
}

impl MemoryLoginEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoginEventRepository for MemoryLoginEventRepository {
    async fn record(&self, event: LoginEvent) -> Result<LoginEvent, RepositoryError> {
        self.events.write().await.push(event.clone());
        Ok(event)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<LoginEvent>, RepositoryError> {
        let events = self.events.read().await;
        Ok(events.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn detach_user(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut events = self.events.write().await;
        let mut detached = 0;
        for event in events
            .iter_mut()
            .filter(|event| event.user_id == Some(user_id))
        {
            event.user_id = None;
            detached += 1;
        }
        Ok(detached)
    }
}

#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: RwLock<HashMap<SessionToken, Session>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn create(&self, session: Session) -> Result<Session, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.token) {
            return Err(RepositoryError::Conflict);
        }
        sessions.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn find(&self, token: &SessionToken) -> Result<Option<Session>, RepositoryError> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), RepositoryError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }

    async fn delete_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }
}
