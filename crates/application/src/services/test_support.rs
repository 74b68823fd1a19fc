//! 服务测试共用的装配代码

use std::sync::Arc;

use async_trait::async_trait;
use domain::{FullName, PasswordHash, User, UserEmail, UserId};

use crate::{
    clock::{Clock, ManualClock},
    dispatcher::RealtimeDispatcher,
    event_queue::EventQueueService,
    memory::{
        MemoryLoginEventRepository, MemoryMessageRepository, MemoryNotificationRepository,
        MemoryReportRepository, MemorySessionRepository, MemoryUserRepository,
    },
    password::{PasswordError, PasswordHasher, PlainPassword},
    presence::PresenceTracker,
    repository::{MessageRepository, NotificationRepository, UserRepository},
};

use super::{
    AuthService, AuthServiceDependencies, MessagingService, MessagingServiceDependencies,
    ModerationService, ModerationServiceDependencies, ReportService, ReportServiceDependencies,
};

/// 不做哈希，只加前缀
pub struct PlainPasswordHasher;

#[async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(&self, password: PlainPassword<'_>) -> Result<PasswordHash, PasswordError> {
        PasswordHash::new(format!("plain:{}", password.as_str()))
            .map_err(|err| PasswordError::Hashing(err.to_string()))
    }

    async fn verify(
        &self,
        password: PlainPassword<'_>,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordError> {
        Ok(hashed.as_str() == format!("plain:{}", password.as_str()))
    }
}

pub struct Harness {
    pub users: Arc<MemoryUserRepository>,
    pub messages: Arc<MemoryMessageRepository>,
    pub notifications: Arc<MemoryNotificationRepository>,
    pub reports: Arc<MemoryReportRepository>,
    pub logins: Arc<MemoryLoginEventRepository>,
    pub sessions: Arc<MemorySessionRepository>,
    pub presence: Arc<PresenceTracker>,
    pub queues: Arc<EventQueueService>,
    pub dispatcher: Arc<RealtimeDispatcher>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        let queues = Arc::new(EventQueueService::new());
        Self {
            users: Arc::new(MemoryUserRepository::new()),
            messages: Arc::new(MemoryMessageRepository::new()),
            notifications: Arc::new(MemoryNotificationRepository::new()),
            reports: Arc::new(MemoryReportRepository::new()),
            logins: Arc::new(MemoryLoginEventRepository::new()),
            sessions: Arc::new(MemorySessionRepository::new()),
            presence: Arc::new(PresenceTracker::new()),
            dispatcher: Arc::new(RealtimeDispatcher::new(Arc::clone(&queues))),
            queues,
            clock: Arc::new(ManualClock::starting_now()),
        }
    }

    pub fn messaging(&self) -> MessagingService {
        self.messaging_with(
            self.users.clone(),
            self.messages.clone(),
            self.notifications.clone(),
        )
    }

    pub fn messaging_with(
        &self,
        user_repository: Arc<dyn UserRepository>,
        message_repository: Arc<dyn MessageRepository>,
        notification_repository: Arc<dyn NotificationRepository>,
    ) -> MessagingService {
        MessagingService::new(MessagingServiceDependencies {
            user_repository,
            message_repository,
            notification_repository,
            presence: self.presence.clone(),
            dispatcher: self.dispatcher.clone(),
            clock: self.clock.clone(),
        })
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(AuthServiceDependencies {
            user_repository: self.users.clone(),
            session_repository: self.sessions.clone(),
            login_event_repository: self.logins.clone(),
            password_hasher: Arc::new(PlainPasswordHasher),
            clock: self.clock.clone(),
            presence: self.presence.clone(),
            dispatcher: self.dispatcher.clone(),
        })
    }

    pub fn reports(&self) -> ReportService {
        ReportService::new(ReportServiceDependencies {
            user_repository: self.users.clone(),
            report_repository: self.reports.clone(),
            dispatcher: self.dispatcher.clone(),
            clock: self.clock.clone(),
        })
    }

    pub fn moderation(&self) -> ModerationService {
        ModerationService::new(ModerationServiceDependencies {
            user_repository: self.users.clone(),
            report_repository: self.reports.clone(),
            message_repository: self.messages.clone(),
            login_event_repository: self.logins.clone(),
            notification_repository: self.notifications.clone(),
            session_repository: self.sessions.clone(),
            presence: self.presence.clone(),
            dispatcher: self.dispatcher.clone(),
            clock: self.clock.clone(),
        })
    }

    /// 直接写入仓储，密码为 `secret`
    pub async fn create_user(&self, full_name: &str, email: &str) -> User {
        let user = User::register(
            UserId::generate(),
            FullName::parse(full_name).unwrap(),
            UserEmail::parse(email).unwrap(),
            PasswordHash::new("plain:secret").unwrap(),
            self.clock.now(),
        );
        self.users.create(user).await.unwrap()
    }

    pub async fn create_admin(&self, full_name: &str, email: &str) -> User {
        let mut user = self.create_user(full_name, email).await;
        user.promote_to_admin(self.clock.now());
        self.users.update(user).await.unwrap()
    }
}
