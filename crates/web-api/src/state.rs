use std::sync::Arc;
use std::time::Duration;

use application::memory::{
    MemoryLoginEventRepository, MemoryMessageRepository, MemoryNotificationRepository,
    MemoryReportRepository, MemorySessionRepository, MemoryUserRepository,
};
use application::{
    AuthService, AuthServiceDependencies, Clock, EventQueueService, LoginEventRepository,
    MessageRepository, MessagingService, MessagingServiceDependencies, ModerationService,
    ModerationServiceDependencies, NotificationRepository, NotificationService, PasswordHasher,
    PresenceTracker, RealtimeDispatcher, ReportRepository, ReportService,
    ReportServiceDependencies, SessionRepository, UserRepository,
};

pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(20);

/// 会话 Cookie 设置
#[derive(Debug, Clone)]
pub struct SessionCookieSettings {
    pub name: String,
    pub secure: bool,
}

impl Default for SessionCookieSettings {
    fn default() -> Self {
        Self {
            name: "genbridge_session".to_string(),
            secure: false,
        }
    }
}

/// 构建 [`AppState`] 所需的适配器和参数
pub struct StateDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub notification_repository: Arc<dyn NotificationRepository>,
    pub report_repository: Arc<dyn ReportRepository>,
    pub login_event_repository: Arc<dyn LoginEventRepository>,
    pub session_repository: Arc<dyn SessionRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
    pub keepalive_interval: Duration,
    pub max_pending_per_user: Option<usize>,
    pub session_cookie: SessionCookieSettings,
}

impl StateDependencies {
    /// 全部使用内存仓储，进程重启后数据丢失
    pub fn in_memory(password_hasher: Arc<dyn PasswordHasher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_repository: Arc::new(MemoryUserRepository::new()),
            message_repository: Arc::new(MemoryMessageRepository::new()),
            notification_repository: Arc::new(MemoryNotificationRepository::new()),
            report_repository: Arc::new(MemoryReportRepository::new()),
            login_event_repository: Arc::new(MemoryLoginEventRepository::new()),
            session_repository: Arc::new(MemorySessionRepository::new()),
            password_hasher,
            clock,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            max_pending_per_user: None,
            session_cookie: SessionCookieSettings::default(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub messaging_service: Arc<MessagingService>,
    pub notification_service: Arc<NotificationService>,
    pub report_service: Arc<ReportService>,
    pub moderation_service: Arc<ModerationService>,
    pub presence: Arc<PresenceTracker>,
    pub dispatcher: Arc<RealtimeDispatcher>,
    pub keepalive_interval: Duration,
    pub session_cookie: SessionCookieSettings,
}

impl AppState {
    /// 组装在线状态、事件队列和全部用例服务
    pub fn new(deps: StateDependencies) -> Self {
        let presence = Arc::new(PresenceTracker::new());
        let queues = Arc::new(EventQueueService::with_max_pending(
            deps.max_pending_per_user,
        ));
        let dispatcher = Arc::new(RealtimeDispatcher::new(queues));

        let auth_service = AuthService::new(AuthServiceDependencies {
            user_repository: deps.user_repository.clone(),
            session_repository: deps.session_repository.clone(),
            login_event_repository: deps.login_event_repository.clone(),
            password_hasher: deps.password_hasher,
            clock: deps.clock.clone(),
            presence: presence.clone(),
            dispatcher: dispatcher.clone(),
        });

        let messaging_service = MessagingService::new(MessagingServiceDependencies {
            user_repository: deps.user_repository.clone(),
            message_repository: deps.message_repository.clone(),
            notification_repository: deps.notification_repository.clone(),
            presence: presence.clone(),
            dispatcher: dispatcher.clone(),
            clock: deps.clock.clone(),
        });

        let notification_service = NotificationService::new(deps.notification_repository.clone());

        let report_service = ReportService::new(ReportServiceDependencies {
            user_repository: deps.user_repository.clone(),
            report_repository: deps.report_repository.clone(),
            dispatcher: dispatcher.clone(),
            clock: deps.clock.clone(),
        });

        let moderation_service = ModerationService::new(ModerationServiceDependencies {
            user_repository: deps.user_repository,
            report_repository: deps.report_repository,
            message_repository: deps.message_repository,
            login_event_repository: deps.login_event_repository,
            notification_repository: deps.notification_repository,
            session_repository: deps.session_repository,
            presence: presence.clone(),
            dispatcher: dispatcher.clone(),
            clock: deps.clock,
        });

        Self {
            auth_service: Arc::new(auth_service),
            messaging_service: Arc::new(messaging_service),
            notification_service: Arc::new(notification_service),
            report_service: Arc::new(report_service),
            moderation_service: Arc::new(moderation_service),
            presence,
            dispatcher,
            keepalive_interval: deps.keepalive_interval,
            session_cookie: deps.session_cookie,
        }
    }
}
