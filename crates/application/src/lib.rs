//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，以及实时投递的核心：
//! 页面在线状态、按用户划分的事件队列、事件分发和长连接订阅。
//! 外部适配器（数据库、密码哈希）通过 trait 注入。

pub mod clock;
pub mod dispatcher;
pub mod dto;
pub mod error;
pub mod event_queue;
pub mod memory;
pub mod password;
pub mod presence;
pub mod repository;
pub mod services;
pub mod subscription;

pub use clock::{Clock, SystemClock};
pub use dispatcher::{DispatchError, RealtimeDispatcher};
pub use dto::{
    AdminSummaryDto, ContactDto, LoginAction, LoginBroadcast, MessageDto, WarningDto,
};
pub use error::ApplicationError;
pub use event_queue::EventQueueService;
pub use password::{PasswordError, PasswordHasher, PlainPassword};
pub use presence::PresenceTracker;
pub use repository::{
    LoginEventRepository, MessageRepository, NotificationRepository, ReportRepository,
    SessionRepository, UserRepository,
};
pub use services::{
    AuthOutcome, AuthService, AuthServiceDependencies, CreateReportRequest, FanOutFailure,
    FanOutStage, LoginRequest, MessagingService, MessagingServiceDependencies, ModerationOutcome,
    ModerationService, ModerationServiceDependencies, NotificationService, ReportService,
    ReportServiceDependencies, SendMessageOutcome, SendMessageRequest, SessionStatus,
    SignupRequest,
};
pub use subscription::EventSubscription;
