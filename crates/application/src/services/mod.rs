mod auth_service;
mod messaging_service;
mod moderation_service;
mod notification_service;
mod report_service;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod auth_service_tests;

pub use auth_service::{
    AuthOutcome, AuthService, AuthServiceDependencies, LoginRequest, SessionStatus, SignupRequest,
};
pub use messaging_service::{
    FanOutFailure, FanOutStage, MessagingService, MessagingServiceDependencies,
    SendMessageOutcome, SendMessageRequest, NOTIFICATION_PREVIEW_CHARS,
};
pub use moderation_service::{
    ModerationOutcome, ModerationService, ModerationServiceDependencies, DEFAULT_LOGIN_LIMIT,
    SUSPENSION_DAYS,
};
pub use notification_service::{NotificationService, NOTIFICATION_PAGE_SIZE};
pub use report_service::{CreateReportRequest, ReportService, ReportServiceDependencies};
