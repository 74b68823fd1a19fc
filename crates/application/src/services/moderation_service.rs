//! 管理后台：统计、登录记录、举报处理和账号处置

use std::sync::Arc;

use chrono::Duration;
use domain::{
    notification_kinds, DomainError, LoginEvent, NewNotification, Report, ReportId, ReportStatus,
    Timestamp, User, UserId, UserPublic,
};

use crate::{
    clock::Clock,
    dispatcher::RealtimeDispatcher,
    dto::AdminSummaryDto,
    error::ApplicationError,
    presence::PresenceTracker,
    repository::{
        LoginEventRepository, MessageRepository, NotificationRepository, ReportRepository,
        SessionRepository, UserRepository,
    },
};

pub const DEFAULT_LOGIN_LIMIT: u32 = 50;
const MAX_LOGIN_LIMIT: u32 = 500;
const REPORT_LIST_LIMIT: u32 = 500;
pub const SUSPENSION_DAYS: i64 = 3;

const WARNING_MESSAGE: &str = "⚠️ Official Warning\n\n\
    A report about your behaviour was reviewed by the moderators. \
    Please follow the community guidelines and keep conversations respectful.\n\n\
    Further reports may lead to a temporary suspension or a permanent ban.";

const SUSPENSION_MESSAGE: &str = "⏸️ Temporary Suspension (3 days)\n\n\
    Your account has been suspended for 3 days after a report reviewed by the moderators.\n\n\
    You can log in again once the suspension ends.";

/// 依据举报执行处置后的结果
#[derive(Debug, Clone)]
pub struct ModerationOutcome {
    pub report: Report,
    pub target: Option<UserPublic>,
    pub suspended_until: Option<Timestamp>,
}

pub struct ModerationServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub report_repository: Arc<dyn ReportRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub login_event_repository: Arc<dyn LoginEventRepository>,
    pub notification_repository: Arc<dyn NotificationRepository>,
    pub session_repository: Arc<dyn SessionRepository>,
    pub presence: Arc<PresenceTracker>,
    pub dispatcher: Arc<RealtimeDispatcher>,
    pub clock: Arc<dyn Clock>,
}

pub struct ModerationService {
    deps: ModerationServiceDependencies,
}

impl ModerationService {
    pub fn new(deps: ModerationServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn summary(&self) -> Result<AdminSummaryDto, ApplicationError> {
        Ok(AdminSummaryDto {
            users: self.deps.user_repository.count().await?,
            reports_pending: self
                .deps
                .report_repository
                .count_by_status(ReportStatus::Pending)
                .await?,
        })
    }

    pub async fn list_logins(&self, limit: Option<u32>) -> Result<Vec<LoginEvent>, ApplicationError> {
        let limit = limit
            .unwrap_or(DEFAULT_LOGIN_LIMIT)
            .clamp(1, MAX_LOGIN_LIMIT);
        Ok(self.deps.login_event_repository.list_recent(limit).await?)
    }

    /// 无法识别的状态过滤条件按不过滤处理
    pub async fn list_reports(&self, status: Option<&str>) -> Result<Vec<Report>, ApplicationError> {
        let filter = status.and_then(|value| value.parse::<ReportStatus>().ok());
        let reports = self
            .deps
            .report_repository
            .list_recent(REPORT_LIST_LIMIT)
            .await?;
        Ok(match filter {
            Some(status) => reports
                .into_iter()
                .filter(|report| report.status == status)
                .collect(),
            None => reports,
        })
    }

    pub async fn update_report(
        &self,
        report_id: ReportId,
        status: &str,
    ) -> Result<Report, ApplicationError> {
        let status = status.parse::<ReportStatus>()?;
        let mut report = self.find_report(report_id).await?;
        report.set_status(status, self.deps.clock.now());
        let report = self.deps.report_repository.update(report).await?;
        tracing::info!(report_id = %report.id, status = %report.status, "举报状态已更新");
        Ok(report)
    }

    /// 警告被举报人：写入待确认警告、推送通知，并把举报标记为已驳回
    pub async fn warn_from_report(
        &self,
        report_id: ReportId,
    ) -> Result<ModerationOutcome, ApplicationError> {
        let report = self.find_report(report_id).await?;
        let now = self.deps.clock.now();

        let target = match self
            .deps
            .user_repository
            .find_by_id(report.target_user_id)
            .await?
        {
            Some(mut user) => {
                user.set_warning(WARNING_MESSAGE, now);
                let user = self.deps.user_repository.update(user).await?;
                self.notify(
                    user.id,
                    "⚠️",
                    "Account warning",
                    WARNING_MESSAGE,
                    "index.html",
                )
                .await?;
                Some(user.public())
            }
            None => None,
        };

        let report = self.dismiss(report).await?;
        tracing::info!(report_id = %report.id, target_user_id = %report.target_user_id, "已警告被举报用户");
        Ok(ModerationOutcome {
            report,
            target,
            suspended_until: None,
        })
    }

    /// 停用被举报人三天
    pub async fn suspend_from_report(
        &self,
        report_id: ReportId,
    ) -> Result<ModerationOutcome, ApplicationError> {
        let report = self.find_report(report_id).await?;
        let mut user = self
            .deps
            .user_repository
            .find_by_id(report.target_user_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let now = self.deps.clock.now();
        let until = now + Duration::days(SUSPENSION_DAYS);
        user.suspend_until(until, now);
        let user = self.deps.user_repository.update(user).await?;

        self.notify(
            user.id,
            "⏸️",
            "Account suspended",
            SUSPENSION_MESSAGE,
            "login.html",
        )
        .await?;

        let report = self.dismiss(report).await?;
        tracing::info!(user_id = %user.id, until = %until, "用户已被停用");
        Ok(ModerationOutcome {
            report,
            target: Some(user.public()),
            suspended_until: Some(until),
        })
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApplicationError> {
        Ok(self.deps.user_repository.list_all().await?)
    }

    /// 封禁并撤销该用户的全部会话
    pub async fn ban_user(&self, user_id: UserId) -> Result<User, ApplicationError> {
        let mut user = self
            .deps
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        user.ban(self.deps.clock.now());
        let user = self.deps.user_repository.update(user).await?;

        let revoked = self.deps.session_repository.delete_for_user(user_id).await?;
        self.deps.presence.clear_presence(user_id);
        tracing::info!(user_id = %user_id, revoked, "用户已被封禁");
        Ok(user)
    }

    /// 删除用户及其会话、私信、通知和相关举报；登录记录保留但不再关联该用户
    pub async fn delete_user(&self, user_id: UserId) -> Result<bool, ApplicationError> {
        self.deps.session_repository.delete_for_user(user_id).await?;
        self.deps.presence.clear_presence(user_id);
        let messages = self.deps.message_repository.delete_for_user(user_id).await?;
        let notifications = self.deps.notification_repository.clear(user_id).await?;
        let reports = self.deps.report_repository.delete_for_user(user_id).await?;
        self.deps.login_event_repository.detach_user(user_id).await?;

        let deleted = self.deps.user_repository.delete(user_id).await?;
        if deleted {
            tracing::info!(
                user_id = %user_id,
                messages,
                notifications,
                reports,
                "用户已删除"
            );
        }
        Ok(deleted)
    }

    async fn find_report(&self, report_id: ReportId) -> Result<Report, ApplicationError> {
        self.deps
            .report_repository
            .find_by_id(report_id)
            .await?
            .ok_or_else(|| DomainError::ReportNotFound.into())
    }

    async fn dismiss(&self, mut report: Report) -> Result<Report, ApplicationError> {
        report.set_status(ReportStatus::Dismissed, self.deps.clock.now());
        Ok(self.deps.report_repository.update(report).await?)
    }

    /// 处置通知落库后立即推送给目标用户
    async fn notify(
        &self,
        user_id: UserId,
        icon: &str,
        title: &str,
        content: &str,
        link: &str,
    ) -> Result<(), ApplicationError> {
        let notification = self
            .deps
            .notification_repository
            .create(NewNotification {
                user_id,
                kind: notification_kinds::MODERATION.to_owned(),
                icon: icon.to_owned(),
                title: title.to_owned(),
                content: content.to_owned(),
                link: link.to_owned(),
            })
            .await?;

        if let Err(err) = self.deps.dispatcher.on_notification(&notification, user_id) {
            tracing::warn!(user_id = %user_id, error = %err, "处置通知推送失败");
        }
        Ok(())
    }
}
