use std::sync::Arc;

use domain::{DomainError, Report, ReportId, UserId};
use uuid::Uuid;

use crate::{
    clock::Clock,
    dispatcher::RealtimeDispatcher,
    error::ApplicationError,
    repository::{ReportRepository, UserRepository},
};

#[derive(Debug, Clone)]
pub struct CreateReportRequest {
    pub reporter_id: UserId,
    pub target_user_id: Option<Uuid>,
    pub reason: String,
    pub details: Option<String>,
}

pub struct ReportServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub report_repository: Arc<dyn ReportRepository>,
    pub dispatcher: Arc<RealtimeDispatcher>,
    pub clock: Arc<dyn Clock>,
}

pub struct ReportService {
    deps: ReportServiceDependencies,
}

impl ReportService {
    pub fn new(deps: ReportServiceDependencies) -> Self {
        Self { deps }
    }

    /// 提交举报并实时通知在线的管理员
    pub async fn create_report(
        &self,
        request: CreateReportRequest,
    ) -> Result<Report, ApplicationError> {
        let reason = request.reason.trim().to_lowercase();
        let target_user_id = match request.target_user_id {
            Some(id) if !reason.is_empty() => UserId::from(id),
            _ => return Err(DomainError::invalid_argument("fields", "missing_fields").into()),
        };

        if self
            .deps
            .user_repository
            .find_by_id(target_user_id)
            .await?
            .is_none()
        {
            return Err(DomainError::UserNotFound.into());
        }

        let details = request
            .details
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_owned();
        let report = Report::open(
            ReportId::generate(),
            request.reporter_id,
            target_user_id,
            reason,
            details,
            self.deps.clock.now(),
        );
        let report = self.deps.report_repository.create(report).await?;
        tracing::info!(
            report_id = %report.id,
            reporter_id = %report.reporter_id,
            target_user_id = %report.target_user_id,
            "收到新举报"
        );

        if let Err(err) = self.deps.dispatcher.on_report(&report) {
            tracing::warn!(report_id = %report.id, error = %err, "举报事件推送失败");
        }
        Ok(report)
    }
}
