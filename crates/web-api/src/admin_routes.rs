//! 管理后台接口，全部要求管理员会话

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use application::{AdminSummaryDto, ModerationOutcome};
use domain::{LoginEvent, Report, ReportId, Timestamp, User, UserId, UserPublic};

use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    session::AdminUser,
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(get_summary))
        .route("/logins", get(list_logins))
        .route("/reports", get(list_reports))
        .route("/reports/{report_id}", put(update_report))
        .route("/reports/{report_id}/warn", post(warn_from_report))
        .route("/reports/{report_id}/suspend", post(suspend_from_report))
        .route("/users", get(list_users))
        .route("/users/{user_id}/ban", post(ban_user))
        .route("/users/{user_id}", delete(delete_user))
}

#[derive(Debug, Deserialize)]
struct LoginsQuery {
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ReportsQuery {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateReportPayload {
    #[serde(default)]
    status: String,
}

#[derive(Debug, Serialize)]
struct ModerationResponse {
    report: Report,
    target: Option<UserPublic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suspended_until: Option<Timestamp>,
}

impl From<ModerationOutcome> for ModerationResponse {
    fn from(outcome: ModerationOutcome) -> Self {
        Self {
            report: outcome.report,
            target: outcome.target,
            suspended_until: outcome.suspended_until,
        }
    }
}

async fn get_summary(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<AdminSummaryDto>, ApiError> {
    Ok(Json(state.moderation_service.summary().await?))
}

async fn list_logins(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<LoginsQuery>,
) -> Result<Json<Vec<LoginEvent>>, ApiError> {
    let logins = state.moderation_service.list_logins(query.limit).await?;
    Ok(Json(logins))
}

async fn list_reports(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<ReportsQuery>,
) -> Result<Json<Vec<Report>>, ApiError> {
    let reports = state
        .moderation_service
        .list_reports(query.status.as_deref())
        .await?;
    Ok(Json(reports))
}

async fn update_report(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(report_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateReportPayload>,
) -> Result<Json<Report>, ApiError> {
    let report = state
        .moderation_service
        .update_report(ReportId::from(report_id), &payload.status)
        .await?;
    tracing::info!(admin_id = %admin.user_id(), report_id = %report.id, "管理员更新举报状态");
    Ok(Json(report))
}

async fn warn_from_report(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(report_id): ApiPath<Uuid>,
) -> Result<Json<ModerationResponse>, ApiError> {
    let outcome = state
        .moderation_service
        .warn_from_report(ReportId::from(report_id))
        .await?;
    tracing::info!(admin_id = %admin.user_id(), report_id = %report_id, "管理员发出警告");
    Ok(Json(outcome.into()))
}

async fn suspend_from_report(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(report_id): ApiPath<Uuid>,
) -> Result<Json<ModerationResponse>, ApiError> {
    let outcome = state
        .moderation_service
        .suspend_from_report(ReportId::from(report_id))
        .await?;
    tracing::info!(admin_id = %admin.user_id(), report_id = %report_id, "管理员停用用户");
    Ok(Json(outcome.into()))
}

async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.moderation_service.list_users().await?))
}

async fn ban_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .moderation_service
        .ban_user(UserId::from(user_id))
        .await?;
    tracing::info!(admin_id = %admin.user_id(), user_id = %user.id, "管理员封禁用户");
    Ok(Json(user))
}

async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .moderation_service
        .delete_user(UserId::from(user_id))
        .await?;
    if !deleted {
        return Err(ApiError::not_found("user_not_found", "user not found"));
    }
    tracing::info!(admin_id = %admin.user_id(), user_id = %user_id, "管理员删除用户");
    Ok(StatusCode::NO_CONTENT)
}
