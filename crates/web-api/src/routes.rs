use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use application::{
    AuthOutcome, ContactDto, CreateReportRequest, LoginRequest, MessageDto, SendMessageRequest,
    SessionStatus, SignupRequest, WarningDto,
};
use domain::{Notification, Report, Timestamp, UserId, UserPublic};

use crate::{
    admin_routes::admin_routes,
    error::ApiError,
    extract::{ApiJson, ApiPath},
    realtime::realtime_routes,
    session::{expired_session_cookie, session_cookie, session_token, CurrentUser, RequestClient},
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct SignupPayload {
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct SendMessagePayload {
    recipient_id: Option<Uuid>,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ReportPayload {
    target_user_id: Option<Uuid>,
    #[serde(default)]
    reason: String,
    details: Option<String>,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    user: UserPublic,
    warning: WarningDto,
}

#[derive(Debug, Serialize)]
struct SuspendedInfo {
    until: Timestamp,
}

#[derive(Debug, Serialize)]
struct MeResponse {
    user: Option<UserPublic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<WarningDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suspended: Option<SuspendedInfo>,
}

#[derive(Debug, Serialize)]
struct SendMessageResponse {
    message: MessageDto,
    notification_created: bool,
}

#[derive(Debug, Serialize)]
struct CountResponse {
    count: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/admin_login", post(admin_login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/warning_ack", post(warning_ack))
        .route("/messages/send", post(send_message))
        .route("/messages/contacts", get(list_contacts))
        .route("/messages/thread/{other_id}", get(get_thread))
        .route("/notifications", get(list_notifications))
        .route("/notifications/clear", post(clear_notifications))
        .route("/notifications/mark_all_read", post(mark_notifications_read))
        .route("/reports", post(create_report))
        .nest("/realtime", realtime_routes())
        .nest("/admin", admin_routes())
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// 写入会话 Cookie 并返回用户信息
fn authenticated(
    state: &AppState,
    status: StatusCode,
    outcome: AuthOutcome,
) -> Result<Response, ApiError> {
    let cookie = session_cookie(&state.session_cookie, &outcome.session.token)?;
    let body = AuthResponse {
        user: outcome.user,
        warning: outcome.warning,
    };
    Ok((status, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

async fn signup(
    State(state): State<AppState>,
    RequestClient(client): RequestClient,
    ApiJson(payload): ApiJson<SignupPayload>,
) -> Result<Response, ApiError> {
    let outcome = state
        .auth_service
        .signup(
            SignupRequest {
                full_name: payload.full_name,
                email: payload.email,
                password: payload.password,
            },
            &client,
        )
        .await?;

    authenticated(&state, StatusCode::CREATED, outcome)
}

async fn login(
    State(state): State<AppState>,
    RequestClient(client): RequestClient,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> Result<Response, ApiError> {
    let outcome = state
        .auth_service
        .login(
            LoginRequest {
                email: payload.email,
                password: payload.password,
            },
            &client,
        )
        .await?;

    authenticated(&state, StatusCode::OK, outcome)
}

async fn admin_login(
    State(state): State<AppState>,
    RequestClient(client): RequestClient,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> Result<Response, ApiError> {
    let outcome = state
        .auth_service
        .admin_login(
            LoginRequest {
                email: payload.email,
                password: payload.password,
            },
            &client,
        )
        .await?;

    authenticated(&state, StatusCode::OK, outcome)
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let token = session_token(&headers, &state.session_cookie.name);
    state.auth_service.logout(token.as_ref()).await?;

    let mut response = StatusCode::NO_CONTENT.into_response();
    if let Some(cookie) = expired_session_cookie(&state.session_cookie) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let token = session_token(&headers, &state.session_cookie.name);
    let status = state.auth_service.session_status(token.as_ref()).await?;

    let response = match status {
        SessionStatus::Anonymous => Json(MeResponse {
            user: None,
            warning: None,
            suspended: None,
        })
        .into_response(),
        SessionStatus::Suspended { until } => {
            let body = Json(MeResponse {
                user: None,
                warning: None,
                suspended: Some(SuspendedInfo { until }),
            });
            match expired_session_cookie(&state.session_cookie) {
                Some(cookie) => ([(header::SET_COOKIE, cookie)], body).into_response(),
                None => body.into_response(),
            }
        }
        SessionStatus::Active { user, warning } => Json(MeResponse {
            user: Some(user),
            warning: Some(warning),
            suspended: None,
        })
        .into_response(),
    };
    Ok(response)
}

async fn warning_ack(State(state): State<AppState>, user: CurrentUser) -> StatusCode {
    state.auth_service.acknowledge_warning(user.user_id()).await;
    StatusCode::NO_CONTENT
}

async fn send_message(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<SendMessagePayload>,
) -> Result<(StatusCode, Json<SendMessageResponse>), ApiError> {
    let outcome = state
        .messaging_service
        .send_message(SendMessageRequest {
            sender_id: user.user_id(),
            recipient_id: payload.recipient_id,
            text: payload.text,
        })
        .await?;

    for failure in &outcome.fan_out_failures {
        tracing::warn!(
            message_id = %outcome.message.id,
            stage = %failure.stage,
            error = %failure.message,
            "私信已保存，但实时推送或通知失败"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            message: MessageDto::from(&outcome.message),
            notification_created: outcome.notification_created(),
        }),
    ))
}

async fn list_contacts(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ContactDto>>, ApiError> {
    let contacts = state.messaging_service.list_contacts(user.user_id()).await?;
    Ok(Json(contacts))
}

async fn get_thread(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(other_id): ApiPath<Uuid>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let messages = state
        .messaging_service
        .thread(user.user_id(), UserId::from(other_id))
        .await?;
    Ok(Json(messages))
}

async fn list_notifications(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let items = state.notification_service.list(user.user_id()).await?;
    Ok(Json(items))
}

async fn clear_notifications(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state.notification_service.clear(user.user_id()).await?;
    Ok(Json(CountResponse { count }))
}

async fn mark_notifications_read(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state
        .notification_service
        .mark_all_read(user.user_id())
        .await?;
    Ok(Json(CountResponse { count }))
}

async fn create_report(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<ReportPayload>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let report = state
        .report_service
        .create_report(CreateReportRequest {
            reporter_id: user.user_id(),
            target_user_id: payload.target_user_id,
            reason: payload.reason,
            details: payload.details,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(report)))
}
