//! 会话 Cookie 与请求身份提取
//!
//! 会话令牌放在 `HttpOnly; SameSite=Lax; Path=/` 的 Cookie 中，服务端按令牌查找会话记录。

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap, HeaderValue},
};
use domain::{ClientInfo, Session, SessionToken, UserId};

use crate::{error::ApiError, state::AppState, SessionCookieSettings};

/// 从 `Cookie` 头中取出会话令牌
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<SessionToken> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| SessionToken::new(value))
}

fn cookie_attributes(settings: &SessionCookieSettings) -> &'static str {
    if settings.secure {
        "HttpOnly; SameSite=Lax; Path=/; Secure"
    } else {
        "HttpOnly; SameSite=Lax; Path=/"
    }
}

pub fn session_cookie(
    settings: &SessionCookieSettings,
    token: &SessionToken,
) -> Result<HeaderValue, ApiError> {
    let cookie = format!(
        "{}={}; {}",
        settings.name,
        token.as_str(),
        cookie_attributes(settings)
    );
    HeaderValue::from_str(&cookie).map_err(|err| {
        tracing::error!(error = %err, "会话 Cookie 无法编码");
        ApiError::new(
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            "session_error",
            "failed to issue session",
        )
    })
}

/// 让浏览器立即删除会话 Cookie
pub fn expired_session_cookie(settings: &SessionCookieSettings) -> Option<HeaderValue> {
    let cookie = format!(
        "{}=; {}; Max-Age=0",
        settings.name,
        cookie_attributes(settings)
    );
    HeaderValue::from_str(&cookie).ok()
}

/// 已登录的请求方
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session: Session,
}

impl CurrentUser {
    pub fn user_id(&self) -> UserId {
        self.session.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.session.is_admin
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, &state.session_cookie.name)
            .ok_or_else(ApiError::unauthorized)?;
        let session = state
            .auth_service
            .resolve_session(&token)
            .await?
            .ok_or_else(ApiError::unauthorized)?;
        Ok(Self { session })
    }
}

/// 管理员会话
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::debug!(user_id = %user.user_id(), "非管理员访问管理接口");
            return Err(ApiError::forbidden());
        }
        Ok(Self(user))
    }
}

/// 登录审计用的来源信息
#[derive(Debug, Clone)]
pub struct RequestClient(pub ClientInfo);

impl<S: Send + Sync> FromRequestParts<S> for RequestClient {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty());
        let ip = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_default();
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Ok(Self(ClientInfo { ip, user_agent }))
    }
}
