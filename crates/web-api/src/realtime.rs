//! 页面在线状态上报与事件长连接
//!
//! 长连接以 `text/event-stream` 输出，事件名即 [`domain::EventKind`] 的线上名称，
//! 数据为 JSON。客户端断开时 axum 丢弃响应流，订阅随之结束，未取出的事件留在队列中。
//! 每次推送（包括 keepalive）前重新校验会话，会话被撤销后连接随即结束。

use std::convert::Infallible;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, Sse},
    routing::{get, post},
    Router,
};
use domain::{EventKind, RealtimeEvent, UserId};
use futures_util::Stream;
use serde::Deserialize;
use uuid::Uuid;

use crate::{extract::ApiJson, session::CurrentUser, state::AppState};

/// 页面名缺省值
const UNKNOWN_PAGE: &str = "unknown";

pub fn realtime_routes() -> Router<AppState> {
    Router::new()
        .route("/presence", post(update_presence))
        .route("/stream", get(stream))
}

#[derive(Debug, Deserialize)]
struct PresencePayload {
    #[serde(default)]
    page: Option<String>,
    #[serde(default)]
    active_contact_id: Option<Uuid>,
}

fn normalize_page(page: Option<&str>) -> String {
    let page = page.unwrap_or_default().trim().to_lowercase();
    if page.is_empty() {
        UNKNOWN_PAGE.to_string()
    } else {
        page
    }
}

async fn update_presence(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<PresencePayload>,
) -> StatusCode {
    state.presence.set_presence(
        user.user_id(),
        normalize_page(payload.page.as_deref()),
        payload.active_contact_id.map(UserId::from),
    );
    StatusCode::NO_CONTENT
}

fn to_sse(event: &RealtimeEvent) -> Result<Event, axum::Error> {
    Event::default()
        .event(event.kind.as_str())
        .json_data(&event.payload)
}

/// 连接结束时记录日志
struct StreamGuard {
    user_id: UserId,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        tracing::info!(user_id = %self.user_id, "实时连接已关闭");
    }
}

async fn stream(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut subscription =
        state
            .dispatcher
            .subscribe(user.user_id(), user.is_admin(), state.keepalive_interval);
    tracing::info!(user_id = %user.user_id(), is_admin = user.is_admin(), "实时连接已建立");

    let guard = StreamGuard {
        user_id: user.user_id(),
    };
    let token = user.session.token;
    let events = async_stream::stream! {
        let _guard = guard;
        loop {
            let event = subscription.next_event().await;
            if event.kind != EventKind::Ready {
                match state.auth_service.resolve_session(&token).await {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        tracing::info!(user_id = %subscription.user_id(), "会话已失效，结束实时连接");
                        break;
                    }
                    Err(err) => {
                        tracing::warn!(user_id = %subscription.user_id(), error = %err, "会话校验失败，继续推送");
                    }
                }
            }
            match to_sse(&event) {
                Ok(sse) => {
                    tracing::debug!(user_id = %subscription.user_id(), kind = %event.kind, "推送实时事件");
                    yield Ok::<_, Infallible>(sse);
                }
                Err(err) => {
                    tracing::warn!(
                        user_id = %subscription.user_id(),
                        kind = %event.kind,
                        error = %err,
                        "实时事件编码失败，已丢弃"
                    );
                }
            }
        }
    };

    Sse::new(events)
}
