//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP 请求和事件长连接委托给应用层的用例服务。

mod admin_routes;
mod error;
mod extract;
mod realtime;
mod routes;
mod session;
mod state;

pub use error::{ApiError, ErrorBody};
pub use routes::router;
pub use session::{session_token, AdminUser, CurrentUser};
pub use state::{
    AppState, SessionCookieSettings, StateDependencies, DEFAULT_KEEPALIVE_INTERVAL,
};
