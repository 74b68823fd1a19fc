//! 主应用程序入口
//!
//! 加载配置、选择存储后端、准备初始管理员，然后启动 Axum Web API 服务。

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use application::{Clock, PasswordHasher, SignupRequest, SystemClock};
use config::{AppConfig, StorageBackend};
use infrastructure::{BcryptPasswordHasher, Infrastructure, InfrastructureConfig};
use tracing_subscriber::EnvFilter;
use web_api::{
    router, AppState, SessionCookieSettings, StateDependencies, DEFAULT_KEEPALIVE_INTERVAL,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志，默认 info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("加载配置失败")?;
    tracing::info!(config = %config.sanitize(), "配置已加载");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut deps = match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("使用内存存储，进程重启后数据会丢失");
            let password_hasher: Arc<dyn PasswordHasher> =
                Arc::new(BcryptPasswordHasher::new(config.database.bcrypt_cost));
            StateDependencies::in_memory(password_hasher, clock)
        }
        StorageBackend::Postgres => {
            let infrastructure = Infrastructure::connect(InfrastructureConfig {
                database_url: config.database.url.clone(),
                max_connections: config.database.max_connections,
                bcrypt_cost: config.database.bcrypt_cost,
                run_migrations: config.database.run_migrations,
            })
            .await
            .context("连接数据库失败")?;
            tracing::info!("已连接 PostgreSQL");

            let storage = infrastructure.storage.clone();
            StateDependencies {
                user_repository: storage.user_repository.clone(),
                message_repository: storage.message_repository.clone(),
                notification_repository: storage.notification_repository.clone(),
                report_repository: storage.report_repository.clone(),
                login_event_repository: storage.login_event_repository.clone(),
                session_repository: storage.session_repository.clone(),
                password_hasher: infrastructure.password_hasher_trait(),
                clock,
                keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
                max_pending_per_user: None,
                session_cookie: SessionCookieSettings::default(),
            }
        }
    };
    // 实时推送与会话参数以配置为准
    deps.keepalive_interval = config.realtime.keepalive_interval();
    deps.max_pending_per_user = config.realtime.max_pending_per_user;
    deps.session_cookie = SessionCookieSettings {
        name: config.session.cookie_name.clone(),
        secure: config.session.secure_cookie,
    };

    let state = AppState::new(deps);

    if let Some(admin) = &config.bootstrap_admin {
        let user = state
            .auth_service
            .ensure_admin(SignupRequest {
                full_name: admin.full_name.clone(),
                email: admin.email.clone(),
                password: admin.password.clone(),
            })
            .await
            .context("创建初始管理员失败")?;
        tracing::info!(user_id = %user.id, "初始管理员已就绪");
    }

    let app = router(state);
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法监听 {addr}"))?;

    tracing::info!("服务启动在 http://{}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "无法监听退出信号");
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，正在停止服务");
}
