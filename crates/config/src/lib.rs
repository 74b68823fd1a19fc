//! 统一配置中心
//!
//! 加载顺序：内置默认值 -> 可选配置文件（`APP_CONFIG_FILE`）-> `APP_` 前缀的环境变量。
//! 嵌套字段用双下划线分隔，例如 `APP_REALTIME__KEEPALIVE_INTERVAL_SECS=20`。

use std::time::Duration;

use figment::providers::{Env, Format, Json, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const CONFIG_FILE_ENV: &str = "APP_CONFIG_FILE";
pub const ENV_PREFIX: &str = "APP_";

/// 数据存放位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// 进程内存，重启即丢失
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// `storage = postgres` 时必填
    #[serde(default)]
    pub url: String,
    #[validate(range(min = 1))]
    pub max_connections: u32,
    #[validate(range(min = 4, max = 31))]
    pub bcrypt_cost: Option<u32>,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

/// 实时推送
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RealtimeConfig {
    /// 长连接空闲时发送 keepalive 的间隔，最长一小时
    #[validate(range(min = 1, max = 3600))]
    pub keepalive_interval_secs: u64,
    /// 单用户事件积压上限，不设置表示不限
    #[validate(range(min = 1))]
    pub max_pending_per_user: Option<usize>,
}

impl RealtimeConfig {
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionConfig {
    #[validate(length(min = 1))]
    pub cookie_name: String,
    /// 只在 HTTPS 下发送 cookie
    #[serde(default)]
    pub secure_cookie: bool,
}

/// 启动时确保存在的管理员账号
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct BootstrapAdminConfig {
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdminConfig")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_storage"))]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageBackend,
    #[validate(nested)]
    pub database: DatabaseConfig,
    #[validate(nested)]
    pub realtime: RealtimeConfig,
    #[validate(nested)]
    pub session: SessionConfig,
    #[serde(default)]
    #[validate(nested)]
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

fn default_true() -> bool {
    true
}

fn validate_storage(config: &AppConfig) -> Result<(), ValidationError> {
    if config.storage == StorageBackend::Postgres && config.database.url.trim().is_empty() {
        return Err(ValidationError::new("database_url_required")
            .with_message("database.url is required when storage = postgres".into()));
    }
    Ok(())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 8080,
            },
            storage: StorageBackend::Memory,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                bcrypt_cost: None,
                run_migrations: true,
            },
            realtime: RealtimeConfig {
                keepalive_interval_secs: 20,
                max_pending_per_user: None,
            },
            session: SessionConfig {
                cookie_name: "genbridge_session".into(),
                secure_cookie: false,
            },
            bootstrap_admin: None,
        }
    }
}

impl AppConfig {
    /// 按默认值、配置文件、环境变量的顺序合并
    pub fn figment() -> Figment {
        let mut fig = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            fig = if path.ends_with(".json") {
                fig.merge(Json::file(path))
            } else {
                fig.merge(Yaml::file(path))
            };
        }
        fig.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 用于日志输出，隐藏数据库口令
    pub fn sanitize(&self) -> String {
        let mut sanitized = self.clone();
        if let Some(at) = sanitized.database.url.rfind('@') {
            let scheme_end = sanitized.database.url.find("://").map(|i| i + 3).unwrap_or(0);
            sanitized
                .database
                .url
                .replace_range(scheme_end..at, "[REDACTED]");
        }
        format!("{sanitized:?}")
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}
