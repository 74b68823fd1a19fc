//! 基础设施层实现。
//!
//! 提供 PostgreSQL 仓储、数据库迁移和密码哈希，实现应用层定义的接口。

pub mod builder;
pub mod migrations;
pub mod password;
pub mod repository;

pub use builder::{Infrastructure, InfrastructureConfig, InfrastructureError};
pub use migrations::MIGRATOR;
pub use password::BcryptPasswordHasher;
pub use repository::{
    create_pg_pool, PgLoginEventRepository, PgMessageRepository, PgNotificationRepository,
    PgReportRepository, PgSessionRepository, PgStorage, PgUserRepository,
};
