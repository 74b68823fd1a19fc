use sqlx::migrate::Migrator;

/// 编译期嵌入 `migrations/` 目录下的 SQL
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");
