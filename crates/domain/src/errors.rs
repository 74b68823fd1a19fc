//! 领域模型错误定义
//!
//! 定义了系统中所有可能的错误类型，提供清晰的错误上下文。

use thiserror::Error;

use crate::value_objects::Timestamp;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 参数校验失败
    #[error("验证失败: {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// 邮箱已被注册
    #[error("用户已存在")]
    UserAlreadyExists,

    /// 用户不存在
    #[error("用户不存在")]
    UserNotFound,

    /// 举报不存在
    #[error("举报不存在")]
    ReportNotFound,

    /// 账号或密码错误，或账号已被封禁
    #[error("账号或密码错误")]
    InvalidCredentials,

    /// 账号处于临时停用期
    #[error("账号已停用至 {until}")]
    AccountSuspended { until: Timestamp },

    /// 权限不足
    #[error("权限不足")]
    InsufficientPermissions,
}

impl DomainError {
    /// 创建参数校验错误
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 仓储层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
