//! 密码哈希接口
//!
//! 注册、初始管理员和登录共用同一条输入规则：去掉首尾空白，空密码不会交给哈希器。

use std::fmt;

use async_trait::async_trait;
use domain::PasswordHash;
use thiserror::Error;

/// 哈希器自身的故障，对外统一表现为内部错误
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hashing(String),
    #[error("failed to verify password: {0}")]
    Verification(String),
}

/// 已去掉首尾空白且非空的明文密码
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PlainPassword<'a>(&'a str);

impl<'a> PlainPassword<'a> {
    pub fn parse(raw: &'a str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed))
        }
    }

    pub fn as_str(&self) -> &'a str {
        self.0
    }
}

impl fmt::Debug for PlainPassword<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword(***)")
    }
}

#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: PlainPassword<'_>) -> Result<PasswordHash, PasswordError>;

    /// 不匹配返回 `Ok(false)`；存储的哈希无法解析时返回 `Err`
    async fn verify(
        &self,
        password: PlainPassword<'_>,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_rejects_blank() {
        assert_eq!(PlainPassword::parse("  pw \n").unwrap().as_str(), "pw");
        assert!(PlainPassword::parse("   ").is_none());
        assert!(PlainPassword::parse("").is_none());
    }

    #[test]
    fn debug_hides_plaintext() {
        let password = PlainPassword::parse("hunter2").unwrap();
        assert!(!format!("{password:?}").contains("hunter2"));
    }
}
