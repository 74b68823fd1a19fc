use application::{PasswordError, PasswordHasher, PlainPassword};
use async_trait::async_trait;
use bcrypt::{hash, verify, DEFAULT_COST};
use domain::PasswordHash;

/// bcrypt 哈希，计算放在阻塞线程池里执行
#[derive(Debug, Clone)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(cost: Option<u32>) -> Self {
        Self {
            cost: cost.unwrap_or(DEFAULT_COST),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: PlainPassword<'_>) -> Result<PasswordHash, PasswordError> {
        let cost = self.cost;
        let plaintext = password.as_str().to_owned();
        let hashed = tokio::task::spawn_blocking(move || hash(plaintext, cost))
            .await
            .map_err(|err| PasswordError::Hashing(err.to_string()))?
            .map_err(|err| PasswordError::Hashing(err.to_string()))?;

        PasswordHash::new(hashed).map_err(|err| PasswordError::Hashing(err.to_string()))
    }

    async fn verify(
        &self,
        password: PlainPassword<'_>,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordError> {
        let plaintext = password.as_str().to_owned();
        let hashed = hashed.as_str().to_owned();
        tokio::task::spawn_blocking(move || verify(plaintext, &hashed))
            .await
            .map_err(|err| PasswordError::Verification(err.to_string()))?
            .map_err(|err| PasswordError::Verification(err.to_string()))
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(None)
    }
}
