#[derive(Debug, thiserror::Error)]
pub enum GroupQueryError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Pattern '{0}' contains a null byte")]
    InvalidPattern(String),
}
