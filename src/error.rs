use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("{0}")]
    Validation(String),
    #[error("no words available")]
    EmptySet,
    #[error("user {0} is not registered")]
    UnknownUser(i64),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type BotResult<T> = Result<T, BotError>;
