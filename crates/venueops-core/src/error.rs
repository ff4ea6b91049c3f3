use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid task: {0}")]
    Validation(String),

    #[error("Failed to parse recurrence rule: {0}")]
    RecurrenceParse(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
