use thiserror::Error;

/// Failures while provisioning a backing service for a test.
#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("container error: {0}")]
    Container(#[from] testcontainers::TestcontainersError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{service} did not accept connections after {attempts} attempts: {last_error}")]
    NotReady {
        service: &'static str,
        attempts: u32,
        last_error: String,
    },
}

pub type Result<T> = std::result::Result<T, TestInfraError>;
