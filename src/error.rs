use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("no such {entity}: {id}")]
    NotFound { entity: &'static str, id: i64 },
    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Import(#[from] csv::Error),
}

impl DashboardError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
