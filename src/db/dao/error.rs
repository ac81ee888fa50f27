use sea_orm::{DbErr, SqlErr};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum DaoLayerError {
    #[error("Database error: {0}")]
    Db(#[source] DbErr),
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("{entity} not found (id={id})")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("Invalid pagination: page={page} page_size={page_size}")]
    InvalidPagination { page: u64, page_size: u64 },
}

pub type DaoResult<T> = Result<T, DaoLayerError>;

impl From<DbErr> for DaoLayerError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => Self::UniqueViolation(detail),
            _ => Self::Db(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::DbErr;

    use super::DaoLayerError;

    #[test]
    fn plain_db_errors_stay_db_errors() {
        let err = DaoLayerError::from(DbErr::Custom("connection reset".to_string()));

        assert!(matches!(err, DaoLayerError::Db(_)));
        assert_eq!(err.to_string(), "Database error: Custom Error: connection reset");
    }
}
