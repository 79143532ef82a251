// Error type for the query executor

use thiserror::Error;

/// Result type alias for executor operations
pub type Result<T> = std::result::Result<T, DbError>;

/// Query or introspection failure after retries exhausted.
//
// Malformed SQL, connectivity loss and permission errors all collapse into
// this one kind, with the last underlying driver message preserved. Callers
// above the tool layer never see raw sqlx errors.
#[derive(Debug, Clone, Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_preserves_message() {
        let err = DbError::Database("relation \"payments\" does not exist".to_string());
        assert_eq!(
            err.to_string(),
            "Database error: relation \"payments\" does not exist"
        );
    }
}
