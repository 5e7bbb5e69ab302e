//! Database-specific error types and conversions.

use lazysignup_core::error::LazySignupError;

/// Fragment of the SurrealDB message raised by a UNIQUE index conflict.
const UNIQUE_CONFLICT_MARKER: &str = "already contains";

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Unique constraint violated on {entity}")]
    Duplicate { entity: String },

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

impl DbError {
    /// Classify a statement error returned by `check()`.
    ///
    /// UNIQUE index conflicts become [`DbError::Duplicate`] so callers can
    /// retry or report a field error.
    pub(crate) fn from_statement(entity: &str, err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if message.contains(UNIQUE_CONFLICT_MARKER) {
            DbError::Duplicate {
                entity: entity.to_string(),
            }
        } else {
            DbError::Query(message)
        }
    }
}

impl From<DbError> for LazySignupError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => LazySignupError::NotFound { entity, id },
            DbError::Duplicate { entity } => LazySignupError::AlreadyExists { entity },
            DbError::Hash(msg) => LazySignupError::Crypto(msg),
            other => LazySignupError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_maps_to_already_exists() {
        let err: LazySignupError = DbError::Duplicate {
            entity: "user".into(),
        }
        .into();
        assert!(matches!(err, LazySignupError::AlreadyExists { entity } if entity == "user"));
    }

    #[test]
    fn not_found_is_preserved() {
        let err: LazySignupError = DbError::NotFound {
            entity: "lazy_user".into(),
            id: "abc".into(),
        }
        .into();
        assert!(matches!(err, LazySignupError::NotFound { .. }));
    }

    #[test]
    fn other_errors_become_database_errors() {
        let err: LazySignupError = DbError::Corrupt("bad uuid".into()).into();
        assert!(matches!(err, LazySignupError::Database(msg) if msg.contains("bad uuid")));
    }
}
