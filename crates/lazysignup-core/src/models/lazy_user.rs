//! Lazy user registry entry.
//!
//! A `LazyUser` links exactly one host [`User`](super::user::User) to the
//! "auto-created, not yet claimed" classification. The host store owns
//! the account itself; this record only owns the classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LazyUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Credentials that replace the generated ones during conversion.
#[derive(Debug, Clone)]
pub struct ConvertLazyUser {
    pub username: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    /// Replacement email, when the conversion form collects one.
    pub email: Option<String>,
}
