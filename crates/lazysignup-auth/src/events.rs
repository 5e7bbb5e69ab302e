//! Notifications published by the conversion flow.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A lazy account was converted into a regular one.
#[derive(Debug, Clone, Serialize)]
pub struct UserConverted {
    pub user_id: Uuid,
    /// The username chosen during conversion.
    pub username: String,
    pub converted_at: DateTime<Utc>,
}
