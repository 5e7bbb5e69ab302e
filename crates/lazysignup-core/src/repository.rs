//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The auth layer is generic over
//! these traits so it has no dependency on the database crate.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::LazyResult;
use crate::models::{
    lazy_user::{ConvertLazyUser, LazyUser},
    session::{CreateSession, Session},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Host user store
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the username is taken.
    fn create(&self, input: CreateUser) -> impl Future<Output = LazyResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = LazyResult<User>> + Send;
    fn get_by_username(&self, username: &str) -> impl Future<Output = LazyResult<User>> + Send;
    /// Whether `username` belongs to any user other than `exclude`.
    fn username_taken(
        &self,
        username: &str,
        exclude: Option<Uuid>,
    ) -> impl Future<Output = LazyResult<bool>> + Send;
    fn update(&self, id: Uuid, input: UpdateUser) -> impl Future<Output = LazyResult<User>> + Send;
    /// Hard delete. Any lazy registry entry for the user goes with it.
    /// `NotFound` when no record was removed.
    fn delete(&self, id: Uuid) -> impl Future<Output = LazyResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = LazyResult<PaginatedResult<User>>> + Send;
}

// ---------------------------------------------------------------------------
// Lazy user registry
// ---------------------------------------------------------------------------

pub trait LazyUserRepository: Send + Sync {
    /// Create a host user and its registry entry in one transaction.
    ///
    /// Fails with `AlreadyExists` when the username is taken; nothing is
    /// written in that case.
    fn create_with_user(
        &self,
        input: CreateUser,
    ) -> impl Future<Output = LazyResult<(User, LazyUser)>> + Send;
    fn get_by_user_id(&self, user_id: Uuid) -> impl Future<Output = LazyResult<LazyUser>> + Send;
    fn exists_for_user(&self, user_id: Uuid) -> impl Future<Output = LazyResult<bool>> + Send;
    /// Replace the user's credentials and drop the registry entry in one
    /// transaction.
    ///
    /// Fails with `NotFound` (entity `lazy_user`) when the user has no
    /// registry entry, and `AlreadyExists` when the username is taken.
    fn convert(
        &self,
        user_id: Uuid,
        input: ConvertLazyUser,
    ) -> impl Future<Output = LazyResult<User>> + Send;
    /// Entries created strictly before `cutoff`, oldest first.
    fn list_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = LazyResult<Vec<LazyUser>>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = LazyResult<PaginatedResult<LazyUser>>> + Send;
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = LazyResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = LazyResult<Session>> + Send;
    /// Invalidate a single session.
    fn invalidate(&self, id: Uuid) -> impl Future<Output = LazyResult<()>> + Send;
    /// Invalidate all sessions for a user (e.g., on credential change).
    fn invalidate_user_sessions(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = LazyResult<()>> + Send;
    /// Remove expired sessions. Returns the number removed.
    fn cleanup_expired(&self) -> impl Future<Output = LazyResult<u64>> + Send;
}
