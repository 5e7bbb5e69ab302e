//! SurrealDB implementation of [`LazyUserRepository`].
//!
//! Writes that touch both the host user table and the registry run in a
//! single transaction, so a lazy account is never left without its entry
//! (or an entry without its account).

use chrono::{DateTime, Utc};
use lazysignup_core::error::LazyResult;
use lazysignup_core::models::lazy_user::{ConvertLazyUser, LazyUser};
use lazysignup_core::models::user::{CreateUser, User};
use lazysignup_core::repository::{LazyUserRepository, PaginatedResult, Pagination};
use lazysignup_core::user_model::{AUTH_USER, UserModel};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;
use crate::password::hash_password;
use crate::repository::user::{UserRow, stored_password};

const ENTITY: &str = "lazy_user";

#[derive(Debug, SurrealValue)]
struct LazyUserRow {
    user_id: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct LazyUserRowWithId {
    record_id: String,
    user_id: String,
    created_at: DateTime<Utc>,
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Corrupt(format!("invalid {what} UUID: {e}")))
}

impl LazyUserRow {
    fn into_lazy_user(self, id: Uuid) -> Result<LazyUser, DbError> {
        Ok(LazyUser {
            id,
            user_id: parse_uuid(&self.user_id, "user")?,
            created_at: self.created_at,
        })
    }
}

impl LazyUserRowWithId {
    fn try_into_lazy_user(self) -> Result<LazyUser, DbError> {
        Ok(LazyUser {
            id: parse_uuid(&self.record_id, "lazy user")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the LazyUser registry.
#[derive(Clone)]
pub struct SurrealLazyUserRepository<C: Connection> {
    db: Surreal<C>,
    model: &'static UserModel,
    pepper: Option<String>,
}

impl<C: Connection> SurrealLazyUserRepository<C> {
    /// Registry over accounts of the built-in `auth.User` model.
    pub fn new(db: Surreal<C>) -> Self {
        Self::for_model(db, &AUTH_USER)
    }

    pub fn for_model(db: Surreal<C>, model: &'static UserModel) -> Self {
        Self {
            db,
            model,
            pepper: None,
        }
    }

    pub fn with_pepper(mut self, pepper: String) -> Self {
        self.pepper = Some(pepper);
        self
    }
}

impl<C: Connection> LazyUserRepository for SurrealLazyUserRepository<C> {
    async fn create_with_user(&self, input: CreateUser) -> LazyResult<(User, LazyUser)> {
        let user_id = Uuid::new_v4();
        let lazy_id = Uuid::new_v4();
        let user_id_str = user_id.to_string();

        let password_hash = stored_password(input.password.as_deref(), self.pepper.as_deref())?;

        // Result 0 is BEGIN. The user CREATE comes next so a username
        // conflict is the first reported statement error.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 CREATE type::record($table, $user_id) SET \
                    username = $username, email = $email, \
                    password_hash = $password_hash, status = 'Active'; \
                 CREATE type::record('lazy_user', $lazy_id) SET \
                    user_id = $user_id; \
                 COMMIT TRANSACTION;",
            )
            .bind(("table", self.model.table.to_string()))
            .bind(("user_id", user_id_str.clone()))
            .bind(("lazy_id", lazy_id.to_string()))
            .bind(("username", input.username))
            .bind(("email", input.email))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(self.model.table, e))?;

        let user_rows: Vec<UserRow> = result.take(1).map_err(DbError::from)?;
        let user_row = user_rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: self.model.table.into(),
                id: user_id_str.clone(),
            })?;

        let lazy_rows: Vec<LazyUserRow> = result.take(2).map_err(DbError::from)?;
        let lazy_row = lazy_rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: ENTITY.into(),
                id: lazy_id.to_string(),
            })?;

        Ok((
            user_row.into_user(user_id)?,
            lazy_row.into_lazy_user(lazy_id)?,
        ))
    }

    async fn get_by_user_id(&self, user_id: Uuid) -> LazyResult<LazyUser> {
        let user_id_str = user_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM lazy_user \
                 WHERE user_id = $user_id",
            )
            .bind(("user_id", user_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LazyUserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: format!("user_id={user_id_str}"),
        })?;

        Ok(row.try_into_lazy_user()?)
    }

    async fn exists_for_user(&self, user_id: Uuid) -> LazyResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM lazy_user \
                 WHERE user_id = $user_id GROUP ALL",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn convert(&self, user_id: Uuid, input: ConvertLazyUser) -> LazyResult<User> {
        let user_id_str = user_id.to_string();
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let mut sets = vec![
            "username = $username",
            "password_hash = $password_hash",
            "updated_at = time::now()",
        ];
        if input.email.is_some() {
            sets.push("email = $email");
        }

        // The guarded UPDATE touches nothing when the registry entry is
        // gone, which is how a concurrent conversion is detected.
        let query = format!(
            "BEGIN TRANSACTION; \
             UPDATE type::record($table, $user_id) SET {} \
                WHERE array::len((SELECT VALUE id FROM lazy_user \
                    WHERE user_id = $user_id)) > 0; \
             DELETE lazy_user WHERE user_id = $user_id; \
             COMMIT TRANSACTION;",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("table", self.model.table.to_string()))
            .bind(("user_id", user_id_str.clone()))
            .bind(("username", input.username))
            .bind(("password_hash", password_hash));
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(self.model.table, e))?;

        // Result 0 is BEGIN; 1 is the guarded UPDATE.
        let rows: Vec<UserRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| {
            debug!(user_id = %user_id, "conversion matched no lazy registry entry");
            DbError::NotFound {
                entity: ENTITY.into(),
                id: format!("user_id={user_id_str}"),
            }
        })?;

        Ok(row.into_user(user_id)?)
    }

    async fn list_created_before(&self, cutoff: DateTime<Utc>) -> LazyResult<Vec<LazyUser>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM lazy_user \
                 WHERE created_at < $cutoff \
                 ORDER BY created_at ASC",
            )
            .bind(("cutoff", cutoff))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LazyUserRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_lazy_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn list(&self, pagination: Pagination) -> LazyResult<PaginatedResult<LazyUser>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM lazy_user GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM lazy_user \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LazyUserRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_lazy_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
