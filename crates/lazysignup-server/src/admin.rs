//! Read-only administrative listing of lazy users.

use axum::extract::{Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use lazysignup_core::error::LazySignupError;
use lazysignup_core::models::lazy_user::LazyUser;
use lazysignup_core::repository::Pagination;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use surrealdb::Connection;

use crate::error::ApiError;
use crate::state::AppState;

pub const LAZY_USERS_PATH: &str = "/admin/lazy-users";

const MAX_PAGE_SIZE: u64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct LazyUserListing {
    pub items: Vec<LazyUser>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Admin routes, behind the bearer-token check.
pub fn routes<C: Connection>(state: AppState<C>) -> Router<AppState<C>> {
    Router::new()
        .route(LAZY_USERS_PATH, get(list_lazy_users::<C>))
        .layer(axum::middleware::from_fn_with_state(state, require_admin::<C>))
}

async fn require_admin<C: Connection>(
    State(state): State<AppState<C>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match (state.admin_token.as_deref(), presented) {
        (Some(expected), Some(given)) if tokens_match(expected, given) => {
            Ok(next.run(request).await)
        }
        _ => Err(ApiError(LazySignupError::AuthenticationFailed {
            reason: "admin token required".into(),
        })),
    }
}

/// Compares fixed-length digests so timing does not reveal how much of
/// the token matched.
fn tokens_match(expected: &str, given: &str) -> bool {
    Sha256::digest(expected.as_bytes()) == Sha256::digest(given.as_bytes())
}

/// GET /admin/lazy-users?offset=&limit=
async fn list_lazy_users<C: Connection>(
    State(state): State<AppState<C>>,
    Query(params): Query<ListParams>,
) -> Result<Json<LazyUserListing>, ApiError> {
    let defaults = Pagination::default();
    let pagination = Pagination {
        offset: params.offset.unwrap_or(defaults.offset),
        limit: params.limit.unwrap_or(defaults.limit).min(MAX_PAGE_SIZE),
    };

    let page = state.service.list_lazy_users(pagination).await?;
    Ok(Json(LazyUserListing {
        items: page.items,
        total: page.total,
        offset: page.offset,
        limit: page.limit,
    }))
}
