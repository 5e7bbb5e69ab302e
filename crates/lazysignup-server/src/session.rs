//! Session cookie handling and lazy user assignment.
//!
//! Requests carrying a valid `lazysignup_session` cookie are attributed to
//! its user. Anyone else (apart from blacklisted agents) is given a fresh
//! lazy account and a session cookie on the way out.

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE, USER_AGENT};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use lazysignup_auth::service::AuthenticatedUser;
use lazysignup_core::error::LazySignupError;
use surrealdb::Connection;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "lazysignup_session";

/// The caller's identity, inserted into request extensions.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

pub fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
}

/// Raw session token from the `Cookie` header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value for a freshly issued session.
pub fn session_cookie(token: &str, max_age: u64) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Max-Age={max_age}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .map_err(|e| ApiError(LazySignupError::Internal(format!("invalid session cookie: {e}"))))
}

fn sets_session_cookie(response: &Response) -> bool {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| {
            v.strip_prefix(SESSION_COOKIE)
                .is_some_and(|rest| rest.starts_with('='))
        })
}

pub async fn lazy_session<C: Connection>(
    State(state): State<AppState<C>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let agent = user_agent(request.headers()).map(str::to_string);
    let token = session_token(request.headers());

    let mut current = match token {
        Some(token) => state.service.authenticate_session(&token).await?,
        None => None,
    };

    let mut issued = None;
    if current.is_none() {
        if let Some(login) = state.service.assign_lazy_user(agent.as_deref()).await? {
            debug!(user_id = %login.user.id, "Assigned lazy user");
            issued = Some((login.session_token, login.expires_in));
            current = Some(AuthenticatedUser {
                user: login.user,
                session_id: login.session_id,
            });
        }
    }

    request.extensions_mut().insert(CurrentUser(current));
    let mut response = next.run(request).await;

    // A handler that opened its own session (conversion) takes precedence.
    if let Some((token, max_age)) = issued {
        if !sets_session_cookie(&response) {
            response
                .headers_mut()
                .append(SET_COOKIE, session_cookie(&token, max_age)?);
        }
    }

    Ok(response)
}
