//! Lazy Signup HTTP server.
//!
//! Visitors without a session are given a lazy account by the
//! [`session::lazy_session`] middleware; the conversion view at
//! `/convert/`, and any extra mounts, turn that account into a regular
//! one.

pub mod admin;
pub mod config;
pub mod convert;
pub mod error;
pub mod session;
pub mod state;
pub mod templates;

use std::collections::HashSet;
use std::sync::Arc;

use axum::Router;
use lazysignup_core::error::{LazyResult, LazySignupError};
use surrealdb::Connection;

pub use config::{ConvertMount, ConvertViewConfig, ServerConfig};
pub use error::ApiError;
pub use state::{AppState, Service, build_service};

/// Build the complete router.
///
/// Fails with a configuration error when a conversion form or template
/// name does not resolve, or when two views claim the same path.
pub fn build_router<C: Connection>(service: Arc<Service<C>>, config: &ServerConfig) -> LazyResult<Router> {
    let state = AppState::new(service, config)?;

    let mut paths = HashSet::from([
        convert::CONVERT_PATH,
        convert::DONE_PATH,
        admin::LAZY_USERS_PATH,
    ]);
    let mut site = convert::routes::<C>(&config.convert)?;
    for mount in &config.convert_mounts {
        if !paths.insert(mount.path.as_str()) {
            return Err(LazySignupError::Configuration(format!(
                "conversion path mounted twice: {}",
                mount.path
            )));
        }
        site = site.merge(convert::routes_with::<C>(&mount.path, &mount.view)?);
    }

    let site = site.layer(axum::middleware::from_fn_with_state(
        state.clone(),
        session::lazy_session::<C>,
    ));

    let mut app = Router::new().merge(site);
    if state.admin_token.is_some() {
        app = app.merge(admin::routes(state.clone()));
    }

    Ok(app.with_state(state))
}
