//! Shared application state.

use std::sync::Arc;

use lazysignup_auth::{ConvertForm, LazySignupConfig, LazySignupService, form_by_name};
use lazysignup_core::error::LazyResult;
use lazysignup_db::repository::{
    SurrealLazyUserRepository, SurrealSessionRepository, SurrealUserRepository,
};
use surrealdb::{Connection, Surreal};

use crate::config::{ConvertViewConfig, ServerConfig};
use crate::templates::{self, DONE_TEMPLATE, Template};

/// The service wired to the SurrealDB repositories.
pub type Service<C> = LazySignupService<
    SurrealUserRepository<C>,
    SurrealLazyUserRepository<C>,
    SurrealSessionRepository<C>,
>;

/// Build the service for the configured user model.
///
/// `config.pepper` is handed to both hashing repositories here so hashing
/// and verification share one source.
pub fn build_service<C: Connection>(db: Surreal<C>, config: LazySignupConfig) -> LazyResult<Service<C>> {
    let model = config.user_class()?;

    let mut users = SurrealUserRepository::for_model(db.clone(), model);
    let mut lazy_users = SurrealLazyUserRepository::for_model(db.clone(), model);
    if let Some(pepper) = &config.pepper {
        users = users.with_pepper(pepper.clone());
        lazy_users = lazy_users.with_pepper(pepper.clone());
    }

    Ok(LazySignupService::new(
        users,
        lazy_users,
        SurrealSessionRepository::new(db),
        config,
    ))
}

/// One mounted conversion view with its form and templates resolved.
#[derive(Debug)]
pub struct ConvertView {
    /// Path the form posts back to.
    pub action: String,
    pub form: Arc<dyn ConvertForm>,
    pub template: Template,
    pub ajax_template: Template,
}

impl ConvertView {
    pub fn resolve(action: &str, config: &ConvertViewConfig) -> LazyResult<Self> {
        Ok(Self {
            action: action.to_string(),
            form: form_by_name(&config.form_class)?,
            template: templates::lookup(&config.template_name)?,
            ajax_template: templates::lookup(&config.ajax_template_name)?,
        })
    }
}

pub struct AppState<C: Connection> {
    pub service: Arc<Service<C>>,
    pub done_template: Template,
    pub login_url: Arc<str>,
    pub admin_token: Option<Arc<str>>,
}

impl<C: Connection> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            done_template: self.done_template,
            login_url: Arc::clone(&self.login_url),
            admin_token: self.admin_token.clone(),
        }
    }
}

impl<C: Connection> AppState<C> {
    pub fn new(service: Arc<Service<C>>, config: &ServerConfig) -> LazyResult<Self> {
        Ok(Self {
            service,
            done_template: templates::lookup(DONE_TEMPLATE)?,
            login_url: Arc::from(config.login_url.as_str()),
            admin_token: config.admin_token.as_deref().map(Arc::from),
        })
    }
}
