//! Conversion views: the credential form, its submission and the
//! confirmation page.

use std::sync::Arc;

use axum::extract::{Extension, Form, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Router;
use axum::routing::get;
use lazysignup_auth::service::ConvertOutcome;
use lazysignup_auth::{AuthError, ConvertInput, FieldErrors};
use lazysignup_core::error::{LazyResult, LazySignupError};
use surrealdb::Connection;
use tracing::info;

use crate::config::ConvertViewConfig;
use crate::error::ApiError;
use crate::session::{CurrentUser, session_cookie, user_agent};
use crate::state::{AppState, ConvertView};
use crate::templates::PageContext;

pub const CONVERT_PATH: &str = "/convert/";
pub const DONE_PATH: &str = "/convert/done/";

/// The default conversion view at [`CONVERT_PATH`] plus the
/// confirmation page.
pub fn routes<C: Connection>(config: &ConvertViewConfig) -> LazyResult<Router<AppState<C>>> {
    Ok(routes_with::<C>(CONVERT_PATH, config)?.route(DONE_PATH, get(convert_done::<C>)))
}

/// A conversion view at `path` with its own form and templates.
pub fn routes_with<C: Connection>(
    path: &str,
    config: &ConvertViewConfig,
) -> LazyResult<Router<AppState<C>>> {
    if !path.starts_with('/') {
        return Err(LazySignupError::Configuration(format!(
            "conversion path must start with '/': {path}"
        )));
    }
    let view = Arc::new(ConvertView::resolve(path, config)?);

    Ok(Router::new()
        .route(path, get(convert_form::<C>).post(convert_submit::<C>))
        .layer(Extension(view)))
}

/// `X-Requested-With: XMLHttpRequest` marks an asynchronous caller.
fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

fn render_form(
    view: &ConvertView,
    login_url: &str,
    ajax: bool,
    input: &ConvertInput,
    errors: Option<&FieldErrors>,
) -> Html<String> {
    let template = if ajax {
        view.ajax_template
    } else {
        view.template
    };
    Html(template.render(&PageContext {
        action: &view.action,
        username: &input.username,
        email: input.email.as_deref().unwrap_or_default(),
        requires_email: view.form.requires_email(),
        errors,
        login_url,
    }))
}

/// GET on a conversion path. Only lazy users may see the form.
async fn convert_form<C: Connection>(
    State(state): State<AppState<C>>,
    Extension(view): Extension<Arc<ConvertView>>,
    Extension(current): Extension<CurrentUser>,
    headers: HeaderMap,
) -> Result<Html<String>, ApiError> {
    let user = current.0.as_ref().map(|c| &c.user);
    let Some(user) = user else {
        return Err(LazySignupError::from(AuthError::NotAuthenticated).into());
    };
    if !state.service.is_lazy_user(Some(user)).await? {
        return Err(LazySignupError::from(AuthError::NotLazy).into());
    }

    Ok(render_form(
        &view,
        &state.login_url,
        is_ajax(&headers),
        &ConvertInput::default(),
        None,
    ))
}

/// POST on a conversion path.
async fn convert_submit<C: Connection>(
    State(state): State<AppState<C>>,
    Extension(view): Extension<Arc<ConvertView>>,
    Extension(current): Extension<CurrentUser>,
    headers: HeaderMap,
    Form(input): Form<ConvertInput>,
) -> Result<Response, ApiError> {
    let ajax = is_ajax(&headers);
    let user = current.0.as_ref().map(|c| &c.user);

    let outcome = state
        .service
        .convert(user, view.form.as_ref(), &input, user_agent(&headers))
        .await?;

    match outcome {
        ConvertOutcome::Converted(login) => {
            info!(user_id = %login.user.id, path = %view.action, ajax, "Conversion submitted");
            let cookie = session_cookie(&login.session_token, login.expires_in)?;
            let response = if ajax {
                (StatusCode::OK, "OK").into_response()
            } else {
                Redirect::to(DONE_PATH).into_response()
            };
            Ok(([(SET_COOKIE, cookie)], response).into_response())
        }
        ConvertOutcome::Invalid(errors) => {
            let page = render_form(&view, &state.login_url, ajax, &input, Some(&errors));
            if ajax {
                Ok((StatusCode::BAD_REQUEST, page).into_response())
            } else {
                Ok(page.into_response())
            }
        }
    }
}

/// GET /convert/done/
async fn convert_done<C: Connection>(State(state): State<AppState<C>>) -> Html<String> {
    Html(state.done_template.render(&PageContext {
        login_url: &state.login_url,
        ..Default::default()
    }))
}
