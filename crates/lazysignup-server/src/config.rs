//! Server configuration, loaded from a TOML file.
//!
//! Every section is optional; missing keys fall back to their defaults.
//!
//! ```toml
//! bind_addr = "0.0.0.0:8080"
//! login_url = "/accounts/login/"
//!
//! [database]
//! url = "ws://127.0.0.1:8000"
//!
//! [lazysignup]
//! user_model = "auth.User"
//!
//! [convert]
//! form_class = "UserCreationForm"
//!
//! [[convert_mounts]]
//! path = "/signup/finish/"
//! template_name = "lazysignup/convert.html"
//! ```

use std::path::Path;

use anyhow::Context;
use lazysignup_auth::LazySignupConfig;
use lazysignup_db::DbConfig;
use serde::Deserialize;

/// Template and form used by the conversion view.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConvertViewConfig {
    /// Name of the conversion form (see `lazysignup_auth::form_by_name`).
    pub form_class: String,
    /// Full-page template.
    pub template_name: String,
    /// Partial template served to asynchronous callers.
    pub ajax_template_name: String,
}

impl Default for ConvertViewConfig {
    fn default() -> Self {
        Self {
            form_class: "UserCreationForm".into(),
            template_name: "lazysignup/convert.html".into(),
            ajax_template_name: "lazysignup/convert_ajax.html".into(),
        }
    }
}

/// An extra conversion view at its own path.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertMount {
    pub path: String,
    #[serde(flatten)]
    pub view: ConvertViewConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub bind_addr: String,
    /// Where the confirmation page sends users to sign in.
    pub login_url: String,
    /// Bearer token for `/admin/` routes. Admin routes are not mounted
    /// without one.
    pub admin_token: Option<String>,
    pub database: DbConfig,
    pub lazysignup: LazySignupConfig,
    /// View served at `/convert/`.
    pub convert: ConvertViewConfig,
    pub convert_mounts: Vec<ConvertMount>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            login_url: "/accounts/login/".into(),
            admin_token: None,
            database: DbConfig::default(),
            lazysignup: LazySignupConfig::default(),
            convert: ConvertViewConfig::default(),
            convert_mounts: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document.
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        toml::from_str(raw).context("invalid server configuration")
    }

    /// Load from `path`, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Self::from_toml(&raw)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.convert.form_class, "UserCreationForm");
        assert_eq!(config.convert.template_name, "lazysignup/convert.html");
        assert_eq!(config.lazysignup.user_model, "auth.User");
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn sections_override_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            admin_token = "s3cret"

            [lazysignup]
            user_model = "custom.EmailUser"
            username_prefix = "guest_"

            [convert]
            form_class = "EmailUserCreationForm"
            ajax_template_name = "lazysignup/done.html"
            "#,
        )
        .unwrap();

        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
        assert_eq!(config.lazysignup.user_model, "custom.EmailUser");
        assert_eq!(config.lazysignup.username_prefix.as_deref(), Some("guest_"));
        assert_eq!(config.lazysignup.min_password_length, 8);
        assert_eq!(config.convert.form_class, "EmailUserCreationForm");
        assert_eq!(config.convert.template_name, "lazysignup/convert.html");
        assert_eq!(config.convert.ajax_template_name, "lazysignup/done.html");
    }

    #[test]
    fn extra_mounts_fill_in_view_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            [[convert_mounts]]
            path = "/custom_convert/"
            template_name = "lazysignup/done.html"

            [[convert_mounts]]
            path = "/custom_convert_ajax/"
            ajax_template_name = "lazysignup/done.html"
            "#,
        )
        .unwrap();

        assert_eq!(config.convert_mounts.len(), 2);
        let first = &config.convert_mounts[0];
        assert_eq!(first.path, "/custom_convert/");
        assert_eq!(first.view.template_name, "lazysignup/done.html");
        assert_eq!(first.view.ajax_template_name, "lazysignup/convert_ajax.html");
        assert_eq!(first.view.form_class, "UserCreationForm");
        assert_eq!(
            config.convert_mounts[1].view.ajax_template_name,
            "lazysignup/done.html"
        );
    }

    #[test]
    fn mount_without_path_is_an_error() {
        assert!(ServerConfig::from_toml("[[convert_mounts]]\nform_class = \"x\"").is_err());
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(ServerConfig::from_toml("bind_addr = [").is_err());
    }

    #[test]
    fn missing_path_uses_defaults() {
        let config = ServerConfig::load(None).unwrap();
        assert_eq!(config.login_url, "/accounts/login/");
    }
}
