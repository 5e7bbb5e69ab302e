//! Swappable user-model resolution.
//!
//! Deployments pick which host user model backs their accounts by label
//! (`auth.User` unless configured otherwise). Callers pass the configured
//! label on every lookup, so reconfiguration takes effect immediately.

use crate::error::{LazyResult, LazySignupError};

/// Label of the built-in user model used when nothing else is configured.
pub const DEFAULT_USER_MODEL: &str = "auth.User";

/// Descriptor of a concrete host user model.
#[derive(Debug, PartialEq, Eq)]
pub struct UserModel {
    /// Configuration label, e.g. `auth.User`.
    pub label: &'static str,
    /// Storage table holding the records.
    pub table: &'static str,
    /// Maximum length of the username field.
    pub username_max_length: usize,
    /// Whether a real email must be supplied when a lazy account is
    /// converted.
    pub requires_email: bool,
}

/// The default built-in user model.
pub static AUTH_USER: UserModel = UserModel {
    label: DEFAULT_USER_MODEL,
    table: "user",
    username_max_length: 150,
    requires_email: false,
};

/// A stricter custom model keyed by a short username plus an email.
pub static EMAIL_USER: UserModel = UserModel {
    label: "custom.EmailUser",
    table: "email_user",
    username_max_length: 30,
    requires_email: true,
};

static USER_MODELS: &[&UserModel] = &[&AUTH_USER, &EMAIL_USER];

/// Resolve the configured user model label to its descriptor.
pub fn get_user_class(configured: &str) -> LazyResult<&'static UserModel> {
    USER_MODELS
        .iter()
        .copied()
        .find(|model| model.label == configured)
        .ok_or_else(|| {
            LazySignupError::Configuration(format!("unknown user model: {configured}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_label_resolves_to_builtin_model() {
        let model = get_user_class(DEFAULT_USER_MODEL).unwrap();
        assert!(std::ptr::eq(model, &AUTH_USER));
        assert_eq!(model.table, "user");
    }

    #[test]
    fn custom_model_resolves() {
        let model = get_user_class("custom.EmailUser").unwrap();
        assert_eq!(model, &EMAIL_USER);
        assert!(model.requires_email);
    }

    #[test]
    fn unknown_label_is_configuration_error() {
        let err = get_user_class("legacy.Profile").unwrap_err();
        assert!(matches!(err, LazySignupError::Configuration(_)));
    }

    #[test]
    fn tables_are_distinct() {
        for (i, a) in USER_MODELS.iter().enumerate() {
            for b in &USER_MODELS[i + 1..] {
                assert_ne!(a.table, b.table);
            }
        }
    }
}
