//! Credential-setting forms used by the conversion flow.
//!
//! A form cleans the raw submission into [`Credentials`] or reports
//! field-level errors. Checks that need the store (username uniqueness)
//! are added by the service afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use lazysignup_core::error::{LazyResult, LazySignupError};
use lazysignup_core::user_model::UserModel;
use serde::{Deserialize, Serialize};

use crate::password::PasswordPolicy;

/// Raw conversion submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConvertInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Cleaned credentials, ready to replace the generated ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

/// Field name → messages. Ordered so rendered output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// A validation/field set for the conversion endpoint.
pub trait ConvertForm: Send + Sync + std::fmt::Debug {
    /// Name the form is configured by.
    fn name(&self) -> &'static str;

    /// Whether the form collects an email address.
    fn requires_email(&self) -> bool {
        false
    }

    /// Clean `input` against the user model and password policy.
    fn clean(
        &self,
        input: &ConvertInput,
        model: &UserModel,
        policy: &PasswordPolicy,
    ) -> Result<Credentials, FieldErrors>;
}

fn valid_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '_' | '-')
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

/// Username + password/confirmation checks shared by the built-in forms.
fn clean_username_and_password(
    input: &ConvertInput,
    model: &UserModel,
    policy: &PasswordPolicy,
    errors: &mut FieldErrors,
) -> (String, String) {
    let username = input.username.trim().to_string();

    if username.is_empty() {
        errors.add("username", "This field is required.");
    } else {
        if !username.chars().all(valid_username_char) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        if username.chars().count() > model.username_max_length {
            errors.add(
                "username",
                format!(
                    "Ensure this value has at most {} characters.",
                    model.username_max_length
                ),
            );
        }
    }

    if input.password1.is_empty() {
        errors.add("password1", "This field is required.");
    }
    if input.password2.is_empty() {
        errors.add("password2", "This field is required.");
    }
    if !input.password1.is_empty() && !input.password2.is_empty() {
        if input.password1 != input.password2 {
            errors.add("password2", "The two password fields didn't match.");
        } else {
            for problem in policy.violations(&input.password1, &username) {
                errors.add("password2", problem);
            }
        }
    }

    (username, input.password1.clone())
}

/// Username, password and confirmation.
#[derive(Debug, Default)]
pub struct UserCreationForm;

impl ConvertForm for UserCreationForm {
    fn name(&self) -> &'static str {
        "UserCreationForm"
    }

    fn clean(
        &self,
        input: &ConvertInput,
        model: &UserModel,
        policy: &PasswordPolicy,
    ) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::default();
        let (username, password) = clean_username_and_password(input, model, policy, &mut errors);

        if errors.is_empty() {
            Ok(Credentials {
                username,
                password,
                email: None,
            })
        } else {
            Err(errors)
        }
    }
}

/// [`UserCreationForm`] plus a required email address.
#[derive(Debug, Default)]
pub struct EmailUserCreationForm;

impl ConvertForm for EmailUserCreationForm {
    fn name(&self) -> &'static str {
        "EmailUserCreationForm"
    }

    fn requires_email(&self) -> bool {
        true
    }

    fn clean(
        &self,
        input: &ConvertInput,
        model: &UserModel,
        policy: &PasswordPolicy,
    ) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::default();
        let (username, password) = clean_username_and_password(input, model, policy, &mut errors);

        let email = input.email.as_deref().map(str::trim).unwrap_or_default();
        if email.is_empty() {
            errors.add("email", "This field is required.");
        } else if !looks_like_email(email) {
            errors.add("email", "Enter a valid email address.");
        }

        if errors.is_empty() {
            Ok(Credentials {
                username,
                password,
                email: Some(email.to_string()),
            })
        } else {
            Err(errors)
        }
    }
}

/// Look up a built-in form by its configured name.
pub fn form_by_name(name: &str) -> LazyResult<Arc<dyn ConvertForm>> {
    match name {
        "UserCreationForm" => Ok(Arc::new(UserCreationForm)),
        "EmailUserCreationForm" => Ok(Arc::new(EmailUserCreationForm)),
        other => Err(LazySignupError::Configuration(format!(
            "unknown conversion form: {other}"
        ))),
    }
}
