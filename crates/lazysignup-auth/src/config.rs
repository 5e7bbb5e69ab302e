//! Lazy signup configuration.

use chrono::Duration;
use lazysignup_core::error::{LazyResult, LazySignupError};
use lazysignup_core::user_model::{DEFAULT_USER_MODEL, UserModel, get_user_class};
use serde::Deserialize;

/// Random hex characters a generated username must keep after the prefix.
pub const MIN_USERNAME_RANDOM_CHARS: usize = 16;

/// User agents that never receive a lazy account (case-insensitive
/// substring match).
const DEFAULT_USER_AGENT_BLACKLIST: &[&str] = &[
    "slurp",
    "googlebot",
    "yandex",
    "msnbot",
    "baiduspider",
    "bingbot",
    "duckduckbot",
];

/// Configuration for the lazy signup service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LazySignupConfig {
    /// Label of the host user model (see [`get_user_class`]).
    pub user_model: String,
    /// Optional pepper prepended to passwords before Argon2id hashing
    /// and verification. Repositories that hash passwords must be given
    /// the same value.
    pub pepper: Option<String>,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
    /// Session lifetime in seconds (default: 1_209_600 = 14 days).
    pub session_lifetime_secs: u64,
    /// Age in seconds after which an unconverted lazy account is removed
    /// by the cleanup task. `None` uses the session lifetime.
    pub lazy_user_expiry_secs: Option<u64>,
    /// How many usernames are tried before lazy account creation gives up.
    pub username_generation_attempts: u32,
    /// Optional prefix for generated usernames.
    pub username_prefix: Option<String>,
    /// User agent fragments that are never given a lazy account.
    pub user_agent_blacklist: Vec<String>,
}

impl Default for LazySignupConfig {
    fn default() -> Self {
        Self {
            user_model: DEFAULT_USER_MODEL.into(),
            pepper: None,
            min_password_length: 8,
            session_lifetime_secs: 1_209_600,
            lazy_user_expiry_secs: None,
            username_generation_attempts: 10,
            username_prefix: None,
            user_agent_blacklist: DEFAULT_USER_AGENT_BLACKLIST
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl LazySignupConfig {
    /// Resolve the configured user model.
    ///
    /// Fails when the username prefix leaves fewer than
    /// [`MIN_USERNAME_RANDOM_CHARS`] random characters within the model's
    /// username length.
    pub fn user_class(&self) -> LazyResult<&'static UserModel> {
        let model = get_user_class(&self.user_model)?;
        let prefix_len = self
            .username_prefix
            .as_deref()
            .map_or(0, |p| p.chars().count());
        if prefix_len + MIN_USERNAME_RANDOM_CHARS > model.username_max_length {
            return Err(LazySignupError::Configuration(format!(
                "username prefix of {prefix_len} chars leaves too little room in {} \
                 (max length {}, {MIN_USERNAME_RANDOM_CHARS} random chars needed)",
                model.label, model.username_max_length
            )));
        }
        Ok(model)
    }

    /// Effective lazy-account expiry in seconds.
    pub fn lazy_user_expiry(&self) -> u64 {
        self.lazy_user_expiry_secs
            .unwrap_or(self.session_lifetime_secs)
    }

    pub fn session_lifetime(&self) -> LazyResult<Duration> {
        seconds("session_lifetime_secs", self.session_lifetime_secs)
    }

    pub fn lazy_user_expiry_duration(&self) -> LazyResult<Duration> {
        seconds("lazy_user_expiry_secs", self.lazy_user_expiry())
    }

    /// Whether `user_agent` matches the blacklist.
    pub fn is_blacklisted(&self, user_agent: Option<&str>) -> bool {
        let Some(agent) = user_agent else {
            return false;
        };
        let agent = agent.to_lowercase();
        self.user_agent_blacklist
            .iter()
            .any(|fragment| agent.contains(&fragment.to_lowercase()))
    }
}

fn seconds(field: &str, secs: u64) -> LazyResult<Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| LazySignupError::Configuration(format!("{field} out of range: {secs}")))
}
