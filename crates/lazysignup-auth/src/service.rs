//! Lazy signup service: lazy account creation, classification,
//! session handling and conversion.

use chrono::{DateTime, Utc};
use lazysignup_core::error::{LazyResult, LazySignupError};
use lazysignup_core::models::lazy_user::{ConvertLazyUser, LazyUser};
use lazysignup_core::models::session::CreateSession;
use lazysignup_core::models::user::{CreateUser, User, UserStatus};
use lazysignup_core::repository::{
    LazyUserRepository, PaginatedResult, Pagination, SessionRepository, UserRepository,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::LazySignupConfig;
use crate::error::AuthError;
use crate::events::UserConverted;
use crate::forms::{ConvertForm, ConvertInput, FieldErrors};
use crate::password::{self, PasswordPolicy};
use crate::token;
use crate::username;

/// Buffered conversion events per subscriber before lagging.
const CONVERSION_EVENT_CAPACITY: usize = 64;

/// An established session.
#[derive(Debug)]
pub struct LoginOutput {
    pub user: User,
    /// Raw opaque session token (return to client, not stored).
    pub session_token: String,
    pub session_id: Uuid,
    /// Session lifetime in seconds.
    pub expires_in: u64,
}

/// The user behind a valid session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub session_id: Uuid,
}

/// Result of a conversion attempt that passed the authorization checks.
#[derive(Debug)]
pub enum ConvertOutcome {
    /// Credentials replaced, lazy flag cleared, new session issued.
    Converted(LoginOutput),
    /// Submission rejected; nothing changed.
    Invalid(FieldErrors),
}

/// Lazy signup service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct LazySignupService<U: UserRepository, L: LazyUserRepository, S: SessionRepository> {
    user_repo: U,
    lazy_repo: L,
    session_repo: S,
    config: LazySignupConfig,
    conversions: broadcast::Sender<UserConverted>,
}

impl<U, L, S> LazySignupService<U, L, S>
where
    U: UserRepository,
    L: LazyUserRepository,
    S: SessionRepository,
{
    pub fn new(user_repo: U, lazy_repo: L, session_repo: S, config: LazySignupConfig) -> Self {
        let (conversions, _) = broadcast::channel(CONVERSION_EVENT_CAPACITY);
        Self {
            user_repo,
            lazy_repo,
            session_repo,
            config,
            conversions,
        }
    }

    pub fn config(&self) -> &LazySignupConfig {
        &self.config
    }

    /// Receive an event for every successful conversion from now on.
    pub fn subscribe_conversions(&self) -> broadcast::Receiver<UserConverted> {
        self.conversions.subscribe()
    }

    /// Create a host user with a generated username, an unusable
    /// password and a linked lazy registry entry.
    ///
    /// Username conflicts are retried with a fresh candidate up to
    /// `username_generation_attempts` times.
    pub async fn create_lazy_user(&self) -> LazyResult<(User, String)> {
        let model = self.config.user_class()?;
        let attempts = self.config.username_generation_attempts;

        for attempt in 1..=attempts {
            let candidate = username::generate_username(
                self.config.username_prefix.as_deref(),
                model.username_max_length,
            );

            match self
                .lazy_repo
                .create_with_user(CreateUser {
                    username: candidate.clone(),
                    email: String::new(),
                    password: None,
                })
                .await
            {
                Ok((user, entry)) => {
                    info!(
                        user_id = %user.id,
                        lazy_user_id = %entry.id,
                        username = %candidate,
                        "Created lazy user"
                    );
                    return Ok((user, candidate));
                }
                Err(LazySignupError::AlreadyExists { .. }) => {
                    warn!(attempt, username = %candidate, "Generated username already taken");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AuthError::UsernameExhausted { attempts }.into())
    }

    /// Whether `user` is a lazy account. Anonymous callers are not.
    pub async fn is_lazy_user(&self, user: Option<&User>) -> LazyResult<bool> {
        match user {
            Some(user) => self.lazy_repo.exists_for_user(user.id).await,
            None => Ok(false),
        }
    }

    /// Give an anonymous visitor a lazy account and a session.
    ///
    /// Returns `None` for blacklisted user agents (crawlers).
    pub async fn assign_lazy_user(
        &self,
        user_agent: Option<&str>,
    ) -> LazyResult<Option<LoginOutput>> {
        if self.config.is_blacklisted(user_agent) {
            debug!(user_agent = ?user_agent, "Not assigning lazy user to blacklisted agent");
            return Ok(None);
        }
        // Fail before an account is created that could never get a session.
        self.config.session_lifetime()?;

        let (user, _) = self.create_lazy_user().await?;
        self.start_session(user, user_agent).await.map(Some)
    }

    /// Resolve a raw session token to its user.
    ///
    /// Unknown, expired or orphaned sessions resolve to `None`; expired
    /// ones are removed on the way.
    pub async fn authenticate_session(
        &self,
        raw_token: &str,
    ) -> LazyResult<Option<AuthenticatedUser>> {
        let token_hash = token::hash_session_token(raw_token);
        let session = match self.session_repo.get_by_token_hash(&token_hash).await {
            Ok(s) => s,
            Err(LazySignupError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        if session.expires_at <= Utc::now() {
            self.session_repo.invalidate(session.id).await?;
            return Ok(None);
        }

        let user = match self.user_repo.get_by_id(session.user_id).await {
            Ok(u) => u,
            Err(LazySignupError::NotFound { .. }) => {
                self.session_repo.invalidate(session.id).await?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if user.status != UserStatus::Active {
            return Ok(None);
        }

        Ok(Some(AuthenticatedUser {
            user,
            session_id: session.id,
        }))
    }

    /// Authenticate with username + password and open a session.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        user_agent: Option<&str>,
    ) -> LazyResult<LoginOutput> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .map_err(|e| match e {
                LazySignupError::NotFound { .. } => AuthError::InvalidCredentials.into(),
                other => other,
            })?;

        let valid = password::verify_password(
            password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        if user.status != UserStatus::Active {
            return Err(AuthError::AccountInactive.into());
        }

        self.start_session(user, user_agent).await
    }

    /// Invalidate a single session.
    pub async fn logout(&self, session_id: Uuid) -> LazyResult<()> {
        self.session_repo.invalidate(session_id).await
    }

    /// Turn the lazy account `current` into a regular one.
    ///
    /// Anonymous and non-lazy callers are denied. Invalid submissions come
    /// back as [`ConvertOutcome::Invalid`] with nothing changed. On success
    /// the user's earlier sessions are revoked and a new one is opened for
    /// the converted account.
    pub async fn convert(
        &self,
        current: Option<&User>,
        form: &dyn ConvertForm,
        input: &ConvertInput,
        user_agent: Option<&str>,
    ) -> LazyResult<ConvertOutcome> {
        let user = current.ok_or(AuthError::NotAuthenticated)?;
        if !self.lazy_repo.exists_for_user(user.id).await? {
            return Err(AuthError::NotLazy.into());
        }

        let model = self.config.user_class()?;
        if model.requires_email && !form.requires_email() {
            return Err(LazySignupError::Configuration(format!(
                "form {} does not collect the email required by {}",
                form.name(),
                model.label
            )));
        }

        let policy = PasswordPolicy::new(self.config.min_password_length);
        let credentials = match form.clean(input, model, &policy) {
            Ok(c) => c,
            Err(errors) => return Ok(ConvertOutcome::Invalid(errors)),
        };

        if self
            .user_repo
            .username_taken(&credentials.username, Some(user.id))
            .await?
        {
            return Ok(ConvertOutcome::Invalid(username_taken_errors()));
        }

        let converted = match self
            .lazy_repo
            .convert(
                user.id,
                ConvertLazyUser {
                    username: credentials.username.clone(),
                    password: credentials.password.clone(),
                    email: credentials.email.clone(),
                },
            )
            .await
        {
            Ok(u) => u,
            // Lost a race for the username after the check above.
            Err(LazySignupError::AlreadyExists { .. }) => {
                return Ok(ConvertOutcome::Invalid(username_taken_errors()));
            }
            // Converted concurrently.
            Err(LazySignupError::NotFound { .. }) => return Err(AuthError::NotLazy.into()),
            Err(e) => return Err(e),
        };

        self.session_repo
            .invalidate_user_sessions(converted.id)
            .await?;
        let login = self.start_session(converted.clone(), user_agent).await?;

        info!(user_id = %converted.id, username = %converted.username, "Converted lazy user");

        // No subscribers is fine.
        let _ = self.conversions.send(UserConverted {
            user_id: converted.id,
            username: converted.username.clone(),
            converted_at: Utc::now(),
        });

        Ok(ConvertOutcome::Converted(login))
    }

    /// Delete lazy accounts older than the configured expiry, together
    /// with their registry entries and sessions. Expired sessions of any
    /// user are purged as well.
    ///
    /// Returns the number of accounts removed.
    pub async fn remove_expired_users(&self, now: DateTime<Utc>) -> LazyResult<u64> {
        let cutoff = now
            .checked_sub_signed(self.config.lazy_user_expiry_duration()?)
            .ok_or_else(|| {
                LazySignupError::Configuration("lazy user expiry reaches before the epoch".into())
            })?;
        let expired = self.lazy_repo.list_created_before(cutoff).await?;

        let mut removed = 0;
        for entry in expired {
            match self.user_repo.delete(entry.user_id).await {
                Ok(()) => removed += 1,
                Err(LazySignupError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        let sessions = self.session_repo.cleanup_expired().await?;
        info!(removed, sessions, cutoff = %cutoff, "Removed expired lazy users");

        Ok(removed)
    }

    /// Read-only listing of registry entries.
    pub async fn list_lazy_users(
        &self,
        pagination: Pagination,
    ) -> LazyResult<PaginatedResult<LazyUser>> {
        self.lazy_repo.list(pagination).await
    }

    async fn start_session(&self, user: User, user_agent: Option<&str>) -> LazyResult<LoginOutput> {
        let expires_at = Utc::now()
            .checked_add_signed(self.config.session_lifetime()?)
            .ok_or_else(|| {
                LazySignupError::Configuration("session lifetime overflows the clock".into())
            })?;
        let raw = token::generate_session_token();

        let session = self
            .session_repo
            .create(CreateSession {
                user_id: user.id,
                token_hash: token::hash_session_token(&raw),
                user_agent: user_agent.map(str::to_string),
                expires_at,
            })
            .await?;

        Ok(LoginOutput {
            user,
            session_token: raw,
            session_id: session.id,
            expires_in: self.config.session_lifetime_secs,
        })
    }
}

fn username_taken_errors() -> FieldErrors {
    let mut errors = FieldErrors::default();
    errors.add("username", "A user with that username already exists.");
    errors
}
