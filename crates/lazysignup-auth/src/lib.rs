//! Lazy Signup Auth: lazy account factory, classification, session
//! handling and the conversion flow.

pub mod config;
pub mod error;
pub mod events;
pub mod forms;
pub mod password;
pub mod service;
pub mod token;
pub mod username;

pub use config::LazySignupConfig;
pub use error::AuthError;
pub use events::UserConverted;
pub use forms::{ConvertForm, ConvertInput, Credentials, FieldErrors, form_by_name};
pub use service::{AuthenticatedUser, ConvertOutcome, LazySignupService, LoginOutput};
