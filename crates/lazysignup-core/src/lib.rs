//! Lazy Signup Core: domain models, repository traits and the
//! user-model resolver shared by the storage, auth and server crates.

pub mod error;
pub mod models;
pub mod repository;
pub mod user_model;

pub use error::{LazyResult, LazySignupError};
pub use user_model::{UserModel, get_user_class};
