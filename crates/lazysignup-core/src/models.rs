//! Domain models for lazy signup.

pub mod lazy_user;
pub mod session;
pub mod user;
