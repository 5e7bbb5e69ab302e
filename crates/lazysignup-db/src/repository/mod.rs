//! SurrealDB repository implementations.

mod lazy_user;
mod session;
mod user;

pub use lazy_user::SurrealLazyUserRepository;
pub use session::SurrealSessionRepository;
pub use user::SurrealUserRepository;
