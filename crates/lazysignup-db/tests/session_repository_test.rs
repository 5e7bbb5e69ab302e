//! Integration tests for the Session repository using in-memory SurrealDB.

use chrono::{Duration, Utc};
use lazysignup_core::error::LazySignupError;
use lazysignup_core::models::session::CreateSession;
use lazysignup_core::models::user::CreateUser;
use lazysignup_core::repository::{SessionRepository, UserRepository};
use lazysignup_db::repository::{SurrealSessionRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> (SurrealSessionRepository<Db>, SurrealUserRepository<Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    lazysignup_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let user = users
        .create(CreateUser {
            username: "session-owner".into(),
            email: String::new(),
            password: None,
        })
        .await
        .unwrap();

    (SurrealSessionRepository::new(db), users, user.id)
}

fn session_for(user_id: Uuid, token_hash: &str, expires_in: Duration) -> CreateSession {
    CreateSession {
        user_id,
        token_hash: token_hash.into(),
        user_agent: Some("TestAgent".into()),
        expires_at: Utc::now() + expires_in,
    }
}

#[tokio::test]
async fn create_and_find_by_token_hash() {
    let (sessions, _, user_id) = setup().await;

    let session = sessions
        .create(session_for(user_id, "hash-a", Duration::hours(1)))
        .await
        .unwrap();

    let fetched = sessions.get_by_token_hash("hash-a").await.unwrap();
    assert_eq!(fetched.id, session.id);
    assert_eq!(fetched.user_id, user_id);
    assert_eq!(fetched.user_agent.as_deref(), Some("TestAgent"));
}

#[tokio::test]
async fn invalidate_removes_session() {
    let (sessions, _, user_id) = setup().await;

    let session = sessions
        .create(session_for(user_id, "hash-b", Duration::hours(1)))
        .await
        .unwrap();
    sessions.invalidate(session.id).await.unwrap();

    let err = sessions.get_by_token_hash("hash-b").await.unwrap_err();
    assert!(matches!(err, LazySignupError::NotFound { .. }));
}

#[tokio::test]
async fn invalidate_user_sessions_removes_all() {
    let (sessions, _, user_id) = setup().await;

    for hash in ["hash-c1", "hash-c2"] {
        sessions
            .create(session_for(user_id, hash, Duration::hours(1)))
            .await
            .unwrap();
    }
    sessions.invalidate_user_sessions(user_id).await.unwrap();

    assert!(sessions.get_by_token_hash("hash-c1").await.is_err());
    assert!(sessions.get_by_token_hash("hash-c2").await.is_err());
}

#[tokio::test]
async fn cleanup_expired_counts_and_removes() {
    let (sessions, _, user_id) = setup().await;

    sessions
        .create(session_for(user_id, "expired", Duration::seconds(-10)))
        .await
        .unwrap();
    sessions
        .create(session_for(user_id, "live", Duration::hours(1)))
        .await
        .unwrap();

    assert_eq!(sessions.cleanup_expired().await.unwrap(), 1);
    assert!(sessions.get_by_token_hash("expired").await.is_err());
    assert!(sessions.get_by_token_hash("live").await.is_ok());
}

#[tokio::test]
async fn deleting_the_user_removes_sessions() {
    let (sessions, users, user_id) = setup().await;

    sessions
        .create(session_for(user_id, "owned", Duration::hours(1)))
        .await
        .unwrap();
    users.delete(user_id).await.unwrap();

    assert!(sessions.get_by_token_hash("owned").await.is_err());
}
