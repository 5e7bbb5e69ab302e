//! Integration tests for the User repository using in-memory SurrealDB.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use lazysignup_core::error::LazySignupError;
use lazysignup_core::models::user::{CreateUser, UpdateUser, UserStatus};
use lazysignup_core::repository::{Pagination, UserRepository};
use lazysignup_core::user_model::EMAIL_USER;
use lazysignup_db::repository::SurrealUserRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    lazysignup_db::run_migrations(&db).await.unwrap();
    db
}

fn new_user(username: &str, password: Option<&str>) -> CreateUser {
    CreateUser {
        username: username.into(),
        email: format!("{username}@example.com"),
        password: password.map(Into::into),
    }
}

fn verifies(password: &str, hash: &str) -> bool {
    let parsed = PasswordHash::new(hash).unwrap();
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[tokio::test]
async fn create_and_get_user() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo
        .create(new_user("alice", Some("SuperSecret123!")))
        .await
        .unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.status, UserStatus::Active);
    assert!(user.has_usable_password());

    // Password should be hashed, not stored in plaintext.
    assert_ne!(user.password_hash, "SuperSecret123!");
    assert!(user.password_hash.starts_with("$argon2id$"));
    assert!(verifies("SuperSecret123!", &user.password_hash));

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.username, "alice");
}

#[tokio::test]
async fn missing_password_is_unusable() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo.create(new_user("nopass", None)).await.unwrap();

    assert!(!user.has_usable_password());
    assert!(user.password_hash.starts_with('!'));
}

#[tokio::test]
async fn get_user_by_username() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo.create(new_user("dave", Some("pass123"))).await.unwrap();

    let fetched = repo.get_by_username("dave").await.unwrap();
    assert_eq!(fetched.id, user.id);

    let missing = repo.get_by_username("nobody").await.unwrap_err();
    assert!(matches!(missing, LazySignupError::NotFound { .. }));
}

#[tokio::test]
async fn username_taken_excludes_given_record() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo.create(new_user("erin", None)).await.unwrap();

    assert!(repo.username_taken("erin", None).await.unwrap());
    assert!(!repo.username_taken("erin", Some(user.id)).await.unwrap());
    assert!(!repo.username_taken("someone-else", None).await.unwrap());
}

#[tokio::test]
async fn update_user() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo.create(new_user("frank", None)).await.unwrap();

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                username: Some("franklin".into()),
                password: Some("new-password-1".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, user.id);
    assert_eq!(updated.username, "franklin");
    assert_eq!(updated.email, "frank@example.com"); // unchanged
    assert!(verifies("new-password-1", &updated.password_hash));
}

#[tokio::test]
async fn update_to_taken_username_is_rejected() {
    let repo = SurrealUserRepository::new(setup().await);

    repo.create(new_user("taken", None)).await.unwrap();
    let other = repo.create(new_user("other", None)).await.unwrap();

    let err = repo
        .update(
            other.id,
            UpdateUser {
                username: Some("taken".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LazySignupError::AlreadyExists { .. }));
}

#[tokio::test]
async fn update_status() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo.create(new_user("gina", None)).await.unwrap();
    let updated = repo
        .update(
            user.id,
            UpdateUser {
                status: Some(UserStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, UserStatus::Inactive);
}

#[tokio::test]
async fn delete_user_removes_record() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo.create(new_user("grace", None)).await.unwrap();
    repo.delete(user.id).await.unwrap();

    let err = repo.get_by_id(user.id).await.unwrap_err();
    assert!(matches!(err, LazySignupError::NotFound { .. }));
}

#[tokio::test]
async fn deleting_a_missing_user_is_not_found() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo.create(new_user("heidi", None)).await.unwrap();
    repo.delete(user.id).await.unwrap();

    let err = repo.delete(user.id).await.unwrap_err();
    assert!(matches!(err, LazySignupError::NotFound { .. }));
}

#[tokio::test]
async fn list_users_with_pagination() {
    let repo = SurrealUserRepository::new(setup().await);

    for i in 0..5 {
        repo.create(new_user(&format!("user-{i}"), None))
            .await
            .unwrap();
    }

    let page1 = repo
        .list(Pagination {
            offset: 0,
            limit: 3,
        })
        .await
        .unwrap();

    assert_eq!(page1.items.len(), 3);
    assert_eq!(page1.total, 5);

    let page2 = repo
        .list(Pagination {
            offset: 3,
            limit: 3,
        })
        .await
        .unwrap();

    assert_eq!(page2.items.len(), 2);
}

#[tokio::test]
async fn duplicate_username_rejected() {
    let repo = SurrealUserRepository::new(setup().await);

    repo.create(new_user("unique-user", None)).await.unwrap();

    let err = repo
        .create(new_user("unique-user", None))
        .await
        .unwrap_err();

    assert!(
        matches!(err, LazySignupError::AlreadyExists { .. }),
        "expected AlreadyExists, got: {err:?}"
    );
}

#[tokio::test]
async fn custom_model_uses_its_own_table() {
    let db = setup().await;
    let default_repo = SurrealUserRepository::new(db.clone());
    let custom_repo = SurrealUserRepository::for_model(db, &EMAIL_USER);

    default_repo.create(new_user("shared", None)).await.unwrap();
    // Same username in a different model's table does not collide.
    let custom = custom_repo.create(new_user("shared", None)).await.unwrap();

    assert_eq!(custom_repo.model().table, "email_user");
    assert_eq!(custom_repo.get_by_id(custom.id).await.unwrap().username, "shared");
    assert_eq!(default_repo.list(Pagination::default()).await.unwrap().total, 1);
}
