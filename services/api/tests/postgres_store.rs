//! Optional Postgres store tests gated by TEST_DATABASE_URL.
//! Run with `cargo test -- --ignored` and TEST_DATABASE_URL pointing at a scratch database.

use std::sync::Arc;

use api_lib::adapters::DbAdapter;
use chrono::Duration;
use futures::future::join_all;
use globe_explorer_core::domain::{NewUser, SetMutation};
use globe_explorer_core::ports::{CredentialService, PortError, UserStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

async fn connect() -> Option<PgPool> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("SKIP-TEST-POSTGRES: set TEST_DATABASE_URL to run");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("database should be reachable");
    Some(pool)
}

async fn seeded(pool: &PgPool, token_ttl: Duration) -> (Arc<DbAdapter>, Uuid) {
    let store = Arc::new(DbAdapter::new(pool.clone(), token_ttl));
    store.run_migrations().await.expect("migrations should apply");
    let user = store
        .create_user(NewUser {
            name: "Test User".to_string(),
            email: format!("{}@example.com", Uuid::new_v4()),
            hashed_password: "hash".to_string(),
        })
        .await
        .unwrap();
    (store, user.id)
}

async fn cleanup(pool: &PgPool, user_id: Uuid) {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires Postgres; opt-in via TEST_DATABASE_URL"]
async fn concurrent_same_code_mutations_apply_once() {
    let Some(pool) = connect().await else {
        return;
    };
    let (store, id) = seeded(&pool, Duration::days(1)).await;

    let adds = join_all((0..8).map(|_| {
        let store = store.clone();
        tokio::spawn(async move { store.add_favorite_if_absent(id, "USA").await })
    }))
    .await;
    let applied = adds
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(SetMutation::Applied(_)))))
        .count();
    assert_eq!(applied, 1);
    assert_eq!(
        store.get_user_by_id(id).await.unwrap().favorite_countries,
        vec!["USA"]
    );

    let removes = join_all((0..8).map(|_| {
        let store = store.clone();
        tokio::spawn(async move { store.remove_favorite_if_present(id, "USA").await })
    }))
    .await;
    let applied = removes
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(SetMutation::Applied(_)))))
        .count();
    assert_eq!(applied, 1);
    assert!(store
        .get_user_by_id(id)
        .await
        .unwrap()
        .favorite_countries
        .is_empty());

    cleanup(&pool, id).await;
}

#[tokio::test]
#[ignore = "requires Postgres; opt-in via TEST_DATABASE_URL"]
async fn unknown_user_is_not_found_and_duplicate_email_conflicts() {
    let Some(pool) = connect().await else {
        return;
    };
    let (store, id) = seeded(&pool, Duration::days(1)).await;

    assert!(matches!(
        store.add_favorite_if_absent(Uuid::new_v4(), "USA").await,
        Err(PortError::NotFound(_))
    ));

    let email = store.get_user_by_id(id).await.unwrap().email;
    let duplicate = store
        .create_user(NewUser {
            name: "Other".to_string(),
            email: email.to_uppercase(),
            hashed_password: "hash".to_string(),
        })
        .await;
    assert!(matches!(duplicate, Err(PortError::Conflict(_))));

    cleanup(&pool, id).await;
}

#[tokio::test]
#[ignore = "requires Postgres; opt-in via TEST_DATABASE_URL"]
async fn expired_tokens_are_rejected_and_purged() {
    let Some(pool) = connect().await else {
        return;
    };
    let (store, id) = seeded(&pool, Duration::seconds(-1)).await;

    let first = store.issue_token(id).await.unwrap();
    assert_eq!(
        store.resolve_token(&first.token).await,
        Err(PortError::Unauthorized)
    );
    store.issue_token(id).await.unwrap();

    let remaining: i64 =
        sqlx::query_scalar("SELECT count(*) FROM auth_sessions WHERE token = $1")
            .bind(&first.token)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(remaining, 0);

    cleanup(&pool, id).await;
}
