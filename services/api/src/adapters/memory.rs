//! services/api/src/adapters/memory.rs
//!
//! In-process implementation of the `UserStore` and `CredentialService` ports.
//! Used when no `DATABASE_URL` is configured and by the test suites.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use globe_explorer_core::domain::{AuthSession, NewUser, SetMutation, User, UserCredentials};
use globe_explorer_core::ports::{CredentialService, PortError, PortResult, UserStore};
use tokio::sync::RwLock;
use uuid::Uuid;

struct StoredUser {
    user: User,
    hashed_password: String,
}

/// Users and tokens kept in memory.
///
/// Every conditional favorites mutation runs under one write guard, which makes
/// the membership check and the write atomic.
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, StoredUser>>,
    sessions: RwLock<HashMap<String, AuthSession>>,
    token_ttl: Duration,
}

impl InMemoryStore {
    pub fn new(token_ttl: Duration) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            token_ttl,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Duration::days(30))
    }
}

fn not_found(user_id: Uuid) -> PortError {
    PortError::NotFound(format!("User {} not found", user_id))
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.user.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(PortError::Conflict(format!(
                "User {} already exists",
                new_user.email
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            favorite_countries: Vec::new(),
            created_at: Utc::now(),
        };
        users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                hashed_password: new_user.hashed_password,
            },
        );
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.users
            .read()
            .await
            .get(&user_id)
            .map(|stored| stored.user.clone())
            .ok_or_else(|| not_found(user_id))
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.users
            .read()
            .await
            .values()
            .find(|stored| stored.user.email.eq_ignore_ascii_case(email))
            .map(|stored| UserCredentials {
                user_id: stored.user.id,
                email: stored.user.email.clone(),
                hashed_password: stored.hashed_password.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn add_favorite_if_absent(&self, user_id: Uuid, code: &str) -> PortResult<SetMutation> {
        let mut users = self.users.write().await;
        let favorites = &mut users
            .get_mut(&user_id)
            .ok_or_else(|| not_found(user_id))?
            .user
            .favorite_countries;

        if favorites.iter().any(|c| c == code) {
            return Ok(SetMutation::Unchanged(favorites.clone()));
        }
        favorites.push(code.to_string());
        Ok(SetMutation::Applied(favorites.clone()))
    }

    async fn remove_favorite_if_present(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> PortResult<SetMutation> {
        let mut users = self.users.write().await;
        let favorites = &mut users
            .get_mut(&user_id)
            .ok_or_else(|| not_found(user_id))?
            .user
            .favorite_countries;

        match favorites.iter().position(|c| c == code) {
            Some(index) => {
                favorites.remove(index);
                Ok(SetMutation::Applied(favorites.clone()))
            }
            None => Ok(SetMutation::Unchanged(favorites.clone())),
        }
    }
}

#[async_trait]
impl CredentialService for InMemoryStore {
    async fn issue_token(&self, user_id: Uuid) -> PortResult<AuthSession> {
        let session = AuthSession {
            token: Uuid::new_v4().to_string(),
            user_id,
            expires_at: Utc::now() + self.token_ttl,
        };
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        sessions.retain(|_, existing| existing.expires_at > now);
        sessions.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn resolve_token(&self, token: &str) -> PortResult<Uuid> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(token) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.user_id),
            Some(_) => {
                sessions.remove(token);
                Err(PortError::Unauthorized)
            }
            None => Err(PortError::Unauthorized),
        }
    }

    async fn revoke_token(&self, token: &str) -> PortResult<()> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::Arc;

    async fn seeded() -> (Arc<InMemoryStore>, Uuid) {
        let store = Arc::new(InMemoryStore::default());
        let user = store
            .create_user(NewUser {
                name: "Test User".to_string(),
                email: "test@example.com".to_string(),
                hashed_password: "hash".to_string(),
            })
            .await
            .unwrap();
        (store, user.id)
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict_regardless_of_case() {
        let (store, _) = seeded().await;
        let err = store
            .create_user(NewUser {
                name: "Other".to_string(),
                email: "TEST@example.com".to_string(),
                hashed_password: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn conditional_mutations_report_whether_they_applied() {
        let (store, id) = seeded().await;
        assert_eq!(
            store.add_favorite_if_absent(id, "USA").await.unwrap(),
            SetMutation::Applied(vec!["USA".to_string()])
        );
        assert_eq!(
            store.add_favorite_if_absent(id, "USA").await.unwrap(),
            SetMutation::Unchanged(vec!["USA".to_string()])
        );
        assert_eq!(
            store.remove_favorite_if_present(id, "CAN").await.unwrap(),
            SetMutation::Unchanged(vec!["USA".to_string()])
        );
        assert_eq!(
            store.remove_favorite_if_present(id, "USA").await.unwrap(),
            SetMutation::Applied(vec![])
        );
    }

    #[tokio::test]
    async fn concurrent_adds_of_distinct_codes_all_apply() {
        let (store, id) = seeded().await;
        let codes = ["USA", "CAN", "MEX", "FRA", "JPN", "DEU"];
        let results = join_all(codes.iter().map(|code| {
            let store = store.clone();
            async move { store.add_favorite_if_absent(id, code).await }
        }))
        .await;
        assert!(results
            .iter()
            .all(|r| matches!(r, Ok(SetMutation::Applied(_)))));

        let mut favorites = store.get_user_by_id(id).await.unwrap().favorite_countries;
        favorites.sort();
        let mut expected: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
        expected.sort();
        assert_eq!(favorites, expected);
    }

    #[tokio::test]
    async fn concurrent_removes_of_the_same_code_only_one_applies() {
        let (store, id) = seeded().await;
        store.add_favorite_if_absent(id, "USA").await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.remove_favorite_if_present(id, "USA").await })
            })
            .collect();
        let mut applied = 0;
        for handle in handles {
            if let SetMutation::Applied(_) = handle.await.unwrap().unwrap() {
                applied += 1;
            }
        }
        assert_eq!(applied, 1);
    }

    #[tokio::test]
    async fn tokens_resolve_until_revoked_or_expired() {
        let (store, id) = seeded().await;
        let session = store.issue_token(id).await.unwrap();
        assert_eq!(store.resolve_token(&session.token).await.unwrap(), id);

        store.revoke_token(&session.token).await.unwrap();
        assert_eq!(
            store.resolve_token(&session.token).await,
            Err(PortError::Unauthorized)
        );

        let expired = InMemoryStore::new(Duration::seconds(-1));
        let session = expired.issue_token(id).await.unwrap();
        assert_eq!(
            expired.resolve_token(&session.token).await,
            Err(PortError::Unauthorized)
        );
    }

    #[tokio::test]
    async fn issuing_a_token_purges_expired_sessions() {
        let (_, id) = seeded().await;
        let expired = InMemoryStore::new(Duration::seconds(-1));
        for _ in 0..3 {
            expired.issue_token(id).await.unwrap();
        }
        assert_eq!(expired.sessions.read().await.len(), 1);

        let (store, id) = seeded().await;
        store.issue_token(id).await.unwrap();
        store.issue_token(id).await.unwrap();
        assert_eq!(store.sessions.read().await.len(), 2);
    }
}
