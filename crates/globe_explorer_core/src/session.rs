//! crates/globe_explorer_core/src/session.rs
//!
//! Client-side authentication and favorites state.
//!
//! `ExplorerSession` is the single source of truth for "who is signed in and
//! what are their favorites" on the client. It is shared by handle and only
//! changes through its own operations. The favorites cache is never patched
//! locally: every successful mutation replaces it with the set the server
//! returned, and losing authentication clears it.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::{Country, User};
use crate::ports::{AuthPayload, CountryDirectory, ExplorerApi, PortError, PortResult};

pub const AUTH_EXPIRED_MESSAGE: &str = "Authentication expired. Please login again.";
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to save favorites";

/// Outcome of a favorites action, ready to be shown as a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub success: bool,
    pub message: String,
}

impl Notice {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// A copy of the session state at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub user: Option<User>,
    pub error: Option<String>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Clone, Copy)]
enum Mutation {
    Add,
    Remove,
}

impl Mutation {
    const fn fallback_message(self) -> &'static str {
        match self {
            Self::Add => "Failed to add to favorites",
            Self::Remove => "Failed to remove from favorites",
        }
    }
}

pub struct ExplorerSession {
    api: Arc<dyn ExplorerApi>,
    state: RwLock<SessionSnapshot>,
}

impl ExplorerSession {
    pub fn new(api: Arc<dyn ExplorerApi>) -> Self {
        Self {
            api,
            state: RwLock::new(SessionSnapshot::default()),
        }
    }

    /// Starts from a previously stored token. Call [`ExplorerSession::restore`]
    /// to load the user it belongs to.
    pub fn with_token(api: Arc<dyn ExplorerApi>, token: impl Into<String>) -> Self {
        Self {
            api,
            state: RwLock::new(SessionSnapshot {
                token: Some(token.into()),
                ..SessionSnapshot::default()
            }),
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.clone()
    }

    pub async fn favorites(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .user
            .as_ref()
            .map(|u| u.favorite_countries.clone())
            .unwrap_or_default()
    }

    pub async fn is_favorite(&self, code: &str) -> bool {
        self.state
            .read()
            .await
            .user
            .as_ref()
            .is_some_and(|u| u.favorite_countries.iter().any(|c| c == code))
    }

    //=====================================================================================
    // Authentication
    //=====================================================================================

    pub async fn register(&self, name: &str, email: &str, password: &str) -> PortResult<User> {
        let payload = self.api.register(name, email, password).await?;
        Ok(self.sign_in(payload).await)
    }

    pub async fn login(&self, email: &str, password: &str) -> PortResult<User> {
        let payload = self.api.login(email, password).await?;
        Ok(self.sign_in(payload).await)
    }

    /// Loads the user for the stored token. On any failure the token is
    /// dropped and the session is left signed out. Returns whether the loaded
    /// user was installed; a token replaced mid-flight discards the result.
    pub async fn restore(&self) -> bool {
        let Some(token) = self.state.read().await.token.clone() else {
            return false;
        };
        match self.api.current_user(&token).await {
            Ok(user) => {
                let mut state = self.state.write().await;
                if state.token.as_deref() != Some(token.as_str()) {
                    info!("Dropping restored user for a stale session");
                    return false;
                }
                state.user = Some(user);
                state.error = None;
                true
            }
            Err(e) => {
                warn!("Error loading user data: {e}");
                self.expire(&token).await;
                false
            }
        }
    }

    /// Signs out locally, then asks the backend to revoke the token.
    pub async fn logout(&self) {
        let token = {
            let mut state = self.state.write().await;
            let token = state.token.take();
            *state = SessionSnapshot::default();
            token
        };
        if let Some(token) = token {
            if let Err(e) = self.api.logout(&token).await {
                warn!("Failed to revoke token on logout: {e}");
            }
        }
    }

    async fn sign_in(&self, payload: AuthPayload) -> User {
        let mut state = self.state.write().await;
        *state = SessionSnapshot {
            token: Some(payload.token),
            user: Some(payload.user.clone()),
            error: None,
        };
        payload.user
    }

    /// Clears the session if `token` is still the current one.
    async fn expire(&self, token: &str) {
        let mut state = self.state.write().await;
        if state.token.as_deref() == Some(token) {
            *state = SessionSnapshot {
                error: Some(AUTH_EXPIRED_MESSAGE.to_string()),
                ..SessionSnapshot::default()
            };
        }
    }

    //=====================================================================================
    // Favorites
    //=====================================================================================

    pub async fn add_favorite(&self, code: &str) -> Notice {
        self.mutate(Mutation::Add, code).await
    }

    pub async fn remove_favorite(&self, code: &str) -> Notice {
        self.mutate(Mutation::Remove, code).await
    }

    /// Removes the code if the cache says it is a favorite, adds it otherwise.
    pub async fn toggle_favorite(&self, code: &str) -> Notice {
        if self.is_favorite(code).await {
            self.remove_favorite(code).await
        } else {
            self.add_favorite(code).await
        }
    }

    /// Re-reads the favorites from the backend and replaces the cache.
    pub async fn refresh_favorites(&self) -> PortResult<Vec<String>> {
        let token = self.current_token().await.ok_or(PortError::Unauthorized)?;
        match self.api.list_favorites(&token).await {
            Ok(favorites) => {
                self.replace_favorites(&token, favorites.clone()).await;
                Ok(favorites)
            }
            Err(PortError::Unauthorized) => {
                self.expire(&token).await;
                Err(PortError::Unauthorized)
            }
            Err(e) => Err(e),
        }
    }

    /// Resolves the cached favorites through the directory. Codes the
    /// directory cannot resolve are skipped.
    pub async fn favorite_countries(&self, directory: &dyn CountryDirectory) -> Vec<Country> {
        let codes = self.favorites().await;
        let lookups = codes.iter().map(|code| directory.by_code(code));
        join_all(lookups)
            .await
            .into_iter()
            .zip(&codes)
            .filter_map(|(result, code)| match result {
                Ok(country) => Some(country),
                Err(e) => {
                    warn!("Failed to load details for {code}: {e}");
                    None
                }
            })
            .collect()
    }

    async fn current_token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    async fn mutate(&self, mutation: Mutation, code: &str) -> Notice {
        let Some(token) = self.current_token().await else {
            return Notice::failed(LOGIN_REQUIRED_MESSAGE);
        };

        let result = match mutation {
            Mutation::Add => self.api.add_favorite(&token, code).await,
            Mutation::Remove => self.api.remove_favorite(&token, code).await,
        };

        match result {
            Ok(update) => {
                self.replace_favorites(&token, update.favorite_countries)
                    .await;
                Notice::ok(update.message)
            }
            Err(PortError::Unauthorized) => {
                self.expire(&token).await;
                Notice::failed(AUTH_EXPIRED_MESSAGE)
            }
            Err(PortError::Rejected(message)) => Notice::failed(message),
            Err(e) => {
                warn!("Favorites request for {code} failed: {e}");
                Notice::failed(mutation.fallback_message())
            }
        }
    }

    /// Wholesale replacement with the server's set. Responses that arrive after
    /// the session changed hands are dropped.
    async fn replace_favorites(&self, token: &str, favorites: Vec<String>) {
        let mut state = self.state.write().await;
        if state.token.as_deref() != Some(token) {
            info!("Dropping favorites response for a stale session");
            return;
        }
        if let Some(user) = state.user.as_mut() {
            user.favorite_countries = favorites;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FavoritesUpdate;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn user(favorites: &[&str]) -> User {
        User {
            id: Uuid::nil(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            favorite_countries: favorites.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    /// Scripted backend: every favorites call returns the next queued answer.
    #[derive(Default)]
    struct ScriptedApi {
        answers: Mutex<Vec<PortResult<FavoritesUpdate>>>,
        current_user: Option<PortResult<User>>,
        calls: Mutex<usize>,
    }

    impl ScriptedApi {
        fn answering(answers: Vec<PortResult<FavoritesUpdate>>) -> Self {
            let mut answers = answers;
            answers.reverse();
            Self {
                answers: Mutex::new(answers),
                ..Self::default()
            }
        }

        fn next(&self) -> PortResult<FavoritesUpdate> {
            *self.calls.lock().unwrap() += 1;
            self.answers.lock().unwrap().pop().expect("unexpected call")
        }
    }

    #[async_trait]
    impl ExplorerApi for ScriptedApi {
        async fn register(&self, _: &str, _: &str, _: &str) -> PortResult<AuthPayload> {
            self.login("", "").await
        }

        async fn login(&self, _: &str, _: &str) -> PortResult<AuthPayload> {
            Ok(AuthPayload {
                token: "token-1".to_string(),
                user: user(&["FRA"]),
            })
        }

        async fn current_user(&self, _: &str) -> PortResult<User> {
            self.current_user.clone().expect("unexpected call")
        }

        async fn logout(&self, _: &str) -> PortResult<()> {
            Ok(())
        }

        async fn list_favorites(&self, _: &str) -> PortResult<Vec<String>> {
            self.next().map(|u| u.favorite_countries)
        }

        async fn add_favorite(&self, _: &str, _: &str) -> PortResult<FavoritesUpdate> {
            self.next()
        }

        async fn remove_favorite(&self, _: &str, _: &str) -> PortResult<FavoritesUpdate> {
            self.next()
        }

        async fn check_favorite(&self, _: &str, _: &str) -> PortResult<bool> {
            unimplemented!()
        }
    }

    fn update(message: &str, favorites: &[&str]) -> PortResult<FavoritesUpdate> {
        Ok(FavoritesUpdate {
            message: message.to_string(),
            favorite_countries: favorites.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[tokio::test]
    async fn successful_add_replaces_cache_with_server_set() {
        // The server knows about a favorite the client never saw.
        let api = Arc::new(ScriptedApi::answering(vec![update(
            "Country added to favorites",
            &["DEU", "USA"],
        )]));
        let session = ExplorerSession::new(api);
        session.login("test@example.com", "Password123").await.unwrap();

        let notice = session.add_favorite("USA").await;

        assert!(notice.success);
        assert_eq!(notice.message, "Country added to favorites");
        assert_eq!(session.favorites().await, vec!["DEU", "USA"]);
    }

    #[tokio::test]
    async fn rejected_call_leaves_cache_unchanged() {
        let api = Arc::new(ScriptedApi::answering(vec![Err(PortError::Rejected(
            "Country is already in favorites".to_string(),
        ))]));
        let session = ExplorerSession::new(api);
        session.login("test@example.com", "Password123").await.unwrap();

        let notice = session.add_favorite("FRA").await;

        assert_eq!(
            notice,
            Notice {
                success: false,
                message: "Country is already in favorites".to_string()
            }
        );
        assert_eq!(session.favorites().await, vec!["FRA"]);
    }

    #[tokio::test]
    async fn transport_failure_uses_fallback_message() {
        let api = Arc::new(ScriptedApi::answering(vec![Err(PortError::Unexpected(
            "connection refused".to_string(),
        ))]));
        let session = ExplorerSession::new(api);
        session.login("test@example.com", "Password123").await.unwrap();

        let notice = session.remove_favorite("FRA").await;

        assert!(!notice.success);
        assert_eq!(notice.message, "Failed to remove from favorites");
        assert_eq!(session.favorites().await, vec!["FRA"]);
    }

    #[tokio::test]
    async fn unauthorized_clears_the_session() {
        let api = Arc::new(ScriptedApi::answering(vec![Err(PortError::Unauthorized)]));
        let session = ExplorerSession::new(api);
        session.login("test@example.com", "Password123").await.unwrap();

        let notice = session.add_favorite("USA").await;

        assert_eq!(notice.message, AUTH_EXPIRED_MESSAGE);
        let snapshot = session.snapshot().await;
        assert!(!snapshot.is_authenticated());
        assert_eq!(snapshot.token, None);
        assert_eq!(snapshot.error.as_deref(), Some(AUTH_EXPIRED_MESSAGE));
        assert!(session.favorites().await.is_empty());
    }

    #[tokio::test]
    async fn signed_out_session_makes_no_request() {
        let api = Arc::new(ScriptedApi::default());
        let session = ExplorerSession::new(api.clone());

        let notice = session.add_favorite("USA").await;

        assert_eq!(notice.message, LOGIN_REQUIRED_MESSAGE);
        assert_eq!(*api.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn toggle_follows_the_cache() {
        let api = Arc::new(ScriptedApi::answering(vec![
            update("Country removed from favorites", &[]),
            update("Country added to favorites", &["FRA"]),
        ]));
        let session = ExplorerSession::new(api);
        session.login("test@example.com", "Password123").await.unwrap();

        assert!(session.toggle_favorite("FRA").await.success);
        assert!(!session.is_favorite("FRA").await);
        assert!(session.toggle_favorite("FRA").await.success);
        assert!(session.is_favorite("FRA").await);
    }

    #[tokio::test]
    async fn restore_with_invalid_token_signs_out() {
        let api = Arc::new(ScriptedApi {
            current_user: Some(Err(PortError::Unauthorized)),
            ..ScriptedApi::default()
        });
        let session = ExplorerSession::with_token(api, "stale");

        assert!(!session.restore().await);
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.token, None);
        assert_eq!(snapshot.error.as_deref(), Some(AUTH_EXPIRED_MESSAGE));
    }

    #[tokio::test]
    async fn restore_loads_the_user() {
        let api = Arc::new(ScriptedApi {
            current_user: Some(Ok(user(&["JPN"]))),
            ..ScriptedApi::default()
        });
        let session = ExplorerSession::with_token(api, "token-1");

        assert!(session.restore().await);
        assert!(session.is_favorite("JPN").await);
    }

    /// Backend whose `current_user` parks until the test releases it.
    #[derive(Default)]
    struct GatedApi {
        entered: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl ExplorerApi for GatedApi {
        async fn register(&self, _: &str, _: &str, _: &str) -> PortResult<AuthPayload> {
            unimplemented!()
        }

        async fn login(&self, _: &str, _: &str) -> PortResult<AuthPayload> {
            Ok(AuthPayload {
                token: "fresh-token".to_string(),
                user: user(&["FRA"]),
            })
        }

        async fn current_user(&self, _: &str) -> PortResult<User> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(user(&["JPN"]))
        }

        async fn logout(&self, _: &str) -> PortResult<()> {
            Ok(())
        }

        async fn list_favorites(&self, _: &str) -> PortResult<Vec<String>> {
            unimplemented!()
        }

        async fn add_favorite(&self, _: &str, _: &str) -> PortResult<FavoritesUpdate> {
            unimplemented!()
        }

        async fn remove_favorite(&self, _: &str, _: &str) -> PortResult<FavoritesUpdate> {
            unimplemented!()
        }

        async fn check_favorite(&self, _: &str, _: &str) -> PortResult<bool> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn restore_reports_false_when_the_token_changed_in_flight() {
        let api = Arc::new(GatedApi::default());
        let session = Arc::new(ExplorerSession::with_token(api.clone(), "old-token"));

        let restoring = tokio::spawn({
            let session = session.clone();
            async move { session.restore().await }
        });
        api.entered.notified().await;
        session.login("test@example.com", "Password123").await.unwrap();
        api.release.notify_one();

        assert!(!restoring.await.unwrap());
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.token.as_deref(), Some("fresh-token"));
        assert!(session.is_favorite("FRA").await);
        assert!(!session.is_favorite("JPN").await);
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let api = Arc::new(ScriptedApi::default());
        let session = ExplorerSession::new(api);
        session.login("test@example.com", "Password123").await.unwrap();

        session.logout().await;

        assert_eq!(session.snapshot().await, SessionSnapshot::default());
    }
}
