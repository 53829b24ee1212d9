use crate::error::Error;
use crate::models::{Session, User};
use crate::storage::Storage;

pub const USER_KEY: &str = "user";
pub const TOKEN_KEY: &str = "token";

// Auth cache: a single optional user/token pair instead of a row list. The
// pair is mirrored into durable storage so a session survives a restart.
#[derive(Debug, Clone, Default)]
pub struct AuthStore {
    user: Option<User>,
    token: Option<String>,
    loading: bool,
    error: Option<String>,
}

impl AuthStore {
    pub fn new() -> Self {
        AuthStore::default()
    }

    // Primes the cache from durable storage. A stored "null", a malformed
    // value, or an absent key all bootstrap to no session.
    pub fn bootstrap(storage: &dyn Storage) -> AuthStore {
        let user = storage
            .get(USER_KEY)
            .and_then(|text| serde_json::from_str::<Option<User>>(&text).ok())
            .flatten();
        let token = storage.get(TOKEN_KEY);
        AuthStore {
            user,
            token,
            loading: false,
            error: None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn begin_auth(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn settle_login(&mut self, outcome: Result<Session, Error>, storage: &mut dyn Storage) {
        self.settle_session(outcome, storage, "Login failed");
    }

    pub fn settle_register(&mut self, outcome: Result<Session, Error>, storage: &mut dyn Storage) {
        self.settle_session(outcome, storage, "Registration failed");
    }

    fn settle_session(
        &mut self,
        outcome: Result<Session, Error>,
        storage: &mut dyn Storage,
        fallback: &str,
    ) {
        self.loading = false;
        match outcome {
            Ok(session) => {
                if let Ok(text) = serde_json::to_string(&session.user) {
                    storage.set(USER_KEY, &text);
                }
                storage.set(TOKEN_KEY, &session.token);
                self.user = Some(session.user);
                self.token = Some(session.token);
                self.error = None;
            }
            Err(err) => {
                self.error = Some(err.message_or(fallback));
            }
        }
    }

    // The local clear happens whatever the remote logout call said.
    pub fn apply_logout(&mut self, storage: &mut dyn Storage) {
        storage.remove(USER_KEY);
        storage.remove(TOKEN_KEY);
        self.user = None;
        self.token = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn session(id: &str, token: &str) -> Session {
        Session {
            user: User {
                id: id.to_string(),
                email: format!("{}@example.com", id),
                name: id.to_string(),
                avatar_url: None,
            },
            token: token.to_string(),
        }
    }

    #[test]
    fn bootstrap_with_empty_storage_has_no_session() {
        let storage = MemoryStorage::new();
        let auth = AuthStore::bootstrap(&storage);
        assert_eq!(auth.user(), None);
        assert_eq!(auth.token(), None);
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn bootstrap_treats_stored_null_as_no_user() {
        let mut storage = MemoryStorage::new();
        storage.set(USER_KEY, "null");
        let auth = AuthStore::bootstrap(&storage);
        assert_eq!(auth.user(), None);
    }

    #[test]
    fn bootstrap_ignores_malformed_stored_user() {
        let mut storage = MemoryStorage::new();
        storage.set(USER_KEY, "{not json");
        storage.set(TOKEN_KEY, "tok");
        let auth = AuthStore::bootstrap(&storage);
        assert_eq!(auth.user(), None);
        assert_eq!(auth.token(), Some("tok"));
    }

    #[test]
    fn bootstrap_restores_a_saved_session() {
        let mut storage = MemoryStorage::new();
        storage.set(
            USER_KEY,
            r#"{"id":"u1","email":"u1@example.com","name":"u1","avatar_url":null}"#,
        );
        storage.set(TOKEN_KEY, "tok");
        let auth = AuthStore::bootstrap(&storage);
        assert_eq!(auth.user().map(|u| u.id.as_str()), Some("u1"));
        assert_eq!(auth.token(), Some("tok"));
        assert!(auth.is_authenticated());
    }

    #[test]
    fn login_success_populates_cache_and_storage() {
        let mut storage = MemoryStorage::new();
        let mut auth = AuthStore::new();
        auth.begin_auth();
        assert!(auth.loading());

        auth.settle_login(Ok(session("u1", "tok")), &mut storage);

        assert!(!auth.loading());
        assert_eq!(auth.error(), None);
        assert_eq!(auth.token(), Some("tok"));
        assert!(storage.get(USER_KEY).unwrap().contains("u1@example.com"));
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("tok"));
    }

    #[test]
    fn login_failure_records_message_and_leaves_storage_alone() {
        let mut storage = MemoryStorage::new();
        let mut auth = AuthStore::new();
        auth.begin_auth();

        auth.settle_login(Err(Error::Authentication(String::new())), &mut storage);

        assert!(!auth.loading());
        assert_eq!(auth.error(), Some("Login failed"));
        assert_eq!(auth.user(), None);
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[test]
    fn register_failure_uses_its_own_fallback() {
        let mut storage = MemoryStorage::new();
        let mut auth = AuthStore::new();
        auth.settle_register(Err(Error::Authentication(String::new())), &mut storage);
        assert_eq!(auth.error(), Some("Registration failed"));
    }

    #[test]
    fn logout_clears_cache_and_storage() {
        let mut storage = MemoryStorage::new();
        let mut auth = AuthStore::new();
        auth.settle_login(Ok(session("u1", "tok")), &mut storage);

        auth.apply_logout(&mut storage);

        assert_eq!(auth.user(), None);
        assert_eq!(auth.token(), None);
        assert_eq!(storage.get(USER_KEY), None);
        assert_eq!(storage.get(TOKEN_KEY), None);
    }
}
