//! The process-wide authentication session.
//!
//! Exactly one bearer token governs every outbound request. It is read
//! through [`AuthSession::token`] and changed only through
//! [`AuthSession::set_token`] and [`AuthSession::clear`], and it is mirrored
//! to a [`TokenStore`] so it survives restarts.

use crate::errors::{ClientError, ClientResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, RwLock};

/// Persistent storage for the access token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the stored token, if any.
    async fn load(&self) -> ClientResult<Option<String>>;
    /// Replaces the stored token.
    async fn save(&self, token: &str) -> ClientResult<()>;
    /// Removes the stored token. Removing a missing token is not an error.
    async fn remove(&self) -> ClientResult<()>;
}

/// Keeps the token in a single file, created with its parent directory on
/// first save.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> ClientResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClientError::storage(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn save(&self, token: &str) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ClientError::storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        tokio::fs::write(&self.path, token).await.map_err(|e| {
            ClientError::storage(format!("failed to write {}: {e}", self.path.display()))
        })
    }

    async fn remove(&self) -> ClientResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::storage(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

/// Non-persistent store, used when nothing should touch the filesystem.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> ClientResult<Option<String>> {
        Ok(self.token.lock().await.clone())
    }

    async fn save(&self, token: &str) -> ClientResult<()> {
        *self.token.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn remove(&self) -> ClientResult<()> {
        *self.token.lock().await = None;
        Ok(())
    }
}

/// Shared handle to the current bearer token.
///
/// Cloning is cheap; all clones see the same token.
#[derive(Clone)]
pub struct AuthSession {
    token: Arc<RwLock<Option<String>>>,
    store: Arc<dyn TokenStore>,
    login_redirect: Arc<AtomicBool>,
}

impl AuthSession {
    /// Creates a session backed by `store`, seeded with whatever it holds.
    pub async fn restore(store: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let token = store.load().await?;
        if token.is_some() {
            tracing::debug!("Restored access token from store");
        }
        Ok(Self {
            token: Arc::new(RwLock::new(token)),
            store,
            login_redirect: Arc::new(AtomicBool::new(false)),
        })
    }

    /// A session with no token and no persistence.
    pub fn in_memory() -> Self {
        Self {
            token: Arc::new(RwLock::new(None)),
            store: Arc::new(MemoryTokenStore::new()),
            login_redirect: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The token to attach to outbound requests.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Installs a new token (login). Blank tokens are rejected.
    pub async fn set_token(&self, token: impl Into<String>) -> ClientResult<()> {
        let token = token.into();
        let token = token.trim();
        if token.is_empty() {
            return Err(ClientError::validation("Access token must not be empty"));
        }

        let mut guard = self.token.write().await;
        self.store.save(token).await?;
        *guard = Some(token.to_string());
        self.login_redirect.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Drops the token (logout).
    pub async fn clear(&self) -> ClientResult<()> {
        let mut guard = self.token.write().await;
        *guard = None;
        self.store.remove().await
    }

    /// Handles a 401 from any request: clears the token and arms the login
    /// redirect. Storage failures are logged, never surfaced, so the 401
    /// itself remains the reported error.
    pub async fn expire(&self) {
        if let Err(e) = self.clear().await {
            tracing::warn!("Failed to remove expired token: {}", e);
        }
        self.login_redirect.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once after a 401 so the caller can send the user to
    /// the login entry point; later calls return `false` until the next 401.
    pub fn take_login_redirect(&self) -> bool {
        self.login_redirect.swap(false, Ordering::SeqCst)
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("login_redirect", &self.login_redirect.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_lifecycle() {
        let store = Arc::new(MemoryTokenStore::new());
        let session = AuthSession::restore(store.clone()).await.unwrap();
        assert!(!session.is_authenticated().await);

        session.set_token("abc").await.unwrap();
        assert_eq!(session.token().await.as_deref(), Some("abc"));
        assert_eq!(store.load().await.unwrap().as_deref(), Some("abc"));

        session.clear().await.unwrap();
        assert_eq!(session.token().await, None);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_token_rejected() {
        let session = AuthSession::in_memory();
        assert!(session.set_token("   ").await.is_err());
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_expire_redirects_exactly_once() {
        let session = AuthSession::restore(Arc::new(MemoryTokenStore::with_token("stale")))
            .await
            .unwrap();
        assert!(!session.take_login_redirect());

        session.expire().await;
        assert_eq!(session.token().await, None);
        assert!(session.take_login_redirect());
        assert!(!session.take_login_redirect());
    }

    #[tokio::test]
    async fn test_clones_share_token() {
        let session = AuthSession::in_memory();
        let other = session.clone();
        session.set_token("shared").await.unwrap();
        assert_eq!(other.token().await.as_deref(), Some("shared"));
        other.expire().await;
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("groupify-test-{}", uuid::Uuid::now_v7()));
        let store = FileTokenStore::new(dir.join("nested").join("access_token"));

        assert_eq!(store.load().await.unwrap(), None);
        store.save("tok").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("tok"));
        store.remove().await.unwrap();
        store.remove().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
