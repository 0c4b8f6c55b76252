//! Device-local persisted state.
//!
//! A single JSON document holding the customer access token, the
//! "stay logged in" preference with its cached credentials, and favorites.
//! Every change is written through to disk before it becomes visible; the
//! write goes to a sibling temp file that is then renamed over the original.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use wrapsody_core::ProductId;

use crate::shopify::CustomerAccessToken;

/// Errors from reading or writing local state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("State file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Everything persisted between runs.
///
/// Implements `Debug` manually to redact the cached refresh token.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalState {
    /// Token from the last successful storefront login.
    pub customer_access_token: Option<CustomerAccessToken>,
    /// Email the customer access token was issued for.
    pub customer_email: Option<String>,
    /// Whether to sign in automatically on the next run.
    pub stay_logged_in: bool,
    /// Email cached for automatic sign-in.
    pub saved_email: Option<String>,
    /// Identity refresh token cached for automatic sign-in.
    pub saved_refresh_token: Option<String>,
    /// Whether both identity and storefront sign-in succeeded.
    pub is_user_logged_in: bool,
    /// Favorite products, in the order they were added.
    pub favorites: Vec<ProductId>,
}

impl std::fmt::Debug for LocalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalState")
            .field("customer_access_token", &self.customer_access_token)
            .field("customer_email", &self.customer_email)
            .field("stay_logged_in", &self.stay_logged_in)
            .field("saved_email", &self.saved_email)
            .field(
                "saved_refresh_token",
                &self.saved_refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("is_user_logged_in", &self.is_user_logged_in)
            .field("favorites", &self.favorites)
            .finish()
    }
}

impl LocalState {
    /// Forget the storefront login.
    pub fn clear_customer(&mut self) {
        self.customer_access_token = None;
        self.customer_email = None;
    }

    /// Forget cached sign-in credentials.
    pub fn clear_saved_credentials(&mut self) {
        self.stay_logged_in = false;
        self.saved_email = None;
        self.saved_refresh_token = None;
    }
}

/// Handle to the local state. Cheap to clone.
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<LocalStoreInner>,
}

struct LocalStoreInner {
    path: Option<PathBuf>,
    state: Mutex<LocalState>,
}

impl LocalStore {
    /// State that lives only as long as the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(LocalStoreInner {
                path: None,
                state: Mutex::new(LocalState::default()),
            }),
        }
    }

    /// Open the state file at `path`, starting empty if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file yet, starting empty");
                LocalState::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            inner: Arc::new(LocalStoreInner {
                path: Some(path),
                state: Mutex::new(state),
            }),
        })
    }

    /// Open `path` if given, otherwise keep state in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open_or_in_memory(path: Option<&Path>) -> Result<Self, StoreError> {
        match path {
            Some(path) => Self::open(path).await,
            None => Ok(Self::in_memory()),
        }
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> LocalState {
        self.inner.state.lock().await.clone()
    }

    /// Apply a change and persist it.
    ///
    /// The change is visible to readers only after it has been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written; the in-memory state is
    /// left unchanged in that case.
    pub async fn update<R: Send>(
        &self,
        change: impl FnOnce(&mut LocalState) -> R + Send,
    ) -> Result<R, StoreError> {
        let mut state = self.inner.state.lock().await;
        let mut next = state.clone();
        let result = change(&mut next);
        if next != *state {
            self.persist(&next).await?;
            *state = next;
        }
        Ok(result)
    }

    async fn persist(&self, state: &LocalState) -> Result<(), StoreError> {
        let Some(path) = &self.inner.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = path.with_extension("json.tmp");

        // A leftover temp file would keep its old permissions
        if let Err(e) = tokio::fs::remove_file(&tmp).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            return Err(e.into());
        }

        // The state holds tokens; keep it readable by the owner only
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        debug!(path = %path.display(), "Persisted local state");
        Ok(())
    }

    // =========================================================================
    // Convenience accessors
    // =========================================================================

    /// Remember the customer access token issued to `email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    pub async fn remember_customer(
        &self,
        token: CustomerAccessToken,
        email: &str,
    ) -> Result<(), StoreError> {
        let email = email.to_string();
        self.update(move |state| {
            state.customer_access_token = Some(token);
            state.customer_email = Some(email);
        })
        .await
    }

    /// The stored customer access token if it was issued to `email`.
    ///
    /// Emails compare case-insensitively.
    pub async fn customer_access_token_for(&self, email: &str) -> Option<CustomerAccessToken> {
        let state = self.inner.state.lock().await;
        let owner = state.customer_email.as_deref()?;
        if owner.to_lowercase() == email.to_lowercase() {
            state.customer_access_token.clone()
        } else {
            None
        }
    }

    /// The stored customer access token, if any.
    pub async fn customer_access_token(&self) -> Option<CustomerAccessToken> {
        self.inner
            .state
            .lock()
            .await
            .customer_access_token
            .clone()
    }

    /// Add a product to favorites, or remove it if present.
    ///
    /// Returns whether the product is a favorite afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    pub async fn toggle_favorite(&self, product_id: ProductId) -> Result<bool, StoreError> {
        self.update(|state| {
            if let Some(index) = state.favorites.iter().position(|id| id == &product_id) {
                state.favorites.remove(index);
                false
            } else {
                state.favorites.push(product_id);
                true
            }
        })
        .await
    }

    /// Favorite products in insertion order.
    pub async fn favorites(&self) -> Vec<ProductId> {
        self.inner.state.lock().await.favorites.clone()
    }
}
