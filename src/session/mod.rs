pub mod storage;
pub mod store;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::StorageError;
use crate::types::{TokenPair, UserProfile};

pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{StoredTokens, TokenStore};

/// Authentication state as seen by the UI/CLI layer
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Bootstrapping,
    Authenticated(UserProfile),
    Anonymous,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Bootstrapping)
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AuthState::Bootstrapping => "bootstrapping",
            AuthState::Authenticated(_) => "authenticated",
            AuthState::Anonymous => "anonymous",
        }
    }
}

/// The process-wide session: persisted tokens plus the observable auth state.
///
/// Shared by `Arc` between the API client (which rotates or clears tokens)
/// and the auth controller (which establishes and ends sessions).
pub struct Session {
    store: TokenStore,
    state: watch::Sender<AuthState>,
    /// Bumped on every `end`
    generation: AtomicU64,
}

impl Session {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let (state, _) = watch::channel(AuthState::Bootstrapping);
        Self {
            store: TokenStore::new(storage),
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Counts ended sessions; anything cached under an older value belongs
    /// to a user who is no longer signed in.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub(crate) fn settle(&self, next: AuthState) {
        let previous = self.state.send_replace(next.clone());
        if previous.label() != next.label() {
            tracing::info!("Session {} -> {}", previous.label(), next.label());
        }
    }

    /// Persist a login/registration result and mark the session authenticated
    pub fn establish(&self, tokens: &TokenPair, user: &UserProfile) -> Result<(), StorageError> {
        self.store
            .set_all(&tokens.access_token, &tokens.refresh_token, user)?;
        self.settle(AuthState::Authenticated(user.clone()));
        Ok(())
    }

    /// Drop all persisted state and mark the session anonymous
    pub fn end(&self) -> Result<(), StorageError> {
        let cleared = self.store.clear();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.settle(AuthState::Anonymous);
        cleared
    }
}
