use std::sync::Arc;

use crate::error::StorageError;
use crate::session::storage::Storage;
use crate::types::UserProfile;

pub const ACCESS_TOKEN_KEY: &str = "atlas.accessToken";
pub const REFRESH_TOKEN_KEY: &str = "atlas.refreshToken";
pub const USER_KEY: &str = "atlas.user";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl StoredTokens {
    /// Both tokens, or nothing
    pub fn pair(&self) -> Option<(&str, &str)> {
        match (self.access_token.as_deref(), self.refresh_token.as_deref()) {
            (Some(access), Some(refresh)) => Some((access, refresh)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Token and profile persistence over a [`Storage`] backend.
///
/// Tokens are opaque: nothing here checks expiry or signatures.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn get(&self) -> Result<StoredTokens, StorageError> {
        Ok(StoredTokens {
            access_token: self.storage.get(ACCESS_TOKEN_KEY)?,
            refresh_token: self.storage.get(REFRESH_TOKEN_KEY)?,
        })
    }

    pub fn set(&self, access_token: &str, refresh_token: &str) -> Result<(), StorageError> {
        self.storage.apply(&[
            (ACCESS_TOKEN_KEY, Some(access_token.to_string())),
            (REFRESH_TOKEN_KEY, Some(refresh_token.to_string())),
        ])
    }

    /// Cached profile. An entry that no longer parses counts as absent.
    pub fn get_user(&self) -> Result<Option<UserProfile>, StorageError> {
        let Some(raw) = self.storage.get(USER_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!("Ignoring malformed cached user profile: {}", e);
                Ok(None)
            }
        }
    }

    pub fn set_user(&self, user: &UserProfile) -> Result<(), StorageError> {
        let raw = serde_json::to_string(user)?;
        self.storage.apply(&[(USER_KEY, Some(raw))])
    }

    /// Store a full login result in one write
    pub fn set_all(
        &self,
        access_token: &str,
        refresh_token: &str,
        user: &UserProfile,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(user)?;
        self.storage.apply(&[
            (ACCESS_TOKEN_KEY, Some(access_token.to_string())),
            (REFRESH_TOKEN_KEY, Some(refresh_token.to_string())),
            (USER_KEY, Some(raw)),
        ])
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.apply(&[
            (ACCESS_TOKEN_KEY, None),
            (REFRESH_TOKEN_KEY, None),
            (USER_KEY, None),
        ])
    }
}
