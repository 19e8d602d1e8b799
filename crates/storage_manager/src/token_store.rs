//! GitHub token and device-flow bookkeeping on top of a [`KeyValueStore`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{Result, StorageError};
use crate::storage::KeyValueStore;

pub const GITHUB_TOKEN_KEY: &str = "github_token";
pub const USER_CODE_KEY: &str = "github_user_code";
pub const VERIFICATION_URI_KEY: &str = "github_verification_uri";
pub const DEVICE_EXPIRES_AT_KEY: &str = "github_device_expires_at";

/// Keys written while a device authorization is waiting on the user
pub const DEVICE_FLOW_KEYS: [&str; 3] = [USER_CODE_KEY, VERIFICATION_URI_KEY, DEVICE_EXPIRES_AT_KEY];

/// What a front end needs to show while the user authorizes elsewhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    pub user_code: String,
    pub verification_uri: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingVerification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn token(&self) -> Result<Option<String>> {
        match self.store.get(GITHUB_TOKEN_KEY).await? {
            Some(Value::String(token)) if !token.trim().is_empty() => {
                Ok(Some(token.trim().to_string()))
            }
            Some(Value::String(_)) | None => Ok(None),
            Some(_) => Err(StorageError::InvalidData {
                key: GITHUB_TOKEN_KEY.to_string(),
                reason: "token is not a string".to_string(),
            }),
        }
    }

    /// Like [`token`](Self::token) but absence is an error
    pub async fn require_token(&self) -> Result<String> {
        self.token().await?.ok_or(StorageError::TokenNotFound)
    }

    pub async fn save_token(&self, token: &str) -> Result<()> {
        self.store
            .set(GITHUB_TOKEN_KEY, Value::String(token.to_string()))
            .await
    }

    pub async fn clear_token(&self) -> Result<()> {
        self.store.remove(&[GITHUB_TOKEN_KEY]).await
    }

    pub async fn save_pending_verification(&self, pending: &PendingVerification) -> Result<()> {
        self.store
            .set_many(vec![
                (USER_CODE_KEY.to_string(), Value::String(pending.user_code.clone())),
                (
                    VERIFICATION_URI_KEY.to_string(),
                    Value::String(pending.verification_uri.clone()),
                ),
                (
                    DEVICE_EXPIRES_AT_KEY.to_string(),
                    Value::String(pending.expires_at.to_rfc3339()),
                ),
            ])
            .await
    }

    /// Returns the pending verification only when all bookkeeping keys are present
    pub async fn pending_verification(&self) -> Result<Option<PendingVerification>> {
        let user_code = self.string_value(USER_CODE_KEY).await?;
        let verification_uri = self.string_value(VERIFICATION_URI_KEY).await?;
        let expires_at = self.string_value(DEVICE_EXPIRES_AT_KEY).await?;

        let (Some(user_code), Some(verification_uri), Some(expires_at)) =
            (user_code, verification_uri, expires_at)
        else {
            return Ok(None);
        };

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|e| StorageError::InvalidData {
                key: DEVICE_EXPIRES_AT_KEY.to_string(),
                reason: e.to_string(),
            })?
            .with_timezone(&Utc);

        Ok(Some(PendingVerification {
            user_code,
            verification_uri,
            expires_at,
        }))
    }

    pub async fn clear_pending_verification(&self) -> Result<()> {
        self.store.remove(&DEVICE_FLOW_KEYS).await
    }

    async fn string_value(&self, key: &str) -> Result<Option<String>> {
        Ok(match self.store.get(key).await? {
            Some(Value::String(value)) => Some(value),
            _ => None,
        })
    }
}
