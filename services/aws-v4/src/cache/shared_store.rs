use super::{decode_credential, encode_credential, should_write, CredentialCache};
use crate::constants::SHARED_STORE_CREDENTIAL_KEY;
use crate::{Config, Credential};
use async_trait::async_trait;
use gatesign_core::{Context, Result};
use log::{debug, warn};
use std::sync::Arc;

/// SharedStoreCredentialCache keeps the credential as JSON in one field of
/// the context's key-value store.
#[derive(Debug)]
pub struct SharedStoreCredentialCache {
    config: Arc<Config>,
    key: String,
}

impl SharedStoreCredentialCache {
    /// Create a new cache using the `instance_credential_json` field.
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            key: SHARED_STORE_CREDENTIAL_KEY.to_string(),
        }
    }

    /// Use another field of the store.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

#[async_trait]
impl CredentialCache for SharedStoreCredentialCache {
    async fn read(&self, ctx: &Context) -> Result<Option<Credential>> {
        let Some(content) = ctx.store_get(&self.key).filter(|v| !v.is_empty()) else {
            debug!("shared store has no cached credential under {}", self.key);
            return Ok(None);
        };

        match decode_credential(&content) {
            Ok(cred) => Ok(Some(cred)),
            Err(err) => {
                warn!("ignoring malformed credential under {}: {err}", self.key);
                Ok(None)
            }
        }
    }

    async fn write(&self, ctx: &Context, cred: &Credential) -> Result<()> {
        if !should_write(&self.config, cred)? {
            return Ok(());
        }

        ctx.store_set(&self.key, encode_credential(cred)?)
    }
}
