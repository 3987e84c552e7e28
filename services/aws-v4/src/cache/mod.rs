//! Persist resolved credentials between resolutions.

mod local_file;
pub use local_file::LocalFileCredentialCache;

mod shared_store;
pub use shared_store::SharedStoreCredentialCache;

use crate::{CacheBackend, Config, Credential};
use async_trait::async_trait;
use gatesign_core::time::{format_rfc3339, parse_rfc3339};
use gatesign_core::{Error, Result, SigningCredential};
use gatesign_core::Context;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// CredentialCache stores the last fetched credential.
///
/// A `write` followed by a `read` returns the same credential.
#[async_trait]
pub trait CredentialCache: Debug + Send + Sync + 'static {
    /// Read the cached credential.
    ///
    /// Returns `Ok(None)` when nothing usable is cached.
    async fn read(&self, ctx: &Context) -> Result<Option<Credential>>;

    /// Replace the cached credential.
    async fn write(&self, ctx: &Context, cred: &Credential) -> Result<()>;
}

/// Build the cache selected by [`Config::cache_backend`].
pub fn credential_cache(config: Arc<Config>) -> Arc<dyn CredentialCache> {
    match config.cache_backend {
        CacheBackend::SharedStore => Arc::new(SharedStoreCredentialCache::new(config)),
        CacheBackend::LocalFile => Arc::new(LocalFileCredentialCache::new(config)),
    }
}

/// On-disk and in-store representation of a credential.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedCredential {
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    session_token: Option<String>,
    #[serde(default)]
    expiration: Option<String>,
}

fn encode_credential(cred: &Credential) -> Result<String> {
    let cached = CachedCredential {
        access_key_id: cred.access_key_id.clone(),
        secret_access_key: cred.secret_access_key.clone(),
        session_token: cred.session_token.clone(),
        expiration: cred.expires_in.map(format_rfc3339),
    };

    serde_json::to_string(&cached)
        .map_err(|e| Error::unexpected("failed to encode cached credential").with_source(e))
}

fn decode_credential(content: &str) -> Result<Credential> {
    let cached: CachedCredential = serde_json::from_str(content).map_err(|e| {
        Error::credential_invalid("cached credential is not valid json").with_source(e)
    })?;

    let expires_in = match cached.expiration.as_deref() {
        None | Some("") => None,
        Some(v) => Some(parse_rfc3339(v)?),
    };

    Ok(Credential {
        access_key_id: cached.access_key_id,
        secret_access_key: cached.secret_access_key,
        session_token: cached.session_token.filter(|v| !v.is_empty()),
        expires_in,
    })
}

/// Decide whether `cred` should be persisted.
///
/// Static credentials are never cached, and empty credentials are rejected.
fn should_write(config: &Config, cred: &Credential) -> Result<bool> {
    if config.has_static_credentials() {
        return Ok(false);
    }
    if !cred.is_valid() {
        return Err(Error::cache_write_rejected(
            "credential without access key id or secret access key can't be cached",
        ));
    }

    Ok(true)
}
