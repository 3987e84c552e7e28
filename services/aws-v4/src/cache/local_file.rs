use super::{decode_credential, encode_credential, should_write, CredentialCache};
use crate::{Config, Credential};
use async_trait::async_trait;
use gatesign_core::{Context, ErrorKind, Result};
use log::{debug, warn};
use std::sync::Arc;

/// LocalFileCredentialCache keeps the credential as a JSON file.
///
/// The path is [`Config::credentials_file_path`]. Writes go through the
/// context's `FileWrite`, which is expected to replace the file atomically.
#[derive(Debug)]
pub struct LocalFileCredentialCache {
    config: Arc<Config>,
}

impl LocalFileCredentialCache {
    /// Create a new local file cache.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CredentialCache for LocalFileCredentialCache {
    async fn read(&self, ctx: &Context) -> Result<Option<Credential>> {
        let path = self.config.credentials_file_path();

        let content = match ctx.file_read_as_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("credential cache file {path} doesn't exist");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }

        match decode_credential(&content) {
            Ok(cred) => Ok(Some(cred)),
            Err(err) => {
                warn!("ignoring malformed credential cache file {path}: {err}");
                Ok(None)
            }
        }
    }

    async fn write(&self, ctx: &Context, cred: &Credential) -> Result<()> {
        if !should_write(&self.config, cred)? {
            return Ok(());
        }

        let path = self.config.credentials_file_path();
        let content = encode_credential(cred)?;
        ctx.file_write(&path, content.as_bytes())
            .await
            .map_err(|e| e.with_context(format!("credential cache file: {path}")))
    }
}
