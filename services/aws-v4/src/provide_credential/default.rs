use crate::cache::{credential_cache, CredentialCache};
use crate::provide_credential::{
    AssumeRoleWithWebIdentityCredentialProvider, ConfigCredentialProvider, EcsCredentialProvider,
    ImdsCredentialProvider,
};
use crate::{Config, Credential};
use async_trait::async_trait;
use gatesign_core::{Context, ProvideCredential, Result, SigningCredential};
use log::{debug, warn};
use std::sync::Arc;

/// DefaultCredentialProvider resolves the credential used to sign upstream requests.
///
/// Resolution order:
///
/// 1. Static credential of [`Config`], never cached.
/// 2. The credential cache, unless the cached credential expires within
///    [`Config::refresh_window`].
/// 3. Exactly one remote source, picked from the config:
///    - container credentials if `container_credentials_relative_uri` is set
///    - web identity if both `web_identity_token_file` and `role_arn` are set
///    - instance metadata otherwise
///
/// A fetched credential is written back to the cache before it's returned.
#[derive(Debug)]
pub struct DefaultCredentialProvider {
    config: Arc<Config>,
    static_provider: ConfigCredentialProvider,
    cache: Arc<dyn CredentialCache>,
    fetcher: Box<dyn ProvideCredential<Credential = Credential>>,
}

impl DefaultCredentialProvider {
    /// Create a new `DefaultCredentialProvider` with the cache selected by the config.
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            static_provider: ConfigCredentialProvider::new(config.clone()),
            cache: credential_cache(config.clone()),
            fetcher: select_fetcher(config.clone()),
            config,
        }
    }

    /// Replace the credential cache.
    pub fn with_cache(mut self, cache: Arc<dyn CredentialCache>) -> Self {
        self.cache = cache;
        self
    }

    fn is_usable(&self, cred: &Credential) -> bool {
        if !cred.is_valid() {
            return false;
        }

        match self.config.refresh_window {
            Some(window) => !cred.expires_within(window),
            None => true,
        }
    }
}

fn select_fetcher(config: Arc<Config>) -> Box<dyn ProvideCredential<Credential = Credential>> {
    if config
        .container_credentials_relative_uri
        .as_deref()
        .is_some_and(|v| !v.is_empty())
    {
        debug!("resolving credential from container credentials endpoint");
        Box::new(EcsCredentialProvider::new(config))
    } else if config.web_identity_token_file.is_some() && config.role_arn.is_some() {
        debug!("resolving credential from web identity");
        Box::new(AssumeRoleWithWebIdentityCredentialProvider::new(config))
    } else {
        debug!("resolving credential from instance metadata");
        Box::new(ImdsCredentialProvider::new(config))
    }
}

#[async_trait]
impl ProvideCredential for DefaultCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        if let Some(cred) = self.static_provider.provide_credential(ctx).await? {
            return Ok(Some(cred));
        }

        match self.cache.read(ctx).await {
            Ok(Some(cred)) if self.is_usable(&cred) => return Ok(Some(cred)),
            Ok(Some(_)) => debug!("cached credential is expiring or incomplete, refreshing"),
            Ok(None) => debug!("no cached credential found"),
            Err(err) => warn!("failed to read cached credential, fetching a new one: {err}"),
        }

        let Some(cred) = self.fetcher.provide_credential(ctx).await? else {
            return Ok(None);
        };
        self.cache.write(ctx, &cred).await?;

        Ok(Some(cred))
    }
}
