use crate::{Context, Error, ProvideCredential, Result, SignRequest, SigningCredential};
use log::debug;
use std::sync::Arc;

/// Signer is the main struct used to sign the request.
///
/// Every call to [`Signer::sign`] resolves the credential again through the
/// provider; caching is the provider's concern.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    ctx: Context,
    provider: Arc<dyn ProvideCredential<Credential = K>>,
    signer: Arc<dyn SignRequest<Credential = K>>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        provider: impl ProvideCredential<Credential = K>,
        signer: impl SignRequest<Credential = K>,
    ) -> Self {
        Self {
            ctx,
            provider: Arc::new(provider),
            signer: Arc::new(signer),
        }
    }

    /// Resolve a credential and sign the request with it.
    ///
    /// Returns an error instead of signing when no usable credential is available.
    pub async fn sign(&self, req: &mut http::request::Parts) -> Result<()> {
        let cred = self.provider.provide_credential(&self.ctx).await?;

        let Some(cred) = cred.filter(|c| c.is_valid()) else {
            return Err(Error::credential_invalid(
                "no valid credential resolved, refusing to sign request",
            ));
        };
        debug!("resolved credential for signing: {cred:?}");

        self.signer.sign_request(&self.ctx, req, &cred).await
    }
}
