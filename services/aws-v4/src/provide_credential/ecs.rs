use crate::constants::ECS_CREDENTIALS_ENDPOINT;
use crate::provide_credential::utils::{send_for_body, MetadataCredentials};
use crate::{Config, Credential};
use async_trait::async_trait;
use bytes::Bytes;
use gatesign_core::{Context, ProvideCredential, Result};
use http::Method;
use std::sync::Arc;

/// EcsCredentialProvider will load credential from the container credentials endpoint.
///
/// It's only active when `AWS_CONTAINER_CREDENTIALS_RELATIVE_URI` is configured.
///
/// References:
/// - [IAM roles for tasks](https://docs.aws.amazon.com/AmazonECS/latest/developerguide/task-iam-roles.html)
#[derive(Debug)]
pub struct EcsCredentialProvider {
    config: Arc<Config>,
}

impl EcsCredentialProvider {
    /// Create a new `EcsCredentialProvider` instance.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProvideCredential for EcsCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let Some(relative_uri) = self
            .config
            .container_credentials_relative_uri
            .as_deref()
            .filter(|v| !v.is_empty())
        else {
            return Ok(None);
        };

        let url = format!("{ECS_CREDENTIALS_ENDPOINT}{relative_uri}");
        let req = http::Request::builder()
            .uri(&url)
            .method(Method::GET)
            .body(Bytes::new())?;

        let content = send_for_body(ctx, req, "fetch_container_credentials").await?;
        Ok(Some(MetadataCredentials::parse(&content)?))
    }
}
