use crate::constants::{
    DEFAULT_EC2_METADATA_ENDPOINT, EC2_METADATA_TOKEN_REFRESH_BEFORE, EC2_METADATA_TOKEN_TTL,
    EC2_METADATA_TOKEN_TTL_SECONDS, X_AWS_EC2_METADATA_TOKEN, X_AWS_EC2_METADATA_TOKEN_TTL_SECONDS,
};
use crate::provide_credential::utils::{send_for_body, MetadataCredentials};
use crate::{Config, Credential};
use async_trait::async_trait;
use bytes::Bytes;
use gatesign_core::time::{now, DateTime};
use gatesign_core::{Context, Error, ProvideCredential, Result};
use http::header::CONTENT_LENGTH;
use http::Method;
use log::debug;
use std::sync::{Arc, Mutex};

/// ImdsCredentialProvider loads the credential of the IAM role attached to
/// the instance through the instance metadata service (IMDSv2).
///
/// The session token is reused until shortly before it expires.
#[derive(Debug)]
pub struct ImdsCredentialProvider {
    config: Arc<Config>,
    token: Arc<Mutex<(String, DateTime)>>,
}

impl ImdsCredentialProvider {
    /// Create a new `ImdsCredentialProvider` instance.
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            token: Arc::new(Mutex::new((String::new(), DateTime::default()))),
        }
    }

    fn endpoint(&self) -> &str {
        self.config
            .ec2_metadata_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_EC2_METADATA_ENDPOINT)
            .trim_end_matches('/')
    }

    async fn load_ec2_metadata_token(&self, ctx: &Context) -> Result<String> {
        {
            let (token, expires_in) = self.token.lock().expect("lock poisoned").clone();
            if expires_in > now() {
                return Ok(token);
            }
        }

        let url = format!("{}/latest/api/token", self.endpoint());
        let req = http::Request::builder()
            .uri(&url)
            .method(Method::PUT)
            .header(CONTENT_LENGTH, "0")
            .header(X_AWS_EC2_METADATA_TOKEN_TTL_SECONDS, EC2_METADATA_TOKEN_TTL_SECONDS)
            .body(Bytes::new())?;

        let ec2_token = send_for_body(ctx, req, "fetch_imds_token").await?;
        let reuse_for = EC2_METADATA_TOKEN_TTL.saturating_sub(EC2_METADATA_TOKEN_REFRESH_BEFORE);
        let expires_in = chrono::TimeDelta::from_std(reuse_for)
            .ok()
            .and_then(|d| now().checked_add_signed(d));

        // Without a representable expiry the token is used once and not kept.
        if let Some(expires_in) = expires_in {
            *self.token.lock().expect("lock poisoned") = (ec2_token.clone(), expires_in);
        }

        Ok(ec2_token)
    }
}

#[async_trait]
impl ProvideCredential for ImdsCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let token = self.load_ec2_metadata_token(ctx).await?;

        // List all roles that node has, only the first one is used.
        let url = format!("{}/latest/meta-data/iam/security-credentials/", self.endpoint());
        let req = http::Request::builder()
            .uri(&url)
            .method(Method::GET)
            .header(X_AWS_EC2_METADATA_TOKEN, &token)
            .body(Bytes::new())?;

        let roles = send_for_body(ctx, req, "list_instance_profiles").await?;
        let role = roles.lines().next().map(str::trim).unwrap_or_default();
        if role.is_empty() {
            return Err(Error::no_role_credentials(
                "no IAM role attached to the instance",
            )
            .with_context(format!("endpoint: {}", self.endpoint())));
        }
        debug!("loading credential of instance role {role}");

        // Get the credentials via role_name.
        let url = format!(
            "{}/latest/meta-data/iam/security-credentials/{role}",
            self.endpoint()
        );
        let req = http::Request::builder()
            .uri(&url)
            .method(Method::GET)
            .header(X_AWS_EC2_METADATA_TOKEN, &token)
            .body(Bytes::new())?;

        let content = send_for_body(ctx, req, "fetch_credentials").await?;
        let cred = MetadataCredentials::parse(&content)
            .map_err(|e| e.with_context(format!("role: {role}")))?;

        Ok(Some(cred))
    }
}
