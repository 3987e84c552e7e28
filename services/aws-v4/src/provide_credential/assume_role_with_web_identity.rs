use crate::constants::STS_API_VERSION;
use crate::provide_credential::utils::{send_for_body, sts_endpoint};
use crate::{Config, Credential};
use async_trait::async_trait;
use bytes::Bytes;
use gatesign_core::time::{parse_rfc3339, parse_timestamp_secs, DateTime};
use gatesign_core::{utils::Redact, Context, Error, ProvideCredential, Result};
use http::header::ACCEPT;
use http::Method;
use serde::Deserialize;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// AssumeRoleWithWebIdentityCredentialProvider will load credential via assume role with web identity.
///
/// It's only active when both `web_identity_token_file` and `role_arn` are configured.
#[derive(Debug)]
pub struct AssumeRoleWithWebIdentityCredentialProvider {
    config: Arc<Config>,
}

impl AssumeRoleWithWebIdentityCredentialProvider {
    /// Create a new `AssumeRoleWithWebIdentityCredentialProvider` instance.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProvideCredential for AssumeRoleWithWebIdentityCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let (Some(token_file), Some(role_arn)) = (
            self.config.web_identity_token_file.as_deref(),
            self.config.role_arn.as_deref(),
        ) else {
            return Ok(None);
        };

        // Resolve the endpoint first so a misconfiguration never reaches the network.
        let endpoint = sts_endpoint(
            self.config.sts_endpoint.as_deref(),
            self.config.region.as_deref(),
            self.config.use_regional_sts_endpoint,
        )
        .map_err(|e| e.with_context(format!("role_arn: {role_arn}")))?;

        let token_path = ctx.expand_home_dir(token_file).ok_or_else(|| {
            Error::config_invalid("home dir required to expand web identity token file")
                .with_context(format!("file: {token_file}"))
        })?;
        let token = ctx.file_read_as_string(&token_path).await.map_err(|e| {
            Error::config_invalid("failed to read web identity token file")
                .with_source(e)
                .with_context(format!("file: {token_path}"))
        })?;
        let session_name = self.config.role_session_name();

        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("Version", STS_API_VERSION)
            .append_pair("Action", "AssumeRoleWithWebIdentity")
            .append_pair("RoleArn", role_arn)
            .append_pair("RoleSessionName", session_name)
            .append_pair("WebIdentityToken", token.trim())
            .finish();

        // Construct request to AWS STS Service.
        let req = http::Request::builder()
            .method(Method::GET)
            .uri(format!("{endpoint}/?{query}"))
            .header(ACCEPT, "application/json")
            .body(Bytes::new())
            .map_err(|e| {
                Error::request_invalid("failed to build STS AssumeRoleWithWebIdentity request")
                    .with_source(e)
                    .with_context(format!("endpoint: {endpoint}"))
            })?;

        let body = send_for_body(ctx, req, "AssumeRoleWithWebIdentity")
            .await
            .map_err(|e| {
                e.with_context(format!("role_arn: {role_arn}"))
                    .with_context(format!("session_name: {session_name}"))
            })?;

        let resp: AssumeRoleWithWebIdentityEnvelope = serde_json::from_str(&body).map_err(|e| {
            Error::credential_invalid("failed to parse STS AssumeRoleWithWebIdentity response")
                .with_source(e)
                .with_context(format!("response_length: {}", body.len()))
                .with_context(format!("role_arn: {role_arn}"))
        })?;
        let resp_cred = resp.response.result.credentials;

        let cred = Credential {
            access_key_id: resp_cred.access_key_id,
            secret_access_key: resp_cred.secret_access_key,
            session_token: Some(resp_cred.session_token).filter(|v| !v.is_empty()),
            expires_in: resp_cred
                .expiration
                .map(|v| v.into_date_time())
                .transpose()
                .map_err(|e| e.with_context(format!("role_arn: {role_arn}")))?,
        };

        Ok(Some(cred))
    }
}

#[derive(Default, Debug, Deserialize)]
struct AssumeRoleWithWebIdentityEnvelope {
    #[serde(rename = "AssumeRoleWithWebIdentityResponse")]
    response: AssumeRoleWithWebIdentityResponse,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct AssumeRoleWithWebIdentityResponse {
    #[serde(rename = "AssumeRoleWithWebIdentityResult")]
    result: AssumeRoleWithWebIdentityResult,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct AssumeRoleWithWebIdentityResult {
    credentials: AssumeRoleWithWebIdentityCredentials,
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct AssumeRoleWithWebIdentityCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
    expiration: Option<Expiration>,
}

impl Debug for AssumeRoleWithWebIdentityCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssumeRoleWithWebIdentityCredentials")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("session_token", &Redact::from(&self.session_token))
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// STS reports the expiration as epoch seconds in JSON responses, but some
/// compatible services send an RFC 3339 string instead.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Expiration {
    Seconds(f64),
    Text(String),
}

impl Expiration {
    fn into_date_time(self) -> Result<DateTime> {
        match self {
            Expiration::Seconds(secs) => parse_timestamp_secs(secs as i64),
            Expiration::Text(v) => parse_rfc3339(&v),
        }
        .map_err(|e| {
            Error::credential_invalid("failed to parse web identity credential expiration")
                .with_source(e)
        })
    }
}
