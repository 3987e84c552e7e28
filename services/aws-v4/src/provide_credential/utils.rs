use crate::constants::GLOBAL_STS_ENDPOINT;
use crate::Credential;
use bytes::Bytes;
use gatesign_core::time::parse_rfc3339;
use gatesign_core::utils::Redact;
use gatesign_core::{Context, Error, Result, SigningCredential};
use serde::Deserialize;
use std::fmt::{Debug, Formatter};

/// Get the sts endpoint.
///
/// The returning format may look like `https://sts.{region}.amazonaws.com`
///
/// # Notes
///
/// An explicit endpoint always wins. AWS could have different sts endpoint
/// based on it's region, we can check them by region name.
pub fn sts_endpoint(
    explicit: Option<&str>,
    region: Option<&str>,
    use_regional: bool,
) -> Result<String> {
    if let Some(endpoint) = explicit.filter(|v| !v.is_empty()) {
        let endpoint = endpoint.trim_end_matches('/');
        return if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            Ok(endpoint.to_string())
        } else {
            Ok(format!("https://{endpoint}"))
        };
    }

    if !use_regional {
        return Ok(GLOBAL_STS_ENDPOINT.to_string());
    }

    let region = region.filter(|v| !v.is_empty()).ok_or_else(|| {
        Error::missing_region("regional STS endpoint requires region")
            .with_context("hint: set AWS_REGION or unset AWS_STS_REGIONAL_ENDPOINTS")
    })?;
    if region.starts_with("cn-") {
        Ok(format!("https://sts.{region}.amazonaws.com.cn"))
    } else {
        Ok(format!("https://sts.{region}.amazonaws.com"))
    }
}

/// Send the request and return the body of a successful response.
///
/// Both transport errors and non-success statuses are reported as
/// `TransportFailure`.
pub async fn send_for_body(
    ctx: &Context,
    req: http::Request<Bytes>,
    operation: &str,
) -> Result<String> {
    let url = req.uri().to_string();
    let resp = ctx.http_send_as_string(req).await.map_err(|e| {
        Error::transport_failure(format!("failed to send {operation} request"))
            .with_source(e)
            .with_context(format!("url: {url}"))
    })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(
            Error::transport_failure(format!("{operation} request failed with status {status}"))
                .with_context(format!("url: {url}"))
                .with_context(format!("status: {status}"))
                .with_context(format!("body: {}", resp.body())),
        );
    }

    Ok(resp.into_body())
}

/// Credential document served by the instance metadata and container
/// credential endpoints.
#[derive(Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct MetadataCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub token: String,
    pub expiration: String,

    pub code: String,
    pub message: String,
}

impl Debug for MetadataCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCredentials")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("token", &Redact::from(&self.token))
            .field("expiration", &self.expiration)
            .field("code", &self.code)
            .field("message", &self.message)
            .finish()
    }
}

impl MetadataCredentials {
    /// Parse the document and convert it into a credential.
    pub fn parse(content: &str) -> Result<Credential> {
        let doc: MetadataCredentials = serde_json::from_str(content).map_err(|e| {
            Error::credential_invalid("failed to parse credential document")
                .with_source(e)
                .with_context(format!("response_length: {}", content.len()))
        })?;

        match doc.code.as_str() {
            "" | "Success" => {}
            "AssumeRoleUnauthorizedAccess" => {
                return Err(Error::credential_denied(format!(
                    "instance not authorized to assume role: {}",
                    doc.message
                ))
                .with_context(format!("error_code: {}", doc.code)));
            }
            code => {
                return Err(Error::credential_invalid(format!(
                    "credential endpoint returned error: [{code}] {}",
                    doc.message
                )));
            }
        }

        let expires_in = if doc.expiration.is_empty() {
            None
        } else {
            Some(parse_rfc3339(&doc.expiration).map_err(|e| {
                Error::credential_invalid("failed to parse credential expiration")
                    .with_source(e)
                    .with_context(format!("expiration_value: {}", doc.expiration))
            })?)
        };

        let cred = Credential {
            access_key_id: doc.access_key_id,
            secret_access_key: doc.secret_access_key,
            session_token: Some(doc.token).filter(|v| !v.is_empty()),
            expires_in,
        };
        if !cred.is_valid() {
            return Err(Error::credential_invalid(
                "credential document misses access key id or secret access key",
            ));
        }

        Ok(cred)
    }
}
