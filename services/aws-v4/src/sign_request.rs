use crate::constants::{
    AWS4_HMAC_SHA256, AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET, EMPTY_PAYLOAD_SHA256,
    X_AMZ_CONTENT_SHA_256, X_AMZ_DATE, X_AMZ_SECURITY_TOKEN,
};
use crate::{Credential, SigningKeyCache};
use async_trait::async_trait;
use gatesign_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use gatesign_core::time::{format_date, format_http_date, format_iso8601, now, DateTime};
use gatesign_core::utils::Redact;
use gatesign_core::{Context, Error, Result, SignRequest, SigningCredential};
use http::request::Parts;
use http::{header, HeaderValue, Method};
use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use std::fmt::{Debug, Formatter};

const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";
const SIGNED_HEADERS_WITH_TOKEN: &str = "host;x-amz-content-sha256;x-amz-date;x-amz-security-token";

/// Per-request input of the signature computation.
///
/// Built fresh for every request from a timestamp captured at signing time.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningContext {
    /// HTTP method.
    pub method: Method,
    /// URI path, percent-encoded or not.
    pub uri: String,
    /// Decoded query parameters.
    pub query_params: Vec<(String, String)>,
    /// Host header value, including the port when not default.
    pub host: String,
    /// `YYYYMMDD'T'HHMMSS'Z'`
    pub amz_datetime: String,
    /// `YYYYMMDD`
    pub eight_digit_date: String,
    /// RFC 2616 date of the same instant.
    pub http_date: String,
    /// Signing region.
    pub region: String,
    /// Signing service, e.g. `s3` or `lambda`.
    pub service: String,
    /// Session token of temporary credentials.
    pub session_token: Option<String>,
}

impl Debug for SigningContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningContext")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("query_params", &self.query_params)
            .field("host", &self.host)
            .field("amz_datetime", &self.amz_datetime)
            .field("region", &self.region)
            .field("service", &self.service)
            .field("session_token", &Redact::from(&self.session_token))
            .finish()
    }
}

impl SigningContext {
    /// Create a signing context from a path with optional query string.
    pub fn new(
        method: Method,
        path_and_query: &str,
        host: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
        time: DateTime,
    ) -> Self {
        let (path, query) = path_and_query
            .split_once('?')
            .unwrap_or((path_and_query, ""));

        Self {
            method,
            uri: if path.is_empty() { "/" } else { path }.to_string(),
            query_params: form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
            host: host.into(),
            amz_datetime: format_iso8601(time),
            eight_digit_date: format_date(time),
            http_date: format_http_date(time),
            region: region.into(),
            service: service.into(),
            session_token: None,
        }
    }

    /// Set the session token carried in `x-amz-security-token`.
    pub fn with_session_token(mut self, token: Option<String>) -> Self {
        self.session_token = token;
        self
    }

    /// Build a signing context from request parts.
    ///
    /// The host is taken from the URI authority, falling back to the `Host` header.
    pub fn from_parts(
        parts: &Parts,
        region: &str,
        service: &str,
        time: DateTime,
    ) -> Result<Self> {
        let host = match parts.uri.authority() {
            Some(authority) => authority.as_str().to_string(),
            None => parts
                .headers
                .get(header::HOST)
                .ok_or_else(|| Error::request_invalid("request has neither authority nor host"))?
                .to_str()?
                .to_string(),
        };
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|v| v.as_str())
            .unwrap_or("/");

        Ok(Self::new(
            parts.method.clone(),
            path_and_query,
            host,
            region,
            service,
            time,
        ))
    }

    /// Credential scope: `20220313/<region>/<service>/aws4_request`
    pub fn scope(&self) -> String {
        format!(
            "{}/{}/{}/aws4_request",
            self.eight_digit_date, self.region, self.service
        )
    }
}

/// Header values produced for one signed request.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningOutput {
    /// Value of the `Authorization` header.
    pub authorization: String,
    /// Value of the `x-amz-security-token` header, empty when the credential has no token.
    pub security_token: String,
    /// Value of the `x-amz-date` header.
    pub amz_date: String,
    /// RFC 2616 date of the signing instant, for a `Date` header.
    pub http_date: String,
    /// Value of the `x-amz-content-sha256` header.
    pub content_sha256: &'static str,
    /// Names of the headers covered by the signature, in signing order.
    pub signed_headers: Vec<&'static str>,
}

impl Debug for SigningOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningOutput")
            .field("authorization", &Redact::from(&self.authorization))
            .field("security_token", &Redact::from(&self.security_token))
            .field("amz_date", &self.amz_date)
            .field("http_date", &self.http_date)
            .field("content_sha256", &self.content_sha256)
            .field("signed_headers", &self.signed_headers)
            .finish()
    }
}

/// Semicolon joined list of the signed headers.
///
/// The order is fixed and matches the canonical headers block.
pub fn signed_headers(has_session_token: bool) -> &'static str {
    if has_session_token {
        SIGNED_HEADERS_WITH_TOKEN
    } else {
        SIGNED_HEADERS
    }
}

/// Encode a URI path with the AWS UriEncode rules, keeping `/`.
///
/// Already encoded input is decoded first so that it is not encoded twice.
pub fn canonical_uri(path: &str) -> Result<String> {
    let path = if path.is_empty() { "/" } else { path };
    let decoded = percent_decode_str(path).decode_utf8().map_err(|e| {
        Error::request_invalid("request path is not valid utf-8 after decoding")
            .with_source(e)
            .with_context(format!("path: {path}"))
    })?;

    Ok(utf8_percent_encode(&decoded, &AWS_URI_ENCODE_SET).to_string())
}

/// Encode and sort query parameters into the canonical query string.
pub fn canonical_query_string(params: &[(String, String)]) -> String {
    let mut encoded = params
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect::<Vec<_>>();
    // Sort by param name, then by value.
    encoded.sort();

    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical request of a body-less request.
///
/// `uri` and `query` must already be canonical, see [`canonical_uri`] and
/// [`canonical_query_string`].
pub fn build_canonical_request(
    method: &str,
    uri: &str,
    query: &str,
    host: &str,
    amz_datetime: &str,
    session_token: Option<&str>,
) -> String {
    // 512 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(512);

    f.push_str(method);
    f.push('\n');
    f.push_str(uri);
    f.push('\n');
    f.push_str(query);
    f.push('\n');

    for (name, value) in [
        (header::HOST.as_str(), host),
        (X_AMZ_CONTENT_SHA_256, EMPTY_PAYLOAD_SHA256),
        (X_AMZ_DATE, amz_datetime),
    ]
    .into_iter()
    .chain(session_token.map(|token| (X_AMZ_SECURITY_TOKEN, token)))
    {
        f.push_str(name);
        f.push(':');
        f.push_str(value.trim());
        f.push('\n');
    }
    f.push('\n');

    f.push_str(signed_headers(session_token.is_some()));
    f.push('\n');
    f.push_str(EMPTY_PAYLOAD_SHA256);

    f
}

/// Derive the scoped signing key.
///
/// The key is valid for the whole UTC day of `eight_digit_date`.
pub fn build_signing_key_hash(
    secret_key: &str,
    eight_digit_date: &str,
    service: &str,
    region: &str,
) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret_key}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), eight_digit_date.as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), "aws4_request".as_bytes())
}

/// Build the string to sign.
///
/// ```text
/// AWS4-HMAC-SHA256
/// 20220313T072004Z
/// 20220313/<region>/<service>/aws4_request
/// <hashed_canonical_request>
/// ```
pub fn build_string_to_sign(
    amz_datetime: &str,
    eight_digit_date: &str,
    region: &str,
    service: &str,
    canonical_request_hash: &str,
) -> String {
    format!(
        "{AWS4_HMAC_SHA256}\n{amz_datetime}\n{eight_digit_date}/{region}/{service}/aws4_request\n{canonical_request_hash}"
    )
}

/// Split a cached `<eightDigitDate>:<signingKey>` value.
///
/// Returns `None` for any malformed input so that callers treat it as a cache miss.
pub fn split_cached_values(cached: &str) -> Option<(&str, &str)> {
    let (date, blob) = cached.split_once(':')?;
    if date.is_empty() || blob.is_empty() {
        return None;
    }

    Some((date, blob))
}

/// Build the value of the `Authorization` header.
pub fn build_authorization(
    access_key_id: &str,
    scope: &str,
    signed_headers: &str,
    signature: &str,
) -> String {
    format!(
        "{AWS4_HMAC_SHA256} Credential={access_key_id}/{scope}, SignedHeaders={signed_headers}, Signature={signature}"
    )
}

/// RequestSigner that implement AWS SigV4 for body-less requests.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
#[derive(Debug)]
pub struct RequestSigner {
    service: String,
    region: String,
    signing_key_cache: Option<SigningKeyCache>,
    debug: bool,

    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer for AWS V4.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.into(),
            region: region.into(),
            signing_key_cache: None,
            debug: false,

            time: None,
        }
    }

    /// Reuse derived signing keys through the context's key-value store.
    pub fn with_signing_key_cache(mut self, cache: SigningKeyCache) -> Self {
        self.signing_key_cache = Some(cache);
        self
    }

    /// Log canonical requests and strings to sign at debug level.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Build the signing context of a request with a freshly captured timestamp.
    pub fn signing_context(&self, req: &Parts, cred: &Credential) -> Result<SigningContext> {
        let time = self.time.unwrap_or_else(now);

        Ok(
            SigningContext::from_parts(req, &self.region, &self.service, time)?
                .with_session_token(cred.session_token.clone()),
        )
    }

    /// Compute the header values for a signing context.
    pub fn sign_headers(
        &self,
        ctx: &Context,
        sctx: &SigningContext,
        cred: &Credential,
    ) -> Result<SigningOutput> {
        if !cred.is_valid() {
            return Err(Error::credential_invalid(
                "credential without access key id or secret access key can't sign requests",
            ));
        }

        let session_token = sctx.session_token.as_deref();
        let creq = build_canonical_request(
            sctx.method.as_str(),
            &canonical_uri(&sctx.uri)?,
            &canonical_query_string(&sctx.query_params),
            &sctx.host,
            &sctx.amz_datetime,
            session_token,
        );
        if self.debug {
            debug!("calculated canonical request: {creq}");
        }

        let string_to_sign = build_string_to_sign(
            &sctx.amz_datetime,
            &sctx.eight_digit_date,
            &sctx.region,
            &sctx.service,
            &hex_sha256(creq.as_bytes()),
        );
        if self.debug {
            debug!("calculated string to sign: {string_to_sign}");
        }

        let signing_key = match &self.signing_key_cache {
            Some(cache) => cache.get_or_derive(
                ctx,
                cred,
                &sctx.eight_digit_date,
                &sctx.region,
                &sctx.service,
            ),
            None => build_signing_key_hash(
                &cred.secret_access_key,
                &sctx.eight_digit_date,
                &sctx.service,
                &sctx.region,
            ),
        };
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let signed = signed_headers(session_token.is_some());
        Ok(SigningOutput {
            authorization: build_authorization(
                &cred.access_key_id,
                &sctx.scope(),
                signed,
                &signature,
            ),
            security_token: session_token.unwrap_or_default().to_string(),
            amz_date: sctx.amz_datetime.clone(),
            http_date: sctx.http_date.clone(),
            content_sha256: EMPTY_PAYLOAD_SHA256,
            signed_headers: signed.split(';').collect(),
        })
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(&self, ctx: &Context, req: &mut Parts, cred: &Credential) -> Result<()> {
        let sctx = self.signing_context(req, cred)?;
        let output = self.sign_headers(ctx, &sctx, cred)?;

        req.headers
            .insert(header::HOST, HeaderValue::from_str(&sctx.host)?);
        req.headers
            .insert(X_AMZ_DATE, HeaderValue::from_str(&output.amz_date)?);
        req.headers.insert(
            X_AMZ_CONTENT_SHA_256,
            HeaderValue::from_static(EMPTY_PAYLOAD_SHA256),
        );
        if !output.security_token.is_empty() {
            let mut value = HeaderValue::from_str(&output.security_token)?;
            // Set token value sensitive to valid leaking.
            value.set_sensitive(true);
            req.headers.insert(X_AMZ_SECURITY_TOKEN, value);
        }

        let mut authorization = HeaderValue::from_str(&output.authorization)?;
        authorization.set_sensitive(true);
        req.headers.insert(header::AUTHORIZATION, authorization);

        Ok(())
    }
}
