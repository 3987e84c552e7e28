use super::{create_test_context, MockHttpSend};
use anyhow::Result;
use gatesign_aws_v4::{AssumeRoleWithWebIdentityCredentialProvider, Config};
use gatesign_core::time::parse_rfc3339;
use gatesign_core::{ErrorKind, ProvideCredential};
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;

const STS_RESPONSE: &str = r#"{
  "AssumeRoleWithWebIdentityResponse": {
    "AssumeRoleWithWebIdentityResult": {
      "Credentials": {
        "AccessKeyId": "ASIASTSEXAMPLE",
        "SecretAccessKey": "sts_secret_access_key",
        "SessionToken": "sts_session_token",
        "Expiration": 4070908800
      }
    }
  }
}"#;

#[tokio::test]
async fn test_web_identity_not_configured() -> Result<()> {
    let http = MockHttpSend::default();
    let ctx = create_test_context(
        &[("AWS_ROLE_ARN", "arn:aws:iam::123:role/gateway")],
        http.clone(),
    );
    let provider = AssumeRoleWithWebIdentityCredentialProvider::new(Arc::new(
        Config::default().from_env(&ctx),
    ));

    assert!(provider.provide_credential(&ctx).await?.is_none());
    assert!(http.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_web_identity_missing_region() {
    let http = MockHttpSend::default();
    let ctx = create_test_context(
        &[
            ("AWS_ROLE_ARN", "arn:aws:iam::123:role/gateway"),
            ("AWS_WEB_IDENTITY_TOKEN_FILE", "/not/exist/token"),
            ("AWS_STS_REGIONAL_ENDPOINTS", "regional"),
        ],
        http.clone(),
    );
    let provider = AssumeRoleWithWebIdentityCredentialProvider::new(Arc::new(
        Config::default().from_env(&ctx),
    ));

    let err = provider
        .provide_credential(&ctx)
        .await
        .expect_err("must fail without region");
    assert_eq!(err.kind(), ErrorKind::MissingRegion);
    assert!(http.requests().is_empty());
}

#[tokio::test]
async fn test_web_identity_credential_provider() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let token_file = dir.path().join("token");
    std::fs::write(&token_file, "header.payload.signature\n")?;
    let token_file = token_file.to_string_lossy().to_string();

    let http = MockHttpSend::default().with_route(Method::GET, "/", StatusCode::OK, STS_RESPONSE);
    let ctx = create_test_context(
        &[
            ("AWS_ROLE_ARN", "arn:aws:iam::123:role/gateway"),
            ("AWS_WEB_IDENTITY_TOKEN_FILE", token_file.as_str()),
            ("AWS_REGION", "eu-west-1"),
            ("AWS_STS_REGIONAL_ENDPOINTS", "regional"),
            ("HOSTNAME", "gateway-7f9c"),
        ],
        http.clone(),
    );
    let provider = AssumeRoleWithWebIdentityCredentialProvider::new(Arc::new(
        Config::default().from_env(&ctx),
    ));

    let cred = provider
        .provide_credential(&ctx)
        .await?
        .expect("credential must be loaded");
    assert_eq!(cred.access_key_id, "ASIASTSEXAMPLE");
    assert_eq!(cred.secret_access_key, "sts_secret_access_key");
    assert_eq!(cred.session_token.as_deref(), Some("sts_session_token"));
    assert_eq!(cred.expires_in, Some(parse_rfc3339("2099-01-01T00:00:00Z")?));

    let requests = http.requests();
    assert_eq!(requests.len(), 1);
    let uri: http::Uri = requests[0].1.parse()?;
    assert_eq!(uri.host(), Some("sts.eu-west-1.amazonaws.com"));

    let query: HashMap<String, String> =
        form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
            .into_owned()
            .collect();
    assert_eq!(query["Version"], "2011-06-15");
    assert_eq!(query["Action"], "AssumeRoleWithWebIdentity");
    assert_eq!(query["RoleArn"], "arn:aws:iam::123:role/gateway");
    assert_eq!(query["RoleSessionName"], "gateway-7f9c");
    assert_eq!(query["WebIdentityToken"], "header.payload.signature");
    assert_eq!(
        http.request_header(0, "accept").as_deref(),
        Some("application/json")
    );
    Ok(())
}

#[tokio::test]
async fn test_web_identity_sts_endpoint_override() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let token_file = dir.path().join("token");
    std::fs::write(&token_file, "token")?;
    let token_file = token_file.to_string_lossy().to_string();

    let http = MockHttpSend::default().with_route(Method::GET, "/", StatusCode::OK, STS_RESPONSE);
    let ctx = create_test_context(
        &[
            ("AWS_ROLE_ARN", "arn:aws:iam::123:role/gateway"),
            ("AWS_WEB_IDENTITY_TOKEN_FILE", token_file.as_str()),
            ("STS_ENDPOINT", "http://127.0.0.1:4566"),
        ],
        http.clone(),
    );
    let provider = AssumeRoleWithWebIdentityCredentialProvider::new(Arc::new(
        Config::default().from_env(&ctx),
    ));

    provider.provide_credential(&ctx).await?;
    assert!(http.requests()[0].1.starts_with("http://127.0.0.1:4566/?"));
    Ok(())
}

#[tokio::test]
async fn test_web_identity_access_denied() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let token_file = dir.path().join("token");
    std::fs::write(&token_file, "token")?;
    let token_file = token_file.to_string_lossy().to_string();

    let http = MockHttpSend::default().with_route(
        Method::GET,
        "/",
        StatusCode::FORBIDDEN,
        r#"{"Error":{"Code":"AccessDenied","Message":"Not authorized"}}"#,
    );
    let ctx = create_test_context(
        &[
            ("AWS_ROLE_ARN", "arn:aws:iam::123:role/gateway"),
            ("AWS_WEB_IDENTITY_TOKEN_FILE", token_file.as_str()),
        ],
        http,
    );
    let provider = AssumeRoleWithWebIdentityCredentialProvider::new(Arc::new(
        Config::default().from_env(&ctx),
    ));

    let err = provider
        .provide_credential(&ctx)
        .await
        .expect_err("must fail on 403");
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    assert!(err.context().iter().any(|v| v.contains("AccessDenied")));
    Ok(())
}

#[tokio::test]
async fn test_web_identity_token_file_in_home() -> Result<()> {
    let home = tempfile::tempdir()?;
    std::fs::write(home.path().join("token"), "home-token")?;

    let http = MockHttpSend::default().with_route(Method::GET, "/", StatusCode::OK, STS_RESPONSE);
    let ctx = create_test_context(&[], http.clone()).with_env(gatesign_core::StaticEnv {
        home_dir: Some(home.path().to_path_buf()),
        envs: [
            ("AWS_ROLE_ARN", "arn:aws:iam::123:role/gateway"),
            ("AWS_WEB_IDENTITY_TOKEN_FILE", "~/token"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
    });
    let provider = AssumeRoleWithWebIdentityCredentialProvider::new(Arc::new(
        Config::default().from_env(&ctx),
    ));

    assert!(provider.provide_credential(&ctx).await?.is_some());
    let uri: http::Uri = http.requests()[0].1.parse()?;
    assert!(uri.query().unwrap_or_default().contains("WebIdentityToken=home-token"));
    Ok(())
}

#[tokio::test]
async fn test_web_identity_token_file_without_home() {
    let http = MockHttpSend::default();
    let ctx = create_test_context(
        &[
            ("AWS_ROLE_ARN", "arn:aws:iam::123:role/gateway"),
            ("AWS_WEB_IDENTITY_TOKEN_FILE", "~/token"),
        ],
        http.clone(),
    );
    let provider = AssumeRoleWithWebIdentityCredentialProvider::new(Arc::new(
        Config::default().from_env(&ctx),
    ));

    let err = provider
        .provide_credential(&ctx)
        .await
        .expect_err("home dir is required");
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    assert!(http.requests().is_empty());
}
