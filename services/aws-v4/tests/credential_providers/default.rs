use super::{create_test_context, imds_with_role, MockHttpSend};
use anyhow::Result;
use gatesign_aws_v4::{
    Config, Credential, CredentialCache, DefaultCredentialProvider, LocalFileCredentialCache,
    RequestSigner, SharedStoreCredentialCache,
};
use gatesign_core::time::now;
use gatesign_core::{ErrorKind, KeyValueStore, MemoryStore, ProvideCredential, Signer};
use http::Request;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn cache_file_env(dir: &TempDir) -> (String, String) {
    (
        "AWS_CREDENTIALS_TEMP_FILE".to_string(),
        dir.path()
            .join("credentials.json")
            .to_string_lossy()
            .to_string(),
    )
}

#[tokio::test]
async fn test_static_credentials_skip_cache() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (key, path) = cache_file_env(&dir);
    std::fs::write(
        &path,
        r#"{"accessKeyId":"cached","secretAccessKey":"cached","sessionToken":"token","expiration":null}"#,
    )?;

    let http = imds_with_role();
    let ctx = create_test_context(
        &[
            ("AWS_ACCESS_KEY_ID", "static_access_key_id"),
            ("AWS_SECRET_ACCESS_KEY", "static_secret_access_key"),
            (key.as_str(), path.as_str()),
        ],
        http.clone(),
    );
    let provider = DefaultCredentialProvider::new(Arc::new(Config::default().from_env(&ctx)));

    let cred = provider
        .provide_credential(&ctx)
        .await?
        .expect("credential must be loaded");
    assert_eq!(
        cred,
        Credential::new("static_access_key_id", "static_secret_access_key")
    );
    assert_eq!(cred.session_token, None);
    assert!(http.requests().is_empty());
    assert!(std::fs::read_to_string(&path)?.contains("\"cached\""));
    Ok(())
}

#[tokio::test]
async fn test_fetch_and_write_back() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (key, path) = cache_file_env(&dir);

    let http = imds_with_role();
    let ctx = create_test_context(&[(key.as_str(), path.as_str())], http.clone());
    let config = Arc::new(Config::default().from_env(&ctx));
    let provider = DefaultCredentialProvider::new(config.clone());

    let fetched = provider
        .provide_credential(&ctx)
        .await?
        .expect("credential must be loaded");
    assert_eq!(fetched.access_key_id, "ASIAIMDSEXAMPLE");
    assert_eq!(http.requests().len(), 3);

    let cached = LocalFileCredentialCache::new(config)
        .read(&ctx)
        .await?
        .expect("credential must be cached");
    assert_eq!(cached, fetched);

    // The next resolution is served from the cache.
    let again = provider
        .provide_credential(&ctx)
        .await?
        .expect("credential must be loaded");
    assert_eq!(again, fetched);
    assert_eq!(http.requests().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_corrupted_cache_file_is_replaced() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (key, path) = cache_file_env(&dir);
    std::fs::write(&path, "{\"accessKeyId\": \"trunc")?;

    let http = imds_with_role();
    let ctx = create_test_context(&[(key.as_str(), path.as_str())], http.clone());
    let config = Arc::new(Config::default().from_env(&ctx));
    let cache = LocalFileCredentialCache::new(config.clone());

    assert_eq!(cache.read(&ctx).await?, None);

    let fetched = DefaultCredentialProvider::new(config)
        .provide_credential(&ctx)
        .await?
        .expect("credential must be loaded");
    assert_eq!(cache.read(&ctx).await?, Some(fetched));
    Ok(())
}

#[tokio::test]
async fn test_expiring_cached_credential_is_refreshed() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (key, path) = cache_file_env(&dir);

    let http = imds_with_role();
    let ctx = create_test_context(&[(key.as_str(), path.as_str())], http.clone());
    let config = Arc::new(Config::default().from_env(&ctx));

    let expiring = Credential {
        session_token: Some("old_token".to_string()),
        expires_in: Some(now() + chrono::TimeDelta::try_seconds(60).expect("in bounds")),
        ..Credential::new("ASIAOLD", "old_secret")
    };
    LocalFileCredentialCache::new(config.clone())
        .write(&ctx, &expiring)
        .await?;

    let cred = DefaultCredentialProvider::new(config)
        .provide_credential(&ctx)
        .await?
        .expect("credential must be loaded");
    assert_eq!(cred.access_key_id, "ASIAIMDSEXAMPLE");
    assert_eq!(http.requests().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_refresh_window_disabled() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (key, path) = cache_file_env(&dir);

    let http = imds_with_role();
    let ctx = create_test_context(&[(key.as_str(), path.as_str())], http.clone());
    let config = Arc::new(
        Config {
            refresh_window: None,
            ..Default::default()
        }
        .from_env(&ctx),
    );

    let expiring = Credential {
        expires_in: Some(now() + chrono::TimeDelta::try_seconds(60).expect("in bounds")),
        ..Credential::new("ASIAOLD", "old_secret")
    };
    LocalFileCredentialCache::new(config.clone())
        .write(&ctx, &expiring)
        .await?;

    let cred = DefaultCredentialProvider::new(config)
        .provide_credential(&ctx)
        .await?
        .expect("credential must be loaded");
    assert_eq!(cred, expiring);
    assert!(http.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_shared_store_backend() -> Result<()> {
    let store = MemoryStore::default();
    let http = imds_with_role();
    let ctx = create_test_context(&[("CACHE_INSTANCE_CREDENTIALS_ENABLED", "yes")], http.clone())
        .with_key_value_store(store.clone());
    let provider = DefaultCredentialProvider::new(Arc::new(Config::default().from_env(&ctx)));

    provider.provide_credential(&ctx).await?;
    let cached = store
        .get("instance_credential_json")
        .expect("credential must be stored");
    assert!(cached.contains("\"accessKeyId\":\"ASIAIMDSEXAMPLE\""));

    provider.provide_credential(&ctx).await?;
    assert_eq!(http.requests().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_custom_cache_backend() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (key, path) = cache_file_env(&dir);
    let store = MemoryStore::default();
    let http = imds_with_role();
    // The env selects the local file backend, the injected cache wins.
    let ctx = create_test_context(&[(key.as_str(), path.as_str())], http.clone())
        .with_key_value_store(store.clone());
    let config = Arc::new(Config::default().from_env(&ctx));
    let provider = DefaultCredentialProvider::new(config.clone()).with_cache(Arc::new(
        SharedStoreCredentialCache::new(config).with_key("gateway_credential"),
    ));

    let cred = provider
        .provide_credential(&ctx)
        .await?
        .expect("credential must be loaded");
    assert_eq!(cred.access_key_id, "ASIAIMDSEXAMPLE");
    assert!(store.get("gateway_credential").is_some());
    assert!(store.get("instance_credential_json").is_none());
    assert!(!std::path::Path::new(&path).exists());

    provider.provide_credential(&ctx).await?;
    assert_eq!(http.requests().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_fetch_failure_surfaces() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (key, path) = cache_file_env(&dir);

    let ctx = create_test_context(&[(key.as_str(), path.as_str())], MockHttpSend::default());
    let provider = DefaultCredentialProvider::new(Arc::new(Config::default().from_env(&ctx)));

    let err = provider
        .provide_credential(&ctx)
        .await
        .expect_err("must fail without any source");
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    assert!(!std::path::Path::new(&path).exists());
    Ok(())
}

#[tokio::test]
async fn test_cache_write_failure_surfaces() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir
        .path()
        .join("missing-dir")
        .join("credentials.json")
        .to_string_lossy()
        .to_string();

    let ctx = create_test_context(
        &[("AWS_CREDENTIALS_TEMP_FILE", path.as_str())],
        imds_with_role(),
    );
    let provider = DefaultCredentialProvider::new(Arc::new(Config::default().from_env(&ctx)));

    assert!(provider.provide_credential(&ctx).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_signer_with_default_provider() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (key, path) = cache_file_env(&dir);

    let ctx = create_test_context(&[(key.as_str(), path.as_str())], imds_with_role());
    let config = Arc::new(
        Config {
            refresh_window: Some(Duration::from_secs(300)),
            ..Default::default()
        }
        .from_env(&ctx),
    );
    let signer = Signer::new(
        ctx,
        DefaultCredentialProvider::new(config),
        RequestSigner::new("s3", "us-east-1"),
    );

    let (mut parts, _) = Request::get("https://bucket.s3.amazonaws.com/key")
        .body(())?
        .into_parts();
    signer.sign(&mut parts).await?;

    assert_eq!(parts.headers["x-amz-security-token"], "imds_session_token");
    assert!(parts.headers["authorization"]
        .to_str()?
        .starts_with("AWS4-HMAC-SHA256 Credential=ASIAIMDSEXAMPLE/"));
    Ok(())
}
