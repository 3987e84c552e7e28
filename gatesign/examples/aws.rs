use anyhow::Result;
use gatesign::aws::{
    Config, DefaultCredentialProvider, RequestSigner, SigningContext, SigningKeyCache,
};
use gatesign::time::now;
use gatesign::{default_context, ProvideCredential};
use http::Method;
use log::info;
use std::sync::Arc;

/// Print the headers a proxy would attach to an upstream `GET`.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let ctx = default_context();
    let config = Arc::new(Config::default().from_env(&ctx));
    let region = config.region.clone().unwrap_or_else(|| "us-east-1".to_string());

    let provider = DefaultCredentialProvider::new(config.clone());
    let cred = provider
        .provide_credential(&ctx)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no credential resolved"))?;

    let signer = RequestSigner::new("s3", &region)
        .with_signing_key_cache(SigningKeyCache::default())
        .with_debug(config.debug);
    let sctx = SigningContext::new(
        Method::GET,
        "/my-bucket/my-object",
        format!("s3.{region}.amazonaws.com"),
        &region,
        "s3",
        now(),
    )
    .with_session_token(cred.session_token.clone());

    let output = signer.sign_headers(&ctx, &sctx, &cred)?;
    info!("signed headers: {:?}", output.signed_headers);

    println!("authorization: {}", output.authorization);
    println!("x-amz-date: {}", output.amz_date);
    println!("x-amz-content-sha256: {}", output.content_sha256);
    if !output.security_token.is_empty() {
        println!("x-amz-security-token: <{} bytes>", output.security_token.len());
    }

    Ok(())
}
