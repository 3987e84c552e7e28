mod standard;

use anyhow::Result;
use gatesign_aws_v4::{Credential, RequestSigner};
use gatesign_core::{Context, SignRequest};
use gatesign_http_send_reqwest::ReqwestHttpSend;
use http::{Request, StatusCode};
use log::debug;
use reqwest::Client;
use std::env;

/// Load static credential from environment variables
pub fn load_static_credential() -> Credential {
    let access_key =
        env::var("GATESIGN_AWS_V4_ACCESS_KEY").expect("GATESIGN_AWS_V4_ACCESS_KEY must be set");
    let secret_key =
        env::var("GATESIGN_AWS_V4_SECRET_KEY").expect("GATESIGN_AWS_V4_SECRET_KEY must be set");

    Credential {
        session_token: env::var("GATESIGN_AWS_V4_SESSION_TOKEN").ok(),
        ..Credential::new(access_key, secret_key)
    }
}

/// Initialize test environment
pub fn init_signing_test() -> Option<(Context, RequestSigner, String)> {
    let _ = env_logger::builder().is_test(true).try_init();

    if env::var("GATESIGN_AWS_V4_TEST").unwrap_or_default() != "on" {
        return None;
    }

    let region = env::var("GATESIGN_AWS_V4_REGION").expect("GATESIGN_AWS_V4_REGION must be set");
    let service = env::var("GATESIGN_AWS_V4_SERVICE").unwrap_or_else(|_| "s3".to_string());
    let url = env::var("GATESIGN_AWS_V4_URL").expect("GATESIGN_AWS_V4_URL must be set");

    let context = Context::new().with_http_send(ReqwestHttpSend::default());
    let signer = RequestSigner::new(&service, &region).with_debug(true);

    Some((context, signer, url))
}

/// Send signed request and return response
pub async fn send_signed_request(
    ctx: &Context,
    signer: &RequestSigner,
    req: Request<String>,
    cred: &Credential,
) -> Result<(StatusCode, String)> {
    let (mut parts, body) = req.into_parts();
    signer.sign_request(ctx, &mut parts, cred).await?;
    let req = Request::from_parts(parts, body);

    debug!("signed request: {req:?}");

    let resp = Client::new().execute(req.try_into()?).await?;
    let status = resp.status();
    let body = resp.text().await?;

    debug!("response status: {status}, body: {body}");
    Ok((status, body))
}
