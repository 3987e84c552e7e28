mod default;
mod web_identity;

use async_trait::async_trait;
use bytes::Bytes;
use gatesign_core::{Context, Error, HttpSend, Result, StaticEnv};
use gatesign_file_tokio::{TokioFileRead, TokioFileWrite};
use http::{Method, Request, Response, StatusCode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// MockHttpSend answers requests from a fixed route table and records every
/// request it receives.
#[derive(Debug, Clone, Default)]
pub struct MockHttpSend {
    routes: Arc<Mutex<HashMap<(Method, String), (StatusCode, String)>>>,
    requests: Arc<Mutex<Vec<Request<Bytes>>>>,
}

impl MockHttpSend {
    pub fn with_route(self, method: Method, path: &str, status: StatusCode, body: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), (status, body.to_string()));
        self
    }

    /// `(method, uri)` of every request received so far.
    pub fn requests(&self) -> Vec<(Method, String)> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|req| (req.method().clone(), req.uri().to_string()))
            .collect()
    }

    /// Value of `name` in the `idx`-th request.
    pub fn request_header(&self, idx: usize, name: &str) -> Option<String> {
        self.requests.lock().unwrap()[idx]
            .headers()
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: Request<Bytes>) -> Result<Response<Bytes>> {
        let key = (req.method().clone(), req.uri().path().to_string());
        let route = self.routes.lock().unwrap().get(&key).cloned();
        self.requests.lock().unwrap().push(req);

        let Some((status, body)) = route else {
            return Err(Error::transport_failure(format!(
                "connection refused: {} {}",
                key.0, key.1
            )));
        };
        Ok(Response::builder().status(status).body(Bytes::from(body))?)
    }
}

pub fn create_test_context(envs: &[(&str, &str)], http: MockHttpSend) -> Context {
    let _ = env_logger::builder().is_test(true).try_init();

    Context::new()
        .with_file_read(TokioFileRead)
        .with_file_write(TokioFileWrite)
        .with_http_send(http)
        .with_env(StaticEnv {
            home_dir: None,
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
}

pub const IMDS_ROLE_CREDENTIALS: &str = r#"{
  "AccessKeyId": "ASIAIMDSEXAMPLE",
  "SecretAccessKey": "imds_secret_access_key",
  "Token": "imds_session_token",
  "Expiration": "2099-01-01T00:00:00Z"
}"#;

/// Routes of an instance metadata service with role `my-role` attached.
pub fn imds_with_role() -> MockHttpSend {
    MockHttpSend::default()
        .with_route(Method::PUT, "/latest/api/token", StatusCode::OK, "imds-token")
        .with_route(
            Method::GET,
            "/latest/meta-data/iam/security-credentials/",
            StatusCode::OK,
            "my-role",
        )
        .with_route(
            Method::GET,
            "/latest/meta-data/iam/security-credentials/my-role",
            StatusCode::OK,
            IMDS_ROLE_CREDENTIALS,
        )
}
