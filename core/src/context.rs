// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::{Error, KeyValueStore, NoopKeyValueStore, Result};
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

/// Runtime components shared by credential providers, caches and signers.
///
/// ## Important
///
/// A fresh context carries no real I/O. Every slot starts as a no-op that fails
/// (file access, HTTP) or reports nothing (env, store) until replaced.
///
/// ## Example
///
/// ```
/// use gatesign_core::{Context, MemoryStore, OsEnv};
///
/// let ctx = Context::new()
///     .with_env(OsEnv)
///     .with_key_value_store(MemoryStore::default());
/// ```
#[derive(Clone)]
pub struct Context {
    fs_read: Arc<dyn FileRead>,
    fs_write: Arc<dyn FileWrite>,
    http: Arc<dyn HttpSend>,
    env: Arc<dyn Env>,
    store: Arc<dyn KeyValueStore>,
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("fs_read", &self.fs_read)
            .field("fs_write", &self.fs_write)
            .field("http", &self.http)
            .field("env", &self.env)
            .field("store", &self.store)
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Build a context where every component is a no-op.
    pub fn new() -> Self {
        Self {
            fs_read: Arc::new(NoopFileRead),
            fs_write: Arc::new(NoopFileWrite),
            http: Arc::new(NoopHttpSend),
            env: Arc::new(NoopEnv),
            store: Arc::new(NoopKeyValueStore),
        }
    }

    /// Use `fs` for file reads.
    pub fn with_file_read(mut self, fs: impl FileRead) -> Self {
        self.fs_read = Arc::new(fs);
        self
    }

    /// Use `fs` for file writes.
    pub fn with_file_write(mut self, fs: impl FileWrite) -> Self {
        self.fs_write = Arc::new(fs);
        self
    }

    /// Use `http` to reach metadata, container and STS endpoints.
    pub fn with_http_send(mut self, http: impl HttpSend) -> Self {
        self.http = Arc::new(http);
        self
    }

    /// Use `env` as the source of environment variables.
    pub fn with_env(mut self, env: impl Env) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Use `store` as the shared key-value store.
    pub fn with_key_value_store(mut self, store: impl KeyValueStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    /// Read the whole file at `path`.
    #[inline]
    pub async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        self.fs_read.file_read(path).await
    }

    /// Read the whole file at `path`, decoding it lossily as UTF-8.
    pub async fn file_read_as_string(&self, path: &str) -> Result<String> {
        let bytes = self.file_read(path).await?;
        Ok(String::from_utf8_lossy(&bytes).to_string())
    }

    /// Replace the file content at `path` with `content`.
    #[inline]
    pub async fn file_write(&self, path: &str, content: &[u8]) -> Result<()> {
        self.fs_write.file_write(path, content).await
    }

    /// Send `req` through the configured HTTP client.
    #[inline]
    pub async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        self.http.http_send(req).await
    }

    /// Send `req` and decode the response body lossily as UTF-8.
    pub async fn http_send_as_string(
        &self,
        req: http::Request<Bytes>,
    ) -> Result<http::Response<String>> {
        let (parts, body) = self.http.http_send(req).await?.into_parts();
        let body = String::from_utf8_lossy(&body).to_string();
        Ok(http::Response::from_parts(parts, body))
    }

    /// Home directory reported by the env component.
    #[inline]
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.env.home_dir()
    }

    /// Replace a leading `~` in `path` with the home directory.
    ///
    /// Paths without a `~/` (or `~\\`) prefix come back unchanged. `None` means
    /// the path needs a home directory and the env has none.
    pub fn expand_home_dir(&self, path: &str) -> Option<String> {
        if !path.starts_with("~/") && !path.starts_with("~\\") {
            Some(path.to_string())
        } else {
            self.home_dir()
                .map(|home| path.replacen('~', &home.to_string_lossy(), 1))
        }
    }

    /// Snapshot of every variable visible through the env component.
    #[inline]
    pub fn env_vars(&self) -> HashMap<String, String> {
        self.env.vars()
    }

    /// Read a value from the shared key-value store.
    #[inline]
    pub fn store_get(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    /// Write a value into the shared key-value store.
    #[inline]
    pub fn store_set(&self, key: &str, value: String) -> Result<()> {
        self.store.set(key, value)
    }
}

/// Whole-file reads.
///
/// Implementations must report a missing file with [`crate::ErrorKind::NotFound`]
/// so callers can tell an empty state from a misconfiguration.
#[async_trait::async_trait]
pub trait FileRead: Debug + Send + Sync + 'static {
    /// Read every byte of `path`.
    async fn file_read(&self, path: &str) -> Result<Vec<u8>>;
}

/// FileWrite is used to replace the content of a file, for example the local
/// credential cache.
#[async_trait::async_trait]
pub trait FileWrite: Debug + Send + Sync + 'static {
    /// Replace the file content at `path` with `content`.
    async fn file_write(&self, path: &str, content: &[u8]) -> Result<()>;
}

/// Outbound HTTP used while resolving credentials: IMDS, the container
/// endpoint and STS. Not meant as a general purpose client.
#[async_trait::async_trait]
pub trait HttpSend: Debug + Send + Sync + 'static {
    /// Send `req` and return the buffered response.
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>>;
}

/// Permits parameterizing environment access.
pub trait Env: Debug + Send + Sync + 'static {
    /// All variables as a map.
    fn vars(&self) -> HashMap<String, String>;

    /// Home directory of the current user, if one can be determined.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// Implements Env for the OS context.
#[derive(Debug, Copy, Clone)]
pub struct OsEnv;

impl Env for OsEnv {
    fn vars(&self) -> HashMap<String, String> {
        std::env::vars().collect()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        home::home_dir()
    }
}

/// Fixed environment, mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    /// Reported home directory.
    pub home_dir: Option<PathBuf>,
    /// Reported variables.
    pub envs: HashMap<String, String>,
}

impl Env for StaticEnv {
    fn vars(&self) -> HashMap<String, String> {
        self.envs.clone()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir.clone()
    }
}

/// Default file reader; every read fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFileRead;

#[async_trait::async_trait]
impl FileRead for NoopFileRead {
    async fn file_read(&self, _path: &str) -> Result<Vec<u8>> {
        Err(Error::unexpected("no file reader configured"))
    }
}

/// Default file writer; every write fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFileWrite;

#[async_trait::async_trait]
impl FileWrite for NoopFileWrite {
    async fn file_write(&self, _path: &str, _content: &[u8]) -> Result<()> {
        Err(Error::unexpected("no file writer configured"))
    }
}

/// Default HTTP client; every request fails with `TransportFailure`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHttpSend;

#[async_trait::async_trait]
impl HttpSend for NoopHttpSend {
    async fn http_send(&self, _req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        Err(Error::transport_failure("no http client configured"))
    }
}

/// Default env with no variables and no home directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnv;

impl Env for NoopEnv {
    fn vars(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        None
    }
}
