//! Core components for signing gateway requests.
//!
//! This crate provides the foundational types and traits shared by the gatesign
//! workspace. Service crates build on these abstractions to resolve credentials
//! and sign outbound requests.
//!
//! ## Overview
//!
//! - **Context**: A container that holds implementations for file access, HTTP
//!   sending, environment access and the shared key-value store
//! - **Traits**: Abstract interfaces for credential loading (`ProvideCredential`)
//!   and request signing (`SignRequest`)
//! - **Signer**: The orchestrator that resolves credentials and signs a request
//!
//! ## Example
//!
//! ```no_run
//! use gatesign_core::{Context, ProvideCredential, Result, SignRequest, Signer, SigningCredential};
//! use async_trait::async_trait;
//! use http::request::Parts;
//!
//! #[derive(Clone, Debug)]
//! struct MyCredential {
//!     key: String,
//! }
//!
//! impl SigningCredential for MyCredential {
//!     fn is_valid(&self) -> bool {
//!         !self.key.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyProvider;
//!
//! #[async_trait]
//! impl ProvideCredential for MyProvider {
//!     type Credential = MyCredential;
//!
//!     async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
//!         Ok(Some(MyCredential { key: "my-key".to_string() }))
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MySigner;
//!
//! #[async_trait]
//! impl SignRequest for MySigner {
//!     type Credential = MyCredential;
//!
//!     async fn sign_request(
//!         &self,
//!         _: &Context,
//!         req: &mut Parts,
//!         cred: &MyCredential,
//!     ) -> Result<()> {
//!         req.headers.insert("x-key", cred.key.parse()?);
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let signer = Signer::new(Context::new(), MyProvider, MySigner);
//!
//! let mut parts = http::Request::builder()
//!     .method("GET")
//!     .uri("https://example.com")
//!     .body(())?
//!     .into_parts()
//!     .0;
//! signer.sign(&mut parts).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time formatting and parsing
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::{
    Context, Env, FileRead, FileWrite, HttpSend, NoopEnv, NoopFileRead, NoopFileWrite,
    NoopHttpSend, OsEnv, StaticEnv,
};
mod store;
pub use store::{KeyValueStore, MemoryStore, NoopKeyValueStore};

mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod signer;
pub use signer::Signer;
