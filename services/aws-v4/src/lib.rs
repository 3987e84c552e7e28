//! AWS SigV4 signing for gatesign.
//!
//! This crate signs body-less upstream requests with AWS Signature Version 4 and
//! resolves the credential to sign with: static configuration first, then the
//! credential cache, then one remote identity source.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gatesign_aws_v4::{Config, DefaultCredentialProvider, RequestSigner};
//! use gatesign_core::{Context, OsEnv, Signer};
//! use std::sync::Arc;
//!
//! # async fn example() -> gatesign_core::Result<()> {
//! let ctx = Context::new().with_env(OsEnv);
//! let config = Arc::new(Config::default().from_env(&ctx));
//!
//! let signer = Signer::new(
//!     ctx,
//!     DefaultCredentialProvider::new(config.clone()),
//!     RequestSigner::new("s3", config.region.as_deref().unwrap_or("us-east-1"))
//!         .with_debug(config.debug),
//! );
//!
//! let (mut parts, _) = http::Request::get("https://bucket.s3.amazonaws.com/key")
//!     .body(())?
//!     .into_parts();
//! signer.sign(&mut parts).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod cache;
pub use cache::{
    credential_cache, CredentialCache, LocalFileCredentialCache, SharedStoreCredentialCache,
};

mod config;
pub use config::{CacheBackend, Config};

mod constants;

mod credential;
pub use credential::Credential;

mod provide_credential;
pub use provide_credential::*;

mod sign_request;
pub use sign_request::{
    build_authorization, build_canonical_request, build_signing_key_hash, build_string_to_sign,
    canonical_query_string, canonical_uri, signed_headers, split_cached_values, RequestSigner,
    SigningContext, SigningOutput,
};

mod signing_key;
pub use signing_key::SigningKeyCache;
