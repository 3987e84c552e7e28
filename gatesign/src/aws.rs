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

//! AWS service support with convenience APIs
//!
//! This module provides AWS signing functionality along with convenience functions
//! for common use cases.

// Re-export all AWS signing types
pub use gatesign_aws_v4::*;

#[cfg(feature = "default-context")]
use crate::{default_context, Signer};
#[cfg(feature = "default-context")]
use std::sync::Arc;

/// Default AWS Signer type with commonly used components
#[cfg(feature = "default-context")]
pub type DefaultSigner = Signer<Credential>;

/// Create a default AWS signer with standard configuration
///
/// This function creates a signer with:
/// - Default context (tokio file access, reqwest HTTP client, OS environment, in-memory store)
/// - [`Config`] loaded from the environment
/// - Default credential provider (static config, credential cache, then one remote source)
/// - Request signer for the specified service and region, reusing signing keys
///   through the shared store
///
/// # Example
///
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> gatesign_core::Result<()> {
/// let signer = gatesign::aws::default_signer("s3", "us-east-1");
///
/// let mut req = http::Request::builder()
///     .method("GET")
///     .uri("https://s3.amazonaws.com/my-bucket/my-object")
///     .body(())?
///     .into_parts()
///     .0;
///
/// signer.sign(&mut req).await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "default-context")]
pub fn default_signer(service: &str, region: &str) -> DefaultSigner {
    let ctx = default_context();
    let config = Arc::new(Config::default().from_env(&ctx));

    let provider = DefaultCredentialProvider::new(config.clone());
    let signer = RequestSigner::new(service, region)
        .with_signing_key_cache(SigningKeyCache::default())
        .with_debug(config.debug);
    Signer::new(ctx, provider, signer)
}
