//! Sign gateway requests to AWS compatible upstreams.
//!
//! `gatesign` re-exports [`gatesign_core`] and, behind features, the service
//! crates and a ready to use runtime context.
//!
//! - `aws` (default): [`aws`] SigV4 signing and credential resolution.
//! - `default-context` (default): [`default_context`] built on tokio and reqwest.
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> gatesign::Result<()> {
//! let signer = gatesign::aws::default_signer("s3", "us-east-1");
//!
//! let (mut parts, _) = http::Request::get("https://bucket.s3.amazonaws.com/key")
//!     .body(())?
//!     .into_parts();
//! signer.sign(&mut parts).await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use gatesign_core::*;

#[cfg(feature = "default-context")]
mod context;
#[cfg(feature = "default-context")]
pub use context::default_context;

#[cfg(feature = "aws")]
pub mod aws;
