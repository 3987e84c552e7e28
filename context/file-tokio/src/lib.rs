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

//! Tokio-based file access for gatesign.
//!
//! This crate provides `TokioFileRead` and `TokioFileWrite`, async implementations
//! of the `FileRead` and `FileWrite` traits from `gatesign_core` built on Tokio's
//! file system operations.
//!
//! ## Example
//!
//! ```no_run
//! use gatesign_core::{Context, OsEnv};
//! use gatesign_file_tokio::{TokioFileRead, TokioFileWrite};
//!
//! #[tokio::main]
//! async fn main() {
//!     let ctx = Context::new()
//!         .with_file_read(TokioFileRead)
//!         .with_file_write(TokioFileWrite)
//!         .with_env(OsEnv);
//!
//!     match ctx.file_read("/tmp/credentials.json").await {
//!         Ok(content) => println!("Read {} bytes", content.len()),
//!         Err(e) => eprintln!("Failed to read file: {}", e),
//!     }
//! }
//! ```

use async_trait::async_trait;
use gatesign_core::{Error, FileRead, FileWrite, Result};
use rand::Rng;

/// Tokio-based implementation of the `FileRead` trait.
///
/// A missing file is reported as `ErrorKind::NotFound`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileRead;

#[async_trait]
impl FileRead for TokioFileRead {
    async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| Error::from(e).with_context(format!("file: {path}")))
    }
}

/// Tokio-based implementation of the `FileWrite` trait.
///
/// Content is written to a sibling temporary file which then replaces the
/// target with a rename, so concurrent readers never see a partial file.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileWrite;

#[async_trait]
impl FileWrite for TokioFileWrite {
    async fn file_write(&self, path: &str, content: &[u8]) -> Result<()> {
        let suffix: u64 = rand::thread_rng().gen();
        let tmp_path = format!("{path}.{suffix:016x}.tmp");

        if let Err(e) = tokio::fs::write(&tmp_path, content).await {
            return Err(Error::from(e).with_context(format!("file: {tmp_path}")));
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(Error::from(e).with_context(format!("file: {path}")));
        }

        Ok(())
    }
}
