use gatesign_core::{Context, MemoryStore, OsEnv};
use gatesign_file_tokio::{TokioFileRead, TokioFileWrite};
use gatesign_http_send_reqwest::ReqwestHttpSend;

/// Create a context with the default runtime components:
///
/// - tokio based file read and atomic file write
/// - a reqwest client for metadata, container and STS endpoints
/// - the OS environment
/// - a process wide [`MemoryStore`] as the shared key-value store
///
/// Replace any component with the `with_*` methods of [`Context`].
pub fn default_context() -> Context {
    Context::new()
        .with_file_read(TokioFileRead)
        .with_file_write(TokioFileWrite)
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv)
        .with_key_value_store(MemoryStore::new())
}
