/// Errors raised while persisting session state.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("Session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The session map could not be encoded or decoded.
    #[error("Session storage encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}
