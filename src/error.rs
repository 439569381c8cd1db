use thiserror::Error;

/// Errors at the edges of the crate. Extraction itself never fails; these
/// come from checking input and writing output.
#[derive(Debug, Error)]
pub enum Error {
    /// The module text was not valid UTF-8.
    #[error("input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// A row could not be serialized.
    #[error("could not serialize to JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
