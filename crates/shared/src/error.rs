use thiserror::Error;

/// An inbound renderer message that could not be decoded.
///
/// Unknown event tags are not errors; they decode to
/// [`crate::protocol::ReaderEvent::Unknown`].
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed renderer message: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid font size token `{0}`")]
    InvalidFontSize(String),
    #[error("unknown mark kind `{0}`")]
    UnknownMarkKind(String),
}
