use shared::error::{DomainError, ProtocolError};
use thiserror::Error;

/// Command parameters rejected before any script is produced.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("search query is empty")]
    EmptyQuery,
    #[error("font family is empty")]
    EmptyFontFamily,
    #[error("font family `{0}` contains characters outside a CSS family list")]
    InvalidFontFamily(String),
    #[error("annotation class name `{0}` is not a valid CSS class")]
    InvalidClassName(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("failed to serialize script literal: {0}")]
    Literal(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("script queue is full")]
    QueueFull,
    #[error("rendering surface disconnected")]
    Disconnected,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("numeric navigation requires a generated location table")]
    LocationTableMissing,
    #[error("location {requested} is outside the location table ({total} entries)")]
    LocationOutOfRange { requested: u32, total: usize },
    #[error("renderer failed to display the book: {reason}")]
    Display { reason: String },
}
