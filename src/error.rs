use thiserror::Error;

/// Errors raised by item operations on the canvas.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CanvasError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),
    #[error("Patch `{patch}` does not apply to {item_type} items")]
    PatchMismatch {
        patch: &'static str,
        item_type: &'static str,
    },
    #[error("Invalid patch: {0}")]
    InvalidPatch(String),
}

/// Errors raised by key-value storage backends.
///
/// These never leave the persistence adapter; they are logged and the
/// in-memory state stays authoritative.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Read failed: {0}")]
    Read(String),
    #[error("Write failed: {0}")]
    Write(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors from the external image-generation service.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Image generation is not configured")]
    NotConfigured,
    #[error("Image service error: {0}")]
    Service(String),
    #[error("Response superseded by a newer request")]
    Superseded,
}
