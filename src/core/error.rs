//! Error taxonomy for vault operations

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure raised by a vault operation
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Item already exists: {0}")]
    AlreadyExists(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

/// Fieldless mirror of [`VaultError`] for exhaustive matching and the wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    BadRequest,
    AccessDenied,
    NotFound,
    AlreadyExists,
    Io,
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::BadRequest(_) => ErrorKind::BadRequest,
            VaultError::AccessDenied(_) => ErrorKind::AccessDenied,
            VaultError::NotFound(_) => ErrorKind::NotFound,
            VaultError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            VaultError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Wrap a storage error with the operation and path it came from
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        VaultError::Io {
            context: context.into(),
            source,
        }
    }
}

impl ErrorKind {
    /// Status code reported to the presentation layer
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::AccessDenied => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::AlreadyExists => 409,
            ErrorKind::Io => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_status() {
        let err = VaultError::NotFound("notes/a.md".to_string());
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.kind().status(), 404);

        let err = VaultError::io("Failed to write a.md", io::Error::other("disk full"));
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.kind().status(), 500);
        assert_eq!(err.to_string(), "Failed to write a.md: disk full");
    }

    #[test]
    fn test_kind_serializes_camel_case() {
        let json = serde_json::to_string(&ErrorKind::AlreadyExists).unwrap();
        assert_eq!(json, "\"alreadyExists\"");
    }
}
