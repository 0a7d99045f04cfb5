use thiserror::Error;

/// Error raised when a semantic type is parsed from malformed text or bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("invalid identifier length: expected 16 bytes, got {0}")]
    InvalidIdentifierLength(usize),
    #[error("invalid locator: {0}")]
    InvalidLocator(String),
    #[error("locator requires an absolute file path")]
    RelativeFilePath,
}
