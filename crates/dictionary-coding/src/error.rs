//! Encode and decode error types.
//!
//! Every error the engine detects is built with the full [`CodingPath`] of
//! the value being processed and then propagated unchanged to the top-level
//! call. Errors raised through serde's trait constructors (by `Serialize` /
//! `Deserialize` impls, which have no path) start out unattributed and are
//! pinned to the path of the value being processed by the enclosing container.

use std::fmt;

use serde::{de, ser};
use thiserror::Error;

use crate::path::{CodingKey, CodingPath};

/// Errors produced while decoding.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// A required key was absent and no permissive policy applied.
    #[error("key not found at {path}")]
    KeyNotFound { path: CodingPath },
    /// A value was present but could not be coerced to the requested shape.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: CodingPath,
        expected: String,
        found: String,
    },
    /// A numeric value was outside the target type's range.
    #[error("numeric overflow at {path}: {value} does not fit in {target}")]
    NumericOverflow {
        path: CodingPath,
        value: String,
        target: &'static str,
    },
    /// Malformed textual encoding of a semantic type.
    #[error("invalid value at {path}: {reason}")]
    InvalidValue { path: CodingPath, reason: String },
    /// A message raised by a `Deserialize` impl.
    #[error("{message} at {path}")]
    Custom { path: CodingPath, message: String },
    #[doc(hidden)]
    #[error("{0}")]
    Unattributed(Unattributed),
}

/// Errors produced while encoding.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodeError {
    /// A value could not be represented (e.g. a non-finite timestamp under a
    /// textual date strategy, or a 128-bit integer beyond 64 bits).
    #[error("invalid value at {path}: {reason}")]
    InvalidValue { path: CodingPath, reason: String },
    /// A map key did not encode to a string or number.
    #[error("map key at {path} must be a string, found {found}")]
    KeyMustBeString { path: CodingPath, found: String },
    /// The encoded tree could not be copied into the requested output type.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: CodingPath,
        expected: String,
        found: String,
    },
    /// A message raised by a `Serialize` impl.
    #[error("{message} at {path}")]
    Custom { path: CodingPath, message: String },
    #[doc(hidden)]
    #[error("{0}")]
    Unattributed(Unattributed),
}

/// An error raised by serde glue code that does not yet know its path.
#[doc(hidden)]
#[derive(Debug, Clone, PartialEq)]
pub enum Unattributed {
    Message(String),
    MissingField(&'static str),
    TypeMismatch { expected: String, found: String },
}

impl fmt::Display for Unattributed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unattributed::Message(message) => f.write_str(message),
            Unattributed::MissingField(field) => write!(f, "missing field `{field}`"),
            Unattributed::TypeMismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
        }
    }
}

impl DecodeError {
    /// Coding path the error was raised at.
    pub fn path(&self) -> &CodingPath {
        static ROOT: CodingPath = CodingPath::root();
        match self {
            DecodeError::KeyNotFound { path }
            | DecodeError::TypeMismatch { path, .. }
            | DecodeError::NumericOverflow { path, .. }
            | DecodeError::InvalidValue { path, .. }
            | DecodeError::Custom { path, .. } => path,
            DecodeError::Unattributed(_) => &ROOT,
        }
    }

    pub(crate) fn mismatch(
        path: &CodingPath,
        expected: impl fmt::Display,
        found: impl fmt::Display,
    ) -> Self {
        DecodeError::TypeMismatch {
            path: path.clone(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn invalid(path: &CodingPath, reason: impl fmt::Display) -> Self {
        DecodeError::InvalidValue {
            path: path.clone(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn overflow(
        path: &CodingPath,
        value: impl fmt::Display,
        target: &'static str,
    ) -> Self {
        DecodeError::NumericOverflow {
            path: path.clone(),
            value: value.to_string(),
            target,
        }
    }

    /// Pins an unattributed error to `path`. Attributed errors pass through.
    pub(crate) fn attribute(self, path: &CodingPath) -> Self {
        match self {
            DecodeError::Unattributed(Unattributed::MissingField(field)) => {
                DecodeError::KeyNotFound {
                    path: path.appending(CodingKey::field(field)),
                }
            }
            DecodeError::Unattributed(Unattributed::TypeMismatch { expected, found }) => {
                DecodeError::TypeMismatch {
                    path: path.clone(),
                    expected,
                    found,
                }
            }
            DecodeError::Unattributed(Unattributed::Message(message)) => DecodeError::Custom {
                path: path.clone(),
                message,
            },
            other => other,
        }
    }
}

impl EncodeError {
    pub fn path(&self) -> &CodingPath {
        static ROOT: CodingPath = CodingPath::root();
        match self {
            EncodeError::InvalidValue { path, .. }
            | EncodeError::KeyMustBeString { path, .. }
            | EncodeError::TypeMismatch { path, .. }
            | EncodeError::Custom { path, .. } => path,
            EncodeError::Unattributed(_) => &ROOT,
        }
    }

    pub(crate) fn invalid(path: &CodingPath, reason: impl fmt::Display) -> Self {
        EncodeError::InvalidValue {
            path: path.clone(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn attribute(self, path: &CodingPath) -> Self {
        match self {
            EncodeError::Unattributed(Unattributed::Message(message)) => EncodeError::Custom {
                path: path.clone(),
                message,
            },
            EncodeError::Unattributed(Unattributed::MissingField(field)) => EncodeError::Custom {
                path: path.clone(),
                message: format!("missing field `{field}`"),
            },
            EncodeError::Unattributed(Unattributed::TypeMismatch { expected, found }) => {
                EncodeError::TypeMismatch {
                    path: path.clone(),
                    expected,
                    found,
                }
            }
            other => other,
        }
    }
}

impl de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DecodeError::Unattributed(Unattributed::Message(msg.to_string()))
    }

    fn invalid_type(unexp: de::Unexpected<'_>, exp: &dyn de::Expected) -> Self {
        DecodeError::Unattributed(Unattributed::TypeMismatch {
            expected: exp.to_string(),
            found: unexp.to_string(),
        })
    }

    fn missing_field(field: &'static str) -> Self {
        DecodeError::Unattributed(Unattributed::MissingField(field))
    }
}

impl ser::Error for EncodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        EncodeError::Unattributed(Unattributed::Message(msg.to_string()))
    }
}

/// Crate-local decode result.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Crate-local encode result.
pub type EncodeResult<T> = std::result::Result<T, EncodeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::Error as _;

    #[test]
    fn missing_field_is_attributed_below_the_struct_path() {
        let at = CodingPath::root().appending(CodingKey::field("owner"));
        let err = DecodeError::missing_field("pets").attribute(&at);
        assert_eq!(err.path().names(), vec!["owner", "pets"]);
        assert!(matches!(err, DecodeError::KeyNotFound { .. }));
    }

    #[test]
    fn attributed_errors_keep_their_path() {
        let deep = CodingPath::root()
            .appending(CodingKey::field("a"))
            .appending(CodingKey::index(2));
        let err = DecodeError::invalid(&deep, "bad").attribute(&CodingPath::root());
        assert_eq!(err.path(), &deep);
    }

    #[test]
    fn display_includes_pointer() {
        let path = CodingPath::root().appending(CodingKey::field("pets"));
        let err = DecodeError::KeyNotFound { path };
        assert_eq!(err.to_string(), "key not found at /pets");
        let err = DecodeError::overflow(&CodingPath::root(), 300, "u8");
        assert_eq!(
            err.to_string(),
            "numeric overflow at <root>: 300 does not fit in u8"
        );
    }

    #[test]
    fn invalid_type_becomes_type_mismatch() {
        let err = DecodeError::invalid_type(de::Unexpected::Bool(true), &"a string")
            .attribute(&CodingPath::root());
        assert_eq!(
            err,
            DecodeError::TypeMismatch {
                path: CodingPath::root(),
                expected: "a string".into(),
                found: "boolean `true`".into(),
            }
        );
    }
}
