//! Semantic leaf types with strategy-dependent or coercible representations.
//!
//! [`Timestamp`], [`Identifier`] and [`Locator`] serialize as newtype structs
//! under reserved names so the coding engine can recognise them and apply its
//! date strategy or coercion rules. Any other serde format just sees the inner
//! value (reference-epoch seconds, canonical string, locator string).

mod blob;
mod identifier;
mod locator;
mod timestamp;

pub use blob::Blob;
pub use identifier::{Identifier, IDENTIFIER_TOKEN};
pub use locator::{Locator, LOCATOR_TOKEN};
pub use timestamp::{Timestamp, REFERENCE_EPOCH_UNIX_OFFSET, TIMESTAMP_TOKEN};
