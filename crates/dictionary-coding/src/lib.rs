//! dictionary-coding - strategy-driven conversion between typed values and
//! dynamic dictionary trees.
//!
//! Types describe their fields with `serde::Serialize` / `serde::Deserialize`
//! (usually derived). [`Encoder`] turns them into [`DynamicValue`] trees;
//! [`Decoder`] reads them back from any [`Container`]: a `DynamicValue`, a
//! `serde_json::Value`, a `HashMap<String, _>`, an [`AnyMap`] of mixed values,
//! and so on. Timestamps, byte blobs and absent fields are handled according
//! to per-engine strategies.
//!
//! ```
//! use dictionary_coding::{Decoder, Encoder};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Pet {
//!     name: String,
//!     age: Option<u8>,
//! }
//!
//! let pet = Pet { name: "Morven".into(), age: None };
//! let tree = Encoder::new().encode(&pet).unwrap();
//! assert!(tree.get("age").is_none());
//! let back: Pet = Decoder::new().decode(&tree).unwrap();
//! assert_eq!(back, pet);
//! ```

mod coerce;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod path;
pub mod pipeline;
pub mod strategy;

pub use dictionary_value;
pub use dictionary_value::{
    any_list, any_map, AnyList, AnyMap, Blob, Container, DynamicValue, Identifier, Locator,
    Opaque, Scalar, Timestamp, ValueKind, ValueMap,
};

pub use decoder::{Decoder, SingleValueDecoder};
pub use encoder::{Encoder, FromDynamicValue, SingleValueEncoder};
pub use error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
pub use path::{CodingKey, CodingPath};
pub use pipeline::{CodingIteratorExt, TopLevelDecoder, TopLevelEncoder};
pub use strategy::{
    DataStrategy, DateFormatter, DateStrategy, DecodeConfig, EncodeConfig, MissingValueStrategy,
    PatternFormatter,
};
