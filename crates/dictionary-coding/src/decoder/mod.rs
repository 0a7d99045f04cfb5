//! Decoder engine: [`Container`] inputs to typed values.
//!
//! [`ValueDecoder`] is a `serde::Deserializer` over any [`Container`]. Struct
//! and map requests open a [`KeyedDecodingContainer`], sequence requests an
//! [`UnkeyedDecodingContainer`], and scalar requests go through the coercion
//! rules. Errors carry the coding path of the value being decoded; the first
//! one aborts the whole call.

mod enums;
mod keyed;
mod missing;
mod unkeyed;
mod value;

use std::sync::Arc;

use dictionary_value::{Container, DynamicValue};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

pub use keyed::KeyedDecodingContainer;
pub use unkeyed::UnkeyedDecodingContainer;
pub use value::ValueDecoder;

use crate::error::{DecodeError, DecodeResult};
use crate::path::CodingPath;
use crate::strategy::{DataStrategy, DateStrategy, DecodeConfig, MissingValueStrategy};

/// Top-level decoder.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: Arc<DecodeConfig>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecodeConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn with_date_strategy(mut self, strategy: DateStrategy) -> Self {
        self.set_date_strategy(strategy);
        self
    }

    pub fn with_data_strategy(mut self, strategy: DataStrategy) -> Self {
        self.set_data_strategy(strategy);
        self
    }

    pub fn with_missing_value_strategy(mut self, strategy: MissingValueStrategy) -> Self {
        self.set_missing_value_strategy(strategy);
        self
    }

    pub fn set_date_strategy(&mut self, strategy: DateStrategy) {
        Arc::make_mut(&mut self.config).date = strategy;
    }

    pub fn set_data_strategy(&mut self, strategy: DataStrategy) {
        Arc::make_mut(&mut self.config).data = strategy;
    }

    pub fn set_missing_value_strategy(&mut self, strategy: MissingValueStrategy) {
        Arc::make_mut(&mut self.config).missing = strategy;
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Decodes a `T` from any container.
    pub fn decode<T: DeserializeOwned>(&self, input: &dyn Container) -> DecodeResult<T> {
        let config = Arc::clone(&self.config);
        debug!(
            target_type = std::any::type_name::<T>(),
            input = %input.describe(),
            date = config.date.name(),
            missing = config.missing.name(),
            "decode"
        );
        let root = CodingPath::root();
        T::deserialize(ValueDecoder::new(input, &config, root.clone()))
            .map_err(|e| e.attribute(&root))
    }

    /// Decodes a `T` from an owned tree.
    pub fn decode_value<T: DeserializeOwned>(&self, value: DynamicValue) -> DecodeResult<T> {
        self.decode(&value)
    }

    /// Decodes a `T` from a JSON document, in place.
    pub fn decode_json<T: DeserializeOwned>(&self, value: &JsonValue) -> DecodeResult<T> {
        self.decode(value)
    }
}

/// Decoding hook handed to custom strategies, positioned at one value.
pub struct SingleValueDecoder<'a> {
    input: &'a dyn Container,
    config: &'a DecodeConfig,
    path: CodingPath,
}

impl<'a> SingleValueDecoder<'a> {
    pub(crate) fn new(input: &'a dyn Container, config: &'a DecodeConfig, path: CodingPath) -> Self {
        Self {
            input,
            config,
            path,
        }
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }

    pub fn config(&self) -> &DecodeConfig {
        self.config
    }

    /// The raw container at this position.
    pub fn container(&self) -> &'a dyn Container {
        self.input
    }

    pub fn decode_nil(&self) -> bool {
        matches!(self.input.as_scalar(), Some(dictionary_value::Scalar::Null))
    }

    /// Decodes the value at this position with the same strategies.
    pub fn decode<T: DeserializeOwned>(&self) -> DecodeResult<T> {
        T::deserialize(ValueDecoder::new(self.input, self.config, self.path.clone()))
            .map_err(|e| e.attribute(&self.path))
    }

    /// An `InvalidValue` error at this position, for hooks that reject input.
    pub fn invalid(&self, reason: impl std::fmt::Display) -> DecodeError {
        DecodeError::invalid(&self.path, reason)
    }
}
