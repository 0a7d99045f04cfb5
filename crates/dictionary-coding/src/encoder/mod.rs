//! Encoder engine: typed values to [`DynamicValue`] trees.
//!
//! [`ValueEncoder`] is a `serde::Serializer`. Structs and maps open a
//! [`KeyedEncodingContainer`], sequences and tuples an
//! [`UnkeyedEncodingContainer`], and every other `serialize_*` call writes a
//! single leaf. Timestamps and blobs are intercepted and written according to
//! the configured strategies.

mod keyed;
mod output;
mod unkeyed;

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use dictionary_value::{DynamicValue, Timestamp, ValueMap, TIMESTAMP_TOKEN};
use serde::ser::{self, Serialize};
use tracing::debug;

pub use keyed::KeyedEncodingContainer;
pub use output::FromDynamicValue;
pub use unkeyed::UnkeyedEncodingContainer;

use crate::error::{EncodeError, EncodeResult};
use crate::path::{CodingKey, CodingPath};
use crate::strategy::{format_iso8601, DataStrategy, DateStrategy, EncodeConfig};

/// Top-level encoder.
///
/// Cheap to clone; clones share the strategy snapshot until one of them is
/// reconfigured.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    config: Arc<EncodeConfig>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EncodeConfig) -> Self {
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

    pub fn set_date_strategy(&mut self, strategy: DateStrategy) {
        Arc::make_mut(&mut self.config).date = strategy;
    }

    pub fn set_data_strategy(&mut self, strategy: DataStrategy) {
        Arc::make_mut(&mut self.config).data = strategy;
    }

    pub fn config(&self) -> &EncodeConfig {
        &self.config
    }

    /// Encodes `value` into a fresh tree.
    ///
    /// A top-level `None` encodes as [`DynamicValue::Null`].
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> EncodeResult<DynamicValue> {
        let config = Arc::clone(&self.config);
        debug!(
            target_type = std::any::type_name::<T>(),
            date = config.date.name(),
            data = config.data.name(),
            "encode"
        );
        let root = CodingPath::root();
        value
            .serialize(ValueEncoder::new(&config, root.clone()))
            .map(Slot::into_value)
            .map_err(|e| e.attribute(&root))
    }

    /// Encodes `value` and copies the tree into the requested container type.
    pub fn encode_as<C, T>(&self, value: &T) -> EncodeResult<C>
    where
        C: FromDynamicValue,
        T: Serialize + ?Sized,
    {
        C::from_dynamic_value(self.encode(value)?)
    }
}

/// Result of encoding one value: a value, or nothing at all for `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Absent,
    Present(DynamicValue),
}

impl Slot {
    /// The encoded value, with absence written as `Null`.
    pub fn into_value(self) -> DynamicValue {
        match self {
            Slot::Absent => DynamicValue::Null,
            Slot::Present(value) => value,
        }
    }
}

/// Encoding hook handed to custom strategies.
///
/// Whatever the hook encodes last becomes the value at
/// [`coding_path`](Self::coding_path). A hook that encodes nothing produces an
/// empty map.
pub struct SingleValueEncoder {
    config: Arc<EncodeConfig>,
    path: CodingPath,
    value: Option<DynamicValue>,
}

impl SingleValueEncoder {
    fn new(config: &Arc<EncodeConfig>, path: CodingPath) -> Self {
        Self {
            config: Arc::clone(config),
            path,
            value: None,
        }
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }

    pub fn config(&self) -> &EncodeConfig {
        &self.config
    }

    /// Encodes `value` with the same strategies, at the same path.
    pub fn encode<T: Serialize + ?Sized>(&mut self, value: &T) -> EncodeResult<()> {
        let slot = value
            .serialize(ValueEncoder::new(&self.config, self.path.clone()))
            .map_err(|e| e.attribute(&self.path))?;
        self.value = Some(slot.into_value());
        Ok(())
    }

    /// Writes an already-built value.
    pub fn encode_value(&mut self, value: impl Into<DynamicValue>) {
        self.value = Some(value.into());
    }

    fn finish(self) -> DynamicValue {
        self.value.unwrap_or_else(|| DynamicValue::Map(ValueMap::new()))
    }
}

/// `serde::Serializer` writing one value at `path`.
pub struct ValueEncoder<'a> {
    config: &'a Arc<EncodeConfig>,
    path: CodingPath,
}

impl<'a> ValueEncoder<'a> {
    pub(crate) fn new(config: &'a Arc<EncodeConfig>, path: CodingPath) -> Self {
        Self { config, path }
    }

    fn leaf(value: impl Into<DynamicValue>) -> EncodeResult<Slot> {
        Ok(Slot::Present(value.into()))
    }

    fn encode_timestamp(self, timestamp: Timestamp) -> EncodeResult<Slot> {
        let value = match &self.config.date {
            DateStrategy::DeferredToNative => DynamicValue::Double(timestamp.reference_seconds()),
            DateStrategy::SecondsSince1970 => DynamicValue::Double(timestamp.unix_seconds()),
            DateStrategy::MillisecondsSince1970 => DynamicValue::Double(timestamp.unix_millis()),
            DateStrategy::Iso8601 => format_iso8601(&timestamp)
                .map(DynamicValue::String)
                .ok_or_else(|| EncodeError::invalid(&self.path, "timestamp out of range"))?,
            DateStrategy::Formatted(formatter) => formatter
                .format(&timestamp)
                .map(DynamicValue::String)
                .ok_or_else(|| {
                    EncodeError::invalid(&self.path, "timestamp cannot be formatted")
                })?,
            DateStrategy::Custom { encode, .. } => {
                let mut hook = SingleValueEncoder::new(self.config, self.path.clone());
                encode(&timestamp, &mut hook).map_err(|e| e.attribute(&self.path))?;
                hook.finish()
            }
        };
        Ok(Slot::Present(value))
    }

    fn encode_bytes(self, bytes: &[u8]) -> EncodeResult<Slot> {
        let value = match &self.config.data {
            DataStrategy::DeferredToNative => DynamicValue::Array(
                bytes
                    .iter()
                    .map(|&b| DynamicValue::UnsignedInt(u64::from(b)))
                    .collect(),
            ),
            DataStrategy::Base64 => DynamicValue::String(STANDARD.encode(bytes)),
            DataStrategy::Custom { encode, .. } => {
                let mut hook = SingleValueEncoder::new(self.config, self.path.clone());
                encode(bytes, &mut hook).map_err(|e| e.attribute(&self.path))?;
                hook.finish()
            }
        };
        Ok(Slot::Present(value))
    }

    fn variant_path(&self, variant: &'static str) -> CodingPath {
        self.path.appending(CodingKey::field(variant))
    }
}

impl<'a> ser::Serializer for ValueEncoder<'a> {
    type Ok = Slot;
    type Error = EncodeError;
    type SerializeSeq = UnkeyedEncodingContainer<'a>;
    type SerializeTuple = UnkeyedEncodingContainer<'a>;
    type SerializeTupleStruct = UnkeyedEncodingContainer<'a>;
    type SerializeTupleVariant = UnkeyedEncodingContainer<'a>;
    type SerializeMap = KeyedEncodingContainer<'a>;
    type SerializeStruct = KeyedEncodingContainer<'a>;
    type SerializeStructVariant = KeyedEncodingContainer<'a>;

    fn serialize_bool(self, v: bool) -> EncodeResult<Slot> {
        Self::leaf(v)
    }

    fn serialize_i8(self, v: i8) -> EncodeResult<Slot> {
        Self::leaf(v)
    }

    fn serialize_i16(self, v: i16) -> EncodeResult<Slot> {
        Self::leaf(v)
    }

    fn serialize_i32(self, v: i32) -> EncodeResult<Slot> {
        Self::leaf(v)
    }

    fn serialize_i64(self, v: i64) -> EncodeResult<Slot> {
        Self::leaf(v)
    }

    fn serialize_i128(self, v: i128) -> EncodeResult<Slot> {
        if let Ok(narrow) = i64::try_from(v) {
            return Self::leaf(narrow);
        }
        match u64::try_from(v) {
            Ok(narrow) => Self::leaf(narrow),
            Err(_) => Err(EncodeError::invalid(&self.path, format!("{v} exceeds 64 bits"))),
        }
    }

    fn serialize_u8(self, v: u8) -> EncodeResult<Slot> {
        Self::leaf(v)
    }

    fn serialize_u16(self, v: u16) -> EncodeResult<Slot> {
        Self::leaf(v)
    }

    fn serialize_u32(self, v: u32) -> EncodeResult<Slot> {
        Self::leaf(v)
    }

    fn serialize_u64(self, v: u64) -> EncodeResult<Slot> {
        Self::leaf(v)
    }

    fn serialize_u128(self, v: u128) -> EncodeResult<Slot> {
        match u64::try_from(v) {
            Ok(narrow) => Self::leaf(narrow),
            Err(_) => Err(EncodeError::invalid(&self.path, format!("{v} exceeds 64 bits"))),
        }
    }

    fn serialize_f32(self, v: f32) -> EncodeResult<Slot> {
        Self::leaf(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> EncodeResult<Slot> {
        Self::leaf(v)
    }

    fn serialize_char(self, v: char) -> EncodeResult<Slot> {
        Self::leaf(v.to_string())
    }

    fn serialize_str(self, v: &str) -> EncodeResult<Slot> {
        Self::leaf(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> EncodeResult<Slot> {
        self.encode_bytes(v)
    }

    fn serialize_none(self) -> EncodeResult<Slot> {
        Ok(Slot::Absent)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> EncodeResult<Slot> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> EncodeResult<Slot> {
        Self::leaf(DynamicValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> EncodeResult<Slot> {
        Self::leaf(DynamicValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> EncodeResult<Slot> {
        Self::leaf(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        value: &T,
    ) -> EncodeResult<Slot> {
        if name == TIMESTAMP_TOKEN {
            let seconds = match value.serialize(ValueEncoder::new(self.config, self.path.clone()))? {
                Slot::Present(DynamicValue::Double(seconds)) => seconds,
                other => {
                    return Err(EncodeError::TypeMismatch {
                        path: self.path,
                        expected: "timestamp seconds".to_owned(),
                        found: other.into_value().kind().to_string(),
                    })
                }
            };
            return self.encode_timestamp(Timestamp::from_reference_seconds(seconds));
        }
        // Identifier and locator tokens carry their canonical text through.
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> EncodeResult<Slot> {
        let path = self.variant_path(variant);
        let inner = value
            .serialize(ValueEncoder::new(self.config, path.clone()))
            .map_err(|e| e.attribute(&path))?;
        let mut map = ValueMap::with_capacity(1);
        map.insert(variant.to_owned(), inner.into_value());
        Ok(Slot::Present(DynamicValue::Map(map)))
    }

    fn serialize_seq(self, len: Option<usize>) -> EncodeResult<Self::SerializeSeq> {
        Ok(UnkeyedEncodingContainer::new(self.config, self.path, len, None))
    }

    fn serialize_tuple(self, len: usize) -> EncodeResult<Self::SerializeTuple> {
        Ok(UnkeyedEncodingContainer::new(self.config, self.path, Some(len), None))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> EncodeResult<Self::SerializeTupleStruct> {
        Ok(UnkeyedEncodingContainer::new(self.config, self.path, Some(len), None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> EncodeResult<Self::SerializeTupleVariant> {
        let path = self.variant_path(variant);
        Ok(UnkeyedEncodingContainer::new(self.config, path, Some(len), Some(variant)))
    }

    fn serialize_map(self, len: Option<usize>) -> EncodeResult<Self::SerializeMap> {
        Ok(KeyedEncodingContainer::new(self.config, self.path, len, None))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> EncodeResult<Self::SerializeStruct> {
        Ok(KeyedEncodingContainer::new(self.config, self.path, Some(len), None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> EncodeResult<Self::SerializeStructVariant> {
        let path = self.variant_path(variant);
        Ok(KeyedEncodingContainer::new(self.config, path, Some(len), Some(variant)))
    }
}

/// Wraps an enum payload as `{variant: payload}`.
fn wrap_variant(variant: Option<&'static str>, value: DynamicValue) -> DynamicValue {
    match variant {
        Some(name) => {
            let mut map = ValueMap::with_capacity(1);
            map.insert(name.to_owned(), value);
            DynamicValue::Map(map)
        }
        None => value,
    }
}
