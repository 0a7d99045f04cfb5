use std::fmt;

use dictionary_value::{
    Container, ContainerKind, Opaque, Scalar, Timestamp, ValueKind, IDENTIFIER_TOKEN,
    LOCATOR_TOKEN, TIMESTAMP_TOKEN,
};
use serde::de::value::SeqDeserializer;
use serde::de::{self, Visitor};
use tracing::trace;

use super::enums::EnumDecoder;
use super::keyed::KeyedDecodingContainer;
use super::unkeyed::UnkeyedDecodingContainer;
use super::SingleValueDecoder;
use crate::coerce;
use crate::error::{DecodeError, DecodeResult};
use crate::path::CodingPath;
use crate::strategy::{parse_iso8601, DataStrategy, DateStrategy, DecodeConfig};

/// `serde::Deserializer` reading the value at one coding path.
pub struct ValueDecoder<'a> {
    input: &'a dyn Container,
    config: &'a DecodeConfig,
    path: CodingPath,
}

impl<'a> ValueDecoder<'a> {
    pub fn new(input: &'a dyn Container, config: &'a DecodeConfig, path: CodingPath) -> Self {
        Self {
            input,
            config,
            path,
        }
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }

    fn mismatch(&self, expected: impl fmt::Display) -> DecodeError {
        DecodeError::mismatch(&self.path, expected, self.input.describe())
    }

    fn scalar(&self) -> DecodeResult<Scalar<'a>> {
        self.input
            .as_scalar()
            .ok_or_else(|| self.mismatch(ContainerKind::SingleValue))
    }

    fn keyed(self, fields: &'static [&'static str]) -> DecodeResult<KeyedDecodingContainer<'a>> {
        let map = self
            .input
            .as_map()
            .ok_or_else(|| self.mismatch(ContainerKind::Keyed))?;
        Ok(KeyedDecodingContainer::new(map, self.config, self.path, fields))
    }

    fn single(&self) -> SingleValueDecoder<'a> {
        SingleValueDecoder::new(self.input, self.config, self.path.clone())
    }

    /// Native timestamps are always accepted; anything else is read per the
    /// configured date strategy.
    pub(crate) fn decode_timestamp(&self) -> DecodeResult<Timestamp> {
        let scalar = self.input.as_scalar();
        if let Some(Scalar::Opaque(opaque)) = &scalar {
            if let Opaque::Timestamp(timestamp) = opaque.as_ref() {
                return Ok(*timestamp);
            }
        }
        let numeric = |scalar: Option<Scalar<'a>>| -> DecodeResult<f64> {
            let scalar = scalar.ok_or_else(|| self.mismatch(ValueKind::Timestamp))?;
            coerce::to_f64(&scalar, &self.path)
                .map_err(|_| DecodeError::mismatch(&self.path, ValueKind::Timestamp, scalar.kind()))
        };
        match &self.config.date {
            DateStrategy::DeferredToNative => {
                numeric(scalar).map(Timestamp::from_reference_seconds)
            }
            DateStrategy::SecondsSince1970 => numeric(scalar).map(Timestamp::from_unix_seconds),
            DateStrategy::MillisecondsSince1970 => {
                numeric(scalar).map(Timestamp::from_unix_millis)
            }
            DateStrategy::Iso8601 => {
                let scalar = scalar.ok_or_else(|| self.mismatch(ValueKind::Timestamp))?;
                let text = coerce::to_text(scalar, &self.path)?;
                parse_iso8601(&text).ok_or_else(|| {
                    DecodeError::invalid(&self.path, format!("expected ISO 8601 date, found {text:?}"))
                })
            }
            DateStrategy::Formatted(formatter) => {
                let scalar = scalar.ok_or_else(|| self.mismatch(ValueKind::Timestamp))?;
                let text = coerce::to_text(scalar, &self.path)?;
                formatter.parse(&text).ok_or_else(|| {
                    DecodeError::invalid(
                        &self.path,
                        format!("{text:?} does not match format {}", formatter.describe()),
                    )
                })
            }
            DateStrategy::Custom { decode, .. } => {
                trace!(path = %self.path, "timestamp decoded by custom strategy");
                decode(&self.single()).map_err(|e| e.attribute(&self.path))
            }
        }
    }

    pub(crate) fn decode_bytes(&self) -> DecodeResult<Vec<u8>> {
        match &self.config.data {
            DataStrategy::Custom { decode, .. } => {
                trace!(path = %self.path, "bytes decoded by custom strategy");
                decode(&self.single()).map_err(|e| e.attribute(&self.path))
            }
            _ => coerce::to_bytes(self.input, &self.path),
        }
    }
}

macro_rules! decode_integer {
    ($($method:ident => $t:ty, $visit:ident;)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
            let scalar = self.scalar()?;
            let value = coerce::to_integer::<$t>(&scalar, &self.path)?;
            visitor.$visit(value)
        }
    )*};
}

impl<'de, 'a> de::Deserializer<'de> for ValueDecoder<'a> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        if let Some(map) = self.input.as_map() {
            return visitor.visit_map(KeyedDecodingContainer::new(
                map,
                self.config,
                self.path,
                &[],
            ));
        }
        if let Some(items) = self.input.as_sequence() {
            return visitor.visit_seq(UnkeyedDecodingContainer::new(items, self.config, self.path));
        }
        match self.input.as_scalar() {
            None | Some(Scalar::Null) => visitor.visit_unit(),
            Some(Scalar::Bool(v)) => visitor.visit_bool(v),
            Some(Scalar::Signed(v)) => visitor.visit_i64(v),
            Some(Scalar::Unsigned(v)) => visitor.visit_u64(v),
            Some(Scalar::Double(v)) => visitor.visit_f64(v),
            Some(Scalar::Str(s)) => visitor.visit_str(&s),
            Some(Scalar::Bytes(b)) => visitor.visit_bytes(&b),
            Some(Scalar::Opaque(opaque)) => match opaque.as_ref() {
                Opaque::Timestamp(ts) => visitor.visit_f64(ts.reference_seconds()),
                Opaque::Locator(locator) => visitor.visit_str(locator.as_str()),
                Opaque::Identifier(id) => visitor.visit_str(&id.canonical()),
            },
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        let scalar = self.scalar()?;
        visitor.visit_bool(coerce::to_bool(&scalar, &self.path)?)
    }

    decode_integer! {
        deserialize_i8 => i8, visit_i8;
        deserialize_i16 => i16, visit_i16;
        deserialize_i32 => i32, visit_i32;
        deserialize_i64 => i64, visit_i64;
        deserialize_i128 => i128, visit_i128;
        deserialize_u8 => u8, visit_u8;
        deserialize_u16 => u16, visit_u16;
        deserialize_u32 => u32, visit_u32;
        deserialize_u64 => u64, visit_u64;
        deserialize_u128 => u128, visit_u128;
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        let scalar = self.scalar()?;
        visitor.visit_f32(coerce::to_f32(&scalar, &self.path)?)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        let scalar = self.scalar()?;
        visitor.visit_f64(coerce::to_f64(&scalar, &self.path)?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        let scalar = self.scalar()?;
        visitor.visit_char(coerce::to_char(scalar, &self.path)?)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        let scalar = self.scalar()?;
        let text = coerce::to_text(scalar, &self.path)?;
        visitor.visit_str(&text)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        visitor.visit_byte_buf(self.decode_bytes()?)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        match self.input.as_scalar() {
            Some(Scalar::Null) => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        match self.input.as_scalar() {
            Some(Scalar::Null) => visitor.visit_unit(),
            _ => Err(self.mismatch("unit")),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        if name == TIMESTAMP_TOKEN {
            let timestamp = self.decode_timestamp()?;
            return visitor.visit_f64(timestamp.reference_seconds());
        }
        if name == IDENTIFIER_TOKEN {
            let scalar = self.scalar()?;
            let id = coerce::to_identifier(&scalar, &self.path)?;
            return visitor.visit_bytes(id.as_bytes());
        }
        if name == LOCATOR_TOKEN {
            let scalar = self.scalar()?;
            let locator = coerce::to_locator(&scalar, &self.path)?;
            return visitor.visit_str(locator.as_str());
        }
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        if let Some(items) = self.input.as_sequence() {
            return visitor.visit_seq(UnkeyedDecodingContainer::new(items, self.config, self.path));
        }
        match self.input.as_scalar() {
            // A native blob read as a list of octets.
            Some(Scalar::Bytes(bytes)) => {
                let octets = SeqDeserializer::<_, DecodeError>::new(bytes.iter().copied());
                visitor.visit_seq(octets)
            }
            _ => Err(self.mismatch(ContainerKind::Unkeyed)),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> DecodeResult<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        visitor.visit_map(self.keyed(&[])?)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> DecodeResult<V::Value> {
        visitor.visit_map(self.keyed(fields)?)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> DecodeResult<V::Value> {
        if let Some(map) = self.input.as_map() {
            let mut keys = map.keys();
            return match (keys.next(), keys.next()) {
                (Some(variant), None) => {
                    let payload = map.get(&variant);
                    visitor.visit_enum(EnumDecoder::new(variant, payload, self.config, self.path))
                }
                _ => Err(DecodeError::mismatch(
                    &self.path,
                    "enum",
                    format!("map with {} keys", map.len()),
                )),
            };
        }
        match self.scalar()? {
            Scalar::Str(variant) => {
                visitor.visit_enum(EnumDecoder::new(variant, None, self.config, self.path))
            }
            other => Err(DecodeError::mismatch(&self.path, "enum", other.kind())),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        visitor.visit_unit()
    }
}

/// Deserializer for a map key.
///
/// Keys are always text; numeric and boolean targets parse it, mirroring the
/// encoder's key stringification.
pub(crate) struct MapKeyDecoder<'k> {
    key: &'k str,
    path: &'k CodingPath,
}

impl<'k> MapKeyDecoder<'k> {
    pub(crate) fn new(key: &'k str, path: &'k CodingPath) -> Self {
        Self { key, path }
    }

    fn parse<T: std::str::FromStr>(&self, target: &'static str) -> DecodeResult<T> {
        self.key
            .parse()
            .map_err(|_| DecodeError::mismatch(self.path, target, format!("key {:?}", self.key)))
    }
}

macro_rules! parse_key {
    ($($method:ident => $t:ty, $visit:ident;)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
            visitor.$visit(self.parse::<$t>(stringify!($t))?)
        }
    )*};
}

impl<'de> de::Deserializer<'de> for MapKeyDecoder<'_> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        visitor.visit_str(self.key)
    }

    parse_key! {
        deserialize_bool => bool, visit_bool;
        deserialize_i8 => i8, visit_i8;
        deserialize_i16 => i16, visit_i16;
        deserialize_i32 => i32, visit_i32;
        deserialize_i64 => i64, visit_i64;
        deserialize_i128 => i128, visit_i128;
        deserialize_u8 => u8, visit_u8;
        deserialize_u16 => u16, visit_u16;
        deserialize_u32 => u32, visit_u32;
        deserialize_u64 => u64, visit_u64;
        deserialize_u128 => u128, visit_u128;
        deserialize_char => char, visit_char;
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> DecodeResult<V::Value> {
        use serde::de::IntoDeserializer;
        visitor.visit_enum(self.key.into_deserializer())
    }

    serde::forward_to_deserialize_any! {
        f32 f64 str string bytes byte_buf option unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}
