//! [`DynamicValue`] - the canonical untyped document tree.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{Identifier, Locator, Timestamp};

/// Ordered string-keyed map used for [`DynamicValue::Map`].
pub type ValueMap = IndexMap<String, DynamicValue>;

/// One node of an untyped document.
///
/// Maps preserve first-insertion order. Equality is structural; map equality
/// ignores order, matching [`IndexMap`]'s `PartialEq`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DynamicValue {
    #[default]
    Null,
    Bool(bool),
    SignedInt(i64),
    UnsignedInt(u64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<DynamicValue>),
    Map(ValueMap),
    Opaque(Opaque),
}

/// A pass-through semantic value carried through the tree untouched.
///
/// Only the decoder's coercion rules interpret the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Opaque {
    Timestamp(Timestamp),
    Locator(Locator),
    Identifier(Identifier),
}

/// Discriminant of an [`Opaque`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpaqueTag {
    Timestamp,
    Locator,
    Identifier,
}

impl Opaque {
    pub fn tag(&self) -> OpaqueTag {
        match self {
            Opaque::Timestamp(_) => OpaqueTag::Timestamp,
            Opaque::Locator(_) => OpaqueTag::Locator,
            Opaque::Identifier(_) => OpaqueTag::Identifier,
        }
    }

    /// Canonical textual rendering, for the tags that have one.
    ///
    /// Timestamps have no canonical text: their rendering depends on the
    /// configured date strategy.
    pub fn canonical_text(&self) -> Option<String> {
        match self {
            Opaque::Timestamp(_) => None,
            Opaque::Locator(locator) => Some(locator.as_str().to_owned()),
            Opaque::Identifier(id) => Some(id.canonical()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Opaque::Timestamp(_) => ValueKind::Timestamp,
            Opaque::Locator(_) => ValueKind::Locator,
            Opaque::Identifier(_) => ValueKind::Identifier,
        }
    }
}

/// Coarse shape of a value, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    SignedInt,
    UnsignedInt,
    Double,
    String,
    Bytes,
    Array,
    Map,
    Timestamp,
    Locator,
    Identifier,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::SignedInt => "signed integer",
            ValueKind::UnsignedInt => "unsigned integer",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Locator => "locator",
            ValueKind::Identifier => "identifier",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueKind::SignedInt | ValueKind::UnsignedInt | ValueKind::Double
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl DynamicValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            DynamicValue::Null => ValueKind::Null,
            DynamicValue::Bool(_) => ValueKind::Bool,
            DynamicValue::SignedInt(_) => ValueKind::SignedInt,
            DynamicValue::UnsignedInt(_) => ValueKind::UnsignedInt,
            DynamicValue::Double(_) => ValueKind::Double,
            DynamicValue::String(_) => ValueKind::String,
            DynamicValue::Bytes(_) => ValueKind::Bytes,
            DynamicValue::Array(_) => ValueKind::Array,
            DynamicValue::Map(_) => ValueKind::Map,
            DynamicValue::Opaque(opaque) => opaque.kind(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynamicValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DynamicValue::SignedInt(v) => Some(*v),
            DynamicValue::UnsignedInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DynamicValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DynamicValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<DynamicValue>> {
        match self {
            DynamicValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            DynamicValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            DynamicValue::Opaque(opaque) => Some(opaque),
            _ => None,
        }
    }

    /// Looks up `key` when this value is a map.
    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Looks up `index` when this value is an array.
    pub fn at(&self, index: usize) -> Option<&DynamicValue> {
        self.as_array().and_then(|items| items.get(index))
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for DynamicValue {
            fn from(v: $t) -> Self {
                DynamicValue::SignedInt(v as i64)
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for DynamicValue {
            fn from(v: $t) -> Self {
                DynamicValue::UnsignedInt(v as u64)
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<bool> for DynamicValue {
    fn from(v: bool) -> Self {
        DynamicValue::Bool(v)
    }
}

impl From<f32> for DynamicValue {
    fn from(v: f32) -> Self {
        DynamicValue::Double(v as f64)
    }
}

impl From<f64> for DynamicValue {
    fn from(v: f64) -> Self {
        DynamicValue::Double(v)
    }
}

impl From<&str> for DynamicValue {
    fn from(v: &str) -> Self {
        DynamicValue::String(v.to_owned())
    }
}

impl From<String> for DynamicValue {
    fn from(v: String) -> Self {
        DynamicValue::String(v)
    }
}

impl From<Vec<u8>> for DynamicValue {
    fn from(v: Vec<u8>) -> Self {
        DynamicValue::Bytes(v)
    }
}

impl From<Vec<DynamicValue>> for DynamicValue {
    fn from(v: Vec<DynamicValue>) -> Self {
        DynamicValue::Array(v)
    }
}

impl From<ValueMap> for DynamicValue {
    fn from(v: ValueMap) -> Self {
        DynamicValue::Map(v)
    }
}

impl From<Opaque> for DynamicValue {
    fn from(v: Opaque) -> Self {
        DynamicValue::Opaque(v)
    }
}

impl From<Timestamp> for DynamicValue {
    fn from(v: Timestamp) -> Self {
        DynamicValue::Opaque(Opaque::Timestamp(v))
    }
}

impl From<Locator> for DynamicValue {
    fn from(v: Locator) -> Self {
        DynamicValue::Opaque(Opaque::Locator(v))
    }
}

impl From<Identifier> for DynamicValue {
    fn from(v: Identifier) -> Self {
        DynamicValue::Opaque(Opaque::Identifier(v))
    }
}

impl<V: Into<DynamicValue>> From<Option<V>> for DynamicValue {
    fn from(v: Option<V>) -> Self {
        v.map_or(DynamicValue::Null, Into::into)
    }
}

impl<K: Into<String>, V: Into<DynamicValue>> FromIterator<(K, V)> for DynamicValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        DynamicValue::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Serialize for DynamicValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DynamicValue::Null => serializer.serialize_unit(),
            DynamicValue::Bool(b) => serializer.serialize_bool(*b),
            DynamicValue::SignedInt(v) => serializer.serialize_i64(*v),
            DynamicValue::UnsignedInt(v) => serializer.serialize_u64(*v),
            DynamicValue::Double(v) => serializer.serialize_f64(*v),
            DynamicValue::String(s) => serializer.serialize_str(s),
            DynamicValue::Bytes(b) => serializer.serialize_bytes(b),
            DynamicValue::Array(items) => items.serialize(serializer),
            DynamicValue::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            DynamicValue::Opaque(Opaque::Timestamp(ts)) => ts.serialize(serializer),
            DynamicValue::Opaque(Opaque::Locator(locator)) => locator.serialize(serializer),
            DynamicValue::Opaque(Opaque::Identifier(id)) => id.serialize(serializer),
        }
    }
}

struct DynamicValueVisitor;

impl<'de> Visitor<'de> for DynamicValueVisitor {
    type Value = DynamicValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::SignedInt(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::UnsignedInt(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Double(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<DynamicValue, E> {
        Ok(DynamicValue::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<DynamicValue, E> {
        Ok(DynamicValue::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Bytes(v))
    }

    fn visit_none<E: de::Error>(self) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<DynamicValue, D::Error> {
        DynamicValue::deserialize(deserializer)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<DynamicValue, D::Error> {
        DynamicValue::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<DynamicValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(DynamicValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<DynamicValue, A::Error> {
        let mut map = ValueMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, DynamicValue>()? {
            map.insert(key, value);
        }
        Ok(DynamicValue::Map(map))
    }
}

impl<'de> Deserialize<'de> for DynamicValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DynamicValueVisitor)
    }
}
