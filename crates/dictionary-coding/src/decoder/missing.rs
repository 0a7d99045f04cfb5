//! Values for struct fields that have no key in the input.
//!
//! Used only under a permissive [`MissingValueStrategy`]. Each target type is
//! known by a name (`"bool"`, `"i64"`, `"String"`, `"Vec"`, a struct's
//! declared name, ...). `UseDefault` looks that name up in its table first;
//! otherwise the type's zero value is produced.

use dictionary_value::{DynamicValue, Identifier, IDENTIFIER_TOKEN, LOCATOR_TOKEN, TIMESTAMP_TOKEN};
use serde::de::{self, DeserializeSeed, IntoDeserializer, Visitor};
use tracing::trace;

use super::value::ValueDecoder;
use crate::error::{DecodeError, DecodeResult};
use crate::path::{CodingKey, CodingPath};
use crate::strategy::{DecodeConfig, MissingValueStrategy};

pub(crate) struct MissingValueDecoder<'a> {
    config: &'a DecodeConfig,
    path: CodingPath,
}

impl<'a> MissingValueDecoder<'a> {
    pub(crate) fn new(config: &'a DecodeConfig, path: CodingPath) -> Self {
        Self { config, path }
    }

    /// Caller-supplied default for `type_name`, if any.
    fn configured(&self, type_name: &str) -> Option<&'a DynamicValue> {
        match &self.config.missing {
            MissingValueStrategy::UseDefault(defaults) => {
                let value = defaults.get(type_name)?;
                trace!(path = %self.path, type_name, "using configured default");
                Some(value)
            }
            _ => None,
        }
    }

    fn from_default(self, value: &'a DynamicValue) -> ValueDecoder<'a> {
        ValueDecoder::new(value, self.config, self.path)
    }

    fn no_default(self) -> DecodeError {
        DecodeError::KeyNotFound { path: self.path }
    }
}

macro_rules! zero_value {
    ($($method:ident => $name:literal, |$visitor:ident| $zero:expr;)*) => {$(
        fn $method<V: Visitor<'de>>(self, $visitor: V) -> DecodeResult<V::Value> {
            if let Some(value) = self.configured($name) {
                return self.from_default(value).$method($visitor);
            }
            $zero
        }
    )*};
}

impl<'de, 'a> de::Deserializer<'de> for MissingValueDecoder<'a> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        visitor.visit_unit()
    }

    zero_value! {
        deserialize_bool => "bool", |visitor| visitor.visit_bool(false);
        deserialize_i8 => "i8", |visitor| visitor.visit_i8(0);
        deserialize_i16 => "i16", |visitor| visitor.visit_i16(0);
        deserialize_i32 => "i32", |visitor| visitor.visit_i32(0);
        deserialize_i64 => "i64", |visitor| visitor.visit_i64(0);
        deserialize_i128 => "i128", |visitor| visitor.visit_i128(0);
        deserialize_u8 => "u8", |visitor| visitor.visit_u8(0);
        deserialize_u16 => "u16", |visitor| visitor.visit_u16(0);
        deserialize_u32 => "u32", |visitor| visitor.visit_u32(0);
        deserialize_u64 => "u64", |visitor| visitor.visit_u64(0);
        deserialize_u128 => "u128", |visitor| visitor.visit_u128(0);
        deserialize_f32 => "f32", |visitor| visitor.visit_f32(0.0);
        deserialize_f64 => "f64", |visitor| visitor.visit_f64(0.0);
        deserialize_char => "char", |visitor| visitor.visit_char('\0');
        deserialize_str => "String", |visitor| visitor.visit_str("");
        deserialize_string => "String", |visitor| visitor.visit_str("");
        deserialize_bytes => "Bytes", |visitor| visitor.visit_bytes(&[]);
        deserialize_byte_buf => "Bytes", |visitor| visitor.visit_byte_buf(Vec::new());
        deserialize_unit => "unit", |visitor| visitor.visit_unit();
        deserialize_seq => "Vec", |visitor| visitor.visit_seq(ZeroSeq::empty());
        deserialize_map => "Map", |visitor| visitor.visit_map(ZeroFields::empty());
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        visitor.visit_none()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        if let Some(value) = self.configured(name) {
            return self.from_default(value).deserialize_unit_struct(name, visitor);
        }
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        let type_name = match name {
            TIMESTAMP_TOKEN => "Timestamp",
            IDENTIFIER_TOKEN => "Identifier",
            LOCATOR_TOKEN => "Locator",
            other => other,
        };
        if let Some(value) = self.configured(type_name) {
            return self.from_default(value).deserialize_newtype_struct(name, visitor);
        }
        match name {
            TIMESTAMP_TOKEN => visitor.visit_f64(0.0),
            IDENTIFIER_TOKEN => visitor.visit_bytes(Identifier::nil().as_bytes()),
            LOCATOR_TOKEN => Err(self.no_default()),
            _ => visitor.visit_newtype_struct(self),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> DecodeResult<V::Value> {
        visitor.visit_seq(ZeroSeq::new(self.config, self.path, len))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> DecodeResult<V::Value> {
        if let Some(value) = self.configured(name) {
            return self.from_default(value).deserialize_tuple_struct(name, len, visitor);
        }
        visitor.visit_seq(ZeroSeq::new(self.config, self.path, len))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> DecodeResult<V::Value> {
        if let Some(value) = self.configured(name) {
            return self.from_default(value).deserialize_struct(name, fields, visitor);
        }
        visitor.visit_map(ZeroFields::new(self.config, self.path, fields))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> DecodeResult<V::Value> {
        if let Some(value) = self.configured(name) {
            return self.from_default(value).deserialize_enum(name, variants, visitor);
        }
        Err(self.no_default())
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        visitor.visit_str("")
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> DecodeResult<V::Value> {
        visitor.visit_unit()
    }
}

/// A sequence of `len` defaulted elements.
struct ZeroSeq<'a> {
    context: Option<(&'a DecodeConfig, CodingPath)>,
    len: usize,
    index: usize,
}

impl<'a> ZeroSeq<'a> {
    fn empty() -> Self {
        Self {
            context: None,
            len: 0,
            index: 0,
        }
    }

    fn new(config: &'a DecodeConfig, path: CodingPath, len: usize) -> Self {
        Self {
            context: Some((config, path)),
            len,
            index: 0,
        }
    }
}

impl<'de> de::SeqAccess<'de> for ZeroSeq<'_> {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> DecodeResult<Option<T::Value>> {
        let Some((config, path)) = &self.context else {
            return Ok(None);
        };
        if self.index >= self.len {
            return Ok(None);
        }
        let at = path.appending(CodingKey::index(self.index));
        self.index += 1;
        seed.deserialize(MissingValueDecoder::new(config, at.clone()))
            .map(Some)
            .map_err(|e| e.attribute(&at))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.len - self.index)
    }
}

/// A struct whose every field is missing.
struct ZeroFields<'a> {
    context: Option<(&'a DecodeConfig, CodingPath)>,
    fields: &'static [&'static str],
    index: usize,
    pending: Option<CodingPath>,
}

impl<'a> ZeroFields<'a> {
    fn empty() -> Self {
        Self {
            context: None,
            fields: &[],
            index: 0,
            pending: None,
        }
    }

    fn new(config: &'a DecodeConfig, path: CodingPath, fields: &'static [&'static str]) -> Self {
        Self {
            context: Some((config, path)),
            fields,
            index: 0,
            pending: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for ZeroFields<'_> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> DecodeResult<Option<K::Value>> {
        let Some((_, path)) = &self.context else {
            return Ok(None);
        };
        let Some(field) = self.fields.get(self.index).copied() else {
            return Ok(None);
        };
        self.index += 1;
        self.pending = Some(path.appending(CodingKey::field(field)));
        let key: de::value::StrDeserializer<'_, DecodeError> = field.into_deserializer();
        seed.deserialize(key).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> DecodeResult<V::Value> {
        match (&self.context, self.pending.take()) {
            (Some((config, _)), Some(at)) => seed
                .deserialize(MissingValueDecoder::new(config, at.clone()))
                .map_err(|e| e.attribute(&at)),
            _ => Err(DecodeError::Custom {
                path: CodingPath::root(),
                message: "map value requested before its key".to_owned(),
            }),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len() - self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dictionary_value::{Locator, Timestamp, ValueMap};
    use serde::Deserialize;

    fn standard() -> DecodeConfig {
        DecodeConfig {
            missing: MissingValueStrategy::UseStandardDefault,
            ..DecodeConfig::default()
        }
    }

    fn zero<T: de::DeserializeOwned>(config: &DecodeConfig) -> DecodeResult<T> {
        T::deserialize(MissingValueDecoder::new(config, CodingPath::root()))
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Inner {
        count: u32,
        label: Option<String>,
        tags: Vec<String>,
    }

    #[test]
    fn zero_values() {
        let config = standard();
        assert_eq!(zero::<String>(&config).unwrap(), "");
        assert_eq!(zero::<i16>(&config).unwrap(), 0);
        assert!(!zero::<bool>(&config).unwrap());
        assert_eq!(zero::<f64>(&config).unwrap(), 0.0);
        assert_eq!(zero::<Option<u8>>(&config).unwrap(), None);
        assert_eq!(zero::<Vec<u8>>(&config).unwrap(), Vec::<u8>::new());
        assert_eq!(zero::<Timestamp>(&config).unwrap(), Timestamp::REFERENCE);
        assert_eq!(zero::<Identifier>(&config).unwrap(), Identifier::nil());
        assert_eq!(zero::<(u8, String)>(&config).unwrap(), (0, String::new()));
        assert_eq!(
            zero::<Inner>(&config).unwrap(),
            Inner {
                count: 0,
                label: None,
                tags: vec![],
            }
        );
    }

    #[test]
    fn locators_have_no_zero() {
        let err = zero::<Locator>(&standard()).unwrap_err();
        assert!(matches!(err, DecodeError::KeyNotFound { .. }));
    }

    #[test]
    fn configured_defaults_win_by_type_name() {
        let mut defaults = ValueMap::new();
        defaults.insert("String".into(), "fallback".into());
        defaults.insert("Inner".into(), [("count", 9_i64)].into_iter().collect());
        let config = DecodeConfig {
            missing: MissingValueStrategy::UseDefault(defaults),
            ..DecodeConfig::default()
        };
        assert_eq!(zero::<String>(&config).unwrap(), "fallback");
        assert_eq!(zero::<u8>(&config).unwrap(), 0);
        assert_eq!(zero::<Inner>(&config).unwrap().count, 9);
    }
}
