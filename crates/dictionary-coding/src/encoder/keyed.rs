use std::sync::Arc;

use dictionary_value::{DynamicValue, ValueMap};
use serde::ser::{self, Serialize};

use super::{wrap_variant, Slot, ValueEncoder};
use crate::error::{EncodeError, EncodeResult};
use crate::path::{CodingKey, CodingPath};
use crate::strategy::EncodeConfig;

/// Writes string-keyed entries into an ordered map.
///
/// Keys keep first-write order. An absent struct field (`None`) omits its
/// key; an absent map value is written as `Null`.
pub struct KeyedEncodingContainer<'a> {
    config: &'a Arc<EncodeConfig>,
    path: CodingPath,
    map: ValueMap,
    pending_key: Option<String>,
    variant: Option<&'static str>,
}

impl<'a> KeyedEncodingContainer<'a> {
    pub(crate) fn new(
        config: &'a Arc<EncodeConfig>,
        path: CodingPath,
        len: Option<usize>,
        variant: Option<&'static str>,
    ) -> Self {
        Self {
            config,
            path,
            map: ValueMap::with_capacity(len.unwrap_or(0)),
            pending_key: None,
            variant,
        }
    }

    /// Encodes `value` under `key`, omitting the key when the value is absent.
    pub fn encode<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> EncodeResult<()> {
        if let Slot::Present(value) = self.slot(key, value)? {
            self.map.insert(key.to_owned(), value);
        }
        Ok(())
    }

    /// Encodes `value` under `key`, writing `Null` when the value is absent.
    pub fn encode_entry<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> EncodeResult<()> {
        let value = self.slot(key, value)?.into_value();
        self.map.insert(key.to_owned(), value);
        Ok(())
    }

    fn slot<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> EncodeResult<Slot> {
        let path = self.path.appending(CodingKey::field(key));
        value
            .serialize(ValueEncoder::new(self.config, path.clone()))
            .map_err(|e| e.attribute(&path))
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }

    fn key_text(&self, key: DynamicValue) -> EncodeResult<String> {
        match key {
            DynamicValue::String(text) => Ok(text),
            DynamicValue::SignedInt(v) => Ok(v.to_string()),
            DynamicValue::UnsignedInt(v) => Ok(v.to_string()),
            DynamicValue::Bool(v) => Ok(v.to_string()),
            other => Err(EncodeError::KeyMustBeString {
                path: self.path.clone(),
                found: other.kind().to_string(),
            }),
        }
    }

    fn finish(self) -> EncodeResult<Slot> {
        Ok(Slot::Present(wrap_variant(
            self.variant,
            DynamicValue::Map(self.map),
        )))
    }
}

impl ser::SerializeStruct for KeyedEncodingContainer<'_> {
    type Ok = Slot;
    type Error = EncodeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> EncodeResult<()> {
        self.encode(key, value)
    }

    fn end(self) -> EncodeResult<Slot> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for KeyedEncodingContainer<'_> {
    type Ok = Slot;
    type Error = EncodeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> EncodeResult<()> {
        self.encode(key, value)
    }

    fn end(self) -> EncodeResult<Slot> {
        self.finish()
    }
}

impl ser::SerializeMap for KeyedEncodingContainer<'_> {
    type Ok = Slot;
    type Error = EncodeError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> EncodeResult<()> {
        let encoded = key
            .serialize(ValueEncoder::new(self.config, self.path.clone()))
            .map_err(|e| e.attribute(&self.path))?
            .into_value();
        self.pending_key = Some(self.key_text(encoded)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> EncodeResult<()> {
        let key = self.pending_key.take().ok_or_else(|| EncodeError::Custom {
            path: self.path.clone(),
            message: "map value written before its key".to_owned(),
        })?;
        self.encode_entry(&key, value)
    }

    fn end(self) -> EncodeResult<Slot> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Serialize;

    use crate::{EncodeError, Encoder};
    use dictionary_value::DynamicValue;

    #[derive(Serialize)]
    struct Pet {
        name: String,
        age: Option<u8>,
    }

    #[test]
    fn absent_optionals_omit_their_key() {
        let encoded = Encoder::new()
            .encode(&Pet {
                name: "Morven".into(),
                age: None,
            })
            .unwrap();
        let map = encoded.as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key("age"));
    }

    #[test]
    fn absent_map_values_are_written_as_null() {
        let mut ages = BTreeMap::new();
        ages.insert("Morven", None);
        ages.insert("Rebus", Some(3_u8));
        let encoded = Encoder::new().encode(&ages).unwrap();
        assert_eq!(encoded.as_map().unwrap().len(), 2);
        assert_eq!(encoded.get("Morven"), Some(&DynamicValue::Null));
        assert_eq!(encoded.get("Rebus"), Some(&DynamicValue::from(3_u8)));
    }

    #[test]
    fn numeric_and_bool_keys_become_text() {
        let mut scores = BTreeMap::new();
        scores.insert(3_u32, "three");
        scores.insert(10_u32, "ten");
        let encoded = Encoder::new().encode(&scores).unwrap();
        assert_eq!(encoded.get("3"), Some(&DynamicValue::from("three")));
        assert_eq!(encoded.get("10"), Some(&DynamicValue::from("ten")));
    }

    #[test]
    fn structured_keys_are_rejected() {
        let mut weird = BTreeMap::new();
        weird.insert(vec![1_u8], 1_u8);
        let err = Encoder::new().encode(&weird).unwrap_err();
        assert!(matches!(err, EncodeError::KeyMustBeString { .. }));
    }
}
