use std::borrow::Cow;

use dictionary_value::{Container, Scalar};
use serde::de::{self, DeserializeSeed, Deserializer, IntoDeserializer, Visitor};

use super::value::ValueDecoder;
use crate::error::{DecodeError, DecodeResult};
use crate::path::{CodingKey, CodingPath};
use crate::strategy::DecodeConfig;

/// Externally tagged enum access: a bare string for unit variants, or a
/// single-key map `{variant: payload}`.
pub(crate) struct EnumDecoder<'a> {
    variant: Cow<'a, str>,
    payload: Option<&'a dyn Container>,
    config: &'a DecodeConfig,
    path: CodingPath,
}

impl<'a> EnumDecoder<'a> {
    pub(crate) fn new(
        variant: Cow<'a, str>,
        payload: Option<&'a dyn Container>,
        config: &'a DecodeConfig,
        path: CodingPath,
    ) -> Self {
        Self {
            variant,
            payload,
            config,
            path,
        }
    }

    fn payload(self, expected: &'static str) -> DecodeResult<ValueDecoder<'a>> {
        let path = self.path.appending(CodingKey::field(self.variant.as_ref()));
        match self.payload {
            Some(payload) => Ok(ValueDecoder::new(payload, self.config, path)),
            None => Err(DecodeError::mismatch(&self.path, expected, "unit variant")),
        }
    }
}

impl<'de, 'a> de::EnumAccess<'de> for EnumDecoder<'a> {
    type Error = DecodeError;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> DecodeResult<(V::Value, Self)> {
        let name: de::value::StrDeserializer<'_, DecodeError> = self.variant.as_ref().into_deserializer();
        let value = seed.deserialize(name).map_err(|e| e.attribute(&self.path))?;
        Ok((value, self))
    }
}

impl<'de, 'a> de::VariantAccess<'de> for EnumDecoder<'a> {
    type Error = DecodeError;

    fn unit_variant(self) -> DecodeResult<()> {
        match self.payload.map(|payload| payload.as_scalar()) {
            None | Some(Some(Scalar::Null)) => Ok(()),
            Some(_) => Err(DecodeError::mismatch(
                &self.path,
                "unit variant",
                "variant with payload",
            )),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> DecodeResult<T::Value> {
        let decoder = self.payload("newtype variant")?;
        let path = decoder.coding_path().clone();
        seed.deserialize(decoder).map_err(|e| e.attribute(&path))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> DecodeResult<V::Value> {
        let decoder = self.payload("tuple variant")?;
        let path = decoder.coding_path().clone();
        decoder.deserialize_seq(visitor).map_err(|e| e.attribute(&path))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> DecodeResult<V::Value> {
        let decoder = self.payload("struct variant")?;
        let path = decoder.coding_path().clone();
        decoder
            .deserialize_struct("", fields, visitor)
            .map_err(|e| e.attribute(&path))
    }
}
