use std::sync::Arc;

use dictionary_value::DynamicValue;
use serde::ser::{self, Serialize};

use super::{wrap_variant, Slot, ValueEncoder};
use crate::error::{EncodeError, EncodeResult};
use crate::path::{CodingKey, CodingPath};
use crate::strategy::EncodeConfig;

/// Appends elements to an ordered list, in encode order.
///
/// An absent element (`None`) is written as `Null` so indices stay stable.
pub struct UnkeyedEncodingContainer<'a> {
    config: &'a Arc<EncodeConfig>,
    path: CodingPath,
    items: Vec<DynamicValue>,
    variant: Option<&'static str>,
}

impl<'a> UnkeyedEncodingContainer<'a> {
    pub(crate) fn new(
        config: &'a Arc<EncodeConfig>,
        path: CodingPath,
        len: Option<usize>,
        variant: Option<&'static str>,
    ) -> Self {
        Self {
            config,
            path,
            items: Vec::with_capacity(len.unwrap_or(0)),
            variant,
        }
    }

    pub fn encode<T: Serialize + ?Sized>(&mut self, value: &T) -> EncodeResult<()> {
        let path = self.path.appending(CodingKey::index(self.items.len()));
        let slot = value
            .serialize(ValueEncoder::new(self.config, path.clone()))
            .map_err(|e| e.attribute(&path))?;
        self.items.push(slot.into_value());
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    fn finish(self) -> EncodeResult<Slot> {
        Ok(Slot::Present(wrap_variant(
            self.variant,
            DynamicValue::Array(self.items),
        )))
    }
}

impl ser::SerializeSeq for UnkeyedEncodingContainer<'_> {
    type Ok = Slot;
    type Error = EncodeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> EncodeResult<()> {
        self.encode(value)
    }

    fn end(self) -> EncodeResult<Slot> {
        self.finish()
    }
}

impl ser::SerializeTuple for UnkeyedEncodingContainer<'_> {
    type Ok = Slot;
    type Error = EncodeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> EncodeResult<()> {
        self.encode(value)
    }

    fn end(self) -> EncodeResult<Slot> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for UnkeyedEncodingContainer<'_> {
    type Ok = Slot;
    type Error = EncodeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> EncodeResult<()> {
        self.encode(value)
    }

    fn end(self) -> EncodeResult<Slot> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for UnkeyedEncodingContainer<'_> {
    type Ok = Slot;
    type Error = EncodeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> EncodeResult<()> {
        self.encode(value)
    }

    fn end(self) -> EncodeResult<Slot> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::Encoder;
    use dictionary_value::DynamicValue;

    #[test]
    fn none_elements_keep_their_position() {
        let encoded = Encoder::new().encode(&vec![Some(1_i32), None, Some(3)]).unwrap();
        assert_eq!(
            encoded,
            DynamicValue::Array(vec![1.into(), DynamicValue::Null, 3.into()])
        );
    }

    #[test]
    fn tuples_are_lists() {
        let encoded = Encoder::new().encode(&("a", 2_u8, true)).unwrap();
        assert_eq!(
            encoded,
            DynamicValue::Array(vec!["a".into(), 2_u8.into(), true.into()])
        );
    }
}
