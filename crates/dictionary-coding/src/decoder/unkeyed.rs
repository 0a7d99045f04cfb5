use dictionary_value::{Container, SequenceLike};
use serde::de::{self, DeserializeSeed};

use super::value::ValueDecoder;
use crate::error::{DecodeError, DecodeResult};
use crate::path::{CodingKey, CodingPath};
use crate::strategy::DecodeConfig;

/// Reads the elements of a sequence-like container in order.
pub struct UnkeyedDecodingContainer<'a> {
    items: &'a dyn SequenceLike,
    config: &'a DecodeConfig,
    path: CodingPath,
    index: usize,
}

impl<'a> UnkeyedDecodingContainer<'a> {
    pub(crate) fn new(items: &'a dyn SequenceLike, config: &'a DecodeConfig, path: CodingPath) -> Self {
        Self {
            items,
            config,
            path,
            index: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn is_at_end(&self) -> bool {
        self.index >= self.items.len()
    }
}

impl<'de> de::SeqAccess<'de> for UnkeyedDecodingContainer<'_> {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> DecodeResult<Option<T::Value>> {
        if self.is_at_end() {
            return Ok(None);
        }
        let path = self.path.appending(CodingKey::index(self.index));
        let item: &dyn Container = self.items.get(self.index).unwrap_or(&());
        self.index += 1;
        seed.deserialize(ValueDecoder::new(item, self.config, path.clone()))
            .map(Some)
            .map_err(|e| e.attribute(&path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len().saturating_sub(self.index))
    }
}
