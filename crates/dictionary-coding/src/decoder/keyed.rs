use std::borrow::Cow;

use dictionary_value::{Container, MapLike};
use serde::de::{self, DeserializeSeed, IntoDeserializer};
use tracing::trace;

use super::missing::MissingValueDecoder;
use super::value::{MapKeyDecoder, ValueDecoder};
use crate::error::{DecodeError, DecodeResult};
use crate::path::{CodingKey, CodingPath};
use crate::strategy::DecodeConfig;

enum Pending<'a> {
    Present(&'a dyn Container, CodingPath),
    Missing(CodingPath),
}

/// Reads the entries of a map-like container.
///
/// Present keys are visited in the container's order. When decoding a struct
/// under a permissive missing-value strategy, declared fields with no key are
/// visited afterwards and resolved by [`MissingValueDecoder`].
pub struct KeyedDecodingContainer<'a> {
    map: &'a dyn MapLike,
    config: &'a DecodeConfig,
    path: CodingPath,
    keys: Vec<Cow<'a, str>>,
    missing: Vec<&'static str>,
    position: usize,
    pending: Option<Pending<'a>>,
}

impl<'a> KeyedDecodingContainer<'a> {
    pub(crate) fn new(
        map: &'a dyn MapLike,
        config: &'a DecodeConfig,
        path: CodingPath,
        fields: &'static [&'static str],
    ) -> Self {
        let keys: Vec<Cow<'a, str>> = map.keys().collect();
        let missing: Vec<&'static str> = if config.missing.is_permissive() {
            fields
                .iter()
                .copied()
                .filter(|field| !map.contains_key(field))
                .collect()
        } else {
            Vec::new()
        };
        if !missing.is_empty() {
            trace!(
                %path,
                fields = ?missing,
                strategy = config.missing.name(),
                "synthesizing missing fields"
            );
        }
        Self {
            map,
            config,
            path,
            keys,
            missing,
            position: 0,
            pending: None,
        }
    }

    /// Keys present in the input, in order.
    pub fn all_keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.as_ref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }

    fn remaining(&self) -> usize {
        (self.keys.len() + self.missing.len()).saturating_sub(self.position)
    }
}

impl<'de> de::MapAccess<'de> for KeyedDecodingContainer<'_> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> DecodeResult<Option<K::Value>> {
        let position = self.position;
        if position < self.keys.len() {
            self.position += 1;
            let key = self.keys[position].clone();
            let path = self.path.appending(CodingKey::field(key.as_ref()));
            self.pending = Some(match self.map.get(&key) {
                Some(value) => Pending::Present(value, path.clone()),
                None => Pending::Missing(path.clone()),
            });
            return seed
                .deserialize(MapKeyDecoder::new(&key, &path))
                .map(Some)
                .map_err(|e| e.attribute(&path));
        }
        let Some(field) = self.missing.get(position - self.keys.len()).copied() else {
            return Ok(None);
        };
        self.position += 1;
        let path = self.path.appending(CodingKey::field(field));
        self.pending = Some(Pending::Missing(path));
        let key: de::value::StrDeserializer<'_, DecodeError> = field.into_deserializer();
        seed.deserialize(key).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> DecodeResult<V::Value> {
        match self.pending.take() {
            Some(Pending::Present(value, path)) => seed
                .deserialize(ValueDecoder::new(value, self.config, path.clone()))
                .map_err(|e| e.attribute(&path)),
            Some(Pending::Missing(path)) => seed
                .deserialize(MissingValueDecoder::new(self.config, path.clone()))
                .map_err(|e| e.attribute(&path)),
            None => Err(DecodeError::Custom {
                path: self.path.clone(),
                message: "map value requested before its key".to_owned(),
            }),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining())
    }
}
