//! Engine-agnostic encode/decode traits and iterator adapters.
//!
//! Generic code that only needs "something that turns values into documents"
//! can take a [`TopLevelEncoder`] or [`TopLevelDecoder`] instead of the
//! concrete engines. [`CodingIteratorExt`] maps a stream of values through
//! one, yielding each result and stopping after the first error.

use std::marker::PhantomData;

use dictionary_value::{Container, DynamicValue};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{DecodeError, Decoder, EncodeError, Encoder};

pub trait TopLevelEncoder {
    type Output;
    type Error;

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Self::Output, Self::Error>;
}

pub trait TopLevelDecoder {
    type Input: ?Sized;
    type Error;

    fn decode<T: DeserializeOwned>(&self, input: &Self::Input) -> Result<T, Self::Error>;
}

impl TopLevelEncoder for Encoder {
    type Output = DynamicValue;
    type Error = EncodeError;

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<DynamicValue, EncodeError> {
        Encoder::encode(self, value)
    }
}

impl TopLevelDecoder for Decoder {
    type Input = dyn Container;
    type Error = DecodeError;

    fn decode<T: DeserializeOwned>(&self, input: &Self::Input) -> Result<T, DecodeError> {
        Decoder::decode(self, input)
    }
}

/// Iterator adapter produced by [`CodingIteratorExt::encode_each`].
pub struct EncodeEach<'e, I, E> {
    inner: I,
    encoder: &'e E,
    failed: bool,
}

impl<I, E> Iterator for EncodeEach<'_, I, E>
where
    I: Iterator,
    I::Item: Serialize,
    E: TopLevelEncoder,
{
    type Item = Result<E::Output, E::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.inner.next()?;
        let result = self.encoder.encode(&item);
        self.failed = result.is_err();
        Some(result)
    }
}

/// Iterator adapter produced by [`CodingIteratorExt::decode_each`].
pub struct DecodeEach<'d, I, D, T> {
    inner: I,
    decoder: &'d D,
    failed: bool,
    target: PhantomData<fn() -> T>,
}

impl<I, D, T> Iterator for DecodeEach<'_, I, D, T>
where
    I: Iterator,
    I::Item: Container + 'static,
    D: TopLevelDecoder<Input = dyn Container>,
    T: DeserializeOwned,
{
    type Item = Result<T, D::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.inner.next()?;
        let result = self.decoder.decode::<T>(&item);
        self.failed = result.is_err();
        Some(result)
    }
}

pub trait CodingIteratorExt: Iterator + Sized {
    /// Encodes every item, stopping after the first failure.
    fn encode_each<E: TopLevelEncoder>(self, encoder: &E) -> EncodeEach<'_, Self, E>
    where
        Self::Item: Serialize,
    {
        EncodeEach {
            inner: self,
            encoder,
            failed: false,
        }
    }

    /// Decodes a `T` from every item, stopping after the first failure.
    fn decode_each<T, D>(self, decoder: &D) -> DecodeEach<'_, Self, D, T>
    where
        Self::Item: Container + 'static,
        D: TopLevelDecoder<Input = dyn Container>,
        T: DeserializeOwned,
    {
        DecodeEach {
            inner: self,
            decoder,
            failed: false,
            target: PhantomData,
        }
    }
}

impl<I: Iterator> CodingIteratorExt for I {}
