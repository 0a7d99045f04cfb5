//! Adapters for the host containers the decoder accepts out of the box.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use url::Url;
use uuid::Uuid;

use super::{Container, MapLike, Scalar, SequenceLike};
use crate::{Blob, DynamicValue, Identifier, Locator, Opaque, Timestamp};

// ---------------------------------------------------------------------------
// Canonical tree
// ---------------------------------------------------------------------------

impl Container for DynamicValue {
    fn as_map(&self) -> Option<&dyn MapLike> {
        match self {
            DynamicValue::Map(map) => Some(map),
            _ => None,
        }
    }

    fn as_sequence(&self) -> Option<&dyn SequenceLike> {
        match self {
            DynamicValue::Array(items) => Some(items),
            _ => None,
        }
    }

    fn as_scalar(&self) -> Option<Scalar<'_>> {
        let scalar = match self {
            DynamicValue::Null => Scalar::Null,
            DynamicValue::Bool(b) => Scalar::Bool(*b),
            DynamicValue::SignedInt(v) => Scalar::Signed(*v),
            DynamicValue::UnsignedInt(v) => Scalar::Unsigned(*v),
            DynamicValue::Double(v) => Scalar::Double(*v),
            DynamicValue::String(s) => Scalar::Str(Cow::Borrowed(s)),
            DynamicValue::Bytes(b) => Scalar::Bytes(Cow::Borrowed(b)),
            DynamicValue::Opaque(opaque) => Scalar::Opaque(Cow::Borrowed(opaque)),
            DynamicValue::Array(_) | DynamicValue::Map(_) => return None,
        };
        Some(scalar)
    }
}

// ---------------------------------------------------------------------------
// Maps
// ---------------------------------------------------------------------------

impl<C: Container, S: BuildHasher> MapLike for HashMap<String, C, S> {
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn keys(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_> {
        Box::new(HashMap::keys(self).map(|k| Cow::Borrowed(k.as_str())))
    }

    fn get(&self, key: &str) -> Option<&dyn Container> {
        HashMap::get(self, key).map(|v| v as &dyn Container)
    }
}

impl<C: Container, S: BuildHasher> Container for HashMap<String, C, S> {
    fn as_map(&self) -> Option<&dyn MapLike> {
        Some(self)
    }
}

impl<C: Container> MapLike for BTreeMap<String, C> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn keys(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_> {
        Box::new(BTreeMap::keys(self).map(|k| Cow::Borrowed(k.as_str())))
    }

    fn get(&self, key: &str) -> Option<&dyn Container> {
        BTreeMap::get(self, key).map(|v| v as &dyn Container)
    }
}

impl<C: Container> Container for BTreeMap<String, C> {
    fn as_map(&self) -> Option<&dyn MapLike> {
        Some(self)
    }
}

impl<C: Container, S: BuildHasher> MapLike for IndexMap<String, C, S> {
    fn len(&self) -> usize {
        IndexMap::len(self)
    }

    fn keys(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_> {
        Box::new(IndexMap::keys(self).map(|k| Cow::Borrowed(k.as_str())))
    }

    fn get(&self, key: &str) -> Option<&dyn Container> {
        IndexMap::get(self, key).map(|v| v as &dyn Container)
    }
}

impl<C: Container, S: BuildHasher> Container for IndexMap<String, C, S> {
    fn as_map(&self) -> Option<&dyn MapLike> {
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

impl<C: Container> SequenceLike for Vec<C> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, index: usize) -> Option<&dyn Container> {
        self.as_slice().get(index).map(|v| v as &dyn Container)
    }
}

impl<C: Container> Container for Vec<C> {
    fn as_sequence(&self) -> Option<&dyn SequenceLike> {
        Some(self)
    }
}

impl<C: Container> SequenceLike for [C] {
    fn len(&self) -> usize {
        <[C]>::len(self)
    }

    fn get(&self, index: usize) -> Option<&dyn Container> {
        <[C]>::get(self, index).map(|v| v as &dyn Container)
    }
}

impl<C: Container, const N: usize> SequenceLike for [C; N] {
    fn len(&self) -> usize {
        N
    }

    fn get(&self, index: usize) -> Option<&dyn Container> {
        self.as_slice().get(index).map(|v| v as &dyn Container)
    }
}

impl<C: Container, const N: usize> Container for [C; N] {
    fn as_sequence(&self) -> Option<&dyn SequenceLike> {
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// Wrappers
// ---------------------------------------------------------------------------

impl<C: Container + ?Sized> Container for &C {
    fn as_map(&self) -> Option<&dyn MapLike> {
        (**self).as_map()
    }

    fn as_sequence(&self) -> Option<&dyn SequenceLike> {
        (**self).as_sequence()
    }

    fn as_scalar(&self) -> Option<Scalar<'_>> {
        (**self).as_scalar()
    }
}

impl<C: Container + ?Sized> Container for Box<C> {
    fn as_map(&self) -> Option<&dyn MapLike> {
        (**self).as_map()
    }

    fn as_sequence(&self) -> Option<&dyn SequenceLike> {
        (**self).as_sequence()
    }

    fn as_scalar(&self) -> Option<Scalar<'_>> {
        (**self).as_scalar()
    }
}

impl<C: Container + ?Sized> Container for Arc<C> {
    fn as_map(&self) -> Option<&dyn MapLike> {
        (**self).as_map()
    }

    fn as_sequence(&self) -> Option<&dyn SequenceLike> {
        (**self).as_sequence()
    }

    fn as_scalar(&self) -> Option<Scalar<'_>> {
        (**self).as_scalar()
    }
}

impl<C: Container> Container for Option<C> {
    fn as_map(&self) -> Option<&dyn MapLike> {
        self.as_ref().and_then(Container::as_map)
    }

    fn as_sequence(&self) -> Option<&dyn SequenceLike> {
        self.as_ref().and_then(Container::as_sequence)
    }

    fn as_scalar(&self) -> Option<Scalar<'_>> {
        match self {
            Some(inner) => inner.as_scalar(),
            None => Some(Scalar::Null),
        }
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

macro_rules! signed_scalar {
    ($($t:ty),*) => {$(
        impl Container for $t {
            fn as_scalar(&self) -> Option<Scalar<'_>> {
                Some(Scalar::Signed(*self as i64))
            }
        }
    )*};
}

macro_rules! unsigned_scalar {
    ($($t:ty),*) => {$(
        impl Container for $t {
            fn as_scalar(&self) -> Option<Scalar<'_>> {
                Some(Scalar::Unsigned(*self as u64))
            }
        }
    )*};
}

signed_scalar!(i8, i16, i32, i64, isize);
unsigned_scalar!(u8, u16, u32, u64, usize);

impl Container for () {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        Some(Scalar::Null)
    }
}

impl Container for bool {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        Some(Scalar::Bool(*self))
    }
}

impl Container for f32 {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        Some(Scalar::Double(*self as f64))
    }
}

impl Container for f64 {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        Some(Scalar::Double(*self))
    }
}

impl Container for char {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        Some(Scalar::Str(Cow::Owned(self.to_string())))
    }
}

impl Container for str {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        Some(Scalar::Str(Cow::Borrowed(self)))
    }
}

impl Container for String {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        Some(Scalar::Str(Cow::Borrowed(self)))
    }
}

impl Container for Blob {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        Some(Scalar::Bytes(Cow::Borrowed(self.as_slice())))
    }
}

// ---------------------------------------------------------------------------
// Semantic values
// ---------------------------------------------------------------------------

impl Container for Opaque {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        Some(Scalar::Opaque(Cow::Borrowed(self)))
    }
}

impl Container for Timestamp {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        Some(Scalar::Opaque(Cow::Owned(Opaque::Timestamp(*self))))
    }
}

impl Container for Identifier {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        Some(Scalar::Opaque(Cow::Owned(Opaque::Identifier(*self))))
    }
}

impl Container for Uuid {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        Some(Scalar::Opaque(Cow::Owned(Opaque::Identifier(
            Identifier::from_uuid(*self),
        ))))
    }
}

impl Container for Locator {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        Some(Scalar::Opaque(Cow::Owned(Opaque::Locator(self.clone()))))
    }
}

/// A foreign locator type: adapted to the native [`Locator`] at the boundary.
impl Container for Url {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        Some(Scalar::Opaque(Cow::Owned(Opaque::Locator(Locator::from(
            self.clone(),
        )))))
    }
}

/// Absolute paths present themselves as `file://` locators, relative ones as
/// plain strings.
impl Container for Path {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        match Locator::from_file_path(self) {
            Ok(locator) => Some(Scalar::Opaque(Cow::Owned(Opaque::Locator(locator)))),
            Err(_) => Some(Scalar::Str(self.to_string_lossy())),
        }
    }
}

impl Container for PathBuf {
    fn as_scalar(&self) -> Option<Scalar<'_>> {
        self.as_path().as_scalar()
    }
}
