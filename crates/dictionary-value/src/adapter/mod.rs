//! Container adapter capabilities.
//!
//! The decoder never inspects concrete host container types. Anything it reads
//! is a [`Container`], which may expose itself as a [`MapLike`], a
//! [`SequenceLike`], or a [`Scalar`] leaf. The decoder queries the three
//! capabilities in that order and uses the first one that satisfies the
//! container it was asked for.

mod impls;

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;

use crate::{Opaque, ValueKind};

/// The shape a decode call asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Keyed,
    Unkeyed,
    SingleValue,
}

impl ContainerKind {
    pub fn name(self) -> &'static str {
        match self {
            ContainerKind::Keyed => "keyed container",
            ContainerKind::Unkeyed => "unkeyed container",
            ContainerKind::SingleValue => "single value",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decodable input value.
///
/// Every method defaults to "capability not offered"; implementors override
/// the ones that apply.
pub trait Container {
    fn as_map(&self) -> Option<&dyn MapLike> {
        None
    }

    fn as_sequence(&self) -> Option<&dyn SequenceLike> {
        None
    }

    fn as_scalar(&self) -> Option<Scalar<'_>> {
        None
    }

    /// Shape reported in type-mismatch errors.
    fn describe(&self) -> ValueKind {
        if self.as_map().is_some() {
            ValueKind::Map
        } else if self.as_sequence().is_some() {
            ValueKind::Array
        } else {
            self.as_scalar().map_or(ValueKind::Null, |s| s.kind())
        }
    }
}

/// Read access to a string-keyed map.
pub trait MapLike {
    fn len(&self) -> usize;

    /// Keys in the container's own iteration order.
    fn keys(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_>;

    fn get(&self, key: &str) -> Option<&dyn Container>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Read access to an ordered list.
pub trait SequenceLike {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Option<&dyn Container>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements in order.
    fn elements(&self) -> Box<dyn Iterator<Item = &dyn Container> + '_> {
        Box::new((0..self.len()).filter_map(move |index| self.get(index)))
    }
}

/// A raw leaf payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar<'a> {
    Null,
    Bool(bool),
    Signed(i64),
    Unsigned(u64),
    Double(f64),
    Str(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
    Opaque(Cow<'a, Opaque>),
}

impl Scalar<'_> {
    pub fn kind(&self) -> ValueKind {
        match self {
            Scalar::Null => ValueKind::Null,
            Scalar::Bool(_) => ValueKind::Bool,
            Scalar::Signed(_) => ValueKind::SignedInt,
            Scalar::Unsigned(_) => ValueKind::UnsignedInt,
            Scalar::Double(_) => ValueKind::Double,
            Scalar::Str(_) => ValueKind::String,
            Scalar::Bytes(_) => ValueKind::Bytes,
            Scalar::Opaque(opaque) => opaque.kind(),
        }
    }

    pub fn into_owned(self) -> Scalar<'static> {
        match self {
            Scalar::Null => Scalar::Null,
            Scalar::Bool(b) => Scalar::Bool(b),
            Scalar::Signed(v) => Scalar::Signed(v),
            Scalar::Unsigned(v) => Scalar::Unsigned(v),
            Scalar::Double(v) => Scalar::Double(v),
            Scalar::Str(s) => Scalar::Str(Cow::Owned(s.into_owned())),
            Scalar::Bytes(b) => Scalar::Bytes(Cow::Owned(b.into_owned())),
            Scalar::Opaque(o) => Scalar::Opaque(Cow::Owned(o.into_owned())),
        }
    }
}

/// Heterogeneous string-keyed map of arbitrary containers.
pub type AnyMap = IndexMap<String, Box<dyn Container>>;

/// Heterogeneous list of arbitrary containers.
pub type AnyList = Vec<Box<dyn Container>>;
