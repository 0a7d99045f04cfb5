//! dictionary-value - the untyped document model used by `dictionary-coding`.
//!
//! Provides:
//! - [`DynamicValue`], the canonical tagged tree (null, bool, numbers, strings,
//!   bytes, arrays, ordered maps and [`Opaque`] pass-through values);
//! - the semantic leaf types [`Timestamp`], [`Identifier`], [`Locator`] and
//!   [`Blob`], whose serde impls cooperate with the coding engine;
//! - the [`Container`] adapter capabilities ([`MapLike`], [`SequenceLike`],
//!   [`Scalar`]) that let foreign containers be decoded without copying.

mod adapter;
mod error;
mod json;
mod semantic;
mod value;

pub use adapter::{AnyList, AnyMap, Container, ContainerKind, MapLike, Scalar, SequenceLike};
pub use error::SemanticError;
pub use semantic::{
    Blob, Identifier, Locator, Timestamp, IDENTIFIER_TOKEN, LOCATOR_TOKEN,
    REFERENCE_EPOCH_UNIX_OFFSET, TIMESTAMP_TOKEN,
};
pub use value::{DynamicValue, Opaque, OpaqueTag, ValueKind, ValueMap};

/// Builds an [`AnyMap`] from `key => value` pairs, boxing each value.
///
/// ```
/// use dictionary_value::{any_map, Container};
///
/// let map = any_map! { "name" => "Sam", "age" => 48_i64 };
/// assert_eq!(map.len(), 2);
/// assert!(map.as_map().is_some());
/// ```
#[macro_export]
macro_rules! any_map {
    () => {
        $crate::AnyMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::AnyMap::new();
        $(
            map.insert(
                ::std::string::String::from($key),
                ::std::boxed::Box::new($value) as ::std::boxed::Box<dyn $crate::Container>,
            );
        )+
        map
    }};
}

/// Builds an [`AnyList`] from values, boxing each one.
#[macro_export]
macro_rules! any_list {
    ($($value:expr),* $(,)?) => {{
        let list: $crate::AnyList = ::std::vec![
            $(::std::boxed::Box::new($value) as ::std::boxed::Box<dyn $crate::Container>),*
        ];
        list
    }};
}
