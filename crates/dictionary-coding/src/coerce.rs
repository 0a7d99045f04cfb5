//! Decode-time coercion rules.
//!
//! Each rule takes the raw [`Scalar`] (or container, for blobs) found at a
//! coding path and either produces the requested shape or an error carrying
//! that path. None of them look at strategies except where noted.

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use dictionary_value::{Container, Identifier, Locator, Opaque, Scalar, ValueKind};
use tracing::trace;

use crate::error::{DecodeError, DecodeResult};
use crate::path::CodingPath;

// ---------------------------------------------------------------------------
// Booleans
// ---------------------------------------------------------------------------

pub(crate) fn to_bool(scalar: &Scalar<'_>, path: &CodingPath) -> DecodeResult<bool> {
    match scalar {
        Scalar::Bool(b) => Ok(*b),
        Scalar::Signed(v) => Ok(*v != 0),
        Scalar::Unsigned(v) => Ok(*v != 0),
        other => Err(DecodeError::mismatch(path, ValueKind::Bool, other.kind())),
    }
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// A fixed-width integer target.
pub(crate) trait Integral: Sized + Copy {
    const NAME: &'static str;

    fn from_i64(v: i64) -> Option<Self>;
    fn from_u64(v: u64) -> Option<Self>;
    /// `v` is known to be integral.
    fn from_whole_f64(v: f64) -> Option<Self>;
}

macro_rules! integral {
    ($($t:ty),*) => {$(
        impl Integral for $t {
            const NAME: &'static str = stringify!($t);

            fn from_i64(v: i64) -> Option<Self> {
                <$t>::try_from(v).ok()
            }

            fn from_u64(v: u64) -> Option<Self> {
                <$t>::try_from(v).ok()
            }

            fn from_whole_f64(v: f64) -> Option<Self> {
                // MAX as f64 may round up, so compare against MAX + 1 exclusively.
                if v >= <$t>::MIN as f64 && v < <$t>::MAX as f64 + 1.0 {
                    Some(v as $t)
                } else {
                    None
                }
            }
        }
    )*};
}

integral!(i8, i16, i32, i64, u8, u16, u32, u64, i128, u128);

pub(crate) fn to_integer<T: Integral>(scalar: &Scalar<'_>, path: &CodingPath) -> DecodeResult<T> {
    match scalar {
        Scalar::Signed(v) => T::from_i64(*v).ok_or_else(|| DecodeError::overflow(path, v, T::NAME)),
        Scalar::Unsigned(v) => {
            T::from_u64(*v).ok_or_else(|| DecodeError::overflow(path, v, T::NAME))
        }
        Scalar::Double(v) => {
            if !v.is_finite() || v.fract() != 0.0 {
                return Err(DecodeError::mismatch(path, T::NAME, format!("double {v}")));
            }
            T::from_whole_f64(*v).ok_or_else(|| DecodeError::overflow(path, v, T::NAME))
        }
        other => Err(DecodeError::mismatch(path, T::NAME, other.kind())),
    }
}

pub(crate) fn to_f64(scalar: &Scalar<'_>, path: &CodingPath) -> DecodeResult<f64> {
    match scalar {
        Scalar::Double(v) => Ok(*v),
        Scalar::Signed(v) => Ok(*v as f64),
        Scalar::Unsigned(v) => Ok(*v as f64),
        other => Err(DecodeError::mismatch(path, "f64", other.kind())),
    }
}

pub(crate) fn to_f32(scalar: &Scalar<'_>, path: &CodingPath) -> DecodeResult<f32> {
    let wide = to_f64(scalar, path).map_err(|_| {
        DecodeError::mismatch(path, "f32", scalar.kind())
    })?;
    if wide.is_finite() && (wide > f32::MAX as f64 || wide < f32::MIN as f64) {
        return Err(DecodeError::overflow(path, wide, "f32"));
    }
    Ok(wide as f32)
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// A native string, or the canonical text of a locator or identifier.
pub(crate) fn to_text<'a>(scalar: Scalar<'a>, path: &CodingPath) -> DecodeResult<Cow<'a, str>> {
    match scalar {
        Scalar::Str(s) => Ok(s),
        Scalar::Opaque(opaque) => {
            let kind = opaque.kind();
            match opaque.canonical_text() {
                Some(text) => {
                    trace!(%path, from = %kind, "string coerced from semantic value");
                    Ok(Cow::Owned(text))
                }
                None => Err(DecodeError::mismatch(path, ValueKind::String, kind)),
            }
        }
        other => Err(DecodeError::mismatch(path, ValueKind::String, other.kind())),
    }
}

pub(crate) fn to_char(scalar: Scalar<'_>, path: &CodingPath) -> DecodeResult<char> {
    let found = scalar.kind();
    let text = to_text(scalar, path).map_err(|_| DecodeError::mismatch(path, "char", found))?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(DecodeError::invalid(
            path,
            format!("expected a single character, found {text:?}"),
        )),
    }
}

// ---------------------------------------------------------------------------
// Semantic types
// ---------------------------------------------------------------------------

pub(crate) fn to_identifier(scalar: &Scalar<'_>, path: &CodingPath) -> DecodeResult<Identifier> {
    match scalar {
        Scalar::Opaque(opaque) => match opaque.as_ref() {
            Opaque::Identifier(id) => Ok(*id),
            other => Err(DecodeError::mismatch(path, ValueKind::Identifier, other.kind())),
        },
        Scalar::Str(text) => Identifier::parse(text).map_err(|e| DecodeError::invalid(path, e)),
        Scalar::Bytes(bytes) => {
            Identifier::from_slice(bytes).map_err(|e| DecodeError::invalid(path, e))
        }
        other => Err(DecodeError::mismatch(path, ValueKind::Identifier, other.kind())),
    }
}

pub(crate) fn to_locator(scalar: &Scalar<'_>, path: &CodingPath) -> DecodeResult<Locator> {
    match scalar {
        Scalar::Opaque(opaque) => match opaque.as_ref() {
            Opaque::Locator(locator) => Ok(locator.clone()),
            other => Err(DecodeError::mismatch(path, ValueKind::Locator, other.kind())),
        },
        Scalar::Str(text) => Locator::parse(text).map_err(|e| DecodeError::invalid(path, e)),
        other => Err(DecodeError::mismatch(path, ValueKind::Locator, other.kind())),
    }
}

/// Native bytes, then a base64 string, then an array of octets.
pub(crate) fn to_bytes(container: &dyn Container, path: &CodingPath) -> DecodeResult<Vec<u8>> {
    if let Some(items) = container.as_sequence() {
        trace!(%path, "bytes coerced from an array of octets");
        let mut out = Vec::with_capacity(items.len());
        for index in 0..items.len() {
            let at = path.appending(crate::path::CodingKey::index(index));
            let scalar = items
                .get(index)
                .and_then(Container::as_scalar)
                .ok_or_else(|| DecodeError::mismatch(&at, "u8", ValueKind::Null))?;
            out.push(to_integer::<u8>(&scalar, &at)?);
        }
        return Ok(out);
    }
    match container.as_scalar() {
        Some(Scalar::Bytes(bytes)) => Ok(bytes.into_owned()),
        Some(Scalar::Str(text)) => {
            trace!(%path, "bytes coerced from base64 text");
            STANDARD
                .decode(text.as_bytes())
                .map_err(|e| DecodeError::invalid(path, format!("invalid base64: {e}")))
        }
        _ => Err(DecodeError::mismatch(path, ValueKind::Bytes, container.describe())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::CodingKey;
    use dictionary_value::DynamicValue;

    fn at() -> CodingPath {
        CodingPath::root().appending(CodingKey::field("x"))
    }

    #[test]
    fn booleans_from_integers() {
        assert!(to_bool(&Scalar::Signed(1), &at()).unwrap());
        assert!(!to_bool(&Scalar::Unsigned(0), &at()).unwrap());
        assert!(to_bool(&Scalar::Signed(-7), &at()).unwrap());
        assert!(matches!(
            to_bool(&Scalar::Str("true".into()), &at()),
            Err(DecodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn integer_ranges() {
        assert_eq!(to_integer::<u8>(&Scalar::Signed(255), &at()).unwrap(), 255);
        assert!(matches!(
            to_integer::<u8>(&Scalar::Signed(256), &at()),
            Err(DecodeError::NumericOverflow { target: "u8", .. })
        ));
        assert!(matches!(
            to_integer::<u32>(&Scalar::Signed(-1), &at()),
            Err(DecodeError::NumericOverflow { .. })
        ));
        assert_eq!(to_integer::<i64>(&Scalar::Double(-3.0), &at()).unwrap(), -3);
        assert!(matches!(
            to_integer::<i64>(&Scalar::Double(1.5), &at()),
            Err(DecodeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            to_integer::<i64>(&Scalar::Double(9.3e18), &at()),
            Err(DecodeError::NumericOverflow { .. })
        ));
        assert_eq!(
            to_integer::<u64>(&Scalar::Unsigned(u64::MAX), &at()).unwrap(),
            u64::MAX
        );
        assert_eq!(
            to_integer::<i128>(&Scalar::Unsigned(u64::MAX), &at()).unwrap(),
            u64::MAX as i128
        );
    }

    #[test]
    fn floats() {
        assert_eq!(to_f64(&Scalar::Signed(2), &at()).unwrap(), 2.0);
        assert!(matches!(
            to_f32(&Scalar::Double(1e300), &at()),
            Err(DecodeError::NumericOverflow { target: "f32", .. })
        ));
        assert!(to_f32(&Scalar::Double(f64::INFINITY), &at()).unwrap().is_infinite());
    }

    #[test]
    fn text_from_semantic_values() {
        let locator = Locator::parse("file:///path").unwrap();
        let text = to_text(Scalar::Opaque(Cow::Owned(Opaque::Locator(locator))), &at()).unwrap();
        assert_eq!(text, "file:///path");
        assert!(to_text(Scalar::Signed(1), &at()).is_err());
    }

    #[test]
    fn identifiers() {
        let id = Identifier::new_v4();
        let from_text = to_identifier(&Scalar::Str(id.canonical().to_lowercase().into()), &at());
        assert_eq!(from_text.unwrap(), id);
        let from_bytes = to_identifier(&Scalar::Bytes(Cow::Borrowed(id.as_bytes())), &at());
        assert_eq!(from_bytes.unwrap(), id);
        assert!(matches!(
            to_identifier(&Scalar::Str("nope".into()), &at()),
            Err(DecodeError::InvalidValue { .. })
        ));
        assert!(matches!(
            to_identifier(&Scalar::Double(1.0), &at()),
            Err(DecodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn locators() {
        assert!(to_locator(&Scalar::Str("http://example.com".into()), &at()).is_ok());
        assert!(matches!(
            to_locator(&Scalar::Str("not a locator".into()), &at()),
            Err(DecodeError::InvalidValue { .. })
        ));
        assert!(matches!(
            to_locator(&Scalar::Bool(true), &at()),
            Err(DecodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn bytes_from_every_form() {
        let native = DynamicValue::Bytes(b"blah".to_vec());
        let text = DynamicValue::from("YmxhaA==");
        let octets = DynamicValue::Array(vec![98.into(), 108.into(), 97.into(), 104.into()]);
        for value in [&native, &text, &octets] {
            assert_eq!(to_bytes(value, &at()).unwrap(), b"blah");
        }
        assert!(matches!(
            to_bytes(&DynamicValue::from("%%%"), &at()),
            Err(DecodeError::InvalidValue { .. })
        ));
        let err = to_bytes(&DynamicValue::Array(vec![300.into()]), &at()).unwrap_err();
        assert_eq!(err.path().names(), vec!["x", "0"]);
        assert!(matches!(
            to_bytes(&DynamicValue::Bool(true), &at()),
            Err(DecodeError::TypeMismatch { .. })
        ));
    }
}
