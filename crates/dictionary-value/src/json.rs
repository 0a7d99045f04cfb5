//! Bridge between [`DynamicValue`] and `serde_json::Value`.
//!
//! `serde_json::Value` is also a [`Container`], so JSON documents can be
//! decoded in place without conversion.

use std::borrow::Cow;

use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use crate::adapter::{Container, MapLike, Scalar, SequenceLike};
use crate::{DynamicValue, ValueMap};

impl Container for JsonValue {
    fn as_map(&self) -> Option<&dyn MapLike> {
        match self {
            JsonValue::Object(map) => Some(map),
            _ => None,
        }
    }

    fn as_sequence(&self) -> Option<&dyn SequenceLike> {
        match self {
            JsonValue::Array(items) => Some(items),
            _ => None,
        }
    }

    fn as_scalar(&self) -> Option<Scalar<'_>> {
        let scalar = match self {
            JsonValue::Null => Scalar::Null,
            JsonValue::Bool(b) => Scalar::Bool(*b),
            JsonValue::Number(n) => number_scalar(n),
            JsonValue::String(s) => Scalar::Str(Cow::Borrowed(s)),
            JsonValue::Array(_) | JsonValue::Object(_) => return None,
        };
        Some(scalar)
    }
}

impl MapLike for JsonMap<String, JsonValue> {
    fn len(&self) -> usize {
        JsonMap::len(self)
    }

    fn keys(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_> {
        Box::new(JsonMap::keys(self).map(|k| Cow::Borrowed(k.as_str())))
    }

    fn get(&self, key: &str) -> Option<&dyn Container> {
        JsonMap::get(self, key).map(|v| v as &dyn Container)
    }
}

impl Container for JsonMap<String, JsonValue> {
    fn as_map(&self) -> Option<&dyn MapLike> {
        Some(self)
    }
}

fn number_scalar(n: &Number) -> Scalar<'static> {
    if let Some(v) = n.as_u64() {
        if let Ok(signed) = i64::try_from(v) {
            return Scalar::Signed(signed);
        }
        return Scalar::Unsigned(v);
    }
    if let Some(v) = n.as_i64() {
        return Scalar::Signed(v);
    }
    Scalar::Double(n.as_f64().unwrap_or(f64::NAN))
}

impl From<JsonValue> for DynamicValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => DynamicValue::Null,
            JsonValue::Bool(b) => DynamicValue::Bool(b),
            JsonValue::Number(n) => match number_scalar(&n) {
                Scalar::Signed(v) => DynamicValue::SignedInt(v),
                Scalar::Unsigned(v) => DynamicValue::UnsignedInt(v),
                Scalar::Double(v) => DynamicValue::Double(v),
                _ => DynamicValue::Null,
            },
            JsonValue::String(s) => DynamicValue::String(s),
            JsonValue::Array(items) => {
                DynamicValue::Array(items.into_iter().map(DynamicValue::from).collect())
            }
            JsonValue::Object(map) => DynamicValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, DynamicValue::from(v)))
                    .collect::<ValueMap>(),
            ),
        }
    }
}

impl DynamicValue {
    /// Converts to JSON.
    ///
    /// Bytes become arrays of numbers, timestamps their reference-epoch
    /// seconds, locators and identifiers their canonical strings, and
    /// non-finite doubles `null`. Map order is preserved.
    pub fn to_json(&self) -> JsonValue {
        match self {
            DynamicValue::Null => JsonValue::Null,
            DynamicValue::Bool(b) => JsonValue::Bool(*b),
            DynamicValue::SignedInt(v) => JsonValue::from(*v),
            DynamicValue::UnsignedInt(v) => JsonValue::from(*v),
            DynamicValue::Double(v) => JsonValue::from(*v),
            DynamicValue::String(s) => JsonValue::String(s.clone()),
            DynamicValue::Bytes(b) => JsonValue::Array(b.iter().map(|&x| JsonValue::from(x)).collect()),
            DynamicValue::Array(items) => {
                JsonValue::Array(items.iter().map(DynamicValue::to_json).collect())
            }
            DynamicValue::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            DynamicValue::Opaque(crate::Opaque::Timestamp(ts)) => {
                JsonValue::from(ts.reference_seconds())
            }
            DynamicValue::Opaque(opaque) => {
                JsonValue::String(opaque.canonical_text().unwrap_or_default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_round_trip_preserves_order_and_number_kinds() {
        let doc = json!({"z": 1, "a": -2, "big": u64::MAX, "f": 1.5, "s": "x", "l": [true, null]});
        let value = DynamicValue::from(doc.clone());
        assert_eq!(value.get("z"), Some(&DynamicValue::SignedInt(1)));
        assert_eq!(value.get("a"), Some(&DynamicValue::SignedInt(-2)));
        assert_eq!(value.get("big"), Some(&DynamicValue::UnsignedInt(u64::MAX)));
        assert_eq!(value.get("f"), Some(&DynamicValue::Double(1.5)));
        let keys: Vec<&String> = value.as_map().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "big", "f", "s", "l"]);
        assert_eq!(value.to_json(), doc);
    }

    #[test]
    fn json_value_is_a_container() {
        let doc = json!({"pets": [{"name": "Morven"}]});
        let map = doc.as_map().unwrap();
        let pets = map.get("pets").unwrap().as_sequence().unwrap();
        assert_eq!(pets.len(), 1);
        let pet = pets.get(0).unwrap().as_map().unwrap();
        assert_eq!(
            pet.get("name").unwrap().as_scalar(),
            Some(Scalar::Str(Cow::Borrowed("Morven")))
        );
    }

    #[test]
    fn bytes_and_non_finite_doubles() {
        assert_eq!(DynamicValue::Bytes(vec![1, 2]).to_json(), json!([1, 2]));
        assert_eq!(DynamicValue::Double(f64::NAN).to_json(), JsonValue::Null);
    }
}
