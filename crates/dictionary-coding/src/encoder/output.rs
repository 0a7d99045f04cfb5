//! Copying an encoded tree into a caller-chosen container type.

use std::collections::{BTreeMap, HashMap};

use dictionary_value::{DynamicValue, ValueKind, ValueMap};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::{EncodeError, EncodeResult};
use crate::path::CodingPath;

/// A container an encoded [`DynamicValue`] can be delivered as.
pub trait FromDynamicValue: Sized {
    fn from_dynamic_value(value: DynamicValue) -> EncodeResult<Self>;
}

fn expect_map(value: DynamicValue) -> EncodeResult<ValueMap> {
    match value {
        DynamicValue::Map(map) => Ok(map),
        other => Err(EncodeError::TypeMismatch {
            path: CodingPath::root(),
            expected: ValueKind::Map.to_string(),
            found: other.kind().to_string(),
        }),
    }
}

impl FromDynamicValue for DynamicValue {
    fn from_dynamic_value(value: DynamicValue) -> EncodeResult<Self> {
        Ok(value)
    }
}

impl FromDynamicValue for ValueMap {
    fn from_dynamic_value(value: DynamicValue) -> EncodeResult<Self> {
        expect_map(value)
    }
}

impl FromDynamicValue for HashMap<String, DynamicValue> {
    fn from_dynamic_value(value: DynamicValue) -> EncodeResult<Self> {
        Ok(expect_map(value)?.into_iter().collect())
    }
}

impl FromDynamicValue for BTreeMap<String, DynamicValue> {
    fn from_dynamic_value(value: DynamicValue) -> EncodeResult<Self> {
        Ok(expect_map(value)?.into_iter().collect())
    }
}

impl FromDynamicValue for Vec<DynamicValue> {
    fn from_dynamic_value(value: DynamicValue) -> EncodeResult<Self> {
        match value {
            DynamicValue::Array(items) => Ok(items),
            other => Err(EncodeError::TypeMismatch {
                path: CodingPath::root(),
                expected: ValueKind::Array.to_string(),
                found: other.kind().to_string(),
            }),
        }
    }
}

impl FromDynamicValue for JsonValue {
    fn from_dynamic_value(value: DynamicValue) -> EncodeResult<Self> {
        Ok(value.to_json())
    }
}

impl FromDynamicValue for JsonMap<String, JsonValue> {
    fn from_dynamic_value(value: DynamicValue) -> EncodeResult<Self> {
        Ok(expect_map(value)?
            .into_iter()
            .map(|(key, value)| (key, value.to_json()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn map_outputs_require_a_map() {
        let err = ValueMap::from_dynamic_value(DynamicValue::from(3_i64)).unwrap_err();
        assert!(matches!(err, EncodeError::TypeMismatch { .. }));
        let err = Vec::<DynamicValue>::from_dynamic_value(DynamicValue::Null).unwrap_err();
        assert_eq!(err.path(), &CodingPath::root());
    }

    #[test]
    fn json_output_keeps_order() {
        let tree: DynamicValue = [("z", 1_i64), ("a", 2_i64)].into_iter().collect();
        let json = JsonValue::from_dynamic_value(tree.clone()).unwrap();
        assert_eq!(json, json!({"z": 1, "a": 2}));
        let keys: Vec<String> = JsonMap::from_dynamic_value(tree)
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
