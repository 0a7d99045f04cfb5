use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dictionary_coding::{
    Blob, DataStrategy, DateStrategy, DynamicValue, EncodeError, Encoder, Identifier, Locator,
    Timestamp, ValueMap,
};
use serde::Serialize;
use serde_json::json;

#[derive(Serialize)]
struct Pet {
    name: String,
}

#[derive(Serialize)]
struct Person {
    name: String,
    age: i64,
    pets: Vec<Pet>,
}

#[derive(Serialize)]
struct Labelled {
    name: String,
    label: Option<String>,
}

#[derive(Serialize)]
struct JustDate {
    date: Timestamp,
}

#[derive(Serialize)]
struct JustData {
    data: Blob,
}

#[derive(Serialize)]
struct AllTheTypes {
    string: String,
    int: isize,
    int8: i8,
    int16: i16,
    int32: i32,
    int64: i64,
    uint: usize,
    uint8: u8,
    uint16: u16,
    uint32: u32,
    uint64: u64,
    float: f32,
    double: f64,
    bool: bool,
    date: Timestamp,
    data: Blob,
}

fn sam() -> Person {
    Person {
        name: "Sam".into(),
        age: 48,
        pets: vec![
            Pet {
                name: "Morven".into(),
            },
            Pet {
                name: "Rebus".into(),
            },
        ],
    }
}

fn sample_date() -> JustDate {
    JustDate {
        date: Timestamp::from_reference_seconds(123_456.789),
    }
}

fn field(value: &DynamicValue, key: &str) -> DynamicValue {
    value.get(key).cloned().unwrap_or_else(|| panic!("missing key {key}"))
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= expected.abs() * 1e-12,
        "expected {expected}, got {actual}"
    );
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

#[test]
fn person_encodes_to_nested_maps_and_lists() {
    let encoded = Encoder::new().encode(&sam()).unwrap();
    assert_eq!(field(&encoded, "name"), DynamicValue::from("Sam"));
    assert_eq!(field(&encoded, "age"), DynamicValue::SignedInt(48));
    let pets = field(&encoded, "pets");
    let pets = pets.as_array().unwrap();
    assert_eq!(pets[0].get("name"), Some(&DynamicValue::from("Morven")));
    assert_eq!(pets[1].get("name"), Some(&DynamicValue::from("Rebus")));

    let keys: Vec<&String> = encoded.as_map().unwrap().keys().collect();
    assert_eq!(keys, vec!["name", "age", "pets"]);
}

#[test]
fn nil_optionals_are_omitted_not_null() {
    let encoded = Encoder::new()
        .encode(&Labelled {
            name: "Sam".into(),
            label: None,
        })
        .unwrap();
    let map = encoded.as_map().unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("name"), Some(&DynamicValue::from("Sam")));

    let with_label = Encoder::new()
        .encode(&Labelled {
            name: "Sam".into(),
            label: Some("x".into()),
        })
        .unwrap();
    assert_eq!(with_label.as_map().unwrap().len(), 2);
}

#[test]
fn top_level_none_is_null() {
    let none: Option<i32> = None;
    assert_eq!(Encoder::new().encode(&none).unwrap(), DynamicValue::Null);
}

#[test]
fn all_the_types_matrix() {
    let test = AllTheTypes {
        string: "blah".into(),
        int: -123_456,
        int8: -123,
        int16: -12_345,
        int32: -123_456,
        int64: -123_456_789,
        uint: 123_456,
        uint8: 123,
        uint16: 12_345,
        uint32: 123_456,
        uint64: 123_456_789,
        float: 123.456,
        double: 12_345.6789,
        bool: true,
        date: Timestamp::from_reference_seconds(123_456.789),
        data: Blob::from("test"),
    };
    let encoded = Encoder::new().encode(&test).unwrap();
    assert_eq!(field(&encoded, "string"), DynamicValue::from("blah"));
    assert_eq!(field(&encoded, "int"), DynamicValue::SignedInt(-123_456));
    assert_eq!(field(&encoded, "int8"), DynamicValue::SignedInt(-123));
    assert_eq!(field(&encoded, "int16"), DynamicValue::SignedInt(-12_345));
    assert_eq!(field(&encoded, "int32"), DynamicValue::SignedInt(-123_456));
    assert_eq!(field(&encoded, "int64"), DynamicValue::SignedInt(-123_456_789));
    assert_eq!(field(&encoded, "uint"), DynamicValue::UnsignedInt(123_456));
    assert_eq!(field(&encoded, "uint8"), DynamicValue::UnsignedInt(123));
    assert_eq!(field(&encoded, "uint16"), DynamicValue::UnsignedInt(12_345));
    assert_eq!(field(&encoded, "uint32"), DynamicValue::UnsignedInt(123_456));
    assert_eq!(field(&encoded, "uint64"), DynamicValue::UnsignedInt(123_456_789));
    assert_eq!(field(&encoded, "float"), DynamicValue::Double(f64::from(123.456_f32)));
    assert_eq!(field(&encoded, "double"), DynamicValue::Double(12_345.6789));
    assert_eq!(field(&encoded, "bool"), DynamicValue::Bool(true));
    assert_eq!(field(&encoded, "date"), DynamicValue::Double(123_456.789));
    assert_eq!(field(&encoded, "data"), DynamicValue::from("dGVzdA=="));
}

#[test]
fn non_finite_doubles_are_kept() {
    let encoded = Encoder::new().encode(&vec![f64::INFINITY]).unwrap();
    assert_eq!(encoded.at(0), Some(&DynamicValue::Double(f64::INFINITY)));
}

// ---------------------------------------------------------------------------
// Date strategies
// ---------------------------------------------------------------------------

#[test]
fn date_strategy_matrix() {
    let date = sample_date();
    let mut encoder = Encoder::new();

    let deferred = encoder.encode(&date).unwrap();
    assert_eq!(field(&deferred, "date"), DynamicValue::Double(123_456.789));

    encoder.set_date_strategy(DateStrategy::Iso8601);
    let iso = encoder.encode(&date).unwrap();
    assert_eq!(field(&iso, "date"), DynamicValue::from("2001-01-02T10:17:36Z"));

    encoder.set_date_strategy(DateStrategy::MillisecondsSince1970);
    let millis = encoder.encode(&date).unwrap();
    assert_close(field(&millis, "date").as_f64().unwrap(), 978_430_656_789.0);

    encoder.set_date_strategy(DateStrategy::SecondsSince1970);
    let seconds = encoder.encode(&date).unwrap();
    assert_close(field(&seconds, "date").as_f64().unwrap(), 978_430_656.789);

    encoder.set_date_strategy(DateStrategy::formatted("%B %-d"));
    let formatted = encoder.encode(&date).unwrap();
    assert_eq!(field(&formatted, "date"), DynamicValue::from("January 2"));
}

#[test]
fn custom_date_strategy_is_invoked() {
    let called = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&called);
    let encoder = Encoder::new().with_date_strategy(DateStrategy::custom(
        move |_, encoder| {
            seen.store(true, Ordering::SeqCst);
            encoder.encode("some custom encoding")
        },
        |_| unreachable!("decode hook is not used when encoding"),
    ));
    let encoded = encoder.encode(&sample_date()).unwrap();
    assert_eq!(field(&encoded, "date"), DynamicValue::from("some custom encoding"));
    assert!(called.load(Ordering::SeqCst));
}

#[test]
fn custom_hook_output_need_not_be_scalar() {
    let encoder = Encoder::new().with_date_strategy(DateStrategy::custom(
        |date, encoder| {
            let mut parts = ValueMap::new();
            parts.insert("unix".into(), date.unix_seconds().floor().into());
            encoder.encode_value(parts);
            Ok(())
        },
        |_| unreachable!(),
    ));
    let encoded = encoder.encode(&sample_date()).unwrap();
    assert_eq!(
        field(&encoded, "date").get("unix"),
        Some(&DynamicValue::Double(978_430_656.0))
    );
}

#[test]
fn silent_custom_hook_writes_an_empty_map() {
    let encoder = Encoder::new().with_data_strategy(DataStrategy::custom(
        |_, _| Ok(()),
        |_| unreachable!(),
    ));
    let encoded = encoder
        .encode(&JustData {
            data: Blob::from("x"),
        })
        .unwrap();
    assert_eq!(field(&encoded, "data"), DynamicValue::Map(ValueMap::new()));
}

#[test]
fn iso8601_dates_truncate_fractional_seconds() {
    let encoder = Encoder::new().with_date_strategy(DateStrategy::Iso8601);
    let encoded = encoder
        .encode(&JustDate {
            date: Timestamp::from_reference_seconds(123_456.999_999_999_9),
        })
        .unwrap();
    assert_eq!(field(&encoded, "date"), DynamicValue::from("2001-01-02T10:17:36Z"));
}

#[test]
fn unrepresentable_dates_fail_with_path() {
    let encoder = Encoder::new().with_date_strategy(DateStrategy::Iso8601);
    let err = encoder
        .encode(&JustDate {
            date: Timestamp::from_reference_seconds(f64::NAN),
        })
        .unwrap_err();
    assert!(matches!(err, EncodeError::InvalidValue { .. }));
    assert_eq!(err.path().names(), vec!["date"]);
}

// ---------------------------------------------------------------------------
// Data strategies
// ---------------------------------------------------------------------------

#[test]
fn data_strategy_matrix() {
    let data = JustData {
        data: Blob::from("blah"),
    };

    let base64 = Encoder::new()
        .with_data_strategy(DataStrategy::Base64)
        .encode(&data)
        .unwrap();
    assert_eq!(field(&base64, "data"), DynamicValue::from("YmxhaA=="));

    let deferred = Encoder::new()
        .with_data_strategy(DataStrategy::DeferredToNative)
        .encode(&data)
        .unwrap();
    assert_eq!(
        field(&deferred, "data"),
        DynamicValue::Array(vec![98_u8.into(), 108_u8.into(), 97_u8.into(), 104_u8.into()])
    );

    let called = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&called);
    let custom = Encoder::new()
        .with_data_strategy(DataStrategy::custom(
            move |_, encoder| {
                seen.store(true, Ordering::SeqCst);
                encoder.encode("some custom encoding")
            },
            |_| unreachable!(),
        ))
        .encode(&data)
        .unwrap();
    assert_eq!(field(&custom, "data"), DynamicValue::from("some custom encoding"));
    assert!(called.load(Ordering::SeqCst));
}

// ---------------------------------------------------------------------------
// Semantic leaves, enums, keys
// ---------------------------------------------------------------------------

#[test]
fn identifiers_and_locators_encode_as_text() {
    #[derive(Serialize)]
    struct Links {
        id: Identifier,
        home: Locator,
    }
    let id = Identifier::new_v4();
    let encoded = Encoder::new()
        .encode(&Links {
            id,
            home: Locator::parse("http://elegantchaos.com").unwrap(),
        })
        .unwrap();
    assert_eq!(field(&encoded, "id"), DynamicValue::from(id.canonical()));
    assert_eq!(field(&encoded, "home"), DynamicValue::from("http://elegantchaos.com/"));
}

#[test]
fn enums_are_externally_tagged() {
    #[derive(Serialize)]
    enum Shape {
        Empty,
        Circle(f64),
        Point(i32, i32),
        Rect { w: u8, h: u8 },
    }
    let encoder = Encoder::new();
    assert_eq!(encoder.encode(&Shape::Empty).unwrap(), DynamicValue::from("Empty"));
    assert_eq!(
        encoder.encode(&Shape::Circle(1.5)).unwrap().to_json(),
        json!({"Circle": 1.5})
    );
    assert_eq!(
        encoder.encode(&Shape::Point(1, -2)).unwrap().to_json(),
        json!({"Point": [1, -2]})
    );
    assert_eq!(
        encoder.encode(&Shape::Rect { w: 2, h: 3 }).unwrap().to_json(),
        json!({"Rect": {"w": 2, "h": 3}})
    );
}

#[test]
fn custom_serialize_errors_carry_their_path() {
    struct Broken;
    impl Serialize for Broken {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("nope"))
        }
    }
    #[derive(Serialize)]
    struct Holder {
        items: Vec<Broken>,
    }
    let err = Encoder::new()
        .encode(&Holder {
            items: vec![Broken],
        })
        .unwrap_err();
    match &err {
        EncodeError::Custom { path, message } => {
            assert_eq!(message, "nope");
            assert_eq!(path.names(), vec!["items", "0"]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn oversized_integers_are_rejected() {
    let err = Encoder::new().encode(&(u128::MAX)).unwrap_err();
    assert!(matches!(err, EncodeError::InvalidValue { .. }));
    assert_eq!(
        Encoder::new().encode(&(-5_i128)).unwrap(),
        DynamicValue::SignedInt(-5)
    );
}

// ---------------------------------------------------------------------------
// Output containers
// ---------------------------------------------------------------------------

#[test]
fn encode_as_output_matrix() {
    let encoder = Encoder::new();

    let ordered: ValueMap = encoder.encode_as(&sam()).unwrap();
    assert_eq!(ordered.get_index(0).map(|(k, _)| k.as_str()), Some("name"));

    let hashed: HashMap<String, DynamicValue> = encoder.encode_as(&sam()).unwrap();
    assert_eq!(hashed.get("age"), Some(&DynamicValue::SignedInt(48)));

    let sorted: BTreeMap<String, DynamicValue> = encoder.encode_as(&sam()).unwrap();
    assert_eq!(
        sorted.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["age", "name", "pets"]
    );

    let json: serde_json::Value = encoder.encode_as(&sam()).unwrap();
    assert_eq!(
        json,
        json!({"name": "Sam", "age": 48, "pets": [{"name": "Morven"}, {"name": "Rebus"}]})
    );

    let err = encoder.encode_as::<ValueMap, _>(&5_u8).unwrap_err();
    assert!(matches!(err, EncodeError::TypeMismatch { .. }));
}

#[test]
fn reconfiguring_a_clone_leaves_the_original_alone() {
    let original = Encoder::new();
    let mut copy = original.clone();
    copy.set_date_strategy(DateStrategy::Iso8601);
    assert_eq!(original.config().date.name(), "deferredToNative");
    assert_eq!(copy.config().date.name(), "iso8601");
}
