use keyparty::serializer::normalize;
use keyparty::{Error, JsonSerializer, PassThruSerializer, SerializationErrorKind, Serializer, Table};
use serde_json::{json, Value};

fn sample() -> Table {
    match json!({
        "integer": 1,
        "float": 1.34,
        "string": "some string",
        "array": ["one", "two", "three"],
        "object": {},
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[test]
fn encode_then_decode_is_identity() {
    for ser in [JsonSerializer::new(), JsonSerializer::pretty()] {
        let table = sample();
        let bytes = ser.encode(&table).unwrap();
        assert_eq!(ser.decode(bytes).unwrap(), table);
    }
}

#[test]
fn decode_then_encode_matches_raw_up_to_whitespace() {
    let raw = "{\n  \"b\": [1, 2],\n  \"a\": {\"x\": \"y\"},\n  \"c\": 1.34\n}";
    let ser = JsonSerializer::new();
    let decoded = ser.decode(raw.as_bytes().to_vec()).unwrap();
    let encoded = String::from_utf8(ser.encode(&decoded).unwrap()).unwrap();

    let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    assert_eq!(strip(&encoded), strip(raw));
}

#[test]
fn pretty_output_is_indented_and_compact_is_not() {
    let table = sample();
    let pretty = String::from_utf8(JsonSerializer::pretty().encode(&table).unwrap()).unwrap();
    assert!(pretty.contains('\n'));
    assert!(pretty.contains("  "));
    assert!(JsonSerializer::pretty().is_pretty());

    let compact = String::from_utf8(JsonSerializer::new().encode(&table).unwrap()).unwrap();
    assert!(!compact.contains('\n'));
}

#[test]
fn decode_errors_are_classified() {
    let ser = JsonSerializer::new();
    let kind = |bytes: &[u8]| match ser.decode(bytes.to_vec()) {
        Err(Error::Serialization { kind, .. }) => kind,
        other => panic!("expected serialization error, got {other:?}"),
    };

    assert_eq!(kind(b"{not json"), SerializationErrorKind::Syntax);
    assert_eq!(kind(b"{\"a\": "), SerializationErrorKind::Syntax);
    assert_eq!(kind(b"\"just a string\""), SerializationErrorKind::StateMismatch);
    assert_eq!(kind(&[0xc3, 0x28]), SerializationErrorKind::Encoding);

    let deep = format!("{{\"a\": {}{}}}", "[".repeat(200), "]".repeat(200));
    assert_eq!(kind(deep.as_bytes()), SerializationErrorKind::Depth);
}

#[test]
fn encode_value_normalizes_to_a_mapping() {
    let ser = JsonSerializer::new();
    assert_eq!(ser.encode_value(&json!(null)).unwrap(), b"{}".to_vec());
    assert_eq!(ser.encode_value(&json!({"a": 1})).unwrap(), br#"{"a":1}"#.to_vec());
    assert!(matches!(
        ser.encode_value(&json!([1, 2])),
        Err(Error::Serialization {
            kind: SerializationErrorKind::StateMismatch,
            ..
        })
    ));
    assert!(normalize(&json!("x")).is_err());
}

#[test]
fn pass_thru_is_a_no_op() {
    let ser = PassThruSerializer;
    let table = sample();
    assert_eq!(ser.encode(&table).unwrap(), table);
    assert_eq!(ser.decode(table.clone()).unwrap(), table);
}

fn one_row(value: Value) -> Table {
    let mut table = Table::new();
    table.insert("f".into(), value);
    table
}

fn nested_arrays(levels: usize) -> Value {
    (0..levels).fold(json!(1), |inner, _| Value::Array(vec![inner]))
}

#[test]
fn awkward_floats_survive_a_round_trip() {
    let mut floats = vec![
        1.0715660391465826e-75,
        0.1,
        0.30000000000000004,
        1.34,
        5e-324,
        2.2250738585072014e-308,
        f64::MIN_POSITIVE,
        f64::MAX,
        f64::MIN,
        123456789.12345678,
        -6.02214076e23,
    ];
    // xorshift over raw bit patterns reaches every exponent range
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    while floats.len() < 5_000 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let f = f64::from_bits(state);
        if f.is_finite() && f != 0.0 {
            floats.push(f);
        }
    }

    for ser in [JsonSerializer::new(), JsonSerializer::pretty()] {
        for &f in &floats {
            let bytes = ser.encode(&one_row(json!(f))).unwrap();
            let back = ser.decode(bytes).unwrap();
            let got = back["f"].as_f64().unwrap();
            assert_eq!(got.to_bits(), f.to_bits(), "{f:e} came back as {got:e}");
        }
    }
}

#[test]
fn deepest_encodable_table_decodes_again() {
    let ser = JsonSerializer::new();
    // the table itself is one level
    let table = one_row(nested_arrays(JsonSerializer::MAX_DEPTH - 1));
    let bytes = ser.encode(&table).unwrap();
    assert_eq!(ser.decode(bytes).unwrap(), table);
}

#[test]
fn encode_refuses_what_decode_would_refuse() {
    for levels in [JsonSerializer::MAX_DEPTH, 200, 10_000] {
        let table = one_row(nested_arrays(levels));
        for ser in [JsonSerializer::new(), JsonSerializer::pretty()] {
            assert!(
                matches!(
                    ser.encode(&table),
                    Err(Error::Serialization {
                        kind: SerializationErrorKind::Depth,
                        ..
                    })
                ),
                "{levels} levels encoded"
            );
        }
        assert!(JsonSerializer::new()
            .encode_value(&json!({ "deep": nested_arrays(levels) }))
            .is_err());
        // objects count the same as arrays
        let objects = (0..levels).fold(json!(1), |inner, _| json!({ "x": inner }));
        assert!(JsonSerializer::new().encode(&one_row(objects)).is_err());
    }
}

#[test]
fn bad_unicode_escape_is_a_syntax_error() {
    let ser = JsonSerializer::new();
    for raw in [r#"{"a":"\uDC00"}"#, r#"{"a":"\uZZZZ"}"#, r#"{"a":"\uD800x"}"#] {
        match ser.decode(raw.as_bytes().to_vec()) {
            Err(Error::Serialization { kind, .. }) => {
                assert_eq!(kind, SerializationErrorKind::Syntax, "{raw}")
            }
            other => panic!("{raw} gave {other:?}"),
        }
    }
}
