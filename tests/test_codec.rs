use std::sync::{Arc, OnceLock};

use msgpack_typed::{
    Decoder, Encoder, EnumType, RecordType, TypeExpr, Value, decode, decode_as, encode,
};

fn roundtrip(value: Value) {
    let bytes = encode(&value).unwrap();
    assert_eq!(value, decode(&bytes).unwrap(), "round-tripping {value:?}");
}

fn dog() -> RecordType {
    RecordType::new(
        "Dog",
        vec![
            ("name".into(), None),
            ("breed".into(), None),
            ("is_good_boy".into(), Some(Value::Bool(true))),
        ],
        || vec![TypeExpr::Str, TypeExpr::Str, TypeExpr::Bool],
    )
    .unwrap()
}

#[test]
fn test_nil_and_bools() {
    assert_eq!(vec![0xc0], encode(&Value::Null).unwrap());
    assert!(decode(&[0xc0]).unwrap().is_null());
    roundtrip(Value::Bool(true));
    roundtrip(Value::Bool(false));
}

#[test]
fn test_integer_width_boundaries() {
    // (value, leading byte, total length)
    let cases: [(i64, u8, usize); 18] = [
        (0, 0x00, 1),
        (127, 0x7f, 1),
        (128, 0xcc, 2),
        (255, 0xcc, 2),
        (256, 0xcd, 3),
        (32767, 0xcd, 3),
        (32768, 0xcd, 3),
        (65535, 0xcd, 3),
        (65536, 0xce, 5),
        ((1 << 31) - 1, 0xce, 5),
        (1 << 31, 0xce, 5),
        ((1 << 32) - 1, 0xce, 5),
        (1 << 32, 0xcf, 9),
        (i64::MAX, 0xcf, 9),
        (-32, 0xe0, 1),
        (-33, 0xd0, 2),
        (-128, 0xd0, 2),
        (-129, 0xd1, 3),
    ];
    for (value, prefix, len) in cases {
        let bytes = encode(&Value::Int(value)).unwrap();
        assert_eq!(prefix, bytes[0], "prefix for {value}");
        assert_eq!(len, bytes.len(), "length for {value}");
        assert_eq!(Value::Int(value), decode(&bytes).unwrap());
    }

    let more: [(i64, u8); 5] = [
        (-32768, 0xd1),
        (-32769, 0xd2),
        (-(1 << 31), 0xd2),
        (-(1 << 31) - 1, 0xd3),
        (i64::MIN, 0xd3),
    ];
    for (value, prefix) in more {
        let bytes = encode(&Value::Int(value)).unwrap();
        assert_eq!(prefix, bytes[0], "prefix for {value}");
        assert_eq!(Value::Int(value), decode(&bytes).unwrap());
    }

    // values beyond i64 use uint64 and come back numerically equal
    let bytes = encode(&Value::Uint(u64::MAX)).unwrap();
    assert_eq!(0xcf, bytes[0]);
    assert_eq!(Value::Uint(u64::MAX), decode(&bytes).unwrap());
    let bytes = encode(&Value::Uint(1 << 63)).unwrap();
    assert_eq!(0xcf, bytes[0]);
    assert_eq!(Value::Uint(1 << 63), decode(&bytes).unwrap());
    // a uint that fits i64 picks the same token as the int would
    assert_eq!(vec![0x2a], encode(&Value::Uint(42)).unwrap());
}

#[test]
fn test_string_length_boundaries() {
    let cases: [(usize, u8, usize); 9] = [
        (0, 0xa0, 1),
        (15, 0xaf, 1),
        (16, 0xb0, 1),
        (31, 0xbf, 1),
        (32, 0xd9, 2),
        (255, 0xd9, 2),
        (256, 0xda, 3),
        (65535, 0xda, 3),
        (65536, 0xdb, 5),
    ];
    for (len, prefix, header) in cases {
        let s = "x".repeat(len);
        let bytes = encode(&Value::Str(s.clone())).unwrap();
        assert_eq!(prefix, bytes[0], "prefix for string of length {len}");
        assert_eq!(header + len, bytes.len());
        assert_eq!(Value::Str(s), decode(&bytes).unwrap());
    }
}

#[test]
fn test_bin_length_boundaries() {
    let cases: [(usize, u8); 5] = [(0, 0xc4), (255, 0xc4), (256, 0xc5), (65535, 0xc5), (65536, 0xc6)];
    for (len, prefix) in cases {
        let b = vec![0xabu8; len];
        let bytes = encode(&Value::Bytes(b.clone())).unwrap();
        assert_eq!(prefix, bytes[0], "prefix for bin of length {len}");
        assert_eq!(Value::Bytes(b), decode(&bytes).unwrap());
    }
}

#[test]
fn test_array_length_boundaries() {
    let cases: [(usize, u8); 7] = [
        (0, 0x90),
        (15, 0x9f),
        (16, 0xdc),
        (255, 0xdc),
        (256, 0xdc),
        (65535, 0xdc),
        (65536, 0xdd),
    ];
    for (len, prefix) in cases {
        let items = vec![Value::Int(7); len];
        let bytes = encode(&Value::List(items.clone())).unwrap();
        assert_eq!(prefix, bytes[0], "prefix for array of length {len}");
        assert_eq!(Value::List(items), decode(&bytes).unwrap());
    }
}

#[test]
fn test_map_length_headers() {
    for (len, prefix) in [(0usize, 0x80u8), (15, 0x8f), (16, 0xde), (65535, 0xde), (65536, 0xdf)] {
        let pairs: Vec<(Value, Value)> = (0..len)
            .map(|i| (Value::Int(i as i64), Value::Null))
            .collect();
        let bytes = encode(&Value::Map(pairs)).unwrap();
        assert_eq!(prefix, bytes[0], "prefix for map of length {len}");
    }
    // decode round-trip at the fix/16 boundary
    let pairs: Vec<(Value, Value)> = (0..16)
        .map(|i| (Value::Int(i), Value::Int(i * 2)))
        .collect();
    let value = Value::Map(pairs);
    assert_eq!(value, decode(&encode(&value).unwrap()).unwrap());
}

#[test]
fn test_spec_examples() {
    assert_eq!(vec![0x7f], encode(&Value::Int(127)).unwrap());
    assert_eq!(vec![0xcc, 0x80], encode(&Value::Int(128)).unwrap());
    assert_eq!(vec![0xe0], encode(&Value::Int(-32)).unwrap());
    assert_eq!(vec![0xd0, 0xdf], encode(&Value::Int(-33)).unwrap());
    assert_eq!(vec![0xa2, 0x68, 0x69], encode(&Value::Str("hi".into())).unwrap());
    let long = encode(&Value::Str("x".repeat(32))).unwrap();
    assert_eq!(&[0xd9, 0x20], &long[..2]);
    assert_eq!(
        vec![0x93, 0x01, 0x02, 0x03],
        encode(&Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])).unwrap()
    );
}

#[test]
fn test_untyped_composite_roundtrip() {
    roundtrip(Value::List(vec![
        Value::Null,
        Value::Bool(true),
        Value::Int(-7),
        Value::Float(2.5),
        Value::Str("nested".into()),
        Value::Bytes(vec![1, 2, 3]),
        Value::Map(vec![
            (Value::Str("a".into()), Value::List(vec![Value::Int(1)])),
            (Value::Int(2), Value::Null),
        ]),
    ]));
}

#[test]
fn test_floats() {
    for x in [0.0, -0.0, 1.5, -1.5, f64::MAX, f64::MIN_POSITIVE, 1e-320] {
        let bytes = encode(&Value::Float(x)).unwrap();
        assert_eq!(0xcb, bytes[0]);
        assert_eq!(9, bytes.len());
        match decode(&bytes).unwrap() {
            Value::Float(back) => assert_eq!(x.to_bits(), back.to_bits()),
            other => panic!("expected float, got {other:?}"),
        }
    }
    // float32 is accepted on decode
    let mut buf = vec![0xca];
    buf.extend(1.5f32.to_bits().to_be_bytes());
    assert_eq!(Value::Float(1.5), decode(&buf).unwrap());
}

#[test]
fn test_typed_scalars() {
    assert_eq!(Value::Int(3), decode_as(&[0x03], &TypeExpr::Int).unwrap());
    assert_eq!(
        Value::Bool(true),
        decode_as(&[0xc3], &TypeExpr::Bool).unwrap()
    );
    assert_eq!(
        Value::Float(1.0),
        decode_as(&encode(&Value::Int(1)).unwrap(), &TypeExpr::Float).unwrap()
    );
    assert_eq!(
        Value::Float(1.5),
        decode_as(&encode(&Value::Float(1.5)).unwrap(), &TypeExpr::Float).unwrap()
    );
    let err = decode_as(&[0xc3], &TypeExpr::Int).unwrap_err();
    assert_eq!(
        "Error decoding `int`: expected `int`, got `bool`",
        err.to_string()
    );
    let err = decode_as(&[0xc0], &TypeExpr::Str).unwrap_err();
    assert_eq!(
        "Error decoding `str`: expected `str`, got `None`",
        err.to_string()
    );
}

#[test]
fn test_typed_containers() {
    let ty = TypeExpr::list(TypeExpr::Int);
    let value = Value::List(vec![Value::Int(1), Value::Int(2)]);
    assert_eq!(value, decode_as(&encode(&value).unwrap(), &ty).unwrap());

    let ty = TypeExpr::dict(TypeExpr::Str, TypeExpr::Int);
    let value = Value::Map(vec![
        (Value::from("a"), Value::Int(1)),
        (Value::from("b"), Value::Int(2)),
    ]);
    assert_eq!(value, decode_as(&encode(&value).unwrap(), &ty).unwrap());

    // tuples decode from arrays
    let ty = TypeExpr::Tuple(vec![TypeExpr::Int, TypeExpr::Str]);
    let wire = encode(&Value::List(vec![Value::Int(1), Value::from("x")])).unwrap();
    assert_eq!(
        Value::Tuple(vec![Value::Int(1), Value::from("x")]),
        decode_as(&wire, &ty).unwrap()
    );

    let ty = TypeExpr::var_tuple(TypeExpr::Int);
    let wire = encode(&Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])).unwrap();
    assert_eq!(
        Value::Tuple(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        decode_as(&wire, &ty).unwrap()
    );
}

#[test]
fn test_fixtuple_arity_mismatch() {
    let ty = TypeExpr::Tuple(vec![TypeExpr::Int, TypeExpr::Int]);
    let wire = encode(&Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])).unwrap();
    let err = decode_as(&wire, &ty).unwrap_err();
    assert_eq!(
        "Error decoding `Tuple[int, int]`: expected tuple of length 2, got 3",
        err.to_string()
    );
}

#[test]
fn test_set_roundtrip_and_duplicates() {
    let ty = TypeExpr::set(TypeExpr::Int);
    let value = Value::Set(vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
    let back = decode_as(&encode(&value).unwrap(), &ty).unwrap();
    assert_eq!(value, back);

    // duplicates on the wire collapse
    let wire = encode(&Value::List(vec![Value::Int(1), Value::Int(1), Value::Int(2)])).unwrap();
    assert_eq!(
        Value::Set(vec![Value::Int(1), Value::Int(2)]),
        decode_as(&wire, &ty).unwrap()
    );
}

#[test]
fn test_bytes_and_bytearray_schemas() {
    let wire = encode(&Value::Bytes(vec![1, 2, 3])).unwrap();
    assert_eq!(
        Value::Bytes(vec![1, 2, 3]),
        decode_as(&wire, &TypeExpr::Bytes).unwrap()
    );
    assert_eq!(
        Value::ByteArray(vec![1, 2, 3]),
        decode_as(&wire, &TypeExpr::ByteArray).unwrap()
    );
    let err = decode_as(&[0xa1, b'x'], &TypeExpr::Bytes).unwrap_err();
    assert_eq!(
        "Error decoding `bytes`: expected `bytes`, got `str`",
        err.to_string()
    );
}

#[test]
fn test_optional_schemas() {
    let ty = TypeExpr::optional(TypeExpr::Str);
    assert_eq!(Value::Null, decode_as(&[0xc0], &ty).unwrap());
    assert_eq!(
        Value::Str("ok".into()),
        decode_as(&encode(&Value::from("ok")).unwrap(), &ty).unwrap()
    );
    // nil is not accepted by the bare schema
    assert!(decode_as(&[0xc0], &TypeExpr::Str).is_err());
    // the null type only accepts nil
    assert_eq!(Value::Null, decode_as(&[0xc0], &TypeExpr::Null).unwrap());
    let err = decode_as(&[0x01], &TypeExpr::Null).unwrap_err();
    assert_eq!(
        "Error decoding `None`: expected `None`, got `int`",
        err.to_string()
    );
}

#[test]
fn test_record_roundtrip() {
    let dog = dog();
    let snickers = dog
        .instance(
            vec![Value::from("snickers"), Value::from("corgi")],
            vec![],
        )
        .unwrap();
    let wire = encode(&Value::Record(snickers.clone())).unwrap();

    // encodes as a map of all fields in declaration order
    let expected = encode(&Value::Map(vec![
        (Value::from("name"), Value::from("snickers")),
        (Value::from("breed"), Value::from("corgi")),
        (Value::from("is_good_boy"), Value::Bool(true)),
    ]))
    .unwrap();
    assert_eq!(expected, wire);

    let back = decode_as(&wire, &TypeExpr::Record(dog.clone())).unwrap();
    assert_eq!(Value::Record(snickers), back);

    // the explicit construction with the default equals the filled-in one
    let explicit = dog
        .instance(
            vec![
                Value::from("snickers"),
                Value::from("corgi"),
                Value::Bool(true),
            ],
            vec![],
        )
        .unwrap();
    assert_eq!(Value::Record(explicit), back);
}

#[test]
fn test_record_missing_required_field() {
    let dog = dog();
    // {"name": "x"}
    let wire = [0x81, 0xa4, b'n', b'a', b'm', b'e', 0xa1, b'x'];
    let err = decode_as(&wire, &TypeExpr::Record(dog)).unwrap_err();
    assert_eq!(
        "Error decoding `Dog`: missing required field `breed`",
        err.to_string()
    );
}

#[test]
fn test_record_field_type_error() {
    let dog = dog();
    let wire = encode(&Value::Map(vec![
        (Value::from("name"), Value::Int(1)),
        (Value::from("breed"), Value::from("corgi")),
    ]))
    .unwrap();
    let err = decode_as(&wire, &TypeExpr::Record(dog)).unwrap_err();
    assert_eq!(
        "Error decoding `Dog` field `name` (`str`): expected `str`, got `int`",
        err.to_string()
    );
}

#[test]
fn test_record_unknown_fields_skipped() {
    let dog = dog();
    let wire = encode(&Value::Map(vec![
        (Value::from("color"), Value::from("brown")),
        (Value::from("name"), Value::from("rex")),
        // unknown fields with nested payloads are skipped structurally
        (
            Value::from("extras"),
            Value::Map(vec![(
                Value::from("k"),
                Value::List(vec![Value::Int(1), Value::Null, Value::from("s")]),
            )]),
        ),
        (Value::from("breed"), Value::from("lab")),
    ]))
    .unwrap();
    let back = decode_as(&wire, &TypeExpr::Record(dog.clone())).unwrap();
    let expected = dog
        .instance(vec![Value::from("rex"), Value::from("lab")], vec![])
        .unwrap();
    assert_eq!(Value::Record(expected), back);
}

#[test]
fn test_record_out_of_order_keys() {
    let dog = dog();
    let wire = encode(&Value::Map(vec![
        (Value::from("is_good_boy"), Value::Bool(false)),
        (Value::from("breed"), Value::from("lab")),
        (Value::from("name"), Value::from("rex")),
    ]))
    .unwrap();
    let back = decode_as(&wire, &TypeExpr::Record(dog.clone())).unwrap();
    let expected = dog
        .instance(
            vec![Value::from("rex"), Value::from("lab"), Value::Bool(false)],
            vec![],
        )
        .unwrap();
    assert_eq!(Value::Record(expected), back);
}

#[test]
fn test_record_defaults_not_aliased() {
    let bag = RecordType::new(
        "Bag",
        vec![("items".into(), Some(Value::List(vec![])))],
        || vec![TypeExpr::list(TypeExpr::Int)],
    )
    .unwrap();
    let wire = encode(&Value::Map(vec![])).unwrap();
    let a = decode_as(&wire, &TypeExpr::Record(bag.clone())).unwrap();
    let b = decode_as(&wire, &TypeExpr::Record(bag.clone())).unwrap();
    assert_eq!(a, b);
    let filled = bag
        .instance(vec![Value::List(vec![Value::Int(9)])], vec![])
        .unwrap();
    assert_ne!(Value::Record(filled), b);
    let Value::Record(b) = b else { unreachable!() };
    assert_eq!(Some(&Value::List(vec![])), b.get("items"));
}

#[test]
fn test_recursive_record() {
    let slot: Arc<OnceLock<RecordType>> = Arc::new(OnceLock::new());
    let captured = slot.clone();
    let tree = RecordType::new(
        "Tree",
        vec![
            ("value".into(), None),
            ("children".into(), Some(Value::List(vec![]))),
        ],
        move || {
            let this = captured.get().expect("declared").clone();
            vec![TypeExpr::Int, TypeExpr::list(TypeExpr::Record(this))]
        },
    )
    .unwrap();
    slot.set(tree.clone()).ok().unwrap();

    let leaf = tree.instance(vec![Value::Int(2)], vec![]).unwrap();
    let root = tree
        .instance(
            vec![
                Value::Int(1),
                Value::List(vec![Value::Record(leaf.clone())]),
            ],
            vec![],
        )
        .unwrap();
    let wire = encode(&Value::Record(root.clone())).unwrap();
    let back = decode_as(&wire, &TypeExpr::Record(tree.clone())).unwrap();
    assert_eq!(Value::Record(root), back);
}

#[test]
fn test_enum_roundtrip() {
    let fruit = EnumType::new("Fruit", ["apple", "banana"]).unwrap();
    let apple = fruit.member("apple").unwrap();
    let wire = encode(&Value::Enum(apple.clone())).unwrap();
    // plain enums travel as their name
    assert_eq!(encode(&Value::from("apple")).unwrap(), wire);
    assert_eq!(
        Value::Enum(apple),
        decode_as(&wire, &TypeExpr::Enum(fruit.clone())).unwrap()
    );

    let wire = encode(&Value::from("grape")).unwrap();
    let err = decode_as(&wire, &TypeExpr::Enum(fruit)).unwrap_err();
    assert_eq!(
        "Error decoding enum `Fruit`: invalid name `grape`",
        err.to_string()
    );
}

#[test]
fn test_int_enum_roundtrip() {
    let level = EnumType::int_based("Level", [("LOW", 1), ("HIGH", 10)]).unwrap();
    let high = level.member_by_value(10).unwrap();
    let wire = encode(&Value::Enum(high.clone())).unwrap();
    // integer enums travel as their value
    assert_eq!(vec![0x0a], wire);
    assert_eq!(
        Value::Enum(high),
        decode_as(&wire, &TypeExpr::Enum(level.clone())).unwrap()
    );

    let err = decode_as(&[0x07], &TypeExpr::Enum(level)).unwrap_err();
    assert_eq!(
        "Error decoding enum `Level`: invalid value `7`",
        err.to_string()
    );
}

#[test]
fn test_unsupported_type_error() {
    let err = Decoder::new(&TypeExpr::Union(vec![TypeExpr::Int, TypeExpr::Str])).unwrap_err();
    assert_eq!("Type `Union[int, str]` is not supported", err.to_string());
}

#[test]
fn test_encoder_reuse_produces_identical_output() {
    let mut enc = Encoder::with_buffer_size(64);
    let value = Value::List(vec![Value::from("steady"), Value::Int(1)]);
    let first = enc.encode(&value).unwrap();
    let second = enc.encode(&value).unwrap();
    assert_eq!(first, second);
    // a large payload grows past the steady buffer, then service resumes
    let big = Value::Str("y".repeat(10_000));
    assert_eq!(10_003, enc.encode(&big).unwrap().len());
    assert_eq!(first, enc.encode(&value).unwrap());
}

#[test]
fn test_trailing_bytes_ignored() {
    assert_eq!(Value::Int(1), decode(&[0x01, 0xff]).unwrap());
}

#[test]
fn test_truncated_inputs() {
    for buf in [
        &[0xcc][..],
        &[0xd9][..],
        &[0xd9, 0x05, b'a'][..],
        &[0x92, 0x01][..],
        &[0x81, 0xa1, b'k'][..],
        &[0xcb, 0, 0, 0][..],
    ] {
        assert_eq!(
            "input data was truncated",
            decode(buf).unwrap_err().to_string(),
            "decoding {buf:?}"
        );
    }
}
