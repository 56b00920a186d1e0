//! Property-based tests for the codec's round-trip guarantees.

use php_serialize_core::{
    from_bytes, to_bytes, ArrayKey, PhpArray, PhpObject, PhpObjectSerialized, PhpSplArray,
    PhpValue,
};
use proptest::collection::vec;
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = PhpValue> {
    prop_oneof![
        Just(PhpValue::Null),
        any::<bool>().prop_map(PhpValue::Bool),
        any::<i64>().prop_map(PhpValue::Int),
        any::<f64>()
            .prop_filter("NaN never compares equal", |f| !f.is_nan())
            .prop_map(PhpValue::Float),
        vec(any::<u8>(), 0..16).prop_map(PhpValue::String),
    ]
}

fn key() -> impl Strategy<Value = ArrayKey> {
    prop_oneof![
        any::<i64>().prop_map(ArrayKey::Int),
        vec(any::<u8>(), 0..8).prop_map(ArrayKey::String),
    ]
}

fn value() -> impl Strategy<Value = PhpValue> {
    scalar().prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            vec((key(), inner.clone()), 0..8)
                .prop_map(|entries| PhpValue::from(entries.into_iter().collect::<PhpArray>())),
            ("[A-Za-z_][A-Za-z0-9_]{0,10}", vec((key(), inner.clone()), 0..6)).prop_map(
                |(class_name, entries)| {
                    let mut object = PhpObject::new(class_name);
                    object.set_members(entries.into_iter().collect());
                    PhpValue::from(object)
                }
            ),
            ("[A-Z][A-Za-z]{0,8}", vec(any::<u8>(), 0..16)).prop_map(|(class_name, data)| {
                PhpValue::from(PhpObjectSerialized::new(class_name).with_data(data))
            }),
            (any::<i64>(), vec((key(), inner), 0..4), any::<bool>()).prop_map(
                |(flags, entries, null_properties)| {
                    let array = PhpValue::from(entries.into_iter().collect::<PhpArray>());
                    let properties = null_properties.then_some(PhpValue::Null);
                    PhpValue::from(PhpSplArray::new(Some(array), properties).with_flags(flags))
                }
            ),
        ]
    })
}

proptest! {
    #[test]
    fn prop_round_trip(v in value()) {
        let bytes = to_bytes(&v).unwrap();
        let decoded = from_bytes(&bytes).unwrap();
        prop_assert_eq!(&decoded, &v);
        // Encoding is deterministic, so the decoded tree gives the same bytes
        prop_assert_eq!(to_bytes(&decoded).unwrap(), bytes);
    }

    #[test]
    fn prop_float_bits_survive(bits in any::<u64>()) {
        let f = f64::from_bits(bits);
        let decoded = from_bytes(&to_bytes(&PhpValue::Float(f)).unwrap()).unwrap();
        let back = decoded.as_float().unwrap();
        if f.is_nan() {
            prop_assert!(back.is_nan());
        } else {
            prop_assert_eq!(back.to_bits(), f.to_bits());
        }
    }

    #[test]
    fn prop_set_same_key_twice(
        entries in vec((key(), any::<i64>()), 0..8),
        k in key(),
        a in any::<i64>(),
        b in any::<i64>(),
    ) {
        let mut array: PhpArray = entries.into_iter().collect();
        array.set(k.clone(), a);
        let position = array.keys().position(|x| *x == k);
        array.set(k.clone(), b);

        prop_assert_eq!(array.keys().filter(|x| **x == k).count(), 1);
        prop_assert_eq!(array.keys().position(|x| *x == k), position);
        prop_assert_eq!(array.get(&k), Some(&PhpValue::Int(b)));
    }

    #[test]
    fn prop_shared_handles_stay_shared(copies in 2usize..10, inner in vec(any::<i64>(), 0..4)) {
        let shared = PhpValue::from(PhpArray::from_list(inner));
        let outer = PhpValue::from(PhpArray::from_list(vec![shared; copies]));

        let decoded = from_bytes(&to_bytes(&outer).unwrap()).unwrap();
        let decoded = decoded.as_array().unwrap();
        let first = decoded.get(0).unwrap();
        for v in decoded.values() {
            prop_assert!(v.same_identity(first));
        }
    }

    #[test]
    fn prop_arbitrary_input_does_not_panic(data in vec(any::<u8>(), 0..64)) {
        let _ = from_bytes(&data);
    }

    #[test]
    fn prop_string_length_is_checked(s in "[a-z]{0,10}", declared in 0usize..12) {
        let data = format!("s:{}:\"{}\";", declared, s);
        let result = from_bytes(data.as_bytes());
        prop_assert_eq!(result.is_ok(), declared == s.len());
    }
}
