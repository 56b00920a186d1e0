//! Benchmarks for the PHP serialize codec.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use php_serialize_core::{from_bytes, to_bytes, PhpArray, PhpObject, PhpValue};

const FORM_DATA: &[u8] = br#"a:3:{s:6:"fields";a:3:{i:0;a:3:{s:4:"type";s:4:"text";s:5:"label";s:4:"Name";s:8:"required";b:1;}i:1;a:3:{s:4:"type";s:5:"email";s:5:"label";s:5:"Email";s:8:"required";b:1;}i:2;a:3:{s:4:"type";s:8:"textarea";s:5:"label";s:7:"Message";s:8:"required";b:0;}}s:8:"settings";a:2:{s:11:"submit_text";s:6:"Submit";s:15:"success_message";s:10:"Thank you!";}s:11:"permissions";a:3:{i:0;s:4:"read";i:1;s:5:"write";i:2;s:6:"delete";}}"#;

fn int_list(n: usize) -> String {
    let items: String = (0..n).map(|i| format!("i:{};i:{};", i, i * 2)).collect();
    format!("a:{}:{{{}}}", n, items)
}

fn decode_scalars(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_scalars");

    for (name, data) in [
        ("null", &b"N;"[..]),
        ("bool", &b"b:1;"[..]),
        ("int", &b"i:1234567890;"[..]),
        ("float", &b"d:3.141592653589793;"[..]),
        ("string_5b", &b"s:5:\"hello\";"[..]),
    ] {
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(name, |b| b.iter(|| from_bytes(black_box(data))));
    }

    let large = format!("s:10000:\"{}\";", "x".repeat(10_000));
    let large = large.as_bytes();
    group.throughput(Throughput::Bytes(large.len() as u64));
    group.bench_function("string_10kb", |b| b.iter(|| from_bytes(black_box(large))));

    group.finish();
}

fn decode_composites(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_composites");

    for n in [10, 100, 1000] {
        let data = int_list(n);
        let data = data.as_bytes();
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(format!("list_{}", n), |b| {
            b.iter(|| from_bytes(black_box(data)))
        });
    }

    let nested: String = {
        let mut s = String::from("s:4:\"leaf\";");
        for i in 0..50 {
            let key = format!("k{}", i % 10);
            s = format!("a:1:{{s:{}:\"{}\";{}}}", key.len(), key, s);
        }
        s
    };
    let nested = nested.as_bytes();
    group.throughput(Throughput::Bytes(nested.len() as u64));
    group.bench_function("depth_50", |b| b.iter(|| from_bytes(black_box(nested))));

    // Every element after the first is a back-reference
    let shared: String = {
        let items: String = (1..100).map(|i| format!("i:{};r:1;", i)).collect();
        format!("a:100:{{i:0;O:8:\"stdClass\":1:{{s:1:\"a\";i:1;}}{}}}", items)
    };
    let shared = shared.as_bytes();
    group.throughput(Throughput::Bytes(shared.len() as u64));
    group.bench_function("references_100", |b| b.iter(|| from_bytes(black_box(shared))));

    group.throughput(Throughput::Bytes(FORM_DATA.len() as u64));
    group.bench_function("form_data", |b| b.iter(|| from_bytes(black_box(FORM_DATA))));

    group.finish();
}

fn encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    let list = PhpValue::from(PhpArray::from_list((0..1000).map(i64::from)));
    group.bench_function("list_1000", |b| b.iter(|| to_bytes(black_box(&list))));

    let floats = PhpValue::from(PhpArray::from_list((0..100).map(|i| f64::from(i) / 7.0)));
    group.bench_function("floats_100", |b| b.iter(|| to_bytes(black_box(&floats))));

    let mut object = PhpObject::new("User");
    object
        .set_public("name", "Alice")
        .set_protected("email", "alice@example.com")
        .set_private("password", "secret");
    let object = PhpValue::from(object);
    let shared = PhpValue::from(PhpArray::from_list((0..100).map(|_| object.clone())));
    group.bench_function("shared_objects_100", |b| b.iter(|| to_bytes(black_box(&shared))));

    let form = from_bytes(FORM_DATA).unwrap();
    group.throughput(Throughput::Bytes(FORM_DATA.len() as u64));
    group.bench_function("form_data", |b| b.iter(|| to_bytes(black_box(&form))));

    group.finish();
}

#[cfg(feature = "serde")]
fn json_conversion(c: &mut Criterion) {
    use php_serialize_core::json::to_json_string;

    let mut group = c.benchmark_group("json");

    group.throughput(Throughput::Bytes(FORM_DATA.len() as u64));
    group.bench_function("parse_and_convert", |b| {
        b.iter(|| {
            let value = from_bytes(black_box(FORM_DATA)).unwrap();
            to_json_string(&value).unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, decode_scalars, decode_composites, encode);

#[cfg(feature = "serde")]
criterion_group!(serde_benches, json_conversion);

#[cfg(feature = "serde")]
criterion_main!(benches, serde_benches);

#[cfg(not(feature = "serde"))]
criterion_main!(benches);
