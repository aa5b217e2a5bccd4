use criterion::{Criterion, criterion_group, criterion_main};
use girder::codec;
use girder::{CookieCrypto, HttpRequest, HttpResponse, SessionConfig, SessionManager};
use std::collections::HashMap;
use std::hint::black_box;

const SECRET: &[u8] = b"benchmark-secret-that-is-long-enough";

fn session_data(entries: usize) -> HashMap<String, String> {
    (0..entries)
        .map(|i| (format!("key_{}", i), format!("value:{}%\0{}", i, "x".repeat(16))))
        .collect()
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    for entries in [1, 8, 32] {
        let data = session_data(entries);
        let wire = codec::encode(&data);

        group.bench_function(format!("encode_{}", entries), |b| {
            b.iter(|| codec::encode(black_box(&data)))
        });

        group.bench_function(format!("decode_{}", entries), |b| {
            b.iter(|| codec::decode(black_box(&wire)))
        });
    }

    group.bench_function("decode_garbage", |b| {
        let garbage = "%00%00broken%3A%ZZ".repeat(16);
        b.iter(|| codec::decode(black_box(&garbage)))
    });

    group.finish();
}

fn bench_crypto(c: &mut Criterion) {
    let mut group = c.benchmark_group("cookie_crypto");
    let payload = codec::encode(&session_data(8));

    for encrypt in [false, true] {
        let crypto = CookieCrypto::from_secret(SECRET, encrypt).unwrap();
        let sealed = crypto.seal(&payload).unwrap();
        let label = if encrypt { "encrypted" } else { "signed" };

        group.bench_function(format!("seal_{}", label), |b| {
            b.iter(|| crypto.seal(black_box(&payload)).unwrap())
        });

        group.bench_function(format!("open_{}", label), |b| {
            b.iter(|| crypto.open(black_box(&sealed)))
        });
    }

    group.finish();
}

fn bench_session_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");
    let config = SessionConfig::new(String::from_utf8_lossy(SECRET)).unwrap();
    let manager = SessionManager::new(config).unwrap();

    let session = manager.session();
    for (key, value) in session_data(8) {
        session.put(key, value).unwrap();
    }
    let mut response = HttpResponse::ok();
    session.save(&HttpRequest::get("/"), &mut response).unwrap();
    let request = response
        .cookies
        .iter()
        .fold(HttpRequest::get("/"), |req, c| req.with_cookie(&c.name, &c.value));

    group.bench_function("load", |b| {
        b.iter(|| manager.load_session(black_box(&request)))
    });

    group.bench_function("load_modify_save", |b| {
        b.iter(|| {
            let session = manager.load_session(&request);
            session.put("visits", "2").unwrap();
            let mut response = HttpResponse::ok();
            session.save(&request, &mut response).unwrap();
            response
        })
    });

    group.finish();
}

criterion_group!(benches, bench_codec, bench_crypto, bench_session_round_trip);
criterion_main!(benches);
