use appshelf::decision::{RequestClass, classify};
use criterion::{Criterion, criterion_group, criterion_main};

fn bench_classify(c: &mut Criterion) {
    let bypass_paths = vec!["/events".to_string()];

    c.bench_function("Classify: Cache-First", |b| {
        b.iter(|| {
            let class = classify("GET", "/static/style.css", Some("text/css"), &bypass_paths);
            assert!(class == RequestClass::CacheFirst)
        })
    });

    c.bench_function("Classify: Bypass Path", |b| {
        b.iter(|| {
            let class = classify("GET", "/events", Some("text/html"), &bypass_paths);
            assert!(class == RequestClass::Bypass)
        })
    });

    c.bench_function("Classify: Event-Stream Accept", |b| {
        b.iter(|| {
            let class = classify("GET", "/", Some("text/event-stream"), &bypass_paths);
            assert!(class == RequestClass::Bypass)
        })
    });

    c.bench_function("Classify: Non-GET Method", |b| {
        b.iter(|| {
            let class = classify("POST", "/punch", Some("text/html"), &bypass_paths);
            assert!(class == RequestClass::Bypass)
        })
    });
}

criterion_group!(decision, bench_classify);
criterion_main!(decision);
