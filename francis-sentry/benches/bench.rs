use criterion::{criterion_group, criterion_main, Criterion};
use francis_sentry::get_sentry_base_url;

fn bench_get_sentry_base_url(c: &mut Criterion) {
    let mut g = c.benchmark_group("sentry base url");
    g.bench_function("without credentials", |b| {
        b.iter(|| {
            let url = get_sentry_base_url("http://localhost:8000/0").unwrap();
            if url != "http://localhost:8000/" {
                panic!("value is invalid");
            }
        });
    });

    g.bench_function("with credentials", |b| {
        b.iter(|| {
            let url = get_sentry_base_url(
                "https://abc123@o1.ingest.example.com/456",
            )
            .unwrap();
            if url != "https://o1.ingest.example.com/" {
                panic!("value is invalid")
            }
        });
    });

    g.finish();
}

criterion_group!(benches, bench_get_sentry_base_url);
criterion_main!(benches);
