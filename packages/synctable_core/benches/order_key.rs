use criterion::{black_box, criterion_group, criterion_main, Criterion};
use synctable::order_key::{generate, generate_n};
use synctable::{RowData, TableField, TableStore};

fn bench_append_keys(c: &mut Criterion) {
    c.bench_function("generate 1000 appended keys", |b| {
        b.iter(|| {
            let mut key = generate(None, None).unwrap();
            for _ in 0..1000 {
                key = generate(Some(&key), None).unwrap();
            }
            black_box(key)
        })
    });
}

fn bench_nested_midpoints(c: &mut Criterion) {
    c.bench_function("bisect the same gap 500 times", |b| {
        b.iter(|| {
            let low = generate(None, None).unwrap();
            let mut high = generate(Some(&low), None).unwrap();
            for _ in 0..500 {
                high = generate(Some(&low), Some(&high)).unwrap();
            }
            black_box(high)
        })
    });
}

fn bench_batch(c: &mut Criterion) {
    c.bench_function("generate_n 1000 between neighbours", |b| {
        b.iter(|| black_box(generate_n(Some("a0"), Some("a1"), 1000).unwrap()))
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let mut store = TableStore::in_memory();
    store
        .set_schema(vec![TableField::text("t", "T"), TableField::vote("v", "V")])
        .unwrap();
    for i in 0..500 {
        let mut row = RowData::new();
        row.insert("t".into(), i.to_string().into());
        let id = store.append_row(row).unwrap();
        store.toggle_vote(&id, "v", "bench");
    }

    c.bench_function("snapshot 500 voted rows", |b| {
        b.iter(|| black_box(store.snapshot()))
    });
}

criterion_group!(
    benches,
    bench_append_keys,
    bench_nested_midpoints,
    bench_batch,
    bench_snapshot
);
criterion_main!(benches);
