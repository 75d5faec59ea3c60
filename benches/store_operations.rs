use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use massive_stub::fixtures;
use massive_stub::storage::PathTree;
use massive_stub::{Database, EventType, Path};
use serde_json::json;

fn bench_path_tree(c: &mut Criterion) {
    let mut tree = PathTree::new();
    tree.reset(fixtures::default_seed(true).unwrap());
    let deep = Path::parse("resumes/demore1/profile/firstName").unwrap();

    c.bench_function("path_tree_read_deep", |b| {
        b.iter(|| black_box(tree.get(black_box(&deep))))
    });

    c.bench_function("path_tree_write_deep", |b| {
        b.iter(|| tree.write(black_box(&deep), json!("Ada")))
    });
}

fn bench_notify(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let mut group = c.benchmark_group("set_with_listeners");

    for listeners in [0usize, 10, 100] {
        let database = Database::new();
        database.initialize(fixtures::default_seed(true).unwrap()).unwrap();
        let query = database
            .reference("resumes")
            .unwrap()
            .order_by_child("user")
            .equal_to(fixtures::ANONYMOUS_USER_1_UID);
        runtime.block_on(async {
            for _ in 0..listeners {
                query.on(EventType::Value, |_| {}).unwrap();
            }
        });
        let target = database.reference("resumes/demore1/name").unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(listeners), &listeners, |b, _| {
            b.iter(|| runtime.block_on(target.set("renamed")).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_path_tree, bench_notify);
criterion_main!(benches);
