use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fluentsql::{Dialect, QueryBuilder, WhereArgs, table};

/// Builder with `n` equality predicates, one nested group and a join:
/// select * from t inner join u ... where c0 = ? and ... and (a = ? or b = ?)
fn build_select(dialect: Dialect, n: usize) -> QueryBuilder {
    let mut q = table(dialect, "t");
    q.join("u", "t.id", "=", "u.t_id");
    for i in 0..n {
        q.where_((format!("c{i}").as_str(), i as i64));
    }
    q.where_(WhereArgs::closure(|q| {
        q.where_(("a", 1)).or_where(("b", 2));
    }))
    .order_by_desc("id")
    .limit(20);
    q
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/select");

    for n in [1, 5, 10, 50, 100] {
        let q = build_select(Dialect::Postgres, n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.compile()));
        });
    }

    group.finish();
}

fn bench_build_and_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/build_and_compile");

    for n in [1, 5, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let q = build_select(Dialect::MySql, n);
                black_box(q.compile())
            });
        });
    }

    group.finish();
}

fn bench_where_in(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/where_in");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let mut q = table(Dialect::SqlServer, "t");
                q.where_in("id", values.iter().copied()).skip(10).take(10);
                black_box(q.compile())
            });
        });
    }

    group.finish();
}

fn bench_dialects(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/dialect");

    for dialect in [
        Dialect::Ansi,
        Dialect::MySql,
        Dialect::Postgres,
        Dialect::SqlServer,
        Dialect::Sqlite,
    ] {
        let q = build_select(dialect, 10);
        group.bench_with_input(BenchmarkId::from_parameter(dialect), &q, |b, q| {
            b.iter(|| black_box(q.compile()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compile,
    bench_build_and_compile,
    bench_where_in,
    bench_dialects
);
criterion_main!(benches);
