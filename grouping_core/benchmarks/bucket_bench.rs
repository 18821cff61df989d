use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use grouping_core::{MemberId, MembershipIndex, Role};

fn member_names(count: u64) -> Vec<(MemberId, String)> {
    (0..count)
        .map(|i| (MemberId(i), format!("Member{:04}", (i * 7919) % 10_000)))
        .collect()
}

fn bench_buckets(c: &mut Criterion) {
    let mut group = c.benchmark_group("buckets");

    for size in [5u64, 25, 40, 100] {
        let names = member_names(size);

        group.bench_with_input(BenchmarkId::new("insert", size), &names, |b, names| {
            b.iter_batched(
                MembershipIndex::default,
                |mut index| {
                    for (member, name) in names {
                        index.rebucket(*member, name, None, Role::Ranged);
                    }
                    index
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("rebucket", size), &names, |b, names| {
            b.iter_batched(
                || {
                    let mut index = MembershipIndex::default();
                    for (member, name) in names {
                        index.rebucket(*member, name, None, Role::Ranged);
                    }
                    index
                },
                |mut index| {
                    for (member, name) in names {
                        index.rebucket(*member, name, Some(Role::Ranged), Role::Melee);
                    }
                    index
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(bucket_benches, bench_buckets);
criterion_main!(bucket_benches);
