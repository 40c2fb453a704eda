use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rayon::prelude::*;
use rwmap::RwMap;
use std::sync::Arc;

/* PARALLEL */
const ITER: u64 = 32 * 1024;

fn task_store_u64_u64() -> RwMap<u64, u64> {
    let map = RwMap::with_capacity(ITER as usize);
    (0..ITER).into_par_iter().for_each(|i| {
        map.store(i, i + 7);
    });
    map
}

fn store_u64_u64(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_rwmap_u64_u64");
    group.throughput(Throughput::Elements(ITER));
    let max = num_cpus::get();

    for threads in 1..=max {
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            &threads,
            |b, &threads| {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .unwrap();
                pool.install(|| b.iter(task_store_u64_u64));
            },
        );
    }

    group.finish();
}

fn task_load_u64_u64(map: &RwMap<u64, u64>) {
    (0..ITER).into_par_iter().for_each(|i| {
        assert_eq!(map.load(&i), Some(i + 7));
    });
}

fn load_u64_u64(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_rwmap_u64_u64");
    group.throughput(Throughput::Elements(ITER));
    let max = num_cpus::get();

    for threads in 1..=max {
        let map = task_store_u64_u64();
        map.force_merge();

        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            &threads,
            |b, &threads| {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .unwrap();
                pool.install(|| b.iter(|| task_load_u64_u64(&map)));
            },
        );
    }

    group.finish();
}

// one writer per thread keeps storing fresh keys while the rest of the work is reads
fn task_read_mostly_u64_u64(threads: usize, map: Arc<RwMap<u64, u64>>) {
    let inc = ITER / (threads as u64);

    rayon::scope(|s| {
        for t in 0..(threads as u64) {
            let m = map.clone();
            s.spawn(move |_| {
                let start = t * inc;
                for i in start..(start + inc) {
                    if i % 16 == 0 {
                        m.store(ITER + i, i);
                    } else if let Some(v) = m.load(&i) {
                        assert_eq!(v, i + 7);
                    }
                }
            });
        }
    });
}

fn read_mostly_u64_u64(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_mostly_rwmap_u64_u64");
    group.throughput(Throughput::Elements(ITER));
    let max = num_cpus::get();

    for threads in 1..=max {
        let map = Arc::new(task_store_u64_u64());
        map.force_merge();

        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            &threads,
            |b, &threads| {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .unwrap();
                pool.install(|| b.iter(|| task_read_mostly_u64_u64(threads, map.clone())));
            },
        );
    }

    group.finish();
}

/* SINGLE THREADED:
 *
 * Int key distribution: low bit heavy, top bit heavy, and random.
 * Task: store, store_delete, load, load_absent, range
 */
const SIZE: usize = 1000;

#[derive(Clone, Copy)]
struct RandomKeys {
    state: usize,
}

impl RandomKeys {
    fn new() -> Self {
        RandomKeys { state: 0 }
    }
}

impl Iterator for RandomKeys {
    type Item = usize;
    fn next(&mut self) -> Option<usize> {
        // Add 1 then multiply by some 32 bit prime.
        self.state = self.state.wrapping_add(1).wrapping_mul(3_787_392_781);
        Some(self.state)
    }
}

macro_rules! bench_suite {
    ($bench_macro:ident, $bench_fn_name:ident, $group_name:expr $(,)?) => {
        fn $bench_fn_name(c: &mut Criterion) {
            let mut group = c.benchmark_group($group_name);
            group.throughput(Throughput::Elements(SIZE as u64));

            $bench_macro!(group, 0.., "low");
            $bench_macro!(group, (0..).map(usize::swap_bytes), "high");
            $bench_macro!(group, RandomKeys::new(), "random");

            group.finish();
        }
    };
}

macro_rules! bench_store {
    ($group:ident, $keydist:expr, $bench_id: expr) => {
        $group.bench_function(BenchmarkId::from_parameter($bench_id), |b| {
            b.iter(|| {
                let map = RwMap::with_capacity(SIZE);
                ($keydist).take(SIZE).for_each(|i| {
                    map.store(i, i);
                });
                black_box(&map);
            });
        });
    };
}

bench_suite!(bench_store, store_rwmap, "store_rwmap");

macro_rules! bench_store_delete {
    ($group:ident, $keydist:expr, $bench_id: expr) => {
        let base = RwMap::with_capacity(SIZE);
        ($keydist).take(SIZE).for_each(|i| {
            base.store(i, i);
        });
        base.force_merge();
        let skip = ($keydist).take(SIZE);

        $group.bench_function(BenchmarkId::from_parameter($bench_id), |b| {
            b.iter(|| {
                let map = base.clone();
                let mut add_iter = skip.clone();
                let mut remove_iter = $keydist;

                // While keeping the size constant,
                // replace the first keydist with the second.
                (&mut add_iter)
                    .zip(&mut remove_iter)
                    .take(SIZE)
                    .for_each(|(add, remove)| {
                        map.store(add, add);
                        black_box(map.load_and_delete(&remove));
                    });
                black_box(&map);
            });
        });
    };
}

bench_suite!(bench_store_delete, store_delete_rwmap, "store_delete_rwmap");

macro_rules! bench_load {
    ($group:ident, $keydist:expr, $bench_id: expr) => {
        let map = RwMap::with_capacity(SIZE);
        ($keydist).take(SIZE).for_each(|i| {
            map.store(i, i);
        });
        map.force_merge();

        $group.bench_function(BenchmarkId::from_parameter($bench_id), |b| {
            b.iter(|| {
                ($keydist).take(SIZE).for_each(|i| {
                    black_box(map.load(&i));
                });
            });
        });
    };
}

bench_suite!(bench_load, load_rwmap, "load_rwmap");

macro_rules! bench_load_absent {
    ($group:ident, $keydist:expr, $bench_id: expr) => {
        let map = RwMap::with_capacity(SIZE);
        let mut iter = $keydist;
        (&mut iter).take(SIZE).for_each(|i| {
            map.store(i, i);
        });
        map.force_merge();

        $group.bench_function(BenchmarkId::from_parameter($bench_id), |b| {
            b.iter(|| {
                (&mut iter).take(SIZE).for_each(|i| {
                    black_box(map.load(&i));
                });
            });
        });
    };
}

bench_suite!(bench_load_absent, load_absent_rwmap, "load_absent_rwmap");

macro_rules! bench_range {
    ($group:ident, $keydist:expr, $bench_id: expr) => {
        let map = RwMap::with_capacity(SIZE);
        ($keydist).take(SIZE).for_each(|i| {
            map.store(i, i);
        });
        map.force_merge();

        $group.bench_function(BenchmarkId::from_parameter($bench_id), |b| {
            b.iter(|| {
                map.range(|k, v| {
                    black_box((k, v));
                    true
                });
            });
        });
    };
}

bench_suite!(bench_range, range_rwmap, "range_rwmap");

criterion_group!(
    benches,
    store_u64_u64,
    load_u64_u64,
    read_mostly_u64_u64,
    store_rwmap,
    store_delete_rwmap,
    load_rwmap,
    load_absent_rwmap,
    range_rwmap,
);
criterion_main!(benches);
