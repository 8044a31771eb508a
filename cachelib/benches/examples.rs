use std::fmt::Write;
use std::fs;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cachelib::config::CacheConfig;
use cachelib::simulator::Simulator;
use cachelib::util::get_configs;

/// A strided load/store pattern large enough to exercise eviction in every set
fn synthetic_trace(records: usize) -> String {
    let mut trace = String::with_capacity(records * 16);
    for i in 0..records {
        let op = if i % 3 == 0 { 'S' } else { 'L' };
        let address = (i as u64).wrapping_mul(0x9e37_79b9) & 0xf_ffff;
        writeln!(trace, "{op} {address:x},8").unwrap();
    }
    trace
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Golden traces");
    get_configs()
        .unwrap()
        .iter()
        .for_each(|case| {
            // For the purposes of this we aren't interested in IO effects
            let trace = fs::read(&case.trace).unwrap();
            let name = case.output.file_name().unwrap().to_string_lossy().into_owned();
            group.bench_with_input(BenchmarkId::new("Trace", name), &(case.config, trace), |bench, (conf, trace)| {
                bench.iter(|| {
                    Simulator::new(conf).unwrap().simulate(trace.as_slice()).unwrap();
                });
            });
        });
    group.finish();

    let trace = synthetic_trace(100_000);
    let mut group = c.benchmark_group("Synthetic");
    group.throughput(Throughput::Elements(100_000));
    for (s, e, b) in [(0, 1, 4), (4, 2, 4), (8, 8, 6), (0, 256, 6)] {
        let config = CacheConfig::new(s, e, b);
        group.bench_with_input(BenchmarkId::new("Geometry", format!("s{s}-E{e}-b{b}")), &config, |bench, conf| {
            bench.iter(|| {
                Simulator::new(conf).unwrap().simulate(trace.as_bytes()).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = criterion_benchmark
);
criterion_main!(benches);
