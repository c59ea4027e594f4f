use std::path::Path;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pathinfer_core::{Algorithm, LOCATION_NODE, ModelFormat, TemporalNetwork};
use pathinfer_dbn::{DynamicNetwork, EngineOptions};

fn reference_network() -> DynamicNetwork {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/experiment_dbn.json");
    DynamicNetwork::read_file(&path, ModelFormat::Json, &EngineOptions::default())
        .expect("reference model")
}

fn bench_update(base: &DynamicNetwork, algorithm: Algorithm, slices: usize) {
    let mut network = base.clone();
    network.set_algorithm(algorithm);
    network.set_slice_count(slices);
    let _ = network.set_virtual_evidence(LOCATION_NODE, 0, &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    let _ = network.set_virtual_evidence(LOCATION_NODE, slices - 1, &[0.0, 0.5, 0.5, 0.0, 0.0, 0.0]);
    let _ = black_box(network.update_beliefs());
    black_box(network.posterior_buffer(LOCATION_NODE).len());
}

fn belief_update_bench(c: &mut Criterion) {
    let base = reference_network().with_options(EngineOptions {
        samples: 2_000,
        ..EngineOptions::default()
    });
    let mut group = c.benchmark_group("belief_update");
    for algorithm in [
        Algorithm::Lauritzen,
        Algorithm::EpisSampling,
        Algorithm::LoopyBeliefPropagation,
    ] {
        for slices in [3usize, 24] {
            group.bench_function(format!("{}_{slices}", algorithm.name()), |b| {
                b.iter(|| bench_update(&base, algorithm, slices))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, belief_update_bench);
criterion_main!(benches);
