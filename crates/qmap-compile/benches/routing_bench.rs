//! Benchmarks for placement, routing and cleanup
//!
//! Run with: cargo bench -p qmap-compile

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qmap_compile::{
    Architecture, PassId, PassManagerBuilder, PlacementSolver, apply_optimization_pass, route,
    route_batch,
};
use qmap_ir::{Circuit, CircuitDag, QubitId};

/// Every qubit interacts with every other one, with rotations in between.
fn all_to_all(n: u32) -> CircuitDag {
    let mut circuit = Circuit::with_size("all_to_all", n, 0);
    for a in 0..n {
        circuit.h(QubitId(a)).unwrap();
        for b in (a + 1)..n {
            circuit.cx(QubitId(a), QubitId(b)).unwrap();
            circuit.rz(0.25, QubitId(b)).unwrap();
            circuit.cx(QubitId(a), QubitId(b)).unwrap();
        }
    }
    circuit.into_dag()
}

/// Benchmark routing dense circuits onto square grids
fn bench_route_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_grid");

    for side in &[3usize, 4, 5] {
        let arch = Architecture::grid(*side, *side);
        #[allow(clippy::cast_possible_truncation)]
        let dag = all_to_all((side * side) as u32);
        group.bench_with_input(BenchmarkId::new("all_to_all", side), &dag, |b, dag| {
            b.iter(|| route(black_box(dag), &arch).unwrap());
        });
    }

    group.finish();
}

/// Benchmark a GHZ-style CX fan-out from qubit 0 on a line
fn bench_route_ghz(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_ghz");

    for num_qubits in &[10u32, 50] {
        let arch = Architecture::linear(*num_qubits as usize);
        let mut circuit = Circuit::with_size("fan", *num_qubits, 0);
        circuit.h(QubitId(0)).unwrap();
        for q in 1..*num_qubits {
            circuit.cx(QubitId(0), QubitId(q)).unwrap();
        }
        let dag = circuit.into_dag();
        group.bench_with_input(BenchmarkId::new("fan", num_qubits), &dag, |b, dag| {
            b.iter(|| route(black_box(dag), &arch).unwrap());
        });
    }

    group.finish();
}

/// Benchmark the placement search alone
fn bench_placement(c: &mut Criterion) {
    let arch = Architecture::grid(4, 4);
    let dag = all_to_all(12);
    let solver = PlacementSolver::default();
    c.bench_function("placement_12_on_grid_4x4", |b| {
        b.iter(|| solver.place(black_box(&dag), &arch).unwrap());
    });
}

/// Benchmark the full level 2 pipeline and batch routing
fn bench_pipeline(c: &mut Criterion) {
    let arch = Architecture::grid(4, 4);
    let dag = all_to_all(10);
    let pm = PassManagerBuilder::new().with_optimization_level(2).build();
    c.bench_function("pipeline_level2_10_on_grid_4x4", |b| {
        b.iter(|| pm.run(black_box(&dag), &arch).unwrap());
    });

    let batch: Vec<CircuitDag> = (4..12).map(all_to_all).collect();
    c.bench_function("route_batch_8", |b| {
        b.iter(|| route_batch(black_box(&batch), &arch));
    });
}

/// Benchmark fixed-point cleanup of a routed circuit
fn bench_cleanup(c: &mut Criterion) {
    let arch = Architecture::linear(12);
    let routed = route(&all_to_all(12), &arch).unwrap();
    c.bench_function("cleanup_routed_12", |b| {
        b.iter(|| {
            let mut dag = routed.dag().clone();
            apply_optimization_pass(PassId::Cleanup, &mut dag).unwrap();
            black_box(dag.num_ops())
        });
    });
}

criterion_group!(
    benches,
    bench_route_grid,
    bench_route_ghz,
    bench_placement,
    bench_pipeline,
    bench_cleanup
);
criterion_main!(benches);
