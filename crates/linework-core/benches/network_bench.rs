//! Criterion benchmarks for the network tick loop.
//!
//! - `tick`: 50 bus lines of 6 stops with 4 convoys each
//! - `departure_board`: recomputing a board at a busy shared halt
//! - `serialization`: full snapshot of the 50-line network

use criterion::{Criterion, criterion_group, criterion_main};
use linework_core::departure::DepartureBoard;
use linework_core::geometry::Koord;
use linework_core::id::*;
use linework_core::line::LineType;
use linework_core::network::Network;
use linework_core::schedule::Schedule;
use linework_core::test_utils::*;

/// 50 lines on parallel rows, all sharing one hub halt at the origin.
fn build_network() -> (Network, HaltId) {
    let mut net = small_network();
    let hub = add_halt_at(&mut net, "hub", Koord::new(0, 0));
    for row in 0..50i16 {
        let mut halts = vec![hub];
        for i in 1..6i16 {
            halts.push(add_halt_at(&mut net, "stop", Koord::new(i * 5, row * 3)));
        }
        let line = net.create_line(PlayerId(0), LineType::Truck, format!("line {row}"));
        net.set_schedule(line, Schedule::from_halts(halts));
        for _ in 0..4 {
            let cnv = spawn_bus(&mut net, Schedule::new(), 60 + row as u32);
            net.add_convoy(line, cnv);
            net.start_convoy(cnv);
        }
    }
    // Spread the convoys out along their routes.
    net.advance(2_000);
    (net, hub)
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    group.sample_size(50);

    let (mut net, _) = build_network();

    group.bench_function("50_lines_200_convoys", |b| {
        b.iter(|| {
            net.step();
        });
    });

    group.finish();
}

fn bench_departure_board(c: &mut Criterion) {
    let mut group = c.benchmark_group("departure_board");

    let (net, hub) = build_network();

    group.bench_function("hub_recompute", |b| {
        b.iter(|| {
            let mut board = DepartureBoard::new(Some(hub));
            board.update(&net)
        });
    });

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");

    let (net, _) = build_network();
    let data = net.serialize().unwrap();

    group.bench_function("serialize_50_lines", |b| {
        b.iter(|| net.serialize().unwrap());
    });
    group.bench_function("deserialize_50_lines", |b| {
        b.iter(|| Network::deserialize(&data).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_tick, bench_departure_board, bench_serialization);
criterion_main!(benches);
