use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cozy_chess::Board;
use razorback::search::eval;
use razorback::search::tt::Tables;

const MIDGAME: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const ENDGAME: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

fn eval_bench(c: &mut Criterion) {
    let midgame = Board::from_fen(MIDGAME, false).unwrap();
    let endgame = Board::from_fen(ENDGAME, false).unwrap();
    let tables = Tables::new();

    c.bench_function("evaluate midgame", |b| {
        b.iter(|| eval::evaluate(black_box(&midgame), &tables))
    });
    c.bench_function("evaluate endgame", |b| {
        b.iter(|| eval::evaluate(black_box(&endgame), &tables))
    });
}

criterion_group!(benches, eval_bench);
criterion_main!(benches);
