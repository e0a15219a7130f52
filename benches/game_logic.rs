use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tetrecs::core::{Game, Grid, Piece, ScriptedPieces};
use tetrecs::net::parse_server_message;

fn bench_place_and_clear(c: &mut Criterion) {
    c.bench_function("place_five_dots_clear_row", |b| {
        b.iter(|| {
            let mut game = Game::new(5, 5, ScriptedPieces::new(vec![3]));
            game.start();
            for x in 0..5 {
                game.place_block(black_box(x), 0);
            }
            game.score()
        })
    });
}

fn bench_clear_cross(c: &mut Criterion) {
    c.bench_function("clear_row_and_column", |b| {
        b.iter(|| {
            let mut grid = Grid::new(5, 5);
            for i in 0..5 {
                grid.set(i, 2, 1);
                grid.set(2, i, 1);
            }
            black_box(grid.clear_lines())
        })
    });
}

fn bench_can_play_sweep(c: &mut Criterion) {
    let mut grid = Grid::new(5, 5);
    for i in 0..5 {
        grid.set(i, i, 1);
    }
    let pieces: Vec<Piece> = (0..15).filter_map(Piece::new).collect();

    c.bench_function("can_play_piece_sweep", |b| {
        b.iter(|| {
            let mut fits = 0;
            for piece in &pieces {
                for y in -1..6 {
                    for x in -1..6 {
                        if grid.can_play_piece(piece, x, y) {
                            fits += 1;
                        }
                    }
                }
            }
            black_box(fits)
        })
    });
}

fn bench_parse_board(c: &mut Criterion) {
    let line = format!("BOARD ann:{}", vec!["7"; 25].join(" "));

    c.bench_function("parse_board_message", |b| {
        b.iter(|| parse_server_message(black_box(&line)))
    });
}

criterion_group!(
    benches,
    bench_place_and_clear,
    bench_clear_cross,
    bench_can_play_sweep,
    bench_parse_board
);
criterion_main!(benches);
