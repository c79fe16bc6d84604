use std::time::Duration;

use cozy_chess::{Board, Piece, Square};
use razorback::search::alphabeta::Searcher;
use razorback::search::eval;

fn search(fen: &str, depth: i32) -> razorback::search::alphabeta::SearchOutcome {
    let board = Board::from_fen(fen, false).unwrap();
    let mut searcher = Searcher::new();
    searcher.set_quiet(true);
    searcher.set_max_depth(depth);
    searcher.find_best_move(&board, Duration::from_secs(600))
}

#[test]
fn finds_back_rank_mate_in_one() {
    let outcome = search("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 6);
    let best = outcome.best.expect("a move must be found");
    assert_eq!((best.from, best.to), (Square::A1, Square::A8));
    assert!(
        outcome.eval >= eval::mate_score(1),
        "mate in one must score as mate, got {}",
        outcome.eval
    );
}

#[test]
fn takes_the_hanging_queen() {
    let outcome = search("4k3/8/8/3q4/3R4/8/8/4K3 w - - 0 1", 6);
    let best = outcome.best.expect("a move must be found");
    assert_eq!((best.from, best.to), (Square::D4, Square::D5));
    assert!(outcome.eval > 400, "winning the queen must show, got {}", outcome.eval);
}

#[test]
fn pushes_the_passed_pawn_home() {
    let outcome = search("8/2P5/8/8/8/8/k7/4K3 w - - 0 1", 6);
    let best = outcome.best.expect("a move must be found");
    assert_eq!((best.from, best.to), (Square::C7, Square::C8));
    assert!(
        matches!(best.promotion, Some(Piece::Queen) | Some(Piece::Rook)),
        "must promote to a mating piece, got {:?}",
        best.promotion
    );
    assert!(outcome.eval >= 900, "promotion must win, got {}", outcome.eval);
}

#[test]
fn stalemated_side_has_no_move() {
    // Black to move, no legal moves, not in check.
    let outcome = search("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 4);
    assert!(outcome.best.is_none());
    assert_eq!(outcome.eval, 0);
}

#[test]
fn best_move_is_always_legal() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    ];
    for fen in fens {
        let board = Board::from_fen(fen, false).unwrap();
        let mut searcher = Searcher::new();
        searcher.set_quiet(true);
        searcher.set_max_depth(3);
        let outcome = searcher.find_best_move(&board, Duration::from_secs(600));
        let best = outcome.best.expect("a move must be found");

        let mut legal = Vec::new();
        board.generate_moves(|moves| {
            legal.extend(moves);
            false
        });
        assert!(legal.contains(&best), "{best} is not legal in {fen}");
        assert!(!outcome.pv.is_empty());
        assert_eq!(outcome.pv[0], best);
    }
}

#[test]
fn single_reply_returns_immediately() {
    // The black king's only square is a7: b7/b8 are covered by the rook
    // and the white king.
    let board = Board::from_fen("k7/8/2K5/8/8/8/8/1R6 b - - 0 1", false).unwrap();
    let mut legal = Vec::new();
    board.generate_moves(|moves| {
        legal.extend(moves);
        false
    });
    assert_eq!(legal.len(), 1, "test position must have exactly one reply");

    let mut searcher = Searcher::new();
    searcher.set_quiet(true);
    let outcome = searcher.find_best_move(&board, Duration::from_secs(600));
    assert_eq!(outcome.best, Some(legal[0]));
    assert_eq!(outcome.nodes, 0, "single replies skip the search");
}
