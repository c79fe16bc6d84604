use std::time::Duration;

use cozy_chess::{Board, Color, Square};
use razorback::search::alphabeta::Searcher;
use razorback::search::eval;
use razorback::search::tt::Tables;

#[test]
fn rook_endgame_enters_mop_up() {
    let board = Board::from_fen("8/8/8/8/8/4k3/8/4K2R w - - 0 1", false).unwrap();
    assert!(eval::is_mop_up(&board));
    let score = eval::evaluate(&board, &Tables::new());
    assert!(score >= 5000, "mop-up must report a winning score, got {score}");
}

#[test]
fn mop_up_rewards_herding_the_king() {
    let tables = Tables::new();
    // The same material with the defender pushed further from the center
    // and the kings closer together must score higher.
    let loose = Board::from_fen("8/8/8/4k3/8/8/8/4K2R w - - 0 1", false).unwrap();
    let herded = Board::from_fen("k7/8/1K6/8/8/8/8/7R w - - 0 1", false).unwrap();
    assert!(eval::evaluate(&herded, &tables) > eval::evaluate(&loose, &tables));
}

#[test]
fn search_keeps_the_rook_safe_and_presses() {
    let board = Board::from_fen("8/8/8/8/8/4k3/8/4K2R w - - 0 1", false).unwrap();
    let mut searcher = Searcher::new();
    searcher.set_quiet(true);
    searcher.set_max_depth(6);
    let outcome = searcher.find_best_move(&board, Duration::from_secs(600));

    let best = outcome.best.expect("a move must be found");
    assert!(outcome.eval >= 5000, "winning side must keep a mop-up score, got {}", outcome.eval);

    // The chosen move must not hand the rook to the defending king.
    let mut child = board.clone();
    child.play(best);
    if let Some(rook_sq) = child.colored_pieces(Color::White, cozy_chess::Piece::Rook).into_iter().next()
    {
        let black_king = child.king(Color::Black);
        let defended = !eval::attackers_of(&child, Color::White, rook_sq).is_empty();
        let capturable = eval::manhattan(black_king, rook_sq) <= 2
            && cozy_chess::get_king_moves(black_king).has(rook_sq);
        assert!(!capturable || defended, "rook is hanging after {best}");
    }
}

#[test]
fn losing_side_mirrors_the_score() {
    let tables = Tables::new();
    let board = Board::from_fen("r3k3/8/4K3/8/8/8/8/8 w - - 0 1", false).unwrap();
    let score = eval::evaluate(&board, &tables);
    assert!(score <= -5000, "black's mop-up must be negative for White, got {score}");
}

#[test]
fn center_distance_uses_e4_anchor() {
    // Losing king on e4: distance term vanishes entirely.
    let board = Board::from_fen("8/8/8/8/4k3/8/8/R3K3 w - - 0 1", false).unwrap();
    let expected_floor = 5000 + 150 * (14 - eval::manhattan(Square::E1, Square::E4));
    assert_eq!(eval::evaluate(&board, &Tables::new()), expected_floor);
}
