use std::time::Duration;

use cozy_chess::Board;
use razorback::search::alphabeta::Searcher;
use razorback::search::eval;

fn solve(fen: &str, depth: i32) -> razorback::search::alphabeta::SearchOutcome {
    let board = Board::from_fen(fen, false).unwrap();
    let mut searcher = Searcher::new();
    searcher.set_quiet(true);
    searcher.set_max_depth(depth);
    searcher.find_best_move(&board, Duration::from_secs(600))
}

#[test]
fn mate_in_one_scores_at_the_bound() {
    let outcome = solve("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 4);
    assert!(outcome.eval >= eval::mate_score(1), "got {}", outcome.eval);
}

#[test]
fn ladder_mate_in_two_is_found() {
    // Two rooks against the bare king: cut the seventh, mate on the eighth.
    let outcome = solve("7k/8/8/8/8/8/R7/1R5K w - - 0 1", 5);
    assert!(
        outcome.eval >= eval::mate_score(3),
        "mate in two must score at least {}, got {}",
        eval::mate_score(3),
        outcome.eval
    );
}

#[test]
fn nearer_mates_score_higher() {
    assert!(eval::mate_score(1) > eval::mate_score(3));
    assert!(eval::mate_score(3) > eval::mate_score(5));
    assert!(eval::mate_score(5) > 40_000);
}
