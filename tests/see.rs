use cozy_chess::{Board, Move, Square};
use razorback::search::see::{is_capture, see};

fn find_move(board: &Board, from: Square, to: Square) -> Move {
    let mut found = None;
    board.generate_moves(|moves| {
        for m in moves {
            if m.from == from && m.to == to {
                found = Some(m);
                break;
            }
        }
        found.is_some()
    });
    found.expect("move must be legal")
}

#[test]
fn undefended_queen_wins_the_exchange() {
    let board = Board::from_fen("4k3/8/8/3q4/3R4/8/8/4K3 w - - 0 1", false).unwrap();
    let mv = find_move(&board, Square::D4, Square::D5);
    assert!(is_capture(&board, mv));
    assert_eq!(see(&board, mv), 400);
}

#[test]
fn defended_pawn_loses_the_bishop() {
    // Bxd5 exd5 leaves White a bishop for a pawn down.
    let board = Board::from_fen("4k3/8/4p3/3p4/8/8/1B6/4K3 w - - 0 1", false).unwrap();
    let mv = find_move(&board, Square::B2, Square::D5);
    assert!(see(&board, mv) < 0, "bishop for pawn must be negative");
}

#[test]
fn defended_queen_trades_evenly() {
    // Rxd5 exd5: queen for rook, then rook lost, nets zero.
    let board = Board::from_fen("4k3/8/4p3/3q4/8/8/3R4/4K3 w - - 0 1", false).unwrap();
    let mv = find_move(&board, Square::D2, Square::D5);
    assert_eq!(see(&board, mv), 0);
}

#[test]
fn board_is_bitwise_unchanged_after_see() {
    let board = Board::from_fen("4k3/8/4p3/3q4/8/8/3R4/4K3 w - - 0 1", false).unwrap();
    let before_fen = board.to_string();
    let before_hash = board.hash();
    let mv = find_move(&board, Square::D2, Square::D5);
    let _ = see(&board, mv);
    assert_eq!(board.to_string(), before_fen);
    assert_eq!(board.hash(), before_hash);
}

#[test]
fn quiet_moves_are_not_captures() {
    let board = Board::default();
    let mv = find_move(&board, Square::E2, Square::E4);
    assert!(!is_capture(&board, mv));
}

#[test]
fn en_passant_is_a_capture() {
    let board = Board::from_fen("4k3/8/8/8/3pP3/8/8/4K3 b - e3 0 1", false).unwrap();
    let mv = find_move(&board, Square::D4, Square::E3);
    assert!(is_capture(&board, mv));
}
