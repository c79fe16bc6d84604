//! Static exchange evaluation: the material outcome of a capture
//! sequence on a single square, assuming both sides recapture optimally.

use cozy_chess::{Board, Move, Piece};

/// Exchange values. The king is priced so that losing it dominates any
/// sequence of ordinary captures.
#[inline]
pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 20000,
    }
}

/// Capture test: destination holds an enemy piece, or the move is a
/// pawn's diagonal step onto an empty square (en passant).
#[inline]
pub fn is_capture(board: &Board, mv: Move) -> bool {
    if board.colors(!board.side_to_move()).has(mv.to) {
        return true;
    }
    board.piece_on(mv.from) == Some(Piece::Pawn) && mv.from.file() != mv.to.file()
}

/// Value of the piece a capture removes; en passant takes a pawn.
#[inline]
pub fn victim_value(board: &Board, mv: Move) -> i32 {
    match board.piece_on(mv.to) {
        Some(piece) => piece_value(piece),
        None => piece_value(Piece::Pawn),
    }
}

/// Net material outcome of `mv` after optimal mutual recaptures on its
/// destination square. The input board is left untouched.
pub fn see(board: &Board, mv: Move) -> i32 {
    let attacker = match board.piece_on(mv.from) {
        Some(piece) => piece_value(piece),
        None => return 0,
    };
    let gain = victim_value(board, mv) - attacker;

    let mut child = board.clone();
    child.play(mv);

    // Recaptures on the same square, weakest attacker first.
    let mut recaptures: Vec<Move> = Vec::new();
    child.generate_moves(|moves| {
        for m in moves {
            if m.to == mv.to {
                recaptures.push(m);
            }
        }
        false
    });
    recaptures.sort_by_key(|m| child.piece_on(m.from).map(piece_value).unwrap_or(0));

    let mut best_reply = 0;
    for reply in recaptures {
        best_reply = best_reply.max(see(&child, reply));
    }

    // The opponent recaptures only when it profits them.
    gain - best_reply.max(0)
}
