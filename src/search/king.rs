//! King scoring: shelter and threats in the middlegame, activity in the
//! endgame.

use cozy_chess::{
    get_bishop_moves, get_king_moves, get_knight_moves, get_rook_moves, BitBoard, Board, Color,
    Piece,
};

use crate::search::eval::{self, Info, KING_VALUE};
use crate::search::pst;

/// How threatened `color`'s king is, as a positive score.
///
/// Counts enemy pieces that are either near the king (Manhattan
/// distance, per kind) or whose attack set reaches the king's ring,
/// then scales a per-count weight by per-kind multipliers.
pub fn king_threat(board: &Board, color: Color) -> i32 {
    const ATTACK_WEIGHT: [i32; 9] = [0, 25, 65, 100, 120, 150, 175, 200, 200];

    let king_sq = board.king(color);
    let ring = get_king_moves(king_sq);

    // Sliders are blocked by the defenders and by the attackers' own pawns;
    // the attackers' pieces are assumed to move out of each other's way.
    let their_pawns = board.colored_pieces(!color, Piece::Pawn);
    let blockers = board.colors(color) | their_pawns;

    let mut attackers = BitBoard::EMPTY;

    for sq in their_pawns {
        if eval::manhattan(sq, king_sq) <= 4 {
            attackers = attackers | sq.bitboard();
        }
    }
    for sq in board.colored_pieces(!color, Piece::Queen) {
        let attacks = get_rook_moves(sq, blockers) | get_bishop_moves(sq, blockers);
        if eval::manhattan(sq, king_sq) <= 6 || !(attacks & ring).is_empty() {
            attackers = attackers | sq.bitboard();
        }
    }
    for sq in board.colored_pieces(!color, Piece::Rook) {
        if !(get_rook_moves(sq, blockers) & ring).is_empty() {
            attackers = attackers | sq.bitboard();
        }
    }
    for sq in board.colored_pieces(!color, Piece::Knight) {
        if eval::manhattan(sq, king_sq) <= 5 || !(get_knight_moves(sq) & ring).is_empty() {
            attackers = attackers | sq.bitboard();
        }
    }
    for sq in board.colored_pieces(!color, Piece::Bishop) {
        if eval::manhattan(sq, king_sq) <= 4 || !(get_bishop_moves(sq, blockers) & ring).is_empty() {
            attackers = attackers | sq.bitboard();
        }
    }

    let weight = ATTACK_WEIGHT[(attackers.len() as usize).min(8)];

    let mut threat = 0;
    for sq in attackers {
        let multiplier = match board.piece_on(sq) {
            Some(Piece::Pawn) => 15,
            Some(Piece::Knight) | Some(Piece::Bishop) => 30,
            Some(Piece::Rook) => 50,
            Some(Piece::Queen) => 100,
            _ => 0,
        };
        threat += weight * multiplier;
    }

    threat / 100
}

/// Full king term for `color`.
pub fn king_value(board: &Board, color: Color, info: &Info) -> i32 {
    const OPEN_FILE_PENALTY: [i32; 4] = [0, 20, 35, 60];
    const KING_DISTANCE_PENALTY: i32 = 6;
    const PAWN_DISTANCE_PENALTY: i32 = 3;
    const PASSED_PAWN_DISTANCE_PENALTY: i32 = 6;

    let mid = info.mid_weight();
    let end = info.end_weight();

    let king_sq = board.king(color);
    let king_file = king_sq.file() as i32;
    let king_rank = king_sq.rank() as i32;

    let mut value = KING_VALUE;
    value += pst::interp(&pst::KING_MID, &pst::KING_END, pst::relative_index(king_sq, color), mid, end);

    value -= (king_threat(board, color) as f64 * mid) as i32;

    // Pawn shield directly in front of the king.
    let pawn_shield_bonus = (30.0 * mid) as i32;
    let our_pawns = board.colored_pieces(color, Piece::Pawn);
    let their_pawns = board.colored_pieces(!color, Piece::Pawn);
    let shield_rank = match color {
        Color::White => king_rank + 1,
        Color::Black => king_rank - 1,
    };
    for sq in our_pawns {
        if sq.rank() as i32 == shield_rank && (sq.file() as i32 - king_file).abs() <= 1 {
            value += pawn_shield_bonus;
        }
    }

    // Nearby friendly pieces on the king's forward side.
    let piece_protection_bonus = (30.0 * mid) as i32;
    for kind in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        for sq in board.colored_pieces(color, kind) {
            let in_front = match color {
                Color::White => (sq.rank() as i32) > king_rank,
                Color::Black => (sq.rank() as i32) < king_rank,
            };
            if in_front && eval::manhattan(sq, king_sq) <= 4 {
                value += piece_protection_bonus;
            }
        }
    }

    // Standing on or next to files without pawn cover.
    let mut exposed_files = 0usize;
    for file in [king_file - 1, king_file, king_file + 1] {
        if !(0..8).contains(&file) {
            continue;
        }
        let f = file as usize;
        if info.open_files[f] || info.semi_open_white[f] || info.semi_open_black[f] {
            exposed_files += 1;
        }
    }
    value -= (OPEN_FILE_PENALTY[exposed_files] as f64 * mid) as i32;

    // Endgame activity: chase the enemy king and shepherd the pawns,
    // passed pawns twice as urgently.
    let their_king = board.king(!color);
    let king_dist = eval::manhattan(king_sq, their_king);
    value -= (KING_DISTANCE_PENALTY as f64 * king_dist as f64 * end) as i32;

    for sq in our_pawns {
        let dist = eval::manhattan(king_sq, sq);
        let penalty = if eval::is_passed_pawn(sq, color, their_pawns) {
            PASSED_PAWN_DISTANCE_PENALTY
        } else {
            PAWN_DISTANCE_PENALTY
        };
        value -= (penalty as f64 * dist as f64 * end) as i32;
    }
    for sq in their_pawns {
        let dist = eval::manhattan(king_sq, sq);
        let penalty = if eval::is_passed_pawn(sq, !color, our_pawns) {
            PASSED_PAWN_DISTANCE_PENALTY
        } else {
            PAWN_DISTANCE_PENALTY
        };
        value -= (penalty as f64 * dist as f64 * end) as i32;
    }

    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_start_has_no_threat() {
        assert_eq!(king_threat(&Board::default(), Color::White), 0);
        assert_eq!(king_threat(&Board::default(), Color::Black), 0);
    }

    #[test]
    fn queen_next_to_king_is_a_threat() {
        let board = Board::from_fen("4k3/4q3/8/8/8/8/8/4K3 w - - 0 1", false).unwrap();
        assert!(king_threat(&board, Color::White) > 0);
        assert_eq!(king_threat(&board, Color::Black), 0);
    }
}
