//! Pawn structure scoring with a per-side cache.
//!
//! Pawn evaluation is the most expensive per-piece term, and pawn
//! structures repeat constantly across the tree, so results are memoized
//! keyed by both pawn bitboards plus the game phase (the score
//! interpolates by phase, so phase is part of the key).

use std::collections::HashMap;
use std::sync::Mutex;

use cozy_chess::{Board, Color, Piece};

use crate::search::eval::{self, Info, PAWN_VALUE};
use crate::search::pst;

type Key = (u64, u64, i32);

#[derive(Default)]
pub struct PawnCache {
    white: Mutex<HashMap<Key, i32>>,
    black: Mutex<HashMap<Key, i32>>,
}

impl PawnCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn side(&self, color: Color) -> &Mutex<HashMap<Key, i32>> {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn get(&self, color: Color, key: Key) -> Option<i32> {
        self.side(color).lock().unwrap().get(&key).copied()
    }

    fn insert(&self, color: Color, key: Key, value: i32) {
        self.side(color).lock().unwrap().insert(key, value);
    }

    pub fn clear(&self) {
        self.white.lock().unwrap().clear();
        self.black.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.white.lock().unwrap().len() + self.black.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Score all pawns of `color`: base value, PST, center, isolation,
/// passers, support, advancement and doubling.
pub fn pawn_value(board: &Board, color: Color, info: &Info, cache: &PawnCache) -> i32 {
    const PASSED_PAWN_BONUS: i32 = 35;
    const PROTECTED_PASSED_PAWN_BONUS: i32 = 45;
    const CENTER_BONUS: i32 = 10;
    const ISOLATED_PAWN_PENALTY: i32 = 20;
    const UNSUPPORTED_PENALTY: i32 = 25;
    const DOUBLED_PAWN_PENALTY: i32 = 30;
    const DOUBLED_PAWN_PENALTY_DE: i32 = 40;
    const DOUBLED_ISOLATED_PENALTY: i32 = 30;

    let ours = board.colored_pieces(color, Piece::Pawn);
    let theirs = board.colored_pieces(!color, Piece::Pawn);
    let key = (ours.0, theirs.0, info.game_phase);

    if let Some(value) = cache.get(color, key) {
        return value;
    }

    let mid = info.mid_weight();
    let end = info.end_weight();

    // Phase-interpolated per-rank advancement bonus: worth more as the
    // game empties out.
    let advanced_pawn_bonus = (6.0 - info.game_phase as f64 / 6.0) as i32;

    let mut files = [0i32; 8];
    for sq in ours {
        files[sq.file() as usize] += 1;
    }

    let mut value = 0;
    for sq in ours {
        let file = sq.file() as usize;
        let rank = sq.rank() as i32;

        value += PAWN_VALUE;
        value += pst::interp(&pst::PAWN_MID, &pst::PAWN_END, pst::relative_index(sq, color), mid, end);

        if file == 3 || file == 4 {
            value += CENTER_BONUS;
        }

        let isolated = match file {
            0 => files[1] == 0,
            7 => files[6] == 0,
            f => files[f - 1] == 0 && files[f + 1] == 0,
        };
        if isolated {
            value -= ISOLATED_PAWN_PENALTY;
        }

        let protected_by_pawn = eval::is_protected_by_pawn(board, sq, color);

        if eval::is_passed_pawn(sq, color, theirs) {
            value += if protected_by_pawn {
                PROTECTED_PASSED_PAWN_BONUS
            } else {
                PASSED_PAWN_BONUS
            };
            value += pst::PASSED_PAWN[pst::relative_index(sq, color)];
        }

        // Unsupported pawns are weakest when the opponent has no pawn
        // on the file to block heavy pieces in front of them.
        if !protected_by_pawn {
            let exposed = match color {
                Color::White => info.semi_open_black[file],
                Color::Black => info.semi_open_white[file],
            };
            value -= if exposed { UNSUPPORTED_PENALTY } else { UNSUPPORTED_PENALTY - 15 };
        }

        value += match color {
            Color::White => (rank - 1) * advanced_pawn_bonus,
            Color::Black => (6 - rank) * advanced_pawn_bonus,
        };
    }

    for file in 0..8 {
        let extra = (files[file] - 1).max(0);
        value -= extra
            * if file == 3 || file == 4 {
                DOUBLED_PAWN_PENALTY_DE
            } else {
                DOUBLED_PAWN_PENALTY
            };

        let isolated = match file {
            0 => files[1] == 0,
            7 => files[6] == 0,
            f => files[f - 1] == 0 && files[f + 1] == 0,
        };
        if files[file] > 1 && isolated {
            value -= DOUBLED_ISOLATED_PENALTY;
        }
    }

    cache.insert(color, key, value);
    value
}
