//! The search: move ordering, quiescence, negamax with alpha-beta and
//! PVS, and the iterative-deepening root driver.
//!
//! Boards are copy-make (`clone` + `play`), so every line of search owns
//! its own position and deadline-triggered early returns can never leave
//! a move half-applied.

use std::cmp::Reverse;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cozy_chess::{Board, Color, Move, Piece};
use rayon::prelude::*;

use crate::search::eval::{self, DRAW_SCORE, INF};
use crate::search::see;
use crate::search::tt::Tables;

/// Hard ceiling on iterative deepening.
pub const ENGINE_DEPTH: i32 = 30;

const ASPIRATION_HALF_WIDTH: i32 = 50;
const DELTA_MARGIN: i32 = 400;
const FUTILITY_MARGIN_PER_PLY: i32 = 130;
const NULL_MOVE_MIN_DEPTH: i32 = 4;
const ROOT_EXTENSION_BUDGET: i32 = 3;

/// Shared, read-only view of one search: tables, deadline, and the
/// previous iteration's principal variation.
struct Ctx<'a> {
    tables: &'a Tables,
    hard_deadline: Instant,
    previous_pv: &'a [Move],
    mop_up: bool,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best: Option<Move>,
    /// Score from the side to move's perspective, in centipawns.
    pub eval: i32,
    pub depth: i32,
    pub nodes: u64,
    pub pv: Vec<Move>,
}

pub struct Searcher {
    tables: Arc<Tables>,
    threads: usize,
    max_depth: i32,
    quiet: bool,
    pool: Option<rayon::ThreadPool>,
}

impl Default for Searcher {
    fn default() -> Self {
        Searcher {
            tables: Arc::new(Tables::new()),
            threads: 1,
            max_depth: ENGINE_DEPTH,
            quiet: false,
            pool: None,
        }
    }
}

#[inline]
fn side_sign(board: &Board) -> i32 {
    if board.side_to_move() == Color::White {
        1
    } else {
        -1
    }
}

#[inline]
fn gives_check(board: &Board, mv: Move) -> bool {
    let mut child = board.clone();
    child.play(mv);
    !child.checkers().is_empty()
}

fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    board.generate_moves(|batch| {
        for mv in batch {
            moves.push(mv);
        }
        false
    });
    moves
}

/// Does this move menace the enemy king: landing near it, or a heavy
/// piece pulling alongside it?
fn mate_threat_move(board: &Board, mv: Move) -> bool {
    let their_king = board.king(!board.side_to_move());
    if eval::manhattan(mv.to, their_king) <= 3 {
        return true;
    }
    matches!(board.piece_on(mv.from), Some(Piece::Rook) | Some(Piece::Queen))
        && (mv.to.file() as i32 - their_king.file() as i32).abs() <= 1
        && (mv.to.rank() as i32 - their_king.rank() as i32).abs() <= 1
}

/// A pawn move that lands a passed pawn on the far half of the board.
fn promotion_threat_move(board: &Board, mv: Move) -> bool {
    let color = board.side_to_move();
    if board.piece_on(mv.from) != Some(Piece::Pawn) {
        return false;
    }
    let their_pawns = board.colored_pieces(!color, Piece::Pawn);
    if !eval::is_passed_pawn(mv.to, color, their_pawns) {
        return false;
    }
    match color {
        Color::White => mv.to.rank() as i32 > 3,
        Color::Black => (mv.to.rank() as i32) < 4,
    }
}

/// Candidate moves ordered best-first.
///
/// The hash move short-circuits every other classification; quiets keep
/// their generation order at the very end.
fn ordered_moves(ctx: &Ctx, board: &Board, depth: i32, ply: i32, leftmost: bool) -> Vec<(Move, i32)> {
    const PV_PRIORITY: i32 = 10_000;
    const HASH_PRIORITY: i32 = 9_000;
    const PROMOTION_PRIORITY: i32 = 6_000;
    const CAPTURE_PRIORITY: i32 = 4_000;
    const CHECK_PRIORITY: i32 = 4_000;
    const KILLER_PRIORITY: i32 = 2_000;

    let hash_move = ctx.tables.hash_move(board.hash());

    let mut candidates = Vec::with_capacity(48);
    let mut quiets = Vec::with_capacity(48);

    for mv in legal_moves(board) {
        if hash_move == Some(mv) {
            candidates.push((mv, HASH_PRIORITY));
            continue;
        }
        if leftmost && ctx.previous_pv.get(ply as usize) == Some(&mv) {
            candidates.push((mv, PV_PRIORITY));
        } else if ctx.tables.is_killer(depth, mv) {
            candidates.push((mv, KILLER_PRIORITY));
        } else if mv.promotion.is_some() {
            candidates.push((mv, PROMOTION_PRIORITY));
        } else if see::is_capture(board, mv) {
            candidates.push((mv, CAPTURE_PRIORITY + see::see(board, mv)));
        } else if gives_check(board, mv) {
            candidates.push((mv, CHECK_PRIORITY));
        } else {
            quiets.push((mv, 0));
        }
    }

    candidates.sort_by_key(|&(_, priority)| Reverse(priority));
    candidates.extend(quiets);
    candidates
}

/// Pick the depth for the i-th ordered move: early moves, shallow
/// searches and threatening moves keep full depth; late quiet moves are
/// reduced by up to two extra plies.
fn late_move_reduction(ctx: &Ctx, board: &Board, mv: Move, index: i32, depth: i32) -> i32 {
    let no_reduce = ctx.mop_up || mate_threat_move(board, mv) || promotion_threat_move(board, mv);
    if index <= 5 || depth <= 2 || no_reduce {
        return depth - 1;
    }

    let reduce_less = see::is_capture(board, mv)
        || gives_check(board, mv)
        || ctx.tables.is_killer(depth, mv)
        || !board.checkers().is_empty();
    if index <= 8 || reduce_less {
        depth - 2
    } else {
        depth - 3
    }
}

/// Capture-only extension of the search past the horizon.
fn quiescence(ctx: &Ctx, board: &Board, mut alpha: i32, beta: i32) -> i32 {
    ctx.tables.count_node();

    let stand_pat = side_sign(board) * eval::evaluate(board, ctx.tables);
    if stand_pat >= beta {
        return beta;
    }
    alpha = alpha.max(stand_pat);
    let mut best = stand_pat;

    let mut captures: Vec<(Move, i32)> = Vec::with_capacity(16);
    for mv in legal_moves(board) {
        if !see::is_capture(board, mv) {
            continue;
        }
        // Delta pruning: skip captures that cannot come close to beta
        // even with a generous margin.
        let victim = see::victim_value(board, mv);
        let attacker = board.piece_on(mv.from).map(see::piece_value).unwrap_or(0);
        if stand_pat + victim - attacker + DELTA_MARGIN < beta {
            continue;
        }
        captures.push((mv, see::see(board, mv)));
    }
    captures.sort_by_key(|&(_, priority)| Reverse(priority));

    for (mv, _) in captures {
        let mut child = board.clone();
        child.play(mv);
        let score = -quiescence(ctx, &child, -beta, -alpha);
        best = best.max(score);
        alpha = alpha.max(score);
        if alpha >= beta {
            return beta;
        }
    }

    best
}

/// Negamax with alpha-beta, PVS re-searches, selective extensions and
/// the pruning family. `pv` receives this node's principal variation;
/// `ply` is the distance from the root.
fn negamax(
    ctx: &Ctx,
    board: &Board,
    depth: i32,
    mut alpha: i32,
    beta: i32,
    pv: &mut Vec<Move>,
    mut leftmost: bool,
    mut extension: i32,
    ply: i32,
) -> i32 {
    ctx.tables.flush_if_oversized();

    // Deadline: the value is discarded by the caller chain.
    if Instant::now() >= ctx.hard_deadline {
        return 0;
    }
    ctx.tables.count_node();

    let moves_here = legal_moves(board);
    if moves_here.is_empty() {
        return if !board.checkers().is_empty() {
            -eval::mate_score(ply)
        } else {
            DRAW_SCORE
        };
    }
    if board.halfmove_clock() >= 100 {
        return DRAW_SCORE;
    }

    let hash = board.hash();
    if let Some(stored) = ctx.tables.probe(hash, depth) {
        if stored >= beta {
            return stored;
        }
    }

    if depth <= 0 {
        let score = quiescence(ctx, board, alpha, beta);
        ctx.tables.store(hash, score, 0);
        return score;
    }

    let in_check = !board.checkers().is_empty();
    let endgame = eval::game_phase(board) <= 12;
    let is_pv_node = alpha < beta - 1;

    // Pruning is only sound in quiet middlegame nodes with a sane window.
    let prune_ok = !in_check && !ctx.mop_up && !endgame && alpha < INF / 4 && alpha > -INF / 4;
    let stand_pat = side_sign(board) * eval::material_imbalance(board);

    // Futility: hopelessly good-for-us shallow nodes fail high at once.
    if depth < 3 && prune_ok {
        let margin = depth * FUTILITY_MARGIN_PER_PLY;
        if stand_pat - margin > beta {
            return stand_pat - margin;
        }
    }

    // Razoring: hopelessly bad shallow non-PV nodes drop to quiescence.
    if depth <= 3 && prune_ok && !is_pv_node {
        let razor_margin = 400 + (depth - 1) * 60;
        if stand_pat + razor_margin < alpha {
            return quiescence(ctx, board, alpha, beta);
        }
    }

    // Null move: hand the opponent a free move; if we still beat beta
    // the node is cut. Unsound in zugzwang-prone endgames.
    if depth >= NULL_MOVE_MIN_DEPTH && !endgame && !leftmost && !in_check && !ctx.mop_up {
        if let Some(null_board) = board.null_move() {
            let reduction = 3 + depth / 4;
            let mut null_pv = Vec::new();
            let null_eval = -negamax(
                ctx,
                &null_board,
                depth - reduction,
                -beta,
                -(beta - 1),
                &mut null_pv,
                false,
                extension,
                ply + 1,
            );
            if null_eval >= beta {
                return beta;
            }
        }
    }

    let moves = ordered_moves(ctx, board, depth, ply, leftmost);
    let one_reply = moves.len() == 1;
    let mut best_eval = -INF;

    for (i, &(mv, _)) in moves.iter().enumerate() {
        if i > 0 {
            leftmost = false;
        }

        let mut next_depth = late_move_reduction(ctx, board, mv, i as i32, depth);
        let mate_threat = mate_threat_move(board, mv);
        let promo_threat = promotion_threat_move(board, mv);
        let is_cap = see::is_capture(board, mv);

        let mut child = board.clone();
        child.play(mv);
        let is_check = !child.checkers().is_empty();

        let extend = is_check || mate_threat || promo_threat || (one_reply && !is_check);
        if extend && extension > 0 {
            extension -= 1;
            next_depth += 1;
        }

        let mut child_pv = Vec::new();
        let mut null_window = false;
        let mut score = if i == 0 || ctx.mop_up {
            // Full window, full depth for the principal move.
            -negamax(ctx, &child, next_depth, -beta, -alpha, &mut child_pv, leftmost, extension, ply + 1)
        } else {
            null_window = true;
            -negamax(ctx, &child, next_depth, -(alpha + 1), -alpha, &mut child_pv, leftmost, extension, ply + 1)
        };

        // PVS re-searches: first undo the reduction, then open the window.
        let reduced = next_depth < depth - 1;
        if score > alpha && reduced && null_window {
            child_pv.clear();
            score = -negamax(ctx, &child, depth - 1, -(alpha + 1), -alpha, &mut child_pv, leftmost, extension, ply + 1);
        }
        if score > alpha && null_window {
            child_pv.clear();
            score = -negamax(ctx, &child, depth - 1, -beta, -alpha, &mut child_pv, leftmost, extension, ply + 1);
        }

        if score > alpha {
            pv.clear();
            pv.push(mv);
            pv.extend_from_slice(&child_pv);
        }

        best_eval = best_eval.max(score);
        alpha = alpha.max(score);

        if beta <= alpha {
            if !is_cap && !is_check {
                ctx.tables.update_killers(depth, mv);
            }
            break;
        }
    }

    if !pv.is_empty() {
        ctx.tables.store(hash, best_eval, depth);
        ctx.tables.store_hash_move(hash, pv[0]);
    }

    best_eval
}

/// One root move searched to `depth` behind its own aspiration window.
/// Returns `None` when the hard deadline fell mid-search.
struct RootScore {
    mv: Move,
    eval: i32,
    pv: Vec<Move>,
    reduced: bool,
    leftmost: bool,
}

fn search_root_move(
    ctx: &Ctx,
    board: &Board,
    mv: Move,
    index: usize,
    depth: i32,
    center: i32,
) -> Option<RootScore> {
    let leftmost = index == 0;
    let mut next_depth = late_move_reduction(ctx, board, mv, index as i32, depth);
    let mate_threat = mate_threat_move(board, mv);
    let promo_threat = promotion_threat_move(board, mv);

    let mut extension = if ctx.mop_up { 0 } else { ROOT_EXTENSION_BUDGET };
    let mut child = board.clone();
    child.play(mv);
    let is_check = !child.checkers().is_empty();
    if (is_check || mate_threat || promo_threat) && extension > 0 {
        extension -= 1;
        next_depth += 1;
    }

    let mut window_left = ASPIRATION_HALF_WIDTH;
    let mut window_right = ASPIRATION_HALF_WIDTH;
    let (score, child_pv) = loop {
        let (alpha, beta) = if ctx.mop_up {
            (-INF, INF)
        } else {
            (center - window_left, center + window_right)
        };

        let mut child_pv = Vec::new();
        let score = -negamax(ctx, &child, next_depth, -beta, -alpha, &mut child_pv, leftmost, extension, 1);

        if Instant::now() >= ctx.hard_deadline {
            return None;
        }
        if ctx.mop_up {
            break (score, child_pv);
        }
        // Widen whichever side failed and try again.
        if score <= center - window_left {
            window_left *= 2;
        } else if score >= center + window_right {
            window_right *= 2;
        } else {
            break (score, child_pv);
        }
    };

    let mut pv = vec![mv];
    pv.extend(child_pv);
    Some(RootScore {
        mv,
        eval: score,
        pv,
        reduced: next_depth < depth - 1,
        leftmost,
    })
}

impl Searcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_threads(&mut self, threads: usize) {
        self.threads = threads.max(1);
        self.pool = if self.threads > 1 {
            rayon::ThreadPoolBuilder::new().num_threads(self.threads).build().ok()
        } else {
            None
        };
    }

    pub fn set_max_depth(&mut self, depth: i32) {
        self.max_depth = depth.clamp(1, 99);
    }

    /// Suppress per-iteration info lines (used by tests).
    pub fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn clear_tables(&self) {
        self.tables.clear();
    }

    /// Quiescence score of a position within a window, mover's
    /// perspective (exposed for tests).
    pub fn quiescence_eval(&self, board: &Board, alpha: i32, beta: i32) -> i32 {
        let ctx = Ctx {
            tables: &self.tables,
            hard_deadline: Instant::now() + Duration::from_secs(3600),
            previous_pv: &[],
            mop_up: eval::is_mop_up(board),
        };
        quiescence(&ctx, board, alpha, beta)
    }

    /// Ordered candidate list for a position (exposed for tests).
    pub fn order_moves(&self, board: &Board, depth: i32) -> Vec<(Move, i32)> {
        let ctx = Ctx {
            tables: &self.tables,
            hard_deadline: Instant::now() + Duration::from_secs(3600),
            previous_pv: &[],
            mop_up: eval::is_mop_up(board),
        };
        ordered_moves(&ctx, board, depth, 0, false)
    }

    /// Iterative-deepening search under a time budget.
    ///
    /// The limit is soft: past `time_limit` the search stops once the
    /// score is stable, past twice the limit it stops regardless, and at
    /// three times the limit the current iteration is abandoned and the
    /// last completed answer returned.
    pub fn find_best_move(&mut self, board: &Board, time_limit: Duration) -> SearchOutcome {
        let start = Instant::now();
        let hard_deadline = start + 3 * time_limit;
        let soft_deadline = start + 2 * time_limit;
        let side = side_sign(board);
        let mop_up = eval::is_mop_up(board);

        self.tables.flush_if_oversized();

        let legal = legal_moves(board);
        if legal.is_empty() {
            return SearchOutcome { best: None, eval: DRAW_SCORE, depth: 0, nodes: 0, pv: Vec::new() };
        }
        if legal.len() == 1 {
            let mv = legal[0];
            let score = side * eval::evaluate(board, &self.tables);
            return SearchOutcome { best: Some(mv), eval: score, depth: 0, nodes: 0, pv: vec![mv] };
        }

        let mut previous_pv: Vec<Move> = Vec::new();
        let mut moves: Vec<(Move, i32)> = {
            let ctx = Ctx { tables: &self.tables, hard_deadline, previous_pv: &previous_pv, mop_up };
            ordered_moves(&ctx, board, 1, 0, false)
        };

        let static_eval = side * eval::evaluate(board, &self.tables);

        let history_len = (self.max_depth.max(ENGINE_DEPTH) * 2 + 2) as usize;
        let mut evals = vec![0i32; history_len];
        let mut candidates: Vec<Option<Move>> = vec![None; history_len];

        let mut best_move: Option<Move> = None;
        let mut best_eval = -INF;
        let mut best_pv: Vec<Move> = Vec::new();
        let mut completed_depth = 0;
        let mut total_nodes = 0u64;

        let mut depth = 1;
        while depth <= self.max_depth {
            self.tables.reset_nodes();
            let iteration_start = Instant::now();
            let center = if depth == 1 { static_eval } else { evals[(depth - 1) as usize] };

            let results: Vec<Option<RootScore>> = {
                let ctx = Ctx { tables: &self.tables, hard_deadline, previous_pv: &previous_pv, mop_up };
                match &self.pool {
                    Some(pool) => pool.install(|| {
                        moves
                            .par_iter()
                            .enumerate()
                            .map(|(i, &(mv, _))| search_root_move(&ctx, board, mv, i, depth, center))
                            .collect()
                    }),
                    None => moves
                        .iter()
                        .enumerate()
                        .map(|(i, &(mv, _))| search_root_move(&ctx, board, mv, i, depth, center))
                        .collect(),
                }
            };

            // A missing result means the hard deadline fell mid-iteration:
            // keep the previous depth's answer.
            if results.iter().any(|r| r.is_none()) {
                total_nodes += self.tables.nodes();
                break;
            }
            let mut scored: Vec<RootScore> = results.into_iter().flatten().collect();

            let mut winner = 0;
            for (i, r) in scored.iter().enumerate() {
                if r.eval > scored[winner].eval {
                    winner = i;
                }
            }

            // A reduced move that ends up best is confirmed at full
            // depth with a wide-open window.
            if scored[winner].reduced {
                let ctx = Ctx { tables: &self.tables, hard_deadline, previous_pv: &previous_pv, mop_up };
                let r = &mut scored[winner];
                let mut child = board.clone();
                child.play(r.mv);
                let mut child_pv = Vec::new();
                let extension = if mop_up { 0 } else { ROOT_EXTENSION_BUDGET };
                let score = -negamax(&ctx, &child, depth - 1, -INF, INF, &mut child_pv, r.leftmost, extension, 1);
                if Instant::now() >= hard_deadline {
                    total_nodes += self.tables.nodes();
                    break;
                }
                r.eval = score;
                r.pv = vec![r.mv];
                r.pv.extend(child_pv);
            }

            best_move = Some(scored[winner].mv);
            best_eval = scored[winner].eval;
            best_pv = scored[winner].pv.clone();
            completed_depth = depth;

            // Best-first ordering for the next iteration.
            scored.sort_by_key(|r| Reverse(r.eval));
            moves = scored.iter().map(|r| (r.mv, r.eval)).collect();

            self.tables.store(board.hash(), best_eval, depth);
            previous_pv = best_pv.clone();

            let iteration_nodes = self.tables.nodes();
            total_nodes += iteration_nodes;

            if !self.quiet {
                println!(
                    "info depth {} score cp {} nodes {} time {} pv {}",
                    depth,
                    side * best_eval,
                    iteration_nodes,
                    iteration_start.elapsed().as_millis(),
                    crate::uci::pv_to_uci(board, &best_pv),
                );
            }

            evals[depth as usize] = best_eval;
            candidates[depth as usize] = best_move;

            let time_exceeded = start.elapsed() > time_limit;
            let past_soft = Instant::now() >= soft_deadline;
            let unstable = depth > 3
                && (evals[depth as usize] - evals[(depth - 2) as usize]).abs() > 40
                && candidates[depth as usize] != candidates[(depth - 2) as usize];

            if !time_exceeded {
                depth += 1;
            } else if !unstable {
                break;
            } else if depth > ENGINE_DEPTH || past_soft {
                break;
            } else {
                depth += 1;
            }
        }

        // If even depth 1 never finished, fall back to the top-ordered move.
        let best = best_move.or_else(|| moves.first().map(|&(mv, _)| mv));
        SearchOutcome { best, eval: best_eval, depth: completed_depth, nodes: total_nodes, pv: best_pv }
    }
}
