//! UCI front-end: stdio command loop, move translation and time-control
//! arithmetic. Protocol replies go to stdout; diagnostics go through
//! `log` to stderr.

use std::io::{self, BufRead};
use std::time::Duration;

use cozy_chess::{Board, Color, File, Move, Piece, Square};

use crate::book;
use crate::search::alphabeta::{Searcher, ENGINE_DEPTH};

const ENGINE_NAME: &str = "Razorback";
const ENGINE_AUTHOR: &str = "the Razorback authors";

/// Default budget when the GUI gives no clock at all.
const DEFAULT_TIME_LIMIT_MS: u64 = 30_000;

/// Below this budget the search depth is capped as a safety net.
const LOW_TIME_THRESHOLD_MS: u64 = 15_000;
const LOW_TIME_DEPTH: i32 = 11;

/// Time budget and depth cap derived from a `go` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAllocation {
    pub time_limit_ms: u64,
    pub depth: i32,
}

/// Clock fields of a `go` command, in milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoClock {
    pub wtime: u64,
    pub btime: u64,
    pub winc: u64,
    pub binc: u64,
    pub movestogo: u64,
    pub movetime: u64,
}

/// Split the remaining clock into a per-move budget.
///
/// With `movetime` we spend 60% of it; otherwise the remaining time is
/// divided over the expected number of moves and topped up with the
/// increment. Short budgets also cap the iteration depth.
pub fn allocate_time(side: Color, clock: GoClock, default_depth: i32) -> TimeAllocation {
    if clock.movetime > 0 {
        return TimeAllocation { time_limit_ms: clock.movetime * 6 / 10, depth: default_depth };
    }

    let (remaining, increment) = match side {
        Color::White => (clock.wtime, clock.winc),
        Color::Black => (clock.btime, clock.binc),
    };

    let mut limit = DEFAULT_TIME_LIMIT_MS;
    if remaining > 0 {
        let divisor = if clock.movestogo > 0 { clock.movestogo + 1 } else { 40 };
        let base = remaining / divisor;
        limit = base * 6 / 10 + increment;
    }

    let depth =
        if limit < LOW_TIME_THRESHOLD_MS { default_depth.min(LOW_TIME_DEPTH) } else { default_depth };
    TimeAllocation { time_limit_ms: limit, depth }
}

/// Render a move in standard UCI. Castling is encoded internally as
/// king-takes-rook; GUIs expect the king's destination square.
pub fn move_to_uci(board: &Board, mv: Move) -> String {
    let stm = board.side_to_move();
    if board.colored_pieces(stm, Piece::King).has(mv.from)
        && board.colored_pieces(stm, Piece::Rook).has(mv.to)
    {
        let file = if (mv.to.file() as i32) > (mv.from.file() as i32) { File::G } else { File::C };
        return format!("{}{}", mv.from, Square::new(file, mv.from.rank()));
    }
    mv.to_string()
}

/// Find the legal move matching a UCI string, accepting both standard
/// castling notation and the internal king-takes-rook form.
pub fn uci_to_move(board: &Board, uci: &str) -> Option<Move> {
    let mut found = None;
    board.generate_moves(|batch| {
        for mv in batch {
            if move_to_uci(board, mv) == uci || mv.to_string() == uci {
                found = Some(mv);
                break;
            }
        }
        found.is_some()
    });
    found
}

/// Render a principal variation, replaying it from `board`.
pub fn pv_to_uci(board: &Board, pv: &[Move]) -> String {
    let mut current = board.clone();
    let mut parts = Vec::with_capacity(pv.len());
    for &mv in pv {
        parts.push(move_to_uci(&current, mv));
        current.play(mv);
    }
    parts.join(" ")
}

pub struct UciEngine {
    board: Board,
    searcher: Searcher,
    depth: i32,
}

impl Default for UciEngine {
    fn default() -> Self {
        UciEngine { board: Board::default(), searcher: Searcher::new(), depth: ENGINE_DEPTH }
    }
}

impl UciEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn cmd_uci(&self) {
        println!("id name {} {}", ENGINE_NAME, env!("CARGO_PKG_VERSION"));
        println!("id author {}", ENGINE_AUTHOR);
        println!("option name Threads type spin default 1 min 1 max 256");
        println!("option name Hash type spin default 64 min 1 max 16384");
        println!("uciok");
    }

    fn cmd_isready(&self) {
        println!("readyok");
    }

    fn cmd_ucinewgame(&mut self) {
        self.board = Board::default();
        self.searcher.clear_tables();
    }

    fn cmd_position(&mut self, args: &str) {
        let mut tokens = args.split_whitespace();
        let board = match tokens.next() {
            Some("startpos") => Board::default(),
            Some("fen") => {
                let fields: Vec<&str> = tokens.by_ref().take(6).collect();
                match Board::from_fen(&fields.join(" "), false) {
                    Ok(board) => board,
                    Err(err) => {
                        log::warn!("rejecting position command, malformed FEN: {err:?}");
                        return;
                    }
                }
            }
            _ => return,
        };

        self.board = board;
        if tokens.next() == Some("moves") {
            for token in tokens {
                match uci_to_move(&self.board, token) {
                    Some(mv) => self.board.play(mv),
                    None => {
                        log::warn!("ignoring illegal move from GUI: {token}");
                        break;
                    }
                }
            }
        }
    }

    fn cmd_setoption(&mut self, args: &str) {
        let tokens: Vec<&str> = args.split_whitespace().collect();
        let name_pos = tokens.iter().position(|&t| t == "name");
        let value_pos = tokens.iter().position(|&t| t == "value");
        let (name, value) = match (name_pos, value_pos) {
            (Some(n), Some(v)) if n + 1 <= v => (tokens[n + 1..v].join(" "), tokens[v + 1..].join(" ")),
            (Some(n), None) => (tokens[n + 1..].join(" "), String::new()),
            _ => return,
        };

        match name.as_str() {
            "Threads" => {
                if let Ok(threads) = value.parse::<usize>() {
                    self.searcher.set_threads(threads);
                }
            }
            "Hash" => {
                // The tables grow on demand; the spin is accepted for
                // GUI compatibility.
                log::debug!("Hash option set to {value} MB");
            }
            other => {
                eprintln!("Unknown option: {other}");
            }
        }
    }

    fn cmd_go(&mut self, args: &str) {
        // Book moves bypass the search entirely.
        if let Some(book_move) = book::book_move(&self.board) {
            println!("info depth 0 score cp 0 nodes 0 time 0 pv {}", book_move);
            println!("bestmove {}", book_move);
            return;
        }

        let mut clock = GoClock::default();
        let mut depth = self.depth;
        let mut tokens = args.split_whitespace();
        while let Some(token) = tokens.next() {
            let mut next_u64 = || tokens.next().and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);
            match token {
                "wtime" => clock.wtime = next_u64(),
                "btime" => clock.btime = next_u64(),
                "winc" => clock.winc = next_u64(),
                "binc" => clock.binc = next_u64(),
                "movestogo" => clock.movestogo = next_u64(),
                "movetime" => clock.movetime = next_u64(),
                "depth" => depth = next_u64() as i32,
                _ => {}
            }
        }

        let allocation = allocate_time(self.board.side_to_move(), clock, depth);
        self.searcher.set_max_depth(allocation.depth);
        let outcome = self
            .searcher
            .find_best_move(&self.board, Duration::from_millis(allocation.time_limit_ms));

        match outcome.best {
            Some(mv) => println!("bestmove {}", move_to_uci(&self.board, mv)),
            None => println!("bestmove 0000"),
        }
    }

    pub fn run_loop(&mut self) {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line.trim().to_string(),
                Err(_) => break,
            };
            if line.is_empty() {
                continue;
            }
            if line == "uci" {
                self.cmd_uci();
            } else if line == "isready" {
                self.cmd_isready();
            } else if line == "ucinewgame" {
                self.cmd_ucinewgame();
            } else if line == "quit" {
                break;
            } else if let Some(rest) = line.strip_prefix("position ") {
                self.cmd_position(rest);
            } else if let Some(rest) = line.strip_prefix("setoption ") {
                self.cmd_setoption(rest);
            } else if line == "go" {
                self.cmd_go("");
            } else if let Some(rest) = line.strip_prefix("go ") {
                self.cmd_go(rest);
            }
        }
    }
}
