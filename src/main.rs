use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use cozy_chess::Board;

use razorback::search::alphabeta::Searcher;
use razorback::uci::{move_to_uci, UciEngine};

#[derive(Parser, Debug)]
#[command(author, version, about = "UCI chess engine", long_about = None)]
struct Args {
    /// Analyze a single position instead of running the UCI loop
    #[arg(long)]
    fen: Option<String>,

    /// Maximum search depth in analyze mode
    #[arg(long, default_value_t = 8)]
    depth: i32,

    /// Time budget per move in milliseconds (analyze mode)
    #[arg(long, default_value_t = 15_000)]
    movetime: u64,

    /// Worker threads for the root search
    #[arg(long, default_value_t = 1)]
    threads: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(fen) = args.fen {
        let board = Board::from_fen(&fen, false)
            .map_err(|err| anyhow::anyhow!("invalid FEN {fen:?}: {err:?}"))?;

        let mut searcher = Searcher::new();
        searcher.set_threads(args.threads);
        searcher.set_max_depth(args.depth);

        let outcome = searcher.find_best_move(&board, Duration::from_millis(args.movetime));
        match outcome.best {
            Some(mv) => println!("bestmove {}", move_to_uci(&board, mv)),
            None => println!("bestmove 0000"),
        }
        return Ok(());
    }

    UciEngine::new().run_loop();
    Ok(())
}
