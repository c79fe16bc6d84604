//! Shared search tables: transposition table, hash-move table, killer
//! moves, the pawn cache and the node counter.
//!
//! One `Tables` value is owned by the searcher behind an `Arc`; every
//! map is guarded by its own mutex so parallel root workers can share
//! it. When the transposition table outgrows its capacity all four
//! tables are flushed together, since the hash moves and pawn scores
//! are only as fresh as the entries that produced them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use cozy_chess::Move;

use crate::search::pawns::PawnCache;

/// Flush threshold, in entries.
pub const MAX_TABLE_ENTRIES: usize = 10_000_000;

/// Deepest killer slot; depths beyond this simply stop recording.
const MAX_KILLER_DEPTH: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtEntry {
    pub eval: i32,
    pub depth: i32,
}

pub struct Tables {
    tt: Mutex<HashMap<u64, TtEntry>>,
    hash_moves: Mutex<HashMap<u64, Move>>,
    killers: Mutex<Vec<[Option<Move>; 2]>>,
    pawns: PawnCache,
    nodes: AtomicU64,
    capacity: usize,
}

impl Default for Tables {
    fn default() -> Self {
        Self::with_capacity(MAX_TABLE_ENTRIES)
    }
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capacity override, used by tests to exercise the flush path.
    pub fn with_capacity(capacity: usize) -> Self {
        Tables {
            tt: Mutex::new(HashMap::new()),
            hash_moves: Mutex::new(HashMap::new()),
            killers: Mutex::new(vec![[None; 2]; MAX_KILLER_DEPTH]),
            pawns: PawnCache::new(),
            nodes: AtomicU64::new(0),
            capacity,
        }
    }

    /// TT probe: an entry is believed only if it was searched at least
    /// as deep as the request.
    pub fn probe(&self, hash: u64, depth: i32) -> Option<i32> {
        let tt = self.tt.lock().unwrap();
        match tt.get(&hash) {
            Some(entry) if entry.depth >= depth => Some(entry.eval),
            _ => None,
        }
    }

    /// Unconditional overwrite.
    pub fn store(&self, hash: u64, eval: i32, depth: i32) {
        self.tt.lock().unwrap().insert(hash, TtEntry { eval, depth });
    }

    pub fn hash_move(&self, hash: u64) -> Option<Move> {
        self.hash_moves.lock().unwrap().get(&hash).copied()
    }

    pub fn store_hash_move(&self, hash: u64, mv: Move) {
        self.hash_moves.lock().unwrap().insert(hash, mv);
    }

    pub fn killers_at(&self, depth: i32) -> [Option<Move>; 2] {
        let killers = self.killers.lock().unwrap();
        match killers.get(depth.max(0) as usize) {
            Some(slot) => *slot,
            None => [None; 2],
        }
    }

    pub fn is_killer(&self, depth: i32, mv: Move) -> bool {
        let slot = self.killers_at(depth);
        slot[0] == Some(mv) || slot[1] == Some(mv)
    }

    /// Record a quiet cutoff move: new killers push the old slot 0 down.
    pub fn update_killers(&self, depth: i32, mv: Move) {
        let depth = depth.max(0) as usize;
        let mut killers = self.killers.lock().unwrap();
        if let Some(slot) = killers.get_mut(depth) {
            if slot[0] != Some(mv) {
                slot[1] = slot[0];
                slot[0] = Some(mv);
            }
        }
    }

    pub fn pawn_cache(&self) -> &PawnCache {
        &self.pawns
    }

    #[inline]
    pub fn count_node(&self) {
        self.nodes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    pub fn reset_nodes(&self) {
        self.nodes.store(0, Ordering::Relaxed);
    }

    pub fn tt_len(&self) -> usize {
        self.tt.lock().unwrap().len()
    }

    /// Flush everything once the TT outgrows its cap.
    pub fn flush_if_oversized(&self) {
        if self.tt_len() > self.capacity {
            self.clear();
        }
    }

    /// Drop all cached state; the node counter is left alone.
    pub fn clear(&self) {
        self.tt.lock().unwrap().clear();
        self.hash_moves.lock().unwrap().clear();
        let mut killers = self.killers.lock().unwrap();
        for slot in killers.iter_mut() {
            *slot = [None; 2];
        }
        self.pawns.clear();
    }
}
