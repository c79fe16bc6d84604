pub mod alphabeta;
pub mod eval;
pub mod king;
pub mod pawns;
pub mod pst;
pub mod see;
pub mod tt;
