pub mod attacks;
pub mod board;
pub mod game;
pub mod history;
pub mod movegen;
pub mod san;
pub mod types;
pub mod zobrist;

pub use board::{Board, CastleSide, STARTING_FEN};
pub use game::MovePosStack;
pub use history::MoveHistory;
pub use movegen::{AttackPosInfo, legal_moves};
pub use types::*;
