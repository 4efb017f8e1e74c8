// Copyright 2023 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

//! Chess board with fog of war
//!
//! A _board_ holds the state of a two-player game and enforces the
//! rules. The following features are supported:
//!
//! [x] Standard chess rules, including castling, en passant and promotion
//! [x] Check, checkmate and stalemate detection
//! [x] Algebraic move history with check and mate suffixes
//! [x] Fog of war: the squares each side can see
//! [x] Save and restore through a forgiving JSON record
//! [ ] Disambiguation of moves in the history (e.g. `Nbd2`)
//! [ ] Draw by repetition or the fifty-move rule
//!
//! Some of the key abstractions include:
//!
//! * A `Square` represents the coordinates of a single square on an
//!   8-by-8 board. Rows are `Rank`s (`Rank8` .. `Rank1`, top to bottom)
//!   and columns are `File`s (`FileA` .. `FileH`). Squares are named by
//!   file letter and rank number (`A8` .. `H1`); `x()` and `y()` give
//!   the column and row used by the save record.
//!
//! * A `Mask` is a 64-bit (u64) value in which each bit maps to a
//!   square on the board. Masks hold move destinations and the visible
//!   squares of each side, and combine with `|`, `|=` and `&`.
//!
//! * A `Piece` has a `Color`, a `PieceKind` and remembers whether it
//!   has moved, which decides castling rights.
//!
//! * A `Position` is the contents of the 64 squares and nothing else.
//!   It is a small `Copy` value, so the legality filter tries a move on
//!   a copy and asks whether the mover's king is attacked afterwards.
//!
//! * `LegalMoves` is implemented by anything that knows a position,
//!   the side to move and the en passant target. Both `GameState` and
//!   the detached `Snapshot` use it.
//!
//! * `GameState` owns a game: turn order, en passant target, pending
//!   promotion, move history, captured pieces, check flag, result,
//!   the clocks' remaining time and display preferences. A pawn
//!   reaching the far rank stops the game until `promote` is called.
//!   Once a result is set every further move is rejected.
//!

mod config;
mod legal;
mod material;
mod moves;
mod play;
mod position;
pub mod san;
mod square;
mod visibility;

pub use config::*;
pub use legal::*;
pub use material::*;
pub use moves::*;
pub use play::*;
pub use position::*;
pub use square::*;

pub trait Turn {
    fn turn(&self) -> Color;
}

/// A new game in the standard starting position, White to move.
pub fn new_game() -> GameState {
    GameState::new()
}
