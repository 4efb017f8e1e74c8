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

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use strum::IntoEnumIterator;
use thiserror::Error;

use super::material::{Piece, PieceKind};
use super::position::Position;
use super::square::{Direction, Mask, Offset, Rank, Square};

use PieceKind::*;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("Not a legal move")]
    IllegalMove,
    #[error("Pawns may only be promoted to a queen, rook, bishop or knight")]
    InvalidPromotionChoice,
    #[error("The game is over")]
    GameOver,
    #[error("A promotion choice is pending")]
    PromotionPending,
    #[error("No promotion is pending")]
    NoPromotionPending,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveFlag {
    Normal,
    Capture,
    EnPassant,
    CastleShort,
    CastleLong,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub flag: MoveFlag,
}

impl Move {
    pub fn new(from: Square, to: Square, flag: MoveFlag) -> Self {
        Self { from, to, flag }
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        matches!(self.flag, MoveFlag::Capture | MoveFlag::EnPassant)
    }

    #[inline]
    pub fn is_castle(&self) -> bool {
        matches!(self.flag, MoveFlag::CastleShort | MoveFlag::CastleLong)
    }

    /// Source and destination of the rook for a castling move.
    pub fn rook_squares(&self) -> Option<(Square, Square)> {
        let (src, dest) = match self.flag {
            MoveFlag::CastleShort => (Offset::new(3, 0), Offset::new(1, 0)),
            MoveFlag::CastleLong => (Offset::new(-4, 0), Offset::new(-1, 0)),
            _ => return None,
        };
        Some(((self.from + src)?, (self.from + dest)?))
    }

    /// The square the king crosses on its way to a castling destination.
    pub fn transit_square(&self) -> Option<Square> {
        match self.flag {
            MoveFlag::CastleShort => self.from + Direction::Right,
            MoveFlag::CastleLong => self.from + Direction::Left,
            _ => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// Moves of a single piece keyed by destination.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveSet {
    destinations: Mask,
    map: HashMap<Square, Move>,
}

impl MoveSet {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, mv: Move) {
        self.destinations.set(mv.to);
        self.map.insert(mv.to, mv);
    }
    pub fn destinations(&self) -> Mask {
        self.destinations
    }
    pub fn get(&self, dest: Square) -> Option<Move> {
        self.map.get(&dest).copied()
    }
    pub fn contains(&self, dest: Square) -> bool {
        self.destinations.contains(dest)
    }
    pub fn len(&self) -> usize {
        self.destinations.len()
    }
    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }
    /// Moves in destination order.
    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.destinations.iter().filter_map(|dest| self.get(dest))
    }
    pub fn retain<F: FnMut(&Move) -> bool>(mut self, mut keep: F) -> Self {
        self.map.retain(|_, mv| keep(mv));
        self.destinations = self.map.keys().copied().collect();
        self
    }
}

impl FromIterator<Move> for MoveSet {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        let mut set = MoveSet::new();
        for mv in iter {
            set.insert(mv);
        }
        set
    }
}

impl Position {
    /// Moves following each piece's movement pattern, ignoring whether
    /// they leave the mover's own king attacked.
    pub fn pseudo_legal_moves(&self, from: Square, en_passant: Option<Square>) -> MoveSet {
        let Some(piece) = self.contents(from) else {
            return MoveSet::new();
        };
        match piece.kind() {
            Pawn => self.pawn_moves(from, piece, en_passant),
            Knight => self.step_moves(from, piece, &KNIGHT_MOVES[from]),
            Bishop => self.line_moves(from, piece, Direction::diagonals()),
            Rook => self.line_moves(from, piece, Direction::horizontals()),
            Queen => self.line_moves(from, piece, Direction::iter()),
            King => {
                let mut moves = self.step_moves(from, piece, &KING_MOVES[from]);
                for mv in self.castle_moves(from, piece) {
                    moves.insert(mv);
                }
                moves
            }
        }
    }

    fn target(&self, piece: Piece, from: Square, to: Square) -> Option<Move> {
        match self.contents(to) {
            None => Some(Move::new(from, to, MoveFlag::Normal)),
            Some(other) if !piece.is_friend(&other) => Some(Move::new(from, to, MoveFlag::Capture)),
            Some(_) => None,
        }
    }

    fn step_moves(&self, from: Square, piece: Piece, destinations: &Mask) -> MoveSet {
        destinations
            .iter()
            .filter_map(|to| self.target(piece, from, to))
            .collect()
    }

    fn line_moves<I>(&self, from: Square, piece: Piece, directions: I) -> MoveSet
    where
        I: Iterator<Item = Direction>,
    {
        let mut result = MoveSet::new();
        for direction in directions {
            let mut square = from;
            while let Some(to) = square + direction {
                match self.target(piece, from, to) {
                    Some(mv) => {
                        result.insert(mv);
                        if mv.is_capture() {
                            break;
                        }
                    }
                    None => break,
                }
                square = to;
            }
        }
        result
    }

    fn pawn_moves(&self, from: Square, piece: Piece, en_passant: Option<Square>) -> MoveSet {
        let mut result = MoveSet::new();
        let forward = piece.color().forward();
        if let Some(one) = from + Offset::new(0, forward) {
            if self.contents(one).is_none() {
                result.insert(Move::new(from, one, MoveFlag::Normal));
                if from.rank() == Rank::pawn_rank(piece.color()) {
                    if let Some(two) = from + Offset::new(0, 2 * forward) {
                        if self.contents(two).is_none() {
                            result.insert(Move::new(from, two, MoveFlag::Normal));
                        }
                    }
                }
            }
        }
        for dx in [-1, 1] {
            let Some(to) = from + Offset::new(dx, forward) else {
                continue;
            };
            match self.contents(to) {
                Some(other) if !piece.is_friend(&other) => {
                    result.insert(Move::new(from, to, MoveFlag::Capture));
                }
                None if en_passant == Some(to) => {
                    result.insert(Move::new(from, to, MoveFlag::EnPassant));
                }
                _ => {}
            }
        }
        result
    }

    /// Castling checks only emptiness and move history here; attacked
    /// squares are the legality filter's business.
    fn castle_moves(&self, from: Square, king: Piece) -> Vec<Move> {
        let mut result = Vec::new();
        if king.has_moved() {
            return result;
        }
        let sides = [
            (1, 2, MoveFlag::CastleShort),
            (-1, 3, MoveFlag::CastleLong),
        ];
        for (step, gap, flag) in sides {
            let lane_empty = (1..=gap).all(|i| {
                matches!(from + Offset::new(step * i, 0), Some(square) if self.contents(square).is_none())
            });
            let rook_ready = match from + Offset::new(step * (gap + 1), 0) {
                Some(square) => matches!(
                    self.contents(square),
                    Some(rook) if rook.kind().is_rook() && rook.is_friend(&king) && !rook.has_moved()
                ),
                None => false,
            };
            if lane_empty && rook_ready {
                if let Some(to) = from + Offset::new(step * 2, 0) {
                    result.push(Move::new(from, to, flag));
                }
            }
        }
        result
    }
}

static KING_MOVES: Lazy<[Mask; 64]> = Lazy::new(|| {
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square] = Direction::iter().filter_map(|dir| square + dir).collect();
    }
    array
});

static KNIGHT_MOVES: Lazy<[Mask; 64]> = Lazy::new(|| {
    const OFFSETS: [Offset; 8] = [
        Offset::new(-2, -1),
        Offset::new(-2, 1),
        Offset::new(2, -1),
        Offset::new(2, 1),
        Offset::new(-1, -2),
        Offset::new(-1, 2),
        Offset::new(1, -2),
        Offset::new(1, 2),
    ];
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square] = OFFSETS.into_iter().filter_map(|offset| square + offset).collect();
    }
    array
});

#[cfg(test)]
mod tests {
    use crate::*;
    use Square::*;

    fn destinations(position: &Position, from: Square) -> Mask {
        position.pseudo_legal_moves(from, None).destinations()
    }

    #[test]
    fn test_white_pawn_single_and_double_advance() {
        let position = Position::default();
        let moves = destinations(&position, E2);
        assert_eq!(moves.len(), 2);
        assert!(moves.contains(E3));
        assert!(moves.contains(E4));
    }
    #[test]
    fn test_black_pawn_single_and_double_advance() {
        let position = Position::default();
        let moves = destinations(&position, D7);
        assert_eq!(moves.len(), 2);
        assert!(moves.contains(D6));
        assert!(moves.contains(D5));
    }
    #[test]
    fn test_pawn_advance_blocked() {
        let position = Position::default().set_contents(E3, Some(Piece::BB));
        let moves = destinations(&position, E2);
        assert!(!moves.contains(E3));
        assert!(!moves.contains(E4));
    }
    #[test]
    fn test_pawn_double_advance_blocked() {
        let position = Position::default().set_contents(E4, Some(Piece::BB));
        let moves = destinations(&position, E2);
        assert!(moves.contains(E3));
        assert!(!moves.contains(E4));
    }
    #[test]
    fn test_pawn_double_advance_only_from_start_rank() {
        let position = Position::default()
            .set_contents(E2, None)
            .set_contents(E3, Some(Piece::WP.moved()));
        let moves = destinations(&position, E3);
        assert_eq!(moves.len(), 1);
        assert!(moves.contains(E4));
    }
    #[test]
    fn test_pawn_captures() {
        let position = Position::default()
            .set_contents(D3, Some(Piece::BB))
            .set_contents(F3, Some(Piece::WN));
        let moves = position.pseudo_legal_moves(E2, None);
        assert_eq!(moves.get(D3).map(|mv| mv.flag), Some(MoveFlag::Capture));
        assert!(!moves.contains(F3));
    }
    #[test]
    fn test_pawn_en_passant_target() {
        let position = Position::empty()
            .set_contents(A5, Some(Piece::WP.moved()))
            .set_contents(B5, Some(Piece::BP.moved()));
        assert!(!destinations(&position, A5).contains(B6));
        let moves = position.pseudo_legal_moves(A5, Some(B6));
        assert_eq!(moves.get(B6).map(|mv| mv.flag), Some(MoveFlag::EnPassant));
    }
    #[test]
    fn test_knight_destinations() {
        let position = Position::default();
        let moves = destinations(&position, G1);
        assert_eq!(moves.len(), 2);
        assert!(moves.contains(F3));
        assert!(moves.contains(H3));
    }
    #[test]
    fn test_knight_blocked() {
        let position = Position::default()
            .set_contents(F3, Some(Piece::WP))
            .set_contents(H3, Some(Piece::WP));
        assert!(destinations(&position, G1).is_empty());
    }
    #[test]
    fn test_rook_destinations() {
        let position = Position::default()
            .set_contents(A2, None)
            .set_contents(B1, None);
        let moves = position.pseudo_legal_moves(A1, None);
        assert_eq!(moves.len(), 7);
        assert!(moves.contains(B1));
        assert!(!moves.contains(C1));
        assert!(moves.contains(A3));
        assert_eq!(moves.get(A7).map(|mv| mv.flag), Some(MoveFlag::Capture));
        assert!(!moves.contains(A8));
    }
    #[test]
    fn test_bishop_destinations() {
        let position = Position::default()
            .set_contents(C2, None)
            .set_contents(D2, None);
        let moves = destinations(&position, C1);
        assert_eq!(moves.len(), 5);
        assert!(!moves.contains(B2));
        assert!(moves.contains(D2));
        assert!(moves.contains(E3));
        assert!(moves.contains(H6));
    }
    #[test]
    fn test_queen_destinations() {
        let position = Position::default()
            .set_contents(C1, None)
            .set_contents(C2, None)
            .set_contents(D2, None);
        let moves = destinations(&position, D1);
        assert_eq!(moves.len(), 10);
        assert!(moves.contains(C1));
        assert!(!moves.contains(B1));
        assert!(moves.contains(B3));
        assert!(moves.contains(D7));
        assert!(!moves.contains(D8));
        assert!(!moves.contains(E2));
    }
    #[test]
    fn test_king_blocked() {
        let position = Position::default();
        assert!(destinations(&position, E1).is_empty());
    }
    #[test]
    fn test_short_castle_listed() {
        let position = Position::default()
            .set_contents(F1, None)
            .set_contents(G1, None);
        let moves = position.pseudo_legal_moves(E1, None);
        assert_eq!(moves.get(G1).map(|mv| mv.flag), Some(MoveFlag::CastleShort));
        assert!(!moves.contains(H1));
    }
    #[test]
    fn test_long_castle_listed() {
        let position = Position::default()
            .set_contents(B8, None)
            .set_contents(C8, None)
            .set_contents(D8, None);
        let moves = position.pseudo_legal_moves(E8, None);
        assert_eq!(moves.get(C8).map(|mv| mv.flag), Some(MoveFlag::CastleLong));
    }
    #[test]
    fn test_long_castle_lane_blocked() {
        let position = Position::default()
            .set_contents(C1, None)
            .set_contents(D1, None);
        assert!(!destinations(&position, E1).contains(C1));
    }
    #[test]
    fn test_castle_needs_unmoved_rook() {
        let position = Position::default()
            .set_contents(F1, None)
            .set_contents(G1, None)
            .set_contents(H1, Some(Piece::WR.moved()));
        assert!(!destinations(&position, E1).contains(G1));
    }
    #[test]
    fn test_castle_needs_unmoved_king() {
        let position = Position::default()
            .set_contents(F1, None)
            .set_contents(G1, None)
            .set_contents(E1, Some(Piece::WK.moved()));
        assert!(!destinations(&position, E1).contains(G1));
    }
    #[test]
    fn test_move_set_iterates_by_destination() {
        let position = Position::default();
        let moves: Vec<Square> = position
            .pseudo_legal_moves(B1, None)
            .iter()
            .map(|mv| mv.to)
            .collect();
        assert_eq!(moves, vec![A3, C3]);
    }
}
