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

use std::fmt;
use std::ops::Index;
use strum::IntoEnumIterator;

use super::material::{Color, Piece, PieceKind};
use super::moves::{Move, MoveFlag};
use super::square::{File, Mask, Rank, Square};

use PieceKind::*;

/// Contents of the 64 squares.
///
/// A `Position` is a plain value: copying it is how the legality
/// filter simulates a candidate move without touching the game.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    squares: [Option<Piece>; 64],
}

impl Default for Position {
    fn default() -> Self {
        Self::standard()
    }
}

impl Index<Square> for Position {
    type Output = Option<Piece>;
    fn index(&self, index: Square) -> &Self::Output {
        &self.squares[index.to_index()]
    }
}

impl Position {
    pub const fn empty() -> Self {
        Self {
            squares: [None; 64],
        }
    }

    /// The standard starting placement.
    pub fn standard() -> Self {
        const BACK_ROW: [PieceKind; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        let mut position = Self::empty();
        for color in Color::iter() {
            for (file, kind) in File::iter().zip(BACK_ROW) {
                position.place(Square::new(file, Rank::back_rank(color)), Piece::new(color, kind));
                position.place(Square::new(file, Rank::pawn_rank(color)), Piece::new(color, Pawn));
            }
        }
        position
    }

    #[inline]
    pub fn contents(&self, square: Square) -> Option<Piece> {
        self.squares[square.to_index()]
    }

    /// Builder used to set up positions.
    pub fn set_contents(mut self, square: Square, piece: Option<Piece>) -> Self {
        self.squares[square.to_index()] = piece;
        self
    }

    /// Puts `piece` on `square`, returning whatever stood there.
    pub fn place(&mut self, square: Square, piece: Piece) -> Option<Piece> {
        self.squares[square.to_index()].replace(piece)
    }

    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        self.squares[square.to_index()].take()
    }

    pub fn pieces(&self, color: Color) -> Mask {
        Square::iter()
            .filter(|&square| matches!(self[square], Some(piece) if piece.color() == color))
            .collect()
    }

    pub fn occupied(&self) -> Mask {
        Square::iter().filter(|&square| self[square].is_some()).collect()
    }

    pub fn king(&self, color: Color) -> Option<Square> {
        Square::iter().find(|&square| {
            matches!(self[square], Some(piece) if piece.color() == color && piece.kind().is_king())
        })
    }

    /// Applies `mv` to the squares only: turn, history and en passant
    /// bookkeeping belong to the game. Returns the captured piece,
    /// which for en passant is the pawn beside the origin square.
    pub fn apply_move(&mut self, mv: Move) -> Option<Piece> {
        let mut piece = self.remove(mv.from)?;
        piece.set_moved();
        let mut captured = self.place(mv.to, piece);
        match mv.flag {
            MoveFlag::EnPassant => {
                let target = Square::new(mv.to.file(), mv.from.rank());
                captured = self.remove(target);
            }
            MoveFlag::CastleShort | MoveFlag::CastleLong => {
                if let Some((rook_src, rook_dest)) = mv.rook_squares() {
                    if let Some(rook) = self.remove(rook_src) {
                        self.place(rook_dest, rook.moved());
                    }
                }
            }
            MoveFlag::Normal | MoveFlag::Capture => {}
        }
        captured
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter() {
            for file in File::iter() {
                let c = match self[Square::new(file, rank)] {
                    Some(piece) => match piece.color() {
                        Color::White => piece.kind().symbol(),
                        Color::Black => piece.kind().symbol().to_ascii_lowercase(),
                    },
                    None => '.',
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use Square::*;

    #[test]
    fn test_standard_placement() {
        let position = Position::default();
        assert_eq!(position[E1], Some(Piece::WK));
        assert_eq!(position[D8], Some(Piece::BQ));
        assert_eq!(position[A2], Some(Piece::WP));
        assert_eq!(position[H7], Some(Piece::BP));
        assert_eq!(position[E4], None);
        assert_eq!(position.pieces(Color::White).len(), 16);
        assert_eq!(position.occupied().len(), 32);
        assert_eq!(position.king(Color::Black), Some(E8));
    }

    #[test]
    fn test_apply_move_marks_piece_moved() {
        let mut position = Position::default();
        let captured = position.apply_move(Move::new(G1, F3, MoveFlag::Normal));
        assert_eq!(captured, None);
        assert_eq!(position[G1], None);
        assert_eq!(position[F3], Some(Piece::WN.moved()));
    }

    #[test]
    fn test_apply_en_passant_removes_passed_pawn() {
        let mut position = Position::empty()
            .set_contents(E5, Some(Piece::WP.moved()))
            .set_contents(D5, Some(Piece::BP.moved()));
        let captured = position.apply_move(Move::new(E5, D6, MoveFlag::EnPassant));
        assert_eq!(captured, Some(Piece::BP.moved()));
        assert_eq!(position[D5], None);
        assert_eq!(position[D6], Some(Piece::WP.moved()));
    }

    #[test]
    fn test_apply_castle_moves_rook() {
        let mut position = Position::default()
            .set_contents(B8, None)
            .set_contents(C8, None)
            .set_contents(D8, None);
        position.apply_move(Move::new(E8, C8, MoveFlag::CastleLong));
        assert_eq!(position[C8], Some(Piece::BK.moved()));
        assert_eq!(position[D8], Some(Piece::BR.moved()));
        assert_eq!(position[A8], None);
        assert_eq!(position[E8], None);
    }
}
