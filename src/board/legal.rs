// Copyright 2026 The fog-chess Authors
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

use super::config::CastlingRule;
use super::material::Color;
use super::moves::{Move, MoveFlag, MoveSet};
use super::position::Position;
use super::square::{Offset, Square};
use super::Turn;

impl Position {
    /// True if any piece of color `by` could capture on `square`. Pawn
    /// pushes and castling never attack; a pawn covers its two forward
    /// diagonals whether or not they are occupied.
    pub fn is_attacked(&self, square: Square, by: Color) -> bool {
        self.pieces(by).iter().any(|from| match self.contents(from) {
            Some(piece) if piece.kind().is_pawn() => [-1, 1]
                .into_iter()
                .any(|dx| from + Offset::new(dx, by.forward()) == Some(square)),
            Some(_) => self
                .pseudo_legal_moves(from, None)
                .get(square)
                .is_some_and(|mv| !mv.is_castle()),
            None => false,
        })
    }

    /// A position without a king of `color` is never in check.
    pub fn is_in_check(&self, color: Color) -> bool {
        match self.king(color) {
            Some(king) => self.is_attacked(king, !color),
            None => false,
        }
    }

    /// Pseudo-legal moves of the piece on `from` that do not leave its
    /// own king attacked. Empty unless the piece belongs to `turn`.
    pub fn legal_moves(
        &self,
        from: Square,
        turn: Color,
        en_passant: Option<Square>,
        castling: CastlingRule,
    ) -> MoveSet {
        match self.contents(from) {
            Some(piece) if piece.color() == turn => self
                .pseudo_legal_moves(from, en_passant)
                .retain(|mv| self.is_safe(*mv, turn, castling)),
            _ => MoveSet::new(),
        }
    }

    pub fn has_any_legal_move(
        &self,
        color: Color,
        en_passant: Option<Square>,
        castling: CastlingRule,
    ) -> bool {
        self.pieces(color)
            .iter()
            .any(|from| !self.legal_moves(from, color, en_passant, castling).is_empty())
    }

    pub fn is_checkmate(&self, color: Color, en_passant: Option<Square>, castling: CastlingRule) -> bool {
        self.is_in_check(color) && !self.has_any_legal_move(color, en_passant, castling)
    }

    pub fn is_stalemate(&self, color: Color, en_passant: Option<Square>, castling: CastlingRule) -> bool {
        !self.is_in_check(color) && !self.has_any_legal_move(color, en_passant, castling)
    }

    fn is_safe(&self, mv: Move, color: Color, castling: CastlingRule) -> bool {
        if mv.is_castle() && castling == CastlingRule::Strict {
            if self.is_in_check(color) {
                return false;
            }
            if let Some(transit) = mv.transit_square() {
                if self.is_attacked(transit, !color) {
                    return false;
                }
            }
        }
        // a castling king is tried on its destination without the rook
        let tried = if mv.is_castle() {
            Move::new(mv.from, mv.to, MoveFlag::Normal)
        } else {
            mv
        };
        let mut scratch = *self;
        scratch.apply_move(tried);
        !scratch.is_in_check(color)
    }
}

/// Legal-move queries for anything that knows its position, whose turn
/// it is and the current en passant target.
pub trait LegalMoves: AsRef<Position> + Turn {
    fn en_passant(&self) -> Option<Square>;

    fn castling_rule(&self) -> CastlingRule {
        CastlingRule::default()
    }

    fn legal_moves(&self, from: Square) -> MoveSet {
        let pos: &Position = self.as_ref();
        pos.legal_moves(from, self.turn(), self.en_passant(), self.castling_rule())
    }

    /// Whether the side to move is in check.
    fn is_check(&self) -> bool {
        let pos: &Position = self.as_ref();
        pos.is_in_check(self.turn())
    }

    /// Whether the side to move has at least one legal move.
    fn can_move(&self) -> bool {
        let pos: &Position = self.as_ref();
        pos.has_any_legal_move(self.turn(), self.en_passant(), self.castling_rule())
    }
}

/// A position together with the side to move, detached from any game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    position: Position,
    turn: Color,
    en_passant: Option<Square>,
    castling: CastlingRule,
}

impl Snapshot {
    pub fn new(position: Position, turn: Color) -> Self {
        Self {
            position,
            turn,
            en_passant: None,
            castling: CastlingRule::default(),
        }
    }
    pub fn with_en_passant(mut self, en_passant: Option<Square>) -> Self {
        self.en_passant = en_passant;
        self
    }
    pub fn with_castling(mut self, castling: CastlingRule) -> Self {
        self.castling = castling;
        self
    }
}

impl AsRef<Position> for Snapshot {
    fn as_ref(&self) -> &Position {
        &self.position
    }
}

impl Turn for Snapshot {
    fn turn(&self) -> Color {
        self.turn
    }
}

impl LegalMoves for Snapshot {
    fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }
    fn castling_rule(&self) -> CastlingRule {
        self.castling
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use strum::IntoEnumIterator;
    use Color::*;
    use Square::*;

    fn white(position: Position) -> Snapshot {
        Snapshot::new(position, White)
    }

    #[test]
    fn test_black_cannot_move_first() {
        let state = white(Position::default());
        assert!(state.legal_moves(E7).is_empty());
        assert_eq!(state.legal_moves(E2).len(), 2);
    }

    #[test]
    fn test_initial_position_move_counts() {
        let state = white(Position::default());
        for square in Square::iter() {
            let moves = state.legal_moves(square);
            match state.as_ref()[square] {
                Some(piece) if piece.color() == White && piece.kind().is_pawn() => {
                    assert_eq!(moves.len(), 2, "pawn on {}", square)
                }
                Some(piece) if piece.color() == White && piece.kind() == PieceKind::Knight => {
                    assert_eq!(moves.len(), 2, "knight on {}", square)
                }
                _ => assert!(moves.is_empty(), "unexpected moves from {}", square),
            }
        }
    }

    #[test]
    fn test_pinned_piece_cannot_leave_line() {
        let position = Position::empty()
            .set_contents(E1, Some(Piece::WK.moved()))
            .set_contents(E2, Some(Piece::WR.moved()))
            .set_contents(E8, Some(Piece::BR.moved()))
            .set_contents(A8, Some(Piece::BK.moved()));
        let state = white(position);
        let moves = state.legal_moves(E2);
        assert!(!moves.contains(D2));
        assert!(moves.contains(E5));
        assert!(moves.contains(E8));
    }

    #[test]
    fn test_king_cannot_step_into_attack() {
        let position = Position::empty()
            .set_contents(E1, Some(Piece::WK.moved()))
            .set_contents(D8, Some(Piece::BR.moved()))
            .set_contents(A8, Some(Piece::BK.moved()));
        let moves = white(position).legal_moves(E1);
        assert!(!moves.contains(D1));
        assert!(!moves.contains(D2));
        assert!(moves.contains(E2));
        assert!(moves.contains(F1));
    }

    #[test]
    fn test_legal_moves_never_leave_king_attacked() {
        let position = Position::default()
            .set_contents(F7, None)
            .set_contents(H5, Some(Piece::WQ.moved()))
            .set_contents(E7, None);
        let state = Snapshot::new(position, Black);
        for from in position.pieces(Black).iter() {
            for mv in state.legal_moves(from).iter() {
                let mut scratch = position;
                scratch.apply_move(mv);
                assert!(!scratch.is_in_check(Black), "{} leaves king in check", mv);
            }
        }
    }

    #[test]
    fn test_check_detected_through_opponent_moves() {
        let position = Position::default()
            .set_contents(F7, None)
            .set_contents(H5, Some(Piece::WQ.moved()));
        assert!(position.is_in_check(Black));
        assert!(!position.is_in_check(White));
    }

    #[test]
    fn test_missing_king_is_not_in_check() {
        let position = Position::empty().set_contents(A1, Some(Piece::WQ));
        assert!(!position.is_in_check(Black));
    }

    #[test]
    fn test_checkmate_and_stalemate() {
        // back-rank mate
        let mate = Position::empty()
            .set_contents(G8, Some(Piece::BK.moved()))
            .set_contents(F7, Some(Piece::BP))
            .set_contents(G7, Some(Piece::BP))
            .set_contents(H7, Some(Piece::BP))
            .set_contents(A8, Some(Piece::WR.moved()))
            .set_contents(G1, Some(Piece::WK.moved()));
        assert!(mate.is_checkmate(Black, None, CastlingRule::Permissive));
        assert!(!mate.is_stalemate(Black, None, CastlingRule::Permissive));

        let stale = Position::empty()
            .set_contents(H8, Some(Piece::BK.moved()))
            .set_contents(F7, Some(Piece::WQ.moved()))
            .set_contents(G6, Some(Piece::WK.moved()));
        assert!(stale.is_stalemate(Black, None, CastlingRule::Permissive));
        assert!(!stale.is_checkmate(Black, None, CastlingRule::Permissive));
    }

    #[test]
    fn test_en_passant_exposing_king_is_rejected() {
        let position = Position::empty()
            .set_contents(A5, Some(Piece::WK.moved()))
            .set_contents(B5, Some(Piece::WP.moved()))
            .set_contents(C5, Some(Piece::BP.moved()))
            .set_contents(H5, Some(Piece::BR.moved()))
            .set_contents(H8, Some(Piece::BK.moved()));
        let state = white(position).with_en_passant(Some(C6));
        let moves = state.legal_moves(B5);
        assert!(!moves.contains(C6));
        assert!(moves.contains(B6));
    }

    #[test]
    fn test_permissive_castling_through_attacked_square() {
        // the rook on f8 covers f1 but not g1
        let position = Position::default()
            .set_contents(F1, None)
            .set_contents(G1, None)
            .set_contents(F2, None)
            .set_contents(F7, None)
            .set_contents(F8, Some(Piece::BR.moved()));
        let permissive = white(position);
        assert!(permissive.legal_moves(E1).contains(G1));

        let strict = permissive.with_castling(CastlingRule::Strict);
        assert!(!strict.legal_moves(E1).contains(G1));
    }

    #[test]
    fn test_castling_into_attack_is_rejected() {
        let position = Position::default()
            .set_contents(F1, None)
            .set_contents(G1, None)
            .set_contents(G2, None)
            .set_contents(G7, None)
            .set_contents(G8, Some(Piece::BR.moved()));
        assert!(!white(position).legal_moves(E1).contains(G1));
    }

    #[test]
    fn test_strict_castling_forbids_castling_out_of_check() {
        let position = Position::default()
            .set_contents(F1, None)
            .set_contents(G1, None)
            .set_contents(E2, None)
            .set_contents(E7, Some(Piece::BR.moved()));
        let permissive = white(position);
        assert!(permissive.is_check());
        assert!(permissive.legal_moves(E1).contains(G1));
        let strict = permissive.with_castling(CastlingRule::Strict);
        assert!(!strict.legal_moves(E1).contains(G1));
    }

    #[test]
    fn test_castling_rook_does_not_shield_the_king() {
        // the rook landing on f1 would block the queen's line to g1
        let position = Position::default()
            .set_contents(A1, Some(Piece::BQ.moved()))
            .set_contents(B1, None)
            .set_contents(C1, None)
            .set_contents(D1, None)
            .set_contents(F1, None)
            .set_contents(G1, None);
        let permissive = white(position);
        assert!(permissive.is_check());
        assert!(!permissive.legal_moves(E1).contains(G1));
    }
}
