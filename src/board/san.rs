// Copyright 2026 Tobin Edwards
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

//! Algebraic notation for the move history.
//!
//! Entries are written from the position *after* the move so the
//! check and mate suffix can be computed against the opponent. Two
//! identical pieces able to reach the same square are not
//! disambiguated, and castling is written as a king move (`Kg1`).

use super::legal::{LegalMoves, Snapshot};
use super::material::{Piece, PieceKind};
use super::moves::Move;

/// Notation for `mv` played by `piece`. `after` is the resulting
/// position with the opponent to move.
pub fn to_san(mv: Move, piece: Piece, captured: Option<Piece>, after: &Snapshot) -> String {
    let mut s = String::new();
    let capture = captured.is_some() || mv.is_capture();

    if piece.kind().is_pawn() {
        if capture {
            s.push(mv.from.file().to_char());
        }
    } else {
        s.push(piece.kind().symbol());
    }

    if capture {
        s.push('x');
    }

    s.push(mv.to.file().to_char());
    s.push(mv.to.rank().to_char());
    s.push_str(check_suffix(after));
    s
}

/// Rewrites a pawn move entry once the promotion choice is known,
/// replacing any suffix computed before the pawn was swapped.
pub fn with_promotion(entry: &str, kind: PieceKind, after: &Snapshot) -> String {
    let mut s = entry.trim_end_matches(['+', '#']).to_string();
    s.push('=');
    s.push(kind.symbol());
    s.push_str(check_suffix(after));
    s
}

/// `+` when the side to move is in check, `#` when that check is mate.
pub fn check_suffix(after: &Snapshot) -> &'static str {
    if after.is_check() {
        if after.can_move() {
            "+"
        } else {
            "#"
        }
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;
    use Square::*;

    /// Plays `mv` on `position` and encodes it the way the game does.
    fn play(position: Position, mv: Move) -> String {
        let piece = position[mv.from].unwrap();
        let mut after = position;
        let captured = after.apply_move(mv);
        to_san(mv, piece, captured, &Snapshot::new(after, !piece.color()))
    }

    #[test]
    fn test_pawn_advance() {
        let mv = Move::new(E2, E4, MoveFlag::Normal);
        assert_eq!(play(Position::default(), mv), "e4");
    }

    #[test]
    fn test_knight_move() {
        let mv = Move::new(G1, F3, MoveFlag::Normal);
        assert_eq!(play(Position::default(), mv), "Nf3");
    }

    #[test]
    fn test_pawn_capture() {
        let position = Position::default().set_contents(D5, Some(Piece::BP.moved()));
        let position = position.set_contents(E4, Some(Piece::WP.moved()));
        let mv = Move::new(E4, D5, MoveFlag::Capture);
        assert_eq!(play(position, mv), "exd5");
    }

    #[test]
    fn test_en_passant() {
        let position = Position::default()
            .set_contents(D7, None)
            .set_contents(D5, Some(Piece::BP.moved()))
            .set_contents(E2, None)
            .set_contents(E5, Some(Piece::WP.moved()));
        let mv = Move::new(E5, D6, MoveFlag::EnPassant);
        assert_eq!(play(position, mv), "exd6");
    }

    #[test]
    fn test_castling_written_as_king_move() {
        let position = Position::default()
            .set_contents(F1, None)
            .set_contents(G1, None);
        let mv = Move::new(E1, G1, MoveFlag::CastleShort);
        assert_eq!(play(position, mv), "Kg1");
    }

    #[test]
    fn test_check_suffix() {
        let position = Position::default()
            .set_contents(D1, None)
            .set_contents(H5, Some(Piece::WQ.moved()));
        let mv = Move::new(H5, F7, MoveFlag::Capture);
        assert_eq!(play(position, mv), "Qxf7+");
    }

    #[test]
    fn test_checkmate_suffix() {
        // Fool's mate: 1. f3 e5 2. g4 Qh4#
        let position = Position::default()
            .set_contents(F2, None)
            .set_contents(F3, Some(Piece::WP.moved()))
            .set_contents(G2, None)
            .set_contents(G4, Some(Piece::WP.moved()))
            .set_contents(E7, None)
            .set_contents(E5, Some(Piece::BP.moved()));
        let mv = Move::new(D8, H4, MoveFlag::Normal);
        assert_eq!(play(position, mv), "Qh4#");
    }

    #[test]
    fn test_promotion_suffix_is_recomputed() {
        // a pawn on the far rank gives no check; the queen that replaces it does
        let pending = Position::empty()
            .set_contents(A8, Some(Piece::WP.moved()))
            .set_contents(E8, Some(Piece::BK.moved()))
            .set_contents(E1, Some(Piece::WK.moved()));
        let entry = to_san(
            Move::new(A7, A8, MoveFlag::Normal),
            Piece::WP,
            None,
            &Snapshot::new(pending, Color::Black),
        );
        assert_eq!(entry, "a8");

        let promoted = pending.set_contents(A8, Some(Piece::WQ.moved()));
        let after = Snapshot::new(promoted, Color::Black);
        assert_eq!(with_promotion(&entry, PieceKind::Queen, &after), "a8=Q+");
        assert_eq!(with_promotion("a8#", PieceKind::Queen, &after), "a8=Q+");
    }
}
