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

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::ops::Index;

use super::config::{CastlingRule, GameConfig};
use super::legal::{LegalMoves, Snapshot};
use super::material::{Color, Pair, Piece, PieceKind};
use super::moves::{Move, MoveError, MoveSet};
use super::position::Position;
use super::san;
use super::square::{Mask, Square};
use super::Turn;
use crate::game::{GameResult, SaveRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardResult {
    /// Checkmate, with the winning color.
    CheckMate(Color),
    StaleMate,
    /// The clock ran out, with the losing color.
    TimeExpired(Color),
}

/// Where the game stands, derived from the state rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    AwaitingSelection,
    PieceSelected(Square),
    PromotionPending(Square),
    GameOver(BoardResult),
}

/// The selected piece and the legal moves computed when it was selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub from: Square,
    pub moves: MoveSet,
}

/// Display preferences carried through save and restore untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayPrefs {
    pub board_flipped: bool,
    pub fog_of_war: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub mv: Move,
    pub captured: Option<Piece>,
    pub notation: String,
    /// The moved pawn is waiting for `promote`.
    pub promotion_pending: bool,
}

/// A game in progress.
///
/// `GameState` is the only owner of its `Position`: every change goes
/// through `try_apply_move`, `try_promote` or `timeout`. Rejected
/// operations leave the state exactly as it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "SaveRecord", from = "SaveRecord")]
pub struct GameState {
    pub(crate) config: GameConfig,
    pub(crate) position: Position,
    pub(crate) turn: Color,
    pub(crate) en_passant: Option<Square>,
    pub(crate) promotion: Option<Square>,
    pub(crate) history: Vec<String>,
    /// Pieces captured by each color.
    pub(crate) captured: Pair<Vec<Piece>>,
    pub(crate) check: bool,
    pub(crate) result: Option<BoardResult>,
    pub(crate) selection: Option<Selection>,
    pub(crate) visible: Pair<Mask>,
    pub(crate) timers: Pair<u32>,
    pub(crate) display: DisplayPrefs,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl Turn for GameState {
    #[inline]
    fn turn(&self) -> Color {
        self.turn
    }
}

impl AsRef<Position> for GameState {
    fn as_ref(&self) -> &Position {
        &self.position
    }
}

impl Index<Square> for GameState {
    type Output = Option<Piece>;
    fn index(&self, index: Square) -> &Self::Output {
        self.position.index(index)
    }
}

impl LegalMoves for GameState {
    fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }
    fn castling_rule(&self) -> CastlingRule {
        self.config.castling
    }
}

impl GameState {
    /// Standard starting position, White to move, default settings.
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    pub fn with_config(config: GameConfig) -> Self {
        let mut state = Self {
            config,
            position: Position::standard(),
            turn: Color::White,
            en_passant: None,
            promotion: None,
            history: Vec::new(),
            captured: Pair::default(),
            check: false,
            result: None,
            selection: None,
            visible: Pair::default(),
            timers: Pair::splat(config.clock_seconds),
            display: DisplayPrefs {
                board_flipped: config.board_flipped,
                fog_of_war: config.fog_of_war,
            },
        };
        state.refresh_visibility();
        state
    }

    /// Rebuilds a game by playing `moves` in order from the starting
    /// position. A pawn reaching the far rank needs a promotion choice.
    pub fn replay(moves: &[(Square, Square, Option<PieceKind>)]) -> Result<Self> {
        let mut state = Self::new();
        for (ply, &(from, to, choice)) in moves.iter().enumerate() {
            let outcome = state
                .try_apply_move(from, to)
                .with_context(|| format!("ply {}: {}{}", ply + 1, from, to))?;
            if outcome.promotion_pending {
                let kind = choice
                    .with_context(|| format!("ply {}: {}{} needs a promotion choice", ply + 1, from, to))?;
                state
                    .try_promote(kind)
                    .with_context(|| format!("ply {}: promotion to {}", ply + 1, kind))?;
            }
        }
        Ok(state)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn promotion_pending(&self) -> Option<Square> {
        self.promotion
    }

    /// Notation of every move so far, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Pieces captured by `by`, in capture order.
    pub fn captured(&self, by: Color) -> &[Piece] {
        &self.captured[by]
    }

    /// Whether the side to move is in check.
    pub fn is_in_check(&self) -> bool {
        self.check
    }

    pub fn is_game_over(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<BoardResult> {
        self.result
    }

    pub fn game_result(&self) -> Option<GameResult> {
        self.result.map(GameResult::from)
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if let Some(result) = self.result {
            Phase::GameOver(result)
        } else if let Some(square) = self.promotion {
            Phase::PromotionPending(square)
        } else if let Some(selection) = &self.selection {
            Phase::PieceSelected(selection.from)
        } else {
            Phase::AwaitingSelection
        }
    }

    /// Squares revealed to `color` under fog of war.
    pub fn visible_squares(&self, color: Color) -> Mask {
        self.visible[color]
    }

    /// Whether the side to move may interact with `square`. Everything
    /// is visible with fog of war turned off.
    pub fn is_visible(&self, square: Square) -> bool {
        !self.display.fog_of_war || self.visible[self.turn].contains(square)
    }

    /// Remaining clock time in seconds. The core never counts it down.
    pub fn timer(&self, color: Color) -> u32 {
        self.timers[color]
    }

    pub fn set_timer(&mut self, color: Color, seconds: u32) {
        self.timers[color] = seconds;
    }

    pub fn display(&self) -> DisplayPrefs {
        self.display
    }

    pub fn flip_board(&mut self) {
        self.display.board_flipped = !self.display.board_flipped;
    }

    pub fn toggle_fog_of_war(&mut self) {
        self.display.fog_of_war = !self.display.fog_of_war;
    }

    /// Selects the piece on `square` if it belongs to the side to move.
    /// Any other square clears the selection.
    pub fn select(&mut self, square: Square) -> bool {
        if let Err(err) = self.ensure_playable() {
            debug!("select {} ignored: {}", square, err);
            return false;
        }
        match self.position.contents(square) {
            Some(piece) if piece.color() == self.turn => {
                let moves = self.legal_moves(square);
                self.selection = Some(Selection { from: square, moves });
                true
            }
            _ => {
                self.selection = None;
                false
            }
        }
    }

    /// Moves the selected piece to `target` if that is one of its legal
    /// moves, otherwise treats `target` as a new selection. Returns true
    /// only when a move was played.
    pub fn move_to(&mut self, target: Square) -> bool {
        if let Err(err) = self.ensure_playable() {
            debug!("move to {} ignored: {}", target, err);
            return false;
        }
        let mv = self
            .selection
            .as_ref()
            .and_then(|selection| selection.moves.get(target));
        match mv {
            Some(mv) => self.play(mv).is_ok(),
            None => {
                self.select(target);
                false
            }
        }
    }

    pub fn apply_move(&mut self, from: Square, to: Square) -> bool {
        match self.try_apply_move(from, to) {
            Ok(_) => true,
            Err(err) => {
                debug!("move {}{} rejected: {}", from, to, err);
                false
            }
        }
    }

    pub fn try_apply_move(&mut self, from: Square, to: Square) -> Result<MoveOutcome, MoveError> {
        self.ensure_playable()?;
        let mv = self.legal_moves(from).get(to).ok_or(MoveError::IllegalMove)?;
        self.play(mv)
    }

    pub fn promote(&mut self, kind: PieceKind) -> bool {
        match self.try_promote(kind) {
            Ok(_) => true,
            Err(err) => {
                debug!("promotion to {} rejected: {}", kind, err);
                false
            }
        }
    }

    /// Replaces the pending pawn and hands the turn over. Returns the
    /// amended notation of the promoting move.
    pub fn try_promote(&mut self, kind: PieceKind) -> Result<String, MoveError> {
        if self.result.is_some() {
            return Err(MoveError::GameOver);
        }
        let square = self.promotion.ok_or(MoveError::NoPromotionPending)?;
        if !kind.is_promotion_choice() {
            return Err(MoveError::InvalidPromotionChoice);
        }
        self.position.place(square, Piece::new(self.turn, kind).moved());
        self.promotion = None;

        let after = self.snapshot(!self.turn, None);
        let entry = match self.history.last_mut() {
            Some(entry) => {
                *entry = san::with_promotion(entry, kind, &after);
                entry.clone()
            }
            None => String::new(),
        };
        debug!("{} pawn on {} promoted to {}", self.turn, square, kind);
        self.advance_turn(None);
        Ok(entry)
    }

    /// Clock signal from outside the core. Ends the game with `loser`
    /// out of time unless it is already over.
    pub fn timeout(&mut self, loser: Color) -> bool {
        if self.result.is_some() {
            return false;
        }
        self.timers[loser] = 0;
        self.selection = None;
        self.finish(BoardResult::TimeExpired(loser));
        true
    }

    fn ensure_playable(&self) -> Result<(), MoveError> {
        if self.result.is_some() {
            Err(MoveError::GameOver)
        } else if self.promotion.is_some() {
            Err(MoveError::PromotionPending)
        } else {
            Ok(())
        }
    }

    fn snapshot(&self, turn: Color, en_passant: Option<Square>) -> Snapshot {
        Snapshot::new(self.position, turn)
            .with_en_passant(en_passant)
            .with_castling(self.config.castling)
    }

    /// Plays a move already known to be legal.
    fn play(&mut self, mv: Move) -> Result<MoveOutcome, MoveError> {
        let piece = self.position.contents(mv.from).ok_or(MoveError::IllegalMove)?;
        let color = piece.color();
        let captured = self.position.apply_move(mv);
        if let Some(captured) = captured {
            self.captured[color].push(captured);
        }
        self.selection = None;

        let promotes = piece.should_promote(mv.to);
        let en_passant = if piece.kind().is_pawn() && mv.from.y().abs_diff(mv.to.y()) == 2 {
            Square::from_coords(mv.from.x(), (mv.from.y() + mv.to.y()) / 2)
        } else {
            None
        };

        let notation = san::to_san(mv, piece, captured, &self.snapshot(!color, en_passant));
        debug!("{} plays {} ({})", color, mv, notation);
        self.history.push(notation.clone());

        if promotes {
            self.promotion = Some(mv.to);
            self.en_passant = None;
            self.refresh_visibility();
        } else {
            self.advance_turn(en_passant);
        }
        Ok(MoveOutcome {
            mv,
            captured,
            notation,
            promotion_pending: promotes,
        })
    }

    fn advance_turn(&mut self, en_passant: Option<Square>) {
        self.en_passant = en_passant;
        self.turn = !self.turn;
        self.evaluate();
        self.refresh_visibility();
    }

    /// Check, checkmate and stalemate for the side to move.
    fn evaluate(&mut self) {
        self.check = self.is_check();
        if !self.can_move() {
            let result = if self.check {
                BoardResult::CheckMate(!self.turn)
            } else {
                BoardResult::StaleMate
            };
            self.finish(result);
        }
    }

    fn finish(&mut self, result: BoardResult) {
        info!("game over after {} moves: {:?}", self.history.len(), result);
        self.result = Some(result);
    }

    /// The en passant target only affects the side allowed to use it.
    pub(crate) fn refresh_visibility(&mut self) {
        for color in [Color::White, Color::Black] {
            let en_passant = if color == self.turn { self.en_passant } else { None };
            self.visible[color] = self.position.visible_squares(color, en_passant);
        }
    }
}
